//! arbre - family tree layout engine
//!
//! Lays out a focus-centred family tree: a direct-ancestor trunk, the
//! descendants of expanded persons, couples side by side and orthogonal
//! connectors, with ancestors fetched lazily from an expand API.

pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod source;
pub mod tree;
