//! Services that drive a tree view.
//!
//! [`AncestorFetcher`] talks to an [`AncestorSource`](crate::source::AncestorSource)
//! and [`TreeService`] owns the shared state and the render loop.

mod fetch;
mod tree;

pub use fetch::{fetch_key, AncestorFetcher};
pub use tree::TreeService;
