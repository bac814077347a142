//! Application error types.

use thiserror::Error;

use crate::models::PersonId;

/// Application-level errors for arbre.
#[derive(Error, Debug)]
pub enum AppError {
    // Transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Expand request for {person} failed with status {status}")]
    Status { status: u16, person: PersonId },

    // Decoding errors
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    // Domain errors
    #[error("Person not found: {0}")]
    UnknownPerson(PersonId),

    #[error("No focus person: pass --focus or set rootId")]
    MissingFocus,
}
