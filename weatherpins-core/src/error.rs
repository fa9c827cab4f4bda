//! Error kinds surfaced by the two remote clients.

use thiserror::Error;

use crate::model::{InvalidLocationId, LocationId};

/// Failure to obtain a temperature from the weather provider.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("coordinates must be finite numbers (latitude={latitude}, longitude={longitude})")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("weather request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("weather provider responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("weather response could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("weather response has no current temperature")]
    MissingTemperature,
}

/// Failure of a document store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Connection(#[from] reqwest::Error),

    #[error("location not found: {0}")]
    NotFound(LocationId),

    #[error("store rejected the request with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("store response could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    InvalidId(#[from] InvalidLocationId),

    #[error("document {id} is not a valid location: {reason}")]
    InvalidDocument { id: String, reason: String },
}

/// Shortens a response body for inclusion in an error message.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
