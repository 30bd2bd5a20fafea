//! Driver error types

use thiserror::Error;

/// Errors raised by a browser-driving backend.
#[derive(Debug, Error, Clone)]
pub enum DriverError {
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("interaction with element {element} failed: {reason}")]
    Interaction { element: String, reason: String },

    #[error("stale element handle: {0}")]
    StaleHandle(String),

    #[error("screenshot failed: {0}")]
    Screenshot(String),

    #[error("page inspection failed: {0}")]
    Inspection(String),

    #[error("driver backend unavailable: {0}")]
    Backend(String),
}
