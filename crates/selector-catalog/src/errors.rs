//! Catalog loading error types

use thiserror::Error;

/// Errors raised while loading a selector bundle from disk.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to deserialize selector bundle: {0}")]
    Deserialize(String),
}
