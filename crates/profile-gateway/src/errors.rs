//! Gateway error taxonomy

use thiserror::Error;

/// Errors reported by the profile lifecycle API.
///
/// All of these are recoverable at the profile level: they mark one
/// profile's run as failed and never abort the orchestration run.
#[derive(Debug, Error, Clone)]
pub enum GatewayError {
    #[error("profile {0} does not exist")]
    NotFound(String),

    #[error("profile {0} already has a running session")]
    AlreadyRunning(String),

    #[error("profile service unreachable: {0}")]
    ServiceUnreachable(String),

    #[error("profile service error (code {code}): {message}")]
    Api { code: i64, message: String },

    #[error("failed to decode profile service response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Transport-level failures are worth retrying; API verdicts are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::ServiceUnreachable(_))
    }
}
