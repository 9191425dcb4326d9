use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sanitized, host-facing error payload.
///
/// Every error that crosses the crate boundary after an HTTP attempt is one
/// of these: credentials are redacted and `message` is taken from a fixed
/// table when the upstream status code is recognized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFacingError {
    pub message: String,
    pub description: String,
    /// Stringified HTTP status code, `"0"` when the failure carried none.
    pub code: String,
}

impl std::fmt::Display for UserFacingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.description.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} ({})", self.message, self.description)
        }
    }
}

/// Unified error type for the node core.
#[derive(Debug, Error)]
pub enum Error {
    /// Upstream API failure, already passed through the sanitizer.
    #[error("{0}")]
    Api(UserFacingError),

    /// The circuit breaker is open; no network call was attempted.
    #[error("Circuit breaker is open. Too many consecutive failures. Service will retry after {retry_after_secs}s")]
    CircuitOpen { retry_after_secs: u64 },

    /// Credential or transport configuration problem.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Action-level contract violation (e.g. upstream never returned a task id).
    #[error("Action error: {0}")]
    Action(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Sanitized status code of the failure, if the error carries one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api(e) => e.code.parse::<u16>().ok().filter(|c| *c != 0),
            _ => None,
        }
    }

    pub fn is_circuit_open(&self) -> bool {
        matches!(self, Error::CircuitOpen { .. })
    }
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
