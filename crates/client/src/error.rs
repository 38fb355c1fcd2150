//! Client error types.

use thiserror::Error;

/// Errors raised at the remote API boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server rejected a reservation because the slot is no longer free.
    #[error("Slot conflict: {0}")]
    Conflict(String),

    /// The session is missing or expired.
    #[error("Unauthorized")]
    Unauthorized,

    /// The requested resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other rejection from the backend.
    #[error("Backend rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Transport failure or timeout; retryable by re-invoking the action.
    #[error("Network error: {0}")]
    Network(String),

    /// The response body did not match the expected shape.
    #[error("Invalid payload: {0}")]
    Payload(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Payload(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}
