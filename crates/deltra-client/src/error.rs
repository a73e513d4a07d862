//! Error types for the Deltra client.

use thiserror::Error;


/// Client error types.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from API.
        message: String,
    },

    /// Resource not found, or owned by another user.
    #[error("{0}")]
    NotFound(String),

    /// The API rejected the request as invalid.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Session missing, invalid or expired.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A user-scoped call was made before a session was attached.
    #[error("No session; call with_session first")]
    NoSession,
}

impl Error {
    /// Maps a non-success status and body to an error.
    pub(crate) fn from_status(status: u16, message: String) -> Self {
        match status {
            400 => Error::InvalidRequest(message),
            401 => Error::Unauthorized(message),
            404 => Error::NotFound(message),
            _ => Error::Api { status, message },
        }
    }
}
