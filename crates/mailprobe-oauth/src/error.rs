//! Error types for credential handling.

/// Result type alias for credential operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Credential error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Mailbox or bearer token is empty.
    #[error("Invalid credential: {0}")]
    InvalidCredential(&'static str),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Base64 decoding error.
    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),
}
