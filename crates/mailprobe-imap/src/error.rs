//! Error types for the IMAP session.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during an IMAP session.
#[derive(Debug, Error)]
pub enum Error {
    /// Credential could not be encoded (empty mailbox or token).
    #[error("Invalid credential: {0}")]
    InvalidCredential(#[from] mailprobe_oauth::Error),

    /// I/O error during network operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS handshake or encryption error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Invalid DNS name for TLS.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// Operation timed out.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Server closed the connection before the expected line arrived.
    #[error("Connection closed by server")]
    ConnectionClosed,

    /// Line that could not be classified, or a tagged line for another command.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Server returned NO response.
    #[error("Server returned NO: {0}")]
    No(String),

    /// Server returned BAD response.
    #[error("Server returned BAD: {0}")]
    Bad(String),

    /// Configuration rejected by [`crate::ConfigBuilder::build`].
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid state for the requested operation.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl Error {
    /// Returns true for faults that end the session (network, TLS, framing).
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::Tls(_)
                | Self::InvalidDnsName(_)
                | Self::Timeout(_)
                | Self::ConnectionClosed
                | Self::MalformedResponse(_)
        )
    }

    /// Returns true if the server rejected the command with NO or BAD.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::No(_) | Self::Bad(_))
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert!(Error::ConnectionClosed.is_transport());
        assert!(Error::Timeout(Duration::from_secs(1)).is_transport());
        assert!(Error::MalformedResponse("x".into()).is_transport());
        assert!(!Error::No("x".into()).is_transport());

        assert!(Error::No("x".into()).is_rejection());
        assert!(Error::Bad("x".into()).is_rejection());
        assert!(!Error::InvalidState("x".into()).is_rejection());
        assert!(!Error::InvalidState("x".into()).is_transport());
        assert!(!Error::InvalidConfig("x".into()).is_transport());
        assert!(!Error::InvalidConfig("x".into()).is_rejection());
    }
}
