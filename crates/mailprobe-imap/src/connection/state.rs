//! Session lifecycle states.

use std::fmt;

/// Where a [`Session`](super::Session) is in the protocol sequence.
///
/// ```text
/// Connecting → Connected → CapabilityNegotiated → Authenticating
///     → Authenticated | AuthFailed → CommandExchange → LoggedOut → Closed
/// ```
///
/// `Failed` is entered from any open state on a transport error. `Closed`
/// is the only terminal state; the stream has been released once it is
/// reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Stream is open, greeting not yet read.
    Connecting,
    /// Greeting received.
    Connected,
    /// CAPABILITY completed.
    CapabilityNegotiated,
    /// AUTHENTICATE sent, completion pending.
    Authenticating,
    /// Server accepted the credential.
    Authenticated,
    /// Server rejected the credential.
    AuthFailed,
    /// At least one post-authentication command completed.
    CommandExchange,
    /// LOGOUT completed.
    LoggedOut,
    /// A transport error occurred; only `close` is meaningful.
    Failed,
    /// Stream released.
    Closed,
}

impl SessionState {
    /// Returns true once the server has accepted the credential.
    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated | Self::CommandExchange)
    }

    /// Returns true if a new command may be issued.
    #[must_use]
    pub const fn accepts_commands(self) -> bool {
        !matches!(
            self,
            Self::Connecting | Self::Authenticating | Self::LoggedOut | Self::Failed | Self::Closed
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_authenticated() {
        assert!(SessionState::Authenticated.is_authenticated());
        assert!(SessionState::CommandExchange.is_authenticated());
        assert!(!SessionState::AuthFailed.is_authenticated());
        assert!(!SessionState::LoggedOut.is_authenticated());
    }

    #[test]
    fn test_accepts_commands() {
        assert!(SessionState::Connected.accepts_commands());
        assert!(SessionState::AuthFailed.accepts_commands());
        assert!(!SessionState::Connecting.accepts_commands());
        assert!(!SessionState::Failed.accepts_commands());
        assert!(!SessionState::Closed.accepts_commands());
    }

    fn _assert_send<T: Send>() {}

    #[test]
    fn test_state_is_send() {
        _assert_send::<SessionState>();
    }
}
