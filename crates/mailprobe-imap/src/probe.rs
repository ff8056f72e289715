//! One-shot inbox check.
//!
//! Runs the whole sequence against one server: greeting, CAPABILITY,
//! AUTHENTICATE XOAUTH2, STATUS INBOX (UNSEEN) when authenticated, LOGOUT,
//! and finally close. The stream is released on every path.

use tokio::io::{AsyncRead, AsyncWrite};

use mailprobe_oauth::Credential;

use crate::command::StatusAttribute;
use crate::connection::{AuthOutcome, Config, Session};
use crate::types::MailboxStatus;
use crate::{Error, Result};

/// Mailbox queried after authentication.
pub const INBOX: &str = "INBOX";

/// Outcome of the authentication phase.
#[derive(Debug)]
pub enum AuthResult {
    /// Server accepted the credential.
    Authenticated,
    /// Server rejected the credential; holds the completion text.
    Rejected(String),
    /// Connection, TLS, I/O, timeout or framing failure.
    TransportError(Error),
}

impl AuthResult {
    /// Returns true if the server accepted the credential.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

/// Result of [`check_inbox`].
#[derive(Debug)]
pub struct Report {
    /// Authentication outcome.
    pub auth: AuthResult,
    /// Untagged lines returned by STATUS (empty unless authenticated).
    pub status_lines: Vec<String>,
}

impl Report {
    fn from_auth(auth: AuthResult) -> Self {
        Self {
            auth,
            status_lines: Vec::new(),
        }
    }

    /// Parses the INBOX unseen count from the STATUS lines.
    #[must_use]
    pub fn unseen(&self) -> Option<u32> {
        self.status_lines
            .iter()
            .filter_map(|line| MailboxStatus::parse(line))
            .find(|status| status.mailbox.eq_ignore_ascii_case(INBOX))
            .and_then(|status| status.unseen)
    }
}

/// Connects to `config.host` and checks the inbox.
///
/// # Errors
///
/// Only [`Error::InvalidCredential`], before any network I/O. Every other
/// failure is reported through [`Report::auth`].
pub async fn check_inbox(config: &Config, credential: &Credential) -> Result<Report> {
    credential.validate()?;

    match Session::connect(config).await {
        Ok(session) => check_inbox_on(session, credential).await,
        Err(e) => {
            tracing::warn!(?e, host = %config.host, "Connection failed");
            Ok(Report::from_auth(AuthResult::TransportError(e)))
        }
    }
}

/// Checks the inbox over an already-connected stream, then closes it.
///
/// # Errors
///
/// Only [`Error::InvalidCredential`]; the session is still closed.
pub async fn check_inbox_on<S>(mut session: Session<S>, credential: &Credential) -> Result<Report>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let result = run(&mut session, credential).await;
    session.close().await;

    match result {
        Ok(report) => Ok(report),
        Err(e @ Error::InvalidCredential(_)) => Err(e),
        Err(e) => Ok(Report::from_auth(AuthResult::TransportError(e))),
    }
}

async fn run<S>(session: &mut Session<S>, credential: &Credential) -> Result<Report>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    session.read_banner().await?;

    // Informational only; a refusal here does not stop authentication.
    if let Err(e) = session.capability().await {
        if e.is_transport() {
            return Err(e);
        }
        tracing::warn!(?e, "CAPABILITY refused");
    }

    let mut report = match session.authenticate(credential).await? {
        AuthOutcome::Authenticated => Report::from_auth(AuthResult::Authenticated),
        AuthOutcome::Rejected(rejection) => {
            Report::from_auth(AuthResult::Rejected(rejection.message))
        }
    };

    if report.auth.is_authenticated() {
        match session.status(INBOX, &[StatusAttribute::Unseen]).await {
            Ok(response) => report.status_lines = response.untagged,
            Err(e) if e.is_transport() => return Err(e),
            Err(e) => tracing::warn!(?e, "STATUS refused"),
        }
    }

    // The authentication outcome is already settled; a failed LOGOUT only
    // affects how politely the connection ends.
    if let Err(e) = session.logout().await {
        tracing::warn!(?e, "LOGOUT failed");
    }

    Ok(report)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use mailprobe_oauth::Token;

    use super::*;

    fn report(lines: &[&str]) -> Report {
        Report {
            auth: AuthResult::Authenticated,
            status_lines: lines.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn test_report_unseen() {
        assert_eq!(report(&["* STATUS INBOX (UNSEEN 3)"]).unseen(), Some(3));
        assert_eq!(report(&["* STATUS inbox (UNSEEN 0)"]).unseen(), Some(0));
        assert_eq!(report(&["* OK noise", "* STATUS INBOX (UNSEEN 9)"]).unseen(), Some(9));
        assert_eq!(report(&["* STATUS Archive (UNSEEN 9)"]).unseen(), None);
        assert_eq!(report(&[]).unseen(), None);
    }

    #[tokio::test]
    async fn test_check_inbox_invalid_credential() {
        // Port 9 on an unroutable name: never contacted because encoding fails first.
        let config = Config::builder("invalid.example").port(9).build().unwrap();
        let credential = Credential::new("", Token::bearer("token"));

        let err = check_inbox(&config, &credential).await.unwrap_err();
        assert!(matches!(err, Error::InvalidCredential(_)));
    }
}
