//! Tagged IMAP session.
//!
//! A `Session` owns one secured stream and drives it strictly sequentially:
//! each command is written, then lines are read until the tagged completion
//! for that command's tag arrives. There is never more than one command in
//! flight.
//!
//! ## Example
//!
//! ```ignore
//! use mailprobe_imap::{Config, Session, StatusAttribute};
//! use mailprobe_oauth::{Credential, Token};
//!
//! let config = Config::new("outlook.office365.com");
//! let credential = Credential::new("user@example.com", Token::bearer(access_token));
//!
//! let mut session = Session::connect(&config).await?;
//! session.read_banner().await?;
//! session.capability().await?;
//! if session.authenticate(&credential).await?.is_authenticated() {
//!     let reply = session.status("INBOX", &[StatusAttribute::Unseen]).await?;
//! }
//! session.logout().await?;
//! session.close().await;
//! ```

use tokio::io::{AsyncRead, AsyncWrite};

use mailprobe_oauth::sasl::{XOAUTH2, decode_challenge};
use mailprobe_oauth::{Credential, OAuthError};

use super::framed::{CommandResponse, FramedStream, Progress, ResponseAccumulator};
use super::state::SessionState;
use super::{Config, ImapStream, connect_tls};
use crate::command::{Command, StatusAttribute, TagGenerator};
use crate::parser::ResponseLine;
use crate::types::{Capabilities, Status};
use crate::{Error, Result};

/// Outcome of the AUTHENTICATE step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Server accepted the credential.
    Authenticated,
    /// Server answered NO or BAD.
    Rejected(Rejection),
}

impl AuthOutcome {
    /// Returns true if the server accepted the credential.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

/// Details of a rejected AUTHENTICATE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// NO or BAD.
    pub status: Status,
    /// Text of the tagged completion.
    pub message: String,
    /// Decoded XOAUTH2 error challenge, if the server sent one.
    pub detail: Option<OAuthError>,
}

/// IMAP session over a single stream.
pub struct Session<S> {
    host: String,
    port: u16,
    stream: Option<FramedStream<S>>,
    tag_gen: TagGenerator,
    state: SessionState,
    capabilities: Capabilities,
}

// Manual Debug implementation since FramedStream doesn't implement Debug
impl<S> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("state", &self.state)
            .field("tag_gen", &self.tag_gen)
            .finish_non_exhaustive()
    }
}

impl Session<ImapStream> {
    /// Opens a TCP connection and negotiates TLS with `config.host`.
    ///
    /// The greeting is not read yet; call [`Session::read_banner`] next.
    ///
    /// # Errors
    ///
    /// Returns the DNS, socket, TLS or timeout error that stopped the connection.
    pub async fn connect(config: &Config) -> Result<Self> {
        tracing::info!(host = %config.host, port = config.port, "Connecting");
        let stream = connect_tls(config).await?;
        tracing::debug!("TLS connection established");
        Ok(Self::from_stream(stream, config))
    }
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an already-connected stream.
    pub fn from_stream(stream: S, config: &Config) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            stream: Some(FramedStream::new(stream, config.io_timeout)),
            tag_gen: TagGenerator::new(config.tag_prefix()),
            state: SessionState::Connecting,
            capabilities: Capabilities::default(),
        }
    }

    /// Returns the server hostname.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the server port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Returns the capabilities from the last CAPABILITY exchange.
    #[must_use]
    pub const fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Reads the server greeting.
    ///
    /// The greeting is not validated beyond being a complete line.
    ///
    /// # Errors
    ///
    /// Transport error if the server closes, stalls or the read fails.
    pub async fn read_banner(&mut self) -> Result<String> {
        self.expect_state(self.state == SessionState::Connecting, "read_banner")?;
        let result = self.framed()?.read_line().await;
        let banner = self.track(result)?;

        tracing::debug!(%banner, "Greeting");
        self.state = SessionState::Connected;
        Ok(banner)
    }

    /// Sends CAPABILITY and records the advertised capabilities.
    ///
    /// No capability is required; the list is informational.
    ///
    /// # Errors
    ///
    /// Transport error, or [`Error::No`]/[`Error::Bad`] if the server refuses.
    pub async fn capability(&mut self) -> Result<&Capabilities> {
        self.expect_state(
            matches!(
                self.state,
                SessionState::Connected | SessionState::CapabilityNegotiated
            ),
            "capability",
        )?;

        let response = self.execute(&Command::Capability).await?.into_ok()?;
        self.capabilities = Capabilities::from_untagged(&response.untagged);
        if !self.capabilities.supports_xoauth2() {
            tracing::debug!("Server does not advertise AUTH=XOAUTH2");
        }

        self.state = SessionState::CapabilityNegotiated;
        Ok(&self.capabilities)
    }

    /// Authenticates with SASL XOAUTH2.
    ///
    /// A NO or BAD completion is a normal outcome, reported as
    /// [`AuthOutcome::Rejected`]. If the server sends an error challenge
    /// first, it is answered with an empty line and its decoded JSON is
    /// attached to the rejection.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidCredential`] before any I/O if the mailbox or token is
    /// empty, otherwise a transport error.
    pub async fn authenticate(&mut self, credential: &Credential) -> Result<AuthOutcome> {
        self.expect_state(
            matches!(
                self.state,
                SessionState::Connected | SessionState::CapabilityNegotiated
            ),
            "authenticate",
        )?;
        let initial_response = credential.xoauth2()?;

        self.state = SessionState::Authenticating;
        tracing::info!(mailbox = credential.mailbox(), "Authenticating with XOAUTH2");

        let command = Command::Authenticate {
            mechanism: XOAUTH2.to_string(),
            initial_response: Some(initial_response),
        };
        let result = self.authenticate_exchange(&command).await;
        let (response, detail) = self.track(result)?;

        match response.status {
            Status::Ok => {
                tracing::info!("XOAUTH2 authentication successful");
                self.state = SessionState::Authenticated;
                Ok(AuthOutcome::Authenticated)
            }
            status @ (Status::No | Status::Bad) => {
                tracing::warn!(%status, text = %response.text, "XOAUTH2 authentication rejected");
                self.state = SessionState::AuthFailed;
                Ok(AuthOutcome::Rejected(Rejection {
                    status,
                    message: response.text,
                    detail,
                }))
            }
        }
    }

    async fn authenticate_exchange(
        &mut self,
        command: &Command,
    ) -> Result<(CommandResponse, Option<OAuthError>)> {
        let mut accumulator = self.send(command).await?;
        let mut detail = None;
        let mut answered = false;

        loop {
            match self.next_progress(&mut accumulator).await? {
                Progress::Continuation(challenge) if !answered => {
                    match decode_challenge(&challenge) {
                        Ok(error) => {
                            tracing::debug!(status = %error.status, "XOAUTH2 error challenge");
                            detail = Some(error);
                        }
                        Err(e) => tracing::debug!(?e, "Undecodable XOAUTH2 challenge"),
                    }
                    // The server sends the tagged NO only after an empty reply.
                    self.framed()?.write_command(b"\r\n").await?;
                    answered = true;
                }
                Progress::Continuation(_) => {
                    return Err(Error::MalformedResponse(
                        "repeated continuation during AUTHENTICATE".to_string(),
                    ));
                }
                Progress::Done(response) => return Ok((response, detail)),
                Progress::Pending => {}
            }
        }
    }

    /// Sends STATUS for `mailbox` and returns its reply.
    ///
    /// The untagged `* STATUS` line(s) are in [`CommandResponse::untagged`];
    /// [`crate::MailboxStatus::parse`] decodes them.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] unless authenticated, a transport error, or
    /// [`Error::No`]/[`Error::Bad`].
    pub async fn status(
        &mut self,
        mailbox: &str,
        items: &[StatusAttribute],
    ) -> Result<CommandResponse> {
        self.expect_state(self.state.is_authenticated(), "status")?;

        let command = Command::Status {
            mailbox: mailbox.to_string(),
            items: items.to_vec(),
        };
        let response = self.execute(&command).await?;
        self.state = SessionState::CommandExchange;
        response.into_ok()
    }

    /// Sends NOOP.
    ///
    /// # Errors
    ///
    /// Transport error, or [`Error::No`]/[`Error::Bad`].
    pub async fn noop(&mut self) -> Result<()> {
        self.execute(&Command::Noop).await?.into_ok()?;
        Ok(())
    }

    /// Sends LOGOUT and waits for its tagged completion.
    ///
    /// Valid after a rejected AUTHENTICATE as well as after success.
    ///
    /// # Errors
    ///
    /// Transport error, or [`Error::No`]/[`Error::Bad`].
    pub async fn logout(&mut self) -> Result<CommandResponse> {
        let response = self.execute(&Command::Logout).await?;
        self.state = SessionState::LoggedOut;
        tracing::debug!("Logged out");
        response.into_ok()
    }

    /// Releases the stream.
    ///
    /// Shuts down TLS and the socket. Safe to call in any state and any
    /// number of times; shutdown failures are logged, never returned.
    pub async fn close(&mut self) {
        if let Some(mut framed) = self.stream.take() {
            if let Err(e) = framed.shutdown().await {
                tracing::debug!(?e, "Error during shutdown");
            }
            tracing::debug!(host = %self.host, "Connection closed");
        }
        self.state = SessionState::Closed;
    }

    /// Sends a command and collects its reply.
    ///
    /// NO and BAD completions are returned as data, not errors; use
    /// [`CommandResponse::into_ok`] to convert them.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] if the session cannot take commands, a
    /// transport error, or [`Error::MalformedResponse`] on an unexpected
    /// continuation or foreign tag.
    pub async fn execute(&mut self, command: &Command) -> Result<CommandResponse> {
        self.expect_state(self.state.accepts_commands(), command.name())?;
        let result = self.exchange(command).await;
        self.track(result)
    }

    async fn exchange(&mut self, command: &Command) -> Result<CommandResponse> {
        let mut accumulator = self.send(command).await?;
        loop {
            match self.next_progress(&mut accumulator).await? {
                Progress::Done(response) => return Ok(response),
                Progress::Continuation(_) => {
                    return Err(Error::MalformedResponse(format!(
                        "unexpected continuation for {}",
                        command.name()
                    )));
                }
                Progress::Pending => {}
            }
        }
    }

    async fn send(&mut self, command: &Command) -> Result<ResponseAccumulator> {
        let tag = self.tag_gen.next();
        tracing::debug!(%tag, command = command.name(), "Sending command");

        let bytes = command.serialize(&tag);
        self.framed()?.write_command(&bytes).await?;
        Ok(ResponseAccumulator::new(tag))
    }

    async fn next_progress(&mut self, accumulator: &mut ResponseAccumulator) -> Result<Progress> {
        let line = self.framed()?.read_line().await?;
        tracing::trace!(%line, "Received");
        accumulator.push(ResponseLine::parse(&line)?)
    }

    fn framed(&mut self) -> Result<&mut FramedStream<S>> {
        self.stream
            .as_mut()
            .ok_or_else(|| Error::InvalidState("session is closed".to_string()))
    }

    fn expect_state(&self, allowed: bool, operation: &str) -> Result<()> {
        if allowed {
            Ok(())
        } else {
            Err(Error::InvalidState(format!(
                "{operation} not allowed in state {}",
                self.state
            )))
        }
    }

    /// Moves to `Failed` on transport errors.
    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result
            && e.is_transport()
        {
            tracing::warn!(?e, state = %self.state, "Transport error");
            self.state = SessionState::Failed;
        }
        result
    }
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
    use std::time::Duration;

    use mailprobe_oauth::Token;
    use mailprobe_oauth::sasl::xoauth2_response;
    use tokio_test::io::Builder;

    use super::*;

    fn config() -> Config {
        Config::builder("imap.example.com")
            .io_timeout(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    fn credential() -> Credential {
        Credential::new("user@example.com", Token::bearer("token123"))
    }

    fn auth_line(tag: &str) -> Vec<u8> {
        let payload = xoauth2_response("user@example.com", "token123").unwrap();
        format!("{tag} AUTHENTICATE XOAUTH2 {payload}\r\n").into_bytes()
    }

    #[tokio::test]
    async fn test_full_exchange() {
        let mock = Builder::new()
            .read(b"* OK IMAP4 ready\r\n")
            .write(b"A0001 CAPABILITY\r\n")
            .read(b"* CAPABILITY IMAP4rev1 AUTH=XOAUTH2\r\nA0001 OK CAPABILITY completed\r\n")
            .write(&auth_line("A0002"))
            .read(b"A0002 OK AUTHENTICATE completed\r\n")
            .write(b"A0003 STATUS INBOX (UNSEEN)\r\n")
            .read(b"* STATUS INBOX (UNSEEN 3)\r\nA0003 OK STATUS completed\r\n")
            .write(b"A0004 LOGOUT\r\n")
            .read(b"* BYE bye\r\nA0004 OK LOGOUT completed\r\n")
            .build();
        let mut session = Session::from_stream(mock, &config());
        assert_eq!(session.state(), SessionState::Connecting);

        assert_eq!(session.read_banner().await.unwrap(), "* OK IMAP4 ready");
        assert_eq!(session.state(), SessionState::Connected);

        assert!(session.capability().await.unwrap().supports_xoauth2());
        assert_eq!(session.state(), SessionState::CapabilityNegotiated);

        let outcome = session.authenticate(&credential()).await.unwrap();
        assert_eq!(outcome, AuthOutcome::Authenticated);
        assert_eq!(session.state(), SessionState::Authenticated);

        let status = session
            .status("INBOX", &[StatusAttribute::Unseen])
            .await
            .unwrap();
        assert_eq!(status.untagged, vec!["* STATUS INBOX (UNSEEN 3)".to_string()]);
        assert_eq!(session.state(), SessionState::CommandExchange);

        let logout = session.logout().await.unwrap();
        assert_eq!(logout.untagged, vec!["* BYE bye".to_string()]);
        assert_eq!(session.state(), SessionState::LoggedOut);

        session.close().await;
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_authenticate_rejected() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(&auth_line("A0001"))
            .read(b"A0001 NO AUTHENTICATE failed\r\n")
            .build();
        let mut session = Session::from_stream(mock, &config());
        session.read_banner().await.unwrap();

        let outcome = session.authenticate(&credential()).await.unwrap();
        assert_eq!(
            outcome,
            AuthOutcome::Rejected(Rejection {
                status: Status::No,
                message: "AUTHENTICATE failed".to_string(),
                detail: None,
            })
        );
        assert_eq!(session.state(), SessionState::AuthFailed);

        let err = session
            .status("INBOX", &[StatusAttribute::Unseen])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_authenticate_error_challenge() {
        // base64 of {"status":"400","schemes":"Bearer"}
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(&auth_line("A0001"))
            .read(b"+ eyJzdGF0dXMiOiI0MDAiLCJzY2hlbWVzIjoiQmVhcmVyIn0=\r\n")
            .write(b"\r\n")
            .read(b"A0001 NO [AUTHENTICATIONFAILED] Invalid credentials\r\n")
            .build();
        let mut session = Session::from_stream(mock, &config());
        session.read_banner().await.unwrap();

        let AuthOutcome::Rejected(rejection) = session.authenticate(&credential()).await.unwrap()
        else {
            panic!("expected rejection");
        };
        assert_eq!(rejection.message, "[AUTHENTICATIONFAILED] Invalid credentials");
        assert_eq!(rejection.detail.unwrap().status, "400");
    }

    #[tokio::test]
    async fn test_authenticate_bad_is_rejection() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(&auth_line("A0001"))
            .read(b"A0001 BAD Command Argument Error. 12\r\n")
            .build();
        let mut session = Session::from_stream(mock, &config());
        session.read_banner().await.unwrap();

        let outcome = session.authenticate(&credential()).await.unwrap();
        assert!(matches!(
            outcome,
            AuthOutcome::Rejected(Rejection { status: Status::Bad, .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_credential_before_io() {
        // The mock has no write scripted; any write would panic.
        let mock = Builder::new().read(b"* OK ready\r\n").build();
        let mut session = Session::from_stream(mock, &config());
        session.read_banner().await.unwrap();

        let empty = Credential::new("user@example.com", Token::bearer(""));
        let err = session.authenticate(&empty).await.unwrap_err();
        assert!(matches!(err, Error::InvalidCredential(_)));
        assert_eq!(session.state(), SessionState::Connected);
    }

    #[tokio::test]
    async fn test_banner_eof_is_transport_error() {
        let mock = Builder::new().build();
        let mut session = Session::from_stream(mock, &config());

        let err = session.read_banner().await.unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed));
        assert!(err.is_transport());
        assert_eq!(session.state(), SessionState::Failed);

        session.close().await;
        session.close().await;
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_foreign_tag_is_malformed() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"A0001 CAPABILITY\r\n")
            .read(b"B0007 OK not yours\r\n")
            .build();
        let mut session = Session::from_stream(mock, &config());
        session.read_banner().await.unwrap();

        let err = session.capability().await.unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
        assert_eq!(session.state(), SessionState::Failed);
    }

    #[tokio::test]
    async fn test_unexpected_continuation_is_malformed() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"A0001 CAPABILITY\r\n")
            .read(b"+ go ahead\r\n")
            .build();
        let mut session = Session::from_stream(mock, &config());
        session.read_banner().await.unwrap();

        assert!(matches!(
            session.capability().await,
            Err(Error::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_commands_after_close() {
        let mock = Builder::new().read(b"* OK ready\r\n").build();
        let mut session = Session::from_stream(mock, &config());
        session.read_banner().await.unwrap();
        session.close().await;

        assert!(matches!(session.logout().await, Err(Error::InvalidState(_))));
        assert!(matches!(session.noop().await, Err(Error::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_capability_before_banner() {
        let mock = Builder::new().build();
        let mut session = Session::from_stream(mock, &config());

        assert!(matches!(
            session.capability().await,
            Err(Error::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_status_no_is_error() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(&auth_line("A0001"))
            .read(b"A0001 OK done\r\n")
            .write(b"A0002 STATUS INBOX (UNSEEN)\r\n")
            .read(b"A0002 NO mailbox unavailable\r\n")
            .build();
        let mut session = Session::from_stream(mock, &config());
        session.read_banner().await.unwrap();
        session.authenticate(&credential()).await.unwrap();

        let err = session
            .status("INBOX", &[StatusAttribute::Unseen])
            .await
            .unwrap_err();
        assert!(err.is_rejection());
        assert_eq!(session.state(), SessionState::CommandExchange);
    }

    #[tokio::test]
    async fn test_custom_tag_prefix() {
        let config = Config::builder("imap.example.com").tag_prefix('$').build().unwrap();
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"$0001 NOOP\r\n")
            .read(b"$0001 OK NOOP completed\r\n")
            .build();
        let mut session = Session::from_stream(mock, &config);
        session.read_banner().await.unwrap();

        session.noop().await.unwrap();
    }

    #[tokio::test]
    async fn test_status_before_authenticate() {
        let mock = Builder::new().read(b"* OK ready\r\n").build();
        let mut session = Session::from_stream(mock, &config());
        session.read_banner().await.unwrap();

        assert!(matches!(
            session.status("INBOX", &[StatusAttribute::Unseen]).await,
            Err(Error::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_repeated_challenge_is_malformed() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(&auth_line("A0001"))
            .read(b"+ e30=\r\n")
            .write(b"\r\n")
            .read(b"+ e30=\r\n")
            .build();
        let mut session = Session::from_stream(mock, &config());
        session.read_banner().await.unwrap();

        let err = session.authenticate(&credential()).await.unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
        assert_eq!(session.state(), SessionState::Failed);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mock = Builder::new().read(b"* OK ready\r\n").build();
        let mut session = Session::from_stream(mock, &config());
        session.read_banner().await.unwrap();

        session.close().await;
        session.close().await;
        assert_eq!(session.state(), SessionState::Closed);
    }
}
