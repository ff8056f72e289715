//! # mailprobe-imap
//!
//! A minimal IMAP session that authenticates with an `OAuth2` access token
//! (SASL XOAUTH2) over implicit TLS and reads the INBOX unseen count.
//!
//! ## Features
//!
//! - **Implicit TLS via rustls**: certificate verified against the host,
//!   no OpenSSL dependency
//! - **Line-buffered framing**: replies split across TCP segments are
//!   reassembled before classification
//! - **Explicit tag correlation**: every command's completion is matched
//!   against the exact tag it was sent with
//! - **Rejection vs. fault**: NO/BAD are outcomes, transport failures are
//!   errors; callers branch on kinds, not strings
//! - **Deadlines**: connect and per-I/O timeouts
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailprobe_imap::{AuthResult, Config, check_inbox};
//! use mailprobe_oauth::{Credential, Token};
//!
//! #[tokio::main]
//! async fn main() -> mailprobe_imap::Result<()> {
//!     let config = Config::default(); // outlook.office365.com:993
//!     let credential = Credential::new("user@example.com", Token::bearer(access_token));
//!
//!     let report = check_inbox(&config, &credential).await?;
//!     match report.auth {
//!         AuthResult::Authenticated => println!("Unseen: {:?}", report.unseen()),
//!         AuthResult::Rejected(text) => println!("Rejected: {text}"),
//!         AuthResult::TransportError(e) => println!("Failed: {e}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`command`]: IMAP commands and tag generation
//! - [`connection`]: TLS setup, framing and the session state machine
//! - [`parser`]: Response line classification
//! - [`types`]: Status words, capabilities, mailbox STATUS data

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
mod probe;
pub mod types;

pub use command::{Command, StatusAttribute, TagGenerator};
pub use connection::{
    AuthOutcome, CommandResponse, Config, ConfigBuilder, FramedStream, ImapStream, Rejection,
    ResponseAccumulator, Session, SessionState,
};
pub use error::{Error, Result};
pub use parser::ResponseLine;
pub use probe::{AuthResult, INBOX, Report, check_inbox, check_inbox_on};
pub use types::{Capabilities, MailboxStatus, Status};
