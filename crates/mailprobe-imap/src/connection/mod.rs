//! IMAP connection management.
//!
//! This module provides connection handling for IMAP servers, including:
//! - Configuration (host, port, deadlines)
//! - Implicit-TLS stream setup
//! - Framed line I/O and per-command response accumulation
//! - The tagged session state machine

mod config;
mod framed;
mod session;
mod state;
mod stream;

pub use config::{Config, ConfigBuilder, DEFAULT_HOST, DEFAULT_PORT};
pub use framed::{CommandResponse, FramedStream, Progress, ResponseAccumulator};
pub use session::{AuthOutcome, Rejection, Session};
pub use state::SessionState;
pub use stream::{ImapStream, connect_tls, create_tls_connector};
