//! IMAP command builder.
//!
//! Only the commands a single XOAUTH2 probe session needs are modelled.

mod serialize;
mod tag_generator;
mod types;

pub use tag_generator::{TagGenerator, is_tag_char};
pub use types::StatusAttribute;

use serialize::{write_astring, write_status_items};

/// IMAP command.
#[derive(Clone, PartialEq, Eq)]
pub enum Command {
    /// CAPABILITY command.
    Capability,
    /// NOOP command.
    Noop,
    /// LOGOUT command.
    Logout,
    /// AUTHENTICATE command.
    Authenticate {
        /// Authentication mechanism.
        mechanism: String,
        /// Initial response (optional).
        initial_response: Option<String>,
    },
    /// STATUS command.
    Status {
        /// Mailbox name.
        mailbox: String,
        /// Status items to request.
        items: Vec<StatusAttribute>,
    },
}

impl Command {
    /// Returns the command verb, safe to log.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Capability => "CAPABILITY",
            Self::Noop => "NOOP",
            Self::Logout => "LOGOUT",
            Self::Authenticate { .. } => "AUTHENTICATE",
            Self::Status { .. } => "STATUS",
        }
    }

    /// Serializes the command to bytes with the given tag, CRLF-terminated.
    #[must_use]
    pub fn serialize(&self, tag: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(tag.as_bytes());
        buf.push(b' ');

        match self {
            Self::Capability => buf.extend_from_slice(b"CAPABILITY"),
            Self::Noop => buf.extend_from_slice(b"NOOP"),
            Self::Logout => buf.extend_from_slice(b"LOGOUT"),

            Self::Authenticate {
                mechanism,
                initial_response,
            } => {
                buf.extend_from_slice(b"AUTHENTICATE ");
                buf.extend_from_slice(mechanism.as_bytes());
                if let Some(resp) = initial_response {
                    buf.push(b' ');
                    buf.extend_from_slice(resp.as_bytes());
                }
            }

            Self::Status { mailbox, items } => {
                buf.extend_from_slice(b"STATUS ");
                write_astring(&mut buf, mailbox);
                buf.push(b' ');
                write_status_items(&mut buf, items);
            }
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }
}

// AUTHENTICATE carries the bearer token; keep it out of debug output.
impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Authenticate { mechanism, .. } => f
                .debug_struct("Authenticate")
                .field("mechanism", mechanism)
                .finish_non_exhaustive(),
            Self::Status { mailbox, items } => f
                .debug_struct("Status")
                .field("mailbox", mailbox)
                .field("items", items)
                .finish(),
            other => f.write_str(other.name()),
        }
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
    use super::*;

    #[test]
    fn test_capability_command() {
        let cmd = Command::Capability.serialize("A0001");
        assert_eq!(cmd, b"A0001 CAPABILITY\r\n");
    }

    #[test]
    fn test_logout_command() {
        assert_eq!(Command::Logout.serialize("A0004"), b"A0004 LOGOUT\r\n");
        assert_eq!(Command::Noop.serialize("$"), b"$ NOOP\r\n");
    }

    #[test]
    fn test_authenticate_command() {
        let cmd = Command::Authenticate {
            mechanism: "XOAUTH2".to_string(),
            initial_response: Some("dXNlcj0=".to_string()),
        };
        assert_eq!(
            cmd.serialize("A0002"),
            b"A0002 AUTHENTICATE XOAUTH2 dXNlcj0=\r\n"
        );
    }

    #[test]
    fn test_authenticate_without_initial_response() {
        let cmd = Command::Authenticate {
            mechanism: "XOAUTH2".to_string(),
            initial_response: None,
        };
        assert_eq!(cmd.serialize("A1"), b"A1 AUTHENTICATE XOAUTH2\r\n");
    }

    #[test]
    fn test_status_command() {
        let cmd = Command::Status {
            mailbox: "INBOX".to_string(),
            items: vec![StatusAttribute::Unseen],
        };
        assert_eq!(cmd.serialize("A0003"), b"A0003 STATUS INBOX (UNSEEN)\r\n");
    }

    #[test]
    fn test_status_command_quoted_mailbox() {
        let cmd = Command::Status {
            mailbox: "Sent Items".to_string(),
            items: vec![StatusAttribute::Messages, StatusAttribute::Unseen],
        };
        assert_eq!(
            cmd.serialize("A0003"),
            b"A0003 STATUS \"Sent Items\" (MESSAGES UNSEEN)\r\n"
        );
    }

    #[test]
    fn test_debug_hides_initial_response() {
        let cmd = Command::Authenticate {
            mechanism: "XOAUTH2".to_string(),
            initial_response: Some("c2VjcmV0".to_string()),
        };
        let debug = format!("{cmd:?}");
        assert!(debug.contains("XOAUTH2"));
        assert!(!debug.contains("c2VjcmV0"));
        assert_eq!(format!("{:?}", Command::Logout), "LOGOUT");
    }
}
