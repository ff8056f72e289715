//! Core IMAP types.

mod capability;
mod mailbox;

pub use capability::{Capabilities, Status};
pub use mailbox::MailboxStatus;
