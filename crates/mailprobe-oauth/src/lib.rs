//! # mailprobe-oauth
//!
//! `OAuth2` credential types and SASL encoding for email protocols.
//!
//! Token acquisition lives outside this crate. Callers hand over an access
//! token they already hold; this crate turns it into the XOAUTH2 initial
//! response an IMAP session sends with `AUTHENTICATE`.
//!
//! ## Using with IMAP
//!
//! ```
//! use mailprobe_oauth::{Credential, Token};
//!
//! let credential = Credential::new("user@example.com", Token::bearer("eyJ0eXAi..."));
//! let auth_string = credential.xoauth2().unwrap();
//! // Send: <tag> AUTHENTICATE XOAUTH2 {auth_string}
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod sasl;
pub mod token;

pub use error::{Error, Result};
pub use sasl::OAuthError;
pub use token::{Credential, Token};
