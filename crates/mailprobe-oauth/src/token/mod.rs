//! `OAuth2` token and credential types.
//!
//! Tokens are acquired elsewhere; these types only carry them to the session.
//! Nothing here refreshes or validates a token against a server.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::sasl::{check_inputs, xoauth2_response};

/// `OAuth2` access token with metadata.
#[derive(Clone, Serialize, Deserialize)]
pub struct Token {
    /// Access token string.
    pub access_token: String,
    /// Token type (usually "Bearer").
    pub token_type: String,
    /// Expiration time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Scope granted by authorization server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl Token {
    /// Creates a new bearer token.
    #[must_use]
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: "Bearer".to_string(),
            expires_at: None,
            scope: None,
        }
    }

    /// Checks if the token is expired (with 60 second buffer).
    ///
    /// Informational only: sessions send whatever token they are given.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|exp| Utc::now() + Duration::seconds(60) >= exp)
    }

    /// Sets the expiration time.
    #[must_use]
    pub const fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Identity plus token handed to an IMAP session.
#[derive(Debug, Clone)]
pub struct Credential {
    principal: String,
    token: Token,
    mailbox_override: Option<String>,
}

impl Credential {
    /// Creates a credential for the token's own principal.
    #[must_use]
    pub fn new(principal: impl Into<String>, token: Token) -> Self {
        Self {
            principal: principal.into(),
            token,
            mailbox_override: None,
        }
    }

    /// Authenticates as a different mailbox (e.g. a shared mailbox).
    ///
    /// An empty mailbox leaves the principal in place.
    #[must_use]
    pub fn with_mailbox(mut self, mailbox: impl Into<String>) -> Self {
        let mailbox = mailbox.into();
        self.mailbox_override = (!mailbox.is_empty()).then_some(mailbox);
        self
    }

    /// Returns the principal the token was issued to.
    #[must_use]
    pub fn principal(&self) -> &str {
        &self.principal
    }

    /// Returns the mailbox to authenticate as.
    #[must_use]
    pub fn mailbox(&self) -> &str {
        self.mailbox_override.as_deref().unwrap_or(&self.principal)
    }

    /// Returns the token.
    #[must_use]
    pub const fn token(&self) -> &Token {
        &self.token
    }

    /// Checks that the credential can be encoded, without encoding it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidCredential`] if the mailbox or token is empty.
    pub fn validate(&self) -> Result<()> {
        check_inputs(self.mailbox(), &self.token.access_token)
    }

    /// Encodes the XOAUTH2 initial response for this credential.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidCredential`] if the mailbox or token is empty.
    pub fn xoauth2(&self) -> Result<String> {
        xoauth2_response(self.mailbox(), &self.token.access_token)
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
    use crate::Error;

    #[test]
    fn test_token_creation() {
        let token = Token::bearer("access123");
        assert_eq!(token.access_token, "access123");
        assert_eq!(token.token_type, "Bearer");
        assert!(token.expires_at.is_none());
        assert!(!token.is_expired());
    }

    #[test]
    fn test_token_expiration() {
        let expired = Token::bearer("access123").with_expires_at(Utc::now() - Duration::seconds(120));
        assert!(expired.is_expired());

        let valid = Token::bearer("access123").with_expires_at(Utc::now() + Duration::seconds(3600));
        assert!(!valid.is_expired());
    }

    #[test]
    fn test_token_debug_redacts() {
        let token = Token::bearer("super-secret");
        let credential = Credential::new("user@example.com", token.clone());

        assert!(!format!("{token:?}").contains("super-secret"));
        assert!(!format!("{credential:?}").contains("super-secret"));
    }

    #[test]
    fn test_credential_mailbox_defaults_to_principal() {
        let credential = Credential::new("user@example.com", Token::bearer("t"));
        assert_eq!(credential.mailbox(), "user@example.com");
        assert_eq!(credential.principal(), "user@example.com");
    }

    #[test]
    fn test_credential_mailbox_override() {
        let credential =
            Credential::new("user@example.com", Token::bearer("t")).with_mailbox("shared@example.com");
        assert_eq!(credential.mailbox(), "shared@example.com");
        assert_eq!(credential.principal(), "user@example.com");

        let expected = xoauth2_response("shared@example.com", "t").unwrap();
        assert_eq!(credential.xoauth2().unwrap(), expected);
    }

    #[test]
    fn test_credential_empty_override_falls_back() {
        let credential =
            Credential::new("user@example.com", Token::bearer("t")).with_mailbox("");
        assert_eq!(credential.mailbox(), "user@example.com");

        let expected = xoauth2_response("user@example.com", "t").unwrap();
        assert_eq!(credential.xoauth2().unwrap(), expected);
    }

    #[test]
    fn test_credential_validate() {
        assert!(Credential::new("user@example.com", Token::bearer("t")).validate().is_ok());
        assert!(matches!(
            Credential::new("", Token::bearer("t")).validate(),
            Err(Error::InvalidCredential("mailbox is empty"))
        ));
        assert!(matches!(
            Credential::new("user@example.com", Token::bearer("")).validate(),
            Err(Error::InvalidCredential("bearer token is empty"))
        ));
    }

    #[test]
    fn test_credential_empty_values() {
        let no_principal = Credential::new("", Token::bearer("t"));
        assert!(matches!(no_principal.xoauth2(), Err(Error::InvalidCredential(_))));

        let no_token = Credential::new("user@example.com", Token::bearer(""));
        assert!(matches!(no_token.xoauth2(), Err(Error::InvalidCredential(_))));
    }
}
