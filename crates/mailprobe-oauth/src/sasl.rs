//! SASL XOAUTH2 mechanism.
//!
//! XOAUTH2 is the Google/Microsoft `OAuth2` mechanism for IMAP and SMTP. The
//! client sends a single base64 initial response; on failure the server
//! answers with a continuation carrying a base64 JSON error document, which
//! the client acknowledges with an empty line before the tagged `NO` arrives.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;

use crate::error::{Error, Result};

/// SASL mechanism name sent with `AUTHENTICATE`.
pub const XOAUTH2: &str = "XOAUTH2";

/// Generates the XOAUTH2 initial response.
///
/// Format: `user=<mailbox>\x01auth=Bearer <token>\x01\x01` (base64 encoded,
/// standard alphabet with padding, no trailing newline)
///
/// # Errors
///
/// Returns [`Error::InvalidCredential`] if `mailbox` or `bearer_token` is empty.
///
/// # Example
///
/// ```
/// use mailprobe_oauth::sasl::xoauth2_response;
///
/// let response = xoauth2_response("user@example.com", "ya29.a0...").unwrap();
/// // Send: <tag> AUTHENTICATE XOAUTH2 {response}
/// ```
pub fn xoauth2_response(mailbox: &str, bearer_token: &str) -> Result<String> {
    check_inputs(mailbox, bearer_token)?;

    let auth_string = format!("user={mailbox}\x01auth=Bearer {bearer_token}\x01\x01");
    Ok(STANDARD.encode(auth_string.as_bytes()))
}

pub(crate) fn check_inputs(mailbox: &str, bearer_token: &str) -> Result<()> {
    if mailbox.is_empty() {
        return Err(Error::InvalidCredential("mailbox is empty"));
    }
    if bearer_token.is_empty() {
        return Err(Error::InvalidCredential("bearer token is empty"));
    }
    Ok(())
}

/// Decodes the base64 payload of an XOAUTH2 failure challenge.
///
/// # Errors
///
/// Returns an error if the payload is not base64 or not the expected JSON.
pub fn decode_challenge(challenge: &str) -> Result<OAuthError> {
    let raw = STANDARD.decode(challenge.trim())?;
    Ok(serde_json::from_slice(&raw)?)
}

/// Parses an `OAuth2` error response from the server.
///
/// `OAuth2` errors are JSON-encoded: `{"status":"401", "schemes":"bearer", "scope":"..."}`
///
/// # Errors
///
/// Returns an error if the response cannot be parsed.
pub fn parse_oauth_error(response: &str) -> Result<OAuthError> {
    Ok(serde_json::from_str(response)?)
}

/// `OAuth2` error detail sent by the server in a failure challenge.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OAuthError {
    /// HTTP-style status code.
    pub status: String,
    /// Authentication schemes supported.
    #[serde(default)]
    pub schemes: Option<String>,
    /// `OAuth2` scope required.
    #[serde(default)]
    pub scope: Option<String>,
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
    use proptest::prelude::*;

    fn decode(response: &str) -> Vec<u8> {
        STANDARD.decode(response).unwrap()
    }

    #[test]
    fn test_xoauth2_format() {
        let response = xoauth2_response("test@test.com", "abc").unwrap();
        let decoded_str = String::from_utf8(decode(&response)).unwrap();

        assert_eq!(decoded_str, "user=test@test.com\x01auth=Bearer abc\x01\x01");
    }

    #[test]
    fn test_xoauth2_known_vector() {
        // Vector from the published XOAUTH2 protocol description.
        let response = xoauth2_response(
            "someuser@example.com",
            "ya29.vF9dft4qmTc2Nvb3RlckBhdHRhdmlzdGEuY29tCg",
        )
        .unwrap();
        assert_eq!(
            response,
            "dXNlcj1zb21ldXNlckBleGFtcGxlLmNvbQFhdXRoPUJlYXJlciB5YTI5LnZGOWRmdDRxbVRjMk52YjNSbGNrQmhkSFJoZG1semRHRXVZMjl0Q2cBAQ=="
        );
    }

    #[test]
    fn test_xoauth2_no_newline() {
        let response = xoauth2_response("user@example.com", "token").unwrap();
        assert!(!response.contains('\n'));
        assert!(!decode(&response).contains(&b'\n'));
    }

    #[test]
    fn test_xoauth2_control_bytes() {
        let response = xoauth2_response("a", "b").unwrap();
        let decoded = decode(&response);
        assert_eq!(decoded.iter().filter(|&&b| b == 0x01).count(), 3);
        assert!(decoded.ends_with(&[0x01, 0x01]));
    }

    #[test]
    fn test_xoauth2_special_chars() {
        let response = xoauth2_response("first last=x@example.com", "tok en=").unwrap();
        assert_eq!(
            decode(&response),
            "user=first last=x@example.com\x01auth=Bearer tok en=\x01\x01".as_bytes()
        );
    }

    #[test]
    fn test_xoauth2_utf8() {
        let response = xoauth2_response("jörg@exämple.de", "tøken").unwrap();
        assert_eq!(
            decode(&response),
            "user=jörg@exämple.de\x01auth=Bearer tøken\x01\x01".as_bytes()
        );
    }

    #[test]
    fn test_xoauth2_empty_mailbox() {
        let err = xoauth2_response("", "token").unwrap_err();
        assert!(matches!(err, Error::InvalidCredential(_)));
    }

    #[test]
    fn test_xoauth2_empty_token() {
        let err = xoauth2_response("user@example.com", "").unwrap_err();
        assert!(matches!(err, Error::InvalidCredential(_)));
    }

    #[test]
    fn test_parse_oauth_error() {
        let json = r#"{"status":"401","schemes":"bearer","scope":"https://mail.google.com/"}"#;
        let error = parse_oauth_error(json).unwrap();

        assert_eq!(error.status, "401");
        assert_eq!(error.schemes.as_deref(), Some("bearer"));
        assert_eq!(error.scope.as_deref(), Some("https://mail.google.com/"));
    }

    #[test]
    fn test_decode_challenge() {
        let challenge = STANDARD.encode(r#"{"status":"400","schemes":"Bearer"}"#);
        let error = decode_challenge(&challenge).unwrap();

        assert_eq!(error.status, "400");
        assert!(error.scope.is_none());
    }

    #[test]
    fn test_decode_challenge_garbage() {
        assert!(matches!(decode_challenge("!!!"), Err(Error::Base64(_))));
        let not_json = STANDARD.encode("nope");
        assert!(matches!(decode_challenge(&not_json), Err(Error::Json(_))));
    }

    proptest! {
        #[test]
        fn prop_xoauth2_layout(mailbox in ".+", token in ".+") {
            let response = xoauth2_response(&mailbox, &token).unwrap();
            let expected = format!("user={mailbox}\x01auth=Bearer {token}\x01\x01");
            prop_assert_eq!(decode(&response), expected.into_bytes());
        }

        #[test]
        fn prop_xoauth2_rejects_empty(value in ".*") {
            prop_assert!(xoauth2_response("", &value).is_err());
            prop_assert!(xoauth2_response(&value, "").is_err());
        }
    }
}
