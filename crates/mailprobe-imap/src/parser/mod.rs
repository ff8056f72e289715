//! Response line classification.
//!
//! Every line a server sends is one of three kinds: untagged data (`* ...`),
//! a continuation request (`+ ...`), or the tagged completion of a command
//! (`<tag> OK|NO|BAD <text>`). Parsing is sans-I/O and works on one line with
//! its terminator already removed.

use crate::types::Status;
use crate::{Error, Result};

/// A single classified server line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseLine {
    /// Untagged line, kept verbatim (including the leading `*`).
    Untagged(String),
    /// Continuation request; holds the text after `+`.
    Continuation(String),
    /// Tagged completion.
    Tagged {
        /// Tag of the completed command.
        tag: String,
        /// Completion status.
        status: Status,
        /// Human-readable text (including any `[CODE]`).
        text: String,
    },
}

impl ResponseLine {
    /// Classifies a line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedResponse`] for empty lines and tagged lines
    /// without an `OK`/`NO`/`BAD` outcome word.
    pub fn parse(line: &str) -> Result<Self> {
        if line == "*" || line.starts_with("* ") {
            return Ok(Self::Untagged(line.to_string()));
        }

        if let Some(rest) = line.strip_prefix('+') {
            return Ok(Self::Continuation(rest.trim_start().to_string()));
        }

        let (tag, rest) = line
            .split_once(' ')
            .ok_or_else(|| Error::MalformedResponse(format!("unclassifiable line: {line:?}")))?;
        if tag.is_empty() {
            return Err(Error::MalformedResponse(format!("empty tag: {line:?}")));
        }

        let (word, text) = rest.split_once(' ').unwrap_or((rest, ""));
        let status = Status::parse(word).ok_or_else(|| {
            Error::MalformedResponse(format!("tagged line without outcome: {line:?}"))
        })?;

        Ok(Self::Tagged {
            tag: tag.to_string(),
            status,
            text: text.to_string(),
        })
    }

    /// Returns true if this is the tagged completion for `tag`.
    #[must_use]
    pub fn completes(&self, tag: &str) -> bool {
        matches!(self, Self::Tagged { tag: t, .. } if t == tag)
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
    use proptest::prelude::*;

    #[test]
    fn test_untagged() {
        assert_eq!(
            ResponseLine::parse("* OK banner").unwrap(),
            ResponseLine::Untagged("* OK banner".to_string())
        );
        assert_eq!(
            ResponseLine::parse("* STATUS INBOX (UNSEEN 3)").unwrap(),
            ResponseLine::Untagged("* STATUS INBOX (UNSEEN 3)".to_string())
        );
    }

    #[test]
    fn test_continuation() {
        assert_eq!(
            ResponseLine::parse("+ eyJzdGF0dXMiOiI0MDAifQ==").unwrap(),
            ResponseLine::Continuation("eyJzdGF0dXMiOiI0MDAifQ==".to_string())
        );
        assert_eq!(
            ResponseLine::parse("+").unwrap(),
            ResponseLine::Continuation(String::new())
        );
    }

    #[test]
    fn test_tagged_ok() {
        let line = ResponseLine::parse("A0001 OK CAPABILITY completed").unwrap();
        assert_eq!(
            line,
            ResponseLine::Tagged {
                tag: "A0001".to_string(),
                status: Status::Ok,
                text: "CAPABILITY completed".to_string(),
            }
        );
        assert!(line.completes("A0001"));
        assert!(!line.completes("A0002"));
    }

    #[test]
    fn test_tagged_no_with_code() {
        let line = ResponseLine::parse("$ NO [AUTHENTICATIONFAILED] AUTHENTICATE failed").unwrap();
        assert_eq!(
            line,
            ResponseLine::Tagged {
                tag: "$".to_string(),
                status: Status::No,
                text: "[AUTHENTICATIONFAILED] AUTHENTICATE failed".to_string(),
            }
        );
    }

    #[test]
    fn test_tagged_without_text() {
        let line = ResponseLine::parse("A7 BAD").unwrap();
        assert!(matches!(
            line,
            ResponseLine::Tagged { status: Status::Bad, ref text, .. } if text.is_empty()
        ));
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(ResponseLine::parse(""), Err(Error::MalformedResponse(_))));
        assert!(matches!(ResponseLine::parse("garbage"), Err(Error::MalformedResponse(_))));
        assert!(matches!(ResponseLine::parse(" OK x"), Err(Error::MalformedResponse(_))));
        assert!(matches!(
            ResponseLine::parse("A0001 MAYBE done"),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_prefix_tag_does_not_complete() {
        // "A1" must not match a line tagged "A10".
        let line = ResponseLine::parse("A10 OK done").unwrap();
        assert!(!line.completes("A1"));
    }

    proptest! {
        #[test]
        fn prop_tagged_line_matches_its_tag(tag in "[A-Za-z0-9$.]{1,8}", text in "[ -~]{0,40}") {
            let line = format!("{tag} NO {text}");
            let parsed = ResponseLine::parse(&line).unwrap();
            prop_assert!(parsed.completes(&tag));
            prop_assert_eq!(parsed, ResponseLine::Tagged { tag: tag.clone(), status: Status::No, text });
        }
    }
}
