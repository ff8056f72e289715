//! Server capabilities and response status.

use std::fmt;

/// Completion status of a tagged response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command completed successfully.
    Ok,
    /// Command failed (operational error).
    No,
    /// Command failed (protocol/syntax error).
    Bad,
}

impl Status {
    /// Parses an outcome word, ignoring ASCII case.
    #[must_use]
    pub fn parse(word: &str) -> Option<Self> {
        if word.eq_ignore_ascii_case("OK") {
            Some(Self::Ok)
        } else if word.eq_ignore_ascii_case("NO") {
            Some(Self::No)
        } else if word.eq_ignore_ascii_case("BAD") {
            Some(Self::Bad)
        } else {
            None
        }
    }

    /// Returns true if this is a successful status.
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Returns the wire form of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::No => "NO",
            Self::Bad => "BAD",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capabilities advertised by the server.
///
/// Kept for callers that want to inspect them; the session itself never
/// refuses to authenticate based on this list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities(Vec<String>);

impl Capabilities {
    /// Collects capabilities from untagged `* CAPABILITY ...` lines.
    #[must_use]
    pub fn from_untagged<S: AsRef<str>>(lines: &[S]) -> Self {
        let mut caps = Vec::new();
        for line in lines {
            let mut words = line.as_ref().split_ascii_whitespace();
            if words.next() != Some("*") {
                continue;
            }
            if !words
                .next()
                .is_some_and(|w| w.eq_ignore_ascii_case("CAPABILITY"))
            {
                continue;
            }
            caps.extend(words.map(str::to_string));
        }
        Self(caps)
    }

    /// Returns true if the capability is advertised (ASCII case-insensitive).
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.0.iter().any(|c| c.eq_ignore_ascii_case(name))
    }

    /// Returns true if `AUTH=<mechanism>` is advertised.
    #[must_use]
    pub fn supports_auth(&self, mechanism: &str) -> bool {
        self.0.iter().any(|c| {
            c.split_once('=').is_some_and(|(key, mech)| {
                key.eq_ignore_ascii_case("AUTH") && mech.eq_ignore_ascii_case(mechanism)
            })
        })
    }

    /// Returns true if `AUTH=XOAUTH2` is advertised.
    #[must_use]
    pub fn supports_xoauth2(&self) -> bool {
        self.supports_auth(mailprobe_oauth::sasl::XOAUTH2)
    }

    /// Iterates over the raw capability names.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Returns true if nothing was advertised.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(Status::parse("OK"), Some(Status::Ok));
        assert_eq!(Status::parse("no"), Some(Status::No));
        assert_eq!(Status::parse("Bad"), Some(Status::Bad));
        assert_eq!(Status::parse("BYE"), None);
        assert!(Status::Ok.is_ok());
        assert!(!Status::No.is_ok());
    }

    #[test]
    fn test_capabilities_from_untagged() {
        let caps = Capabilities::from_untagged(&[
            "* CAPABILITY IMAP4rev1 IDLE AUTH=PLAIN AUTH=XOAUTH2 SASL-IR",
            "* OK unrelated",
        ]);

        assert!(caps.has("IMAP4rev1"));
        assert!(caps.has("idle"));
        assert!(caps.supports_auth("PLAIN"));
        assert!(caps.supports_xoauth2());
        assert!(!caps.has("CAPABILITY"));
        assert_eq!(caps.iter().count(), 5);
    }

    #[test]
    fn test_capabilities_without_xoauth2() {
        let caps = Capabilities::from_untagged(&["* CAPABILITY IMAP4rev1 AUTH=PLAIN"]);
        assert!(!caps.supports_xoauth2());
        assert!(!caps.is_empty());

        let none = Capabilities::from_untagged::<&str>(&[]);
        assert!(none.is_empty());
    }
}
