//! Command argument types.

/// STATUS data items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusAttribute {
    /// Number of messages.
    Messages,
    /// Number of recent messages.
    Recent,
    /// Next UID.
    UidNext,
    /// UIDVALIDITY.
    UidValidity,
    /// Number of unseen messages.
    Unseen,
}

impl StatusAttribute {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Messages => "MESSAGES",
            Self::Recent => "RECENT",
            Self::UidNext => "UIDNEXT",
            Self::UidValidity => "UIDVALIDITY",
            Self::Unseen => "UNSEEN",
        }
    }

    /// Parses a STATUS item name, ignoring ASCII case.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        [
            Self::Messages,
            Self::Recent,
            Self::UidNext,
            Self::UidValidity,
            Self::Unseen,
        ]
        .into_iter()
        .find(|item| item.as_str().eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_attribute() {
        assert_eq!(StatusAttribute::parse("UNSEEN"), Some(StatusAttribute::Unseen));
        assert_eq!(StatusAttribute::parse("unseen"), Some(StatusAttribute::Unseen));
        assert_eq!(StatusAttribute::parse("UIDNEXT"), Some(StatusAttribute::UidNext));
        assert_eq!(StatusAttribute::parse("HIGHESTMODSEQ"), None);
    }
}
