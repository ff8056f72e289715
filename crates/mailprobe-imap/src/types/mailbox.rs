//! Mailbox STATUS data.

use crate::command::StatusAttribute;

/// Parsed `* STATUS <mailbox> (<item> <n> ...)` response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailboxStatus {
    /// Mailbox name as sent by the server.
    pub mailbox: String,
    /// Number of messages.
    pub messages: Option<u32>,
    /// Number of recent messages.
    pub recent: Option<u32>,
    /// Next UID.
    pub uid_next: Option<u32>,
    /// UIDVALIDITY.
    pub uid_validity: Option<u32>,
    /// Number of unseen messages.
    pub unseen: Option<u32>,
}

impl MailboxStatus {
    /// Parses one untagged STATUS line.
    ///
    /// Returns `None` for any other line. Unknown items are skipped.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let rest = line.strip_prefix("* ")?.trim_end();
        let (verb, rest) = rest.split_once(' ')?;
        if !verb.eq_ignore_ascii_case("STATUS") {
            return None;
        }

        let (mailbox, rest) = split_mailbox(rest.trim_start())?;
        let items = rest
            .trim()
            .strip_prefix('(')?
            .strip_suffix(')')?;

        let mut status = Self {
            mailbox,
            ..Self::default()
        };

        let mut words = items.split_ascii_whitespace();
        while let (Some(name), Some(value)) = (words.next(), words.next()) {
            let Ok(value) = value.parse::<u32>() else {
                continue;
            };
            match StatusAttribute::parse(name) {
                Some(StatusAttribute::Messages) => status.messages = Some(value),
                Some(StatusAttribute::Recent) => status.recent = Some(value),
                Some(StatusAttribute::UidNext) => status.uid_next = Some(value),
                Some(StatusAttribute::UidValidity) => status.uid_validity = Some(value),
                Some(StatusAttribute::Unseen) => status.unseen = Some(value),
                None => {}
            }
        }

        Some(status)
    }
}

/// Splits a leading atom or quoted mailbox name from the rest of the line.
fn split_mailbox(s: &str) -> Option<(String, &str)> {
    let Some(quoted) = s.strip_prefix('"') else {
        let (name, rest) = s.split_once(' ')?;
        return Some((name.to_string(), rest));
    };

    let mut name = String::new();
    let mut chars = quoted.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => name.push(chars.next()?.1),
            '"' => return Some((name, &quoted[i + 1..])),
            _ => name.push(c),
        }
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_unseen() {
        let status = MailboxStatus::parse("* STATUS INBOX (UNSEEN 3)").unwrap();
        assert_eq!(status.mailbox, "INBOX");
        assert_eq!(status.unseen, Some(3));
        assert_eq!(status.messages, None);
    }

    #[test]
    fn test_parse_multiple_items() {
        let status =
            MailboxStatus::parse("* STATUS INBOX (MESSAGES 231 UIDNEXT 44292 UNSEEN 0)").unwrap();
        assert_eq!(status.messages, Some(231));
        assert_eq!(status.uid_next, Some(44292));
        assert_eq!(status.unseen, Some(0));
    }

    #[test]
    fn test_parse_quoted_mailbox() {
        let status = MailboxStatus::parse("* STATUS \"Sent \\\"Items\\\"\" (unseen 7)").unwrap();
        assert_eq!(status.mailbox, "Sent \"Items\"");
        assert_eq!(status.unseen, Some(7));
    }

    #[test]
    fn test_parse_lowercase_verb() {
        let status = MailboxStatus::parse("* status INBOX (UNSEEN 12)").unwrap();
        assert_eq!(status.unseen, Some(12));
    }

    #[test]
    fn test_parse_skips_unknown_items() {
        let status = MailboxStatus::parse("* STATUS INBOX (HIGHESTMODSEQ 99 UNSEEN 1)").unwrap();
        assert_eq!(status.unseen, Some(1));
    }

    #[test]
    fn test_parse_rejects_other_lines() {
        assert!(MailboxStatus::parse("* OK still here").is_none());
        assert!(MailboxStatus::parse("A0003 OK STATUS completed").is_none());
        assert!(MailboxStatus::parse("* STATUS INBOX UNSEEN 3").is_none());
        assert!(MailboxStatus::parse("* STATUS \"INBOX (UNSEEN 3)").is_none());
    }
}
