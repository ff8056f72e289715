//! IMAP command tag generator.
//!
//! Tags are used to match commands with their responses.

/// Tag generator for IMAP commands.
///
/// Generates sequential tags in the format "A0001", "A0002", etc. A session
/// owns its generator, so tags are unique within that session only.
#[derive(Debug, Clone)]
pub struct TagGenerator {
    counter: u32,
    prefix: char,
}

impl TagGenerator {
    /// Creates a new tag generator with the given prefix.
    #[must_use]
    pub const fn new(prefix: char) -> Self {
        Self { counter: 0, prefix }
    }

    /// Generates the next tag.
    ///
    /// The counter wraps back to 1 after `u32::MAX`; with one outstanding
    /// command at a time a wrapped tag can never collide.
    pub fn next(&mut self) -> String {
        self.counter = self.counter.checked_add(1).unwrap_or(1);
        format!("{}{:04}", self.prefix, self.counter)
    }

}

/// Returns true if `c` may appear in a tag.
///
/// Tags are astring characters other than `+`, so they can never be mistaken
/// for an untagged (`*`) or continuation (`+`) line.
#[must_use]
pub const fn is_tag_char(c: char) -> bool {
    c.is_ascii_graphic() && !matches!(c, '+' | '*' | '(' | ')' | '{' | '%' | '"' | '\\')
}

impl Default for TagGenerator {
    fn default() -> Self {
        Self::new('A')
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
    fn test_tag_generation() {
        let mut generator = TagGenerator::default();
        assert_eq!(generator.next(), "A0001");
        assert_eq!(generator.next(), "A0002");
        assert_eq!(generator.next(), "A0003");
    }

    #[test]
    fn test_custom_prefix() {
        let mut generator = TagGenerator::new('T');
        assert_eq!(generator.next(), "T0001");
        assert_eq!(generator.next(), "T0002");
    }

    #[test]
    fn test_tag_chars() {
        assert!(is_tag_char('A'));
        assert!(is_tag_char('$'));
        assert!(is_tag_char(']'));
        assert!(!is_tag_char('+'));
        assert!(!is_tag_char('*'));
        assert!(!is_tag_char(' '));
        assert!(!is_tag_char('\n'));
    }

    #[test]
    fn test_uniqueness() {
        let mut generator = TagGenerator::default();
        let mut seen = std::collections::HashSet::new();

        for _ in 0..10000 {
            let tag = generator.next();
            assert!(seen.insert(tag), "duplicate tag generated");
        }
    }

    #[test]
    fn test_format_widens() {
        let mut generator = TagGenerator::new('X');
        for _ in 0..9999 {
            let _ = generator.next();
        }
        assert_eq!(generator.next(), "X10000");
    }

    #[test]
    fn test_wraparound() {
        let mut generator = TagGenerator::default();
        generator.counter = u32::MAX;
        assert_eq!(generator.next(), "A0001");
    }
}
