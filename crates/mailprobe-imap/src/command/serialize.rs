//! Command serialization helpers.

use super::types::StatusAttribute;

/// Writes an astring (atom or quoted string).
pub fn write_astring(buf: &mut Vec<u8>, s: &str) {
    if s.is_empty() || s.bytes().any(needs_quoting) {
        buf.push(b'"');
        for b in s.bytes() {
            if b == b'"' || b == b'\\' {
                buf.push(b'\\');
            }
            buf.push(b);
        }
        buf.push(b'"');
    } else {
        buf.extend_from_slice(s.as_bytes());
    }
}

/// Writes a parenthesized STATUS item list.
pub fn write_status_items(buf: &mut Vec<u8>, items: &[StatusAttribute]) {
    buf.push(b'(');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            buf.push(b' ');
        }
        buf.extend_from_slice(item.as_str().as_bytes());
    }
    buf.push(b')');
}

/// Returns true if the byte needs quoting.
const fn needs_quoting(b: u8) -> bool {
    matches!(b, b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*') || b < 0x20 || b == 0x7F
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn astring(s: &str) -> String {
        let mut buf = Vec::new();
        write_astring(&mut buf, s);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_astring_atom() {
        assert_eq!(astring("INBOX"), "INBOX");
        assert_eq!(astring("Archive/2024"), "Archive/2024");
    }

    #[test]
    fn test_astring_quoted() {
        assert_eq!(astring(""), "\"\"");
        assert_eq!(astring("Sent Items"), "\"Sent Items\"");
        assert_eq!(astring("a\"b\\c"), "\"a\\\"b\\\\c\"");
    }

    #[test]
    fn test_status_items() {
        let mut buf = Vec::new();
        write_status_items(&mut buf, &[StatusAttribute::Unseen]);
        assert_eq!(buf, b"(UNSEEN)");

        buf.clear();
        write_status_items(
            &mut buf,
            &[StatusAttribute::Messages, StatusAttribute::UidNext],
        );
        assert_eq!(buf, b"(MESSAGES UIDNEXT)");
    }
}
