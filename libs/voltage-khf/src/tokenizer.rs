//! Field tokenizer
//!
//! KH-F fields are signed decimal integers, each terminated by `,` (the last
//! field of some firmware revisions ends with `.`). `TokenCursor` walks a
//! borrowed line and hands out one value at a time, never allocating and
//! never rewinding.

use crate::error::DecodeError;

/// Read-only position into the field text of one line
#[derive(Debug, Clone, Copy)]
pub struct TokenCursor<'a> {
    rest: &'a [u8],
}

impl<'a> TokenCursor<'a> {
    pub fn new(text: &'a [u8]) -> Self {
        Self { rest: text }
    }

    /// Unconsumed text after the last delimiter
    pub fn remaining(&self) -> &'a [u8] {
        self.rest
    }

    pub fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    /// Parse `[+-]digits` followed by `,` or `.` and step past the delimiter.
    ///
    /// Returns `None` and leaves the cursor untouched when no digits are found,
    /// the delimiter is missing, or the value overflows `i64`. Whitespace is
    /// not skipped: the shunt never pads fields, so a padded field is treated
    /// as malformed.
    pub fn try_next(&mut self) -> Option<i64> {
        let bytes = self.rest;
        let sign_len = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
        let digits = bytes[sign_len..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if digits == 0 {
            return None;
        }

        let end = sign_len + digits;
        match bytes.get(end) {
            Some(b',' | b'.') => {},
            _ => return None,
        }

        // ASCII sign + digits, always valid UTF-8
        let value = std::str::from_utf8(&bytes[..end]).ok()?.parse::<i64>().ok()?;
        self.rest = &bytes[end + 1..];
        Some(value)
    }

    /// Like [`try_next`](Self::try_next), but a failure aborts the message.
    pub fn next_field(&mut self, field: &'static str) -> Result<i64, DecodeError> {
        self.try_next()
            .ok_or_else(|| DecodeError::malformed(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_values() {
        let mut cursor = TokenCursor::new(b"1,46,5319,");
        assert_eq!(cursor.try_next(), Some(1));
        assert_eq!(cursor.try_next(), Some(46));
        assert_eq!(cursor.try_next(), Some(5319));
        assert_eq!(cursor.try_next(), None);
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_signed_values_and_period_delimiter() {
        let mut cursor = TokenCursor::new(b"-12,+7.3,");
        assert_eq!(cursor.try_next(), Some(-12));
        assert_eq!(cursor.try_next(), Some(7));
        assert_eq!(cursor.try_next(), Some(3));
    }

    #[test]
    fn test_failure_does_not_advance() {
        let mut cursor = TokenCursor::new(b"12;34,");
        assert_eq!(cursor.try_next(), None);
        assert_eq!(cursor.remaining(), b"12;34,");

        let mut cursor = TokenCursor::new(b"abc,");
        assert_eq!(cursor.try_next(), None);
        assert_eq!(cursor.remaining(), b"abc,");
    }

    #[test]
    fn test_whitespace_is_not_skipped() {
        let mut cursor = TokenCursor::new(b" 1,");
        assert_eq!(cursor.try_next(), None);
        assert_eq!(cursor.remaining(), b" 1,");

        let mut cursor = TokenCursor::new(b"1 ,");
        assert_eq!(cursor.try_next(), None);
        assert_eq!(cursor.remaining(), b"1 ,");
    }

    #[test]
    fn test_missing_delimiter_at_end() {
        let mut cursor = TokenCursor::new(b"99");
        assert_eq!(cursor.try_next(), None);
        assert_eq!(cursor.remaining(), b"99");
    }

    #[test]
    fn test_bare_sign_is_not_a_value() {
        let mut cursor = TokenCursor::new(b"-,");
        assert_eq!(cursor.try_next(), None);
    }

    #[test]
    fn test_overflow_rejected() {
        let mut cursor = TokenCursor::new(b"99999999999999999999,");
        assert_eq!(cursor.try_next(), None);
    }

    #[test]
    fn test_next_field_names_the_failure() {
        let mut cursor = TokenCursor::new(b"5319,x,");
        assert_eq!(cursor.next_field("voltage"), Ok(5319));
        assert_eq!(
            cursor.next_field("current"),
            Err(DecodeError::malformed("current"))
        );
    }
}
