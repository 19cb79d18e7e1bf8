//! Character cursor over script source.
//!
//! Automation scripts are small (kilobytes), so the cursor decodes chars
//! on demand rather than maintaining SIMD fast paths; byte positions are
//! tracked for span construction.

/// Cursor over source text, tracking the current byte offset.
pub struct Cursor<'src> {
    source: &'src str,
    pos: usize,
}

impl<'src> Cursor<'src> {
    /// Create a cursor at the start of the source.
    pub fn new(source: &'src str) -> Self {
        Cursor { source, pos: 0 }
    }

    /// Current byte offset.
    #[inline]
    pub fn pos(&self) -> u32 {
        u32::try_from(self.pos).unwrap_or(u32::MAX)
    }

    /// Check if the cursor has consumed all input.
    #[inline]
    #[allow(dead_code)]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Peek the current character without consuming it.
    #[inline]
    pub fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    /// Peek one character past the current one.
    #[inline]
    pub fn peek_second(&self) -> Option<char> {
        let mut chars = self.source[self.pos..].chars();
        chars.next();
        chars.next()
    }

    /// Consume and return the current character.
    #[inline]
    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Consume the current character if it equals `expected`.
    #[inline]
    pub fn bump_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    /// Consume characters while the predicate holds.
    pub fn bump_while(&mut self, mut pred: impl FnMut(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    /// Slice of the source between two byte offsets.
    #[inline]
    pub fn slice(&self, start: u32, end: u32) -> &'src str {
        &self.source[start as usize..end as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_advances_by_char_width() {
        let mut cursor = Cursor::new("aé!");
        assert_eq!(cursor.bump(), Some('a'));
        assert_eq!(cursor.pos(), 1);
        assert_eq!(cursor.bump(), Some('é'));
        assert_eq!(cursor.pos(), 3);
        assert_eq!(cursor.bump(), Some('!'));
        assert!(cursor.is_eof());
        assert_eq!(cursor.bump(), None);
    }

    #[test]
    fn bump_while_stops_on_predicate() {
        let mut cursor = Cursor::new("abc123");
        cursor.bump_while(|c| c.is_ascii_alphabetic());
        assert_eq!(cursor.pos(), 3);
        assert_eq!(cursor.peek(), Some('1'));
    }

    #[test]
    fn bump_if_only_on_match() {
        let mut cursor = Cursor::new("&&");
        assert!(cursor.bump_if('&'));
        assert!(cursor.bump_if('&'));
        assert!(!cursor.bump_if('&'));
    }
}
