//! Interned string identifier.

use std::fmt;

/// Interned string identifier.
///
/// A plain index into the `StringInterner`. Two `Name`s are equal iff
/// they intern the same string, making identifier comparison an O(1)
/// integer compare throughout the parser and evaluator.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct Name(u32);

impl Name {
    /// Pre-interned empty string.
    pub const EMPTY: Name = Name(0);

    /// Create from a raw index.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Name(raw)
    }

    /// Get the raw index.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as usize.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

impl Default for Name {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_equality_is_index_equality() {
        assert_eq!(Name::from_raw(7), Name::from_raw(7));
        assert_ne!(Name::from_raw(7), Name::from_raw(8));
    }

    #[test]
    fn name_default_is_empty() {
        assert_eq!(Name::default(), Name::EMPTY);
        assert_eq!(Name::EMPTY.raw(), 0);
    }
}
