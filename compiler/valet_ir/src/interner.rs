//! String interner for identifier storage.
//!
//! Provides O(1) interning and lookup. The interner is shared between the
//! lexer, parser, and evaluator of one engine instance via `SharedInterner`.

use crate::Name;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

struct InternerInner {
    /// Map from string content to index.
    map: FxHashMap<&'static str, u32>,
    /// Storage for string contents.
    strings: Vec<&'static str>,
}

/// String interner.
///
/// Interned strings are leaked to obtain `'static` lifetime; an interner
/// lives for the whole engine instance, so the leak is bounded by the
/// distinct identifiers and string literals seen across all scripts.
pub struct StringInterner {
    inner: RwLock<InternerInner>,
}

impl StringInterner {
    /// Create a new interner with the empty string pre-interned at index 0.
    pub fn new() -> Self {
        let empty: &'static str = "";
        let mut map = FxHashMap::default();
        map.insert(empty, 0);
        StringInterner {
            inner: RwLock::new(InternerInner {
                map,
                strings: vec![empty],
            }),
        }
    }

    /// Intern a string, returning its `Name`.
    pub fn intern(&self, s: &str) -> Name {
        // Fast path: already interned.
        {
            let guard = self.inner.read();
            if let Some(&idx) = guard.map.get(s) {
                return Name::from_raw(idx);
            }
        }

        let mut guard = self.inner.write();
        // Double-check after acquiring the write lock.
        if let Some(&idx) = guard.map.get(s) {
            return Name::from_raw(idx);
        }

        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let idx = u32::try_from(guard.strings.len()).unwrap_or(u32::MAX);
        guard.strings.push(leaked);
        guard.map.insert(leaked, idx);
        Name::from_raw(idx)
    }

    /// Look up the string for a `Name`.
    ///
    /// # Panics
    /// Panics if the name was not produced by this interner.
    pub fn lookup(&self, name: Name) -> &'static str {
        self.inner.read().strings[name.index()]
    }

    /// Number of interned strings.
    pub fn len(&self) -> usize {
        self.inner.read().strings.len()
    }

    /// Check if only the pre-interned empty string is present.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared interner handle.
///
/// Wraps `Arc<StringInterner>` so the lexer, parser, and evaluator of one
/// engine instance observe the same `Name` space.
#[derive(Clone, Default)]
pub struct SharedInterner(Arc<StringInterner>);

impl SharedInterner {
    /// Create a fresh interner.
    pub fn new() -> Self {
        SharedInterner(Arc::new(StringInterner::new()))
    }
}

impl std::ops::Deref for SharedInterner {
    type Target = StringInterner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_dedupes() {
        let interner = StringInterner::new();
        let a = interner.intern("equip");
        let b = interner.intern("equip");
        assert_eq!(a, b);
        assert_eq!(interner.lookup(a), "equip");
    }

    #[test]
    fn intern_distinct() {
        let interner = StringInterner::new();
        let a = interner.intern("item");
        let b = interner.intern("location");
        assert_ne!(a, b);
    }

    #[test]
    fn empty_string_pre_interned() {
        let interner = StringInterner::new();
        assert_eq!(interner.intern(""), Name::EMPTY);
        assert!(interner.is_empty());
    }

    #[test]
    fn shared_interner_same_namespace() {
        let shared = SharedInterner::new();
        let clone = shared.clone();
        assert_eq!(shared.intern("x"), clone.intern("x"));
    }
}
