//! Handle into the type table.

use std::fmt;

/// Interned type handle.
///
/// Index into `valet_types::TypeTable`. The table pre-interns the
/// primitive types in a fixed order so that the constants below are
/// valid for every table instance.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    pub const VOID: TypeId = TypeId(0);
    pub const BOOLEAN: TypeId = TypeId(1);
    pub const INT: TypeId = TypeId(2);
    pub const FLOAT: TypeId = TypeId(3);
    pub const STRING: TypeId = TypeId(4);
    pub const ITEM: TypeId = TypeId(5);
    pub const LOCATION: TypeId = TypeId(6);
    pub const MONSTER: TypeId = TypeId(7);
    pub const SKILL: TypeId = TypeId(8);
    pub const EFFECT: TypeId = TypeId(9);

    /// Number of pre-interned primitive types.
    pub const FIRST_FREE: u32 = 10;

    /// Sentinel for "not yet resolved" (only ever observed on nodes the
    /// parser rejected; executable ASTs never carry it).
    pub const UNRESOLVED: TypeId = TypeId(u32::MAX);

    /// Create a new type ID.
    #[inline]
    pub const fn new(index: u32) -> Self {
        TypeId(index)
    }

    /// Get the index into the type table.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Get the raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Check if this ID is resolved.
    #[inline]
    pub const fn is_resolved(self) -> bool {
        self.0 != u32::MAX
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TypeId::VOID => write!(f, "TypeId(void)"),
            TypeId::BOOLEAN => write!(f, "TypeId(boolean)"),
            TypeId::INT => write!(f, "TypeId(int)"),
            TypeId::FLOAT => write!(f, "TypeId(float)"),
            TypeId::STRING => write!(f, "TypeId(string)"),
            TypeId::UNRESOLVED => write!(f, "TypeId(?)"),
            other => write!(f, "TypeId({})", other.0),
        }
    }
}

impl Default for TypeId {
    fn default() -> Self {
        Self::UNRESOLVED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_constants_are_dense() {
        assert_eq!(TypeId::VOID.raw(), 0);
        assert_eq!(TypeId::EFFECT.raw(), TypeId::FIRST_FREE - 1);
    }

    #[test]
    fn unresolved_sentinel() {
        assert!(!TypeId::UNRESOLVED.is_resolved());
        assert!(TypeId::INT.is_resolved());
    }
}
