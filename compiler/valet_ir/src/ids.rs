//! Node IDs and ranges for the flat AST.
//!
//! Child references are `u32` indices into the `ScriptArena` rather than
//! boxes; contiguous lists (arguments, block bodies, map entries) are
//! `(start, len)` ranges into flattened side arrays.

use std::fmt;

macro_rules! arena_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Sentinel for "no node" (replaces `Option<Self>` in packed nodes).
            pub const INVALID: $name = $name(u32::MAX);

            /// Create a new ID.
            #[inline]
            pub const fn new(index: u32) -> Self {
                $name(index)
            }

            /// Get the index into the arena.
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            /// Check if this ID refers to a present node.
            #[inline]
            pub const fn is_present(self) -> bool {
                self.0 != u32::MAX
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_present() {
                    write!(f, concat!(stringify!($name), "({})"), self.0)
                } else {
                    write!(f, concat!(stringify!($name), "::INVALID"))
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::INVALID
            }
        }
    };
}

macro_rules! arena_range {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
        #[repr(C)]
        pub struct $name {
            pub start: u32,
            pub len: u16,
        }

        impl $name {
            /// Empty range.
            pub const EMPTY: $name = $name { start: 0, len: 0 };

            /// Create a new range.
            #[inline]
            pub const fn new(start: u32, len: u16) -> Self {
                $name { start, len }
            }

            /// Number of elements in the range.
            #[inline]
            pub const fn len(self) -> usize {
                self.len as usize
            }

            /// Check if the range is empty.
            #[inline]
            pub const fn is_empty(self) -> bool {
                self.len == 0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(
                    f,
                    concat!(stringify!($name), "({}..+{})"),
                    self.start, self.len
                )
            }
        }
    };
}

arena_id! {
    /// Index into the expression arena.
    ExprId
}

arena_id! {
    /// Index into the statement arena.
    StmtId
}

arena_range! {
    /// Range of expression IDs in the flattened expression lists.
    ExprRange
}

arena_range! {
    /// Range of statements (a block body) in the statement arena.
    StmtRange
}

arena_range! {
    /// Range of map-literal entries.
    MapEntryRange
}

arena_range! {
    /// Range of function parameters.
    ParamRange
}
