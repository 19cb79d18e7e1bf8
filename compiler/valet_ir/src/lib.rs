//! Valet IR - core data structures for the Valet scripting engine.
//!
//! This crate contains the types shared by every compiler phase:
//! - Spans for source locations
//! - Names for interned identifiers
//! - Tokens and `TokenList` for lexer output
//! - Flat arena AST (Expr, Stmt, FunctionDecl)
//! - `TypeId` handles into the type table
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: Strings → Name(u32), Types → TypeId(u32)
//! - **Flatten Everything**: No Box<Expr>, use ExprId(u32) indices
//!
//! Types that contain floats store them as u64 bits for Hash compatibility.
//! Types that contain strings use interned Name for O(1) equality.

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-allocated types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

mod arena;
pub mod ast;
mod ids;
mod interner;
mod name;
mod span;
mod token;
mod type_id;

pub use arena::ScriptArena;
pub use ast::{
    BinaryOp, Expr, ExprKind, FunctionDecl, MapEntry, Param, Script, Stmt, StmtKind, UnaryOp,
};
pub use ids::{ExprId, ExprRange, MapEntryRange, ParamRange, StmtId, StmtRange};
pub use interner::{SharedInterner, StringInterner};
pub use name::Name;
pub use span::Span;
pub use token::{Token, TokenKind, TokenList};
pub use type_id::TypeId;
