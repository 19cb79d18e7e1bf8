//! Type system for the Valet scripting engine.
//!
//! A `Type` is a single tagged variant: primitive, aggregate (array or
//! map), record, or function signature. Types live in a `TypeTable` and
//! are addressed by `TypeId` handles everywhere else; the table
//! pre-interns the primitives in the order `TypeId`'s constants expect.
//!
//! The rules with teeth, all enforced here:
//! - Aggregate equality compares data and index types only; size and
//!   case sensitivity are not part of identity.
//! - `case_insensitive` is structurally impossible on a non-string
//!   index; the constructor silently downgrades it.
//! - Arrays always index by `int`; an unbounded size makes a map.

mod coerce;
mod primitive;
mod table;
mod types;

pub use coerce::{coercion_cost, COST_DISPLAY, COST_WIDEN};
pub use primitive::Primitive;
pub use table::TypeTable;
pub use types::{AggregateSize, AggregateType, FunctionType, RecordType, Type};
