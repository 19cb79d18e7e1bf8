//! The Valet evaluator: runtime values, scopes, the function registry,
//! and the tree-walking interpreter.
//!
//! A host embeds the evaluator by registering natives in a
//! [`FunctionRegistry`], parsing a script against the registry's
//! signatures, then driving an [`Interpreter`] with a [`CancelToken`] it
//! keeps a clone of.

mod cancel;
mod control;
mod environment;
mod errors;
mod interp;
pub mod natives;
mod registry;
mod value;

pub use cancel::CancelToken;
pub use control::{Control, EvalResult};
pub use environment::Environment;
pub use errors::{RuntimeError, RuntimeErrorKind, TraceFrame};
pub use interp::{Interpreter, Termination};
pub use registry::{FunctionRegistry, NativeFn, Overload, ResolveFailure, Target};
pub use value::{ArrayValue, MapValue, RecordValue, TaggedValue, Value};
