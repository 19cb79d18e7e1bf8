//! Non-local control flow.
//!
//! `break`, `continue`, `return`, host cancellation, and runtime errors
//! all travel through the `Err` position of [`EvalResult`], so `?`
//! propagates them until a loop or function boundary handles its own
//! variants. There is no unwinding machinery and nothing is thrown.

use crate::{RuntimeError, Value};

/// Why evaluation of the current construct stopped early.
#[derive(Clone, Debug)]
pub enum Control {
    /// `return` reached a function boundary.
    Return(Value),
    /// `break` reached a loop boundary.
    Break,
    /// `continue` reached a loop boundary.
    Continue,
    /// The host's cancel token was set. A termination mode, not an error.
    Abort,
    /// A runtime error; unwinds all the way out.
    Runtime(RuntimeError),
}

/// Result of evaluating an expression or statement.
pub type EvalResult<T = Value> = Result<T, Control>;

impl From<RuntimeError> for Control {
    fn from(err: RuntimeError) -> Self {
        Control::Runtime(err)
    }
}
