//! Runtime errors.

use std::fmt;

use thiserror::Error;
use valet_diagnostic::{Diagnostic, ErrorCode, Label};
use valet_ir::Span;

/// One frame of the call stack carried by a runtime error, recorded as
/// the error unwinds through user-function call boundaries.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct TraceFrame {
    pub function: String,
    pub call_span: Span,
}

/// An error raised during evaluation. Unwinds to the top of the run,
/// collecting a call-stack trace on the way out.
#[derive(Clone, PartialEq, Debug, Error)]
#[error("{kind}")]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub span: Span,
    pub trace: Vec<TraceFrame>,
}

#[derive(Clone, PartialEq, Debug)]
pub enum RuntimeErrorKind {
    /// Array access outside `0..len`.
    IndexOutOfBounds { index: i64, len: usize },
    /// No overload of the function accepts the argument types.
    NoMatchingOverload { name: String, detail: String },
    /// A native returned an error.
    NativeFailure { name: String, message: String },
    /// A value could not be coerced at runtime.
    InvalidCoercion { from: String, to: String },
    /// Integer division or modulo by zero.
    DivisionByZero,
    /// A variable the parser accepted is missing from every scope.
    /// Indicates an engine bug, not a script bug.
    UnboundVariable { name: String },
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, span: Span) -> Self {
        RuntimeError {
            kind,
            span,
            trace: Vec::new(),
        }
    }

    /// Record a call frame as the error unwinds out of a function.
    pub fn push_frame(&mut self, function: impl Into<String>, call_span: Span) {
        self.trace.push(TraceFrame {
            function: function.into(),
            call_span,
        });
    }

    pub fn code(&self) -> ErrorCode {
        match self.kind {
            RuntimeErrorKind::IndexOutOfBounds { .. } => ErrorCode::E6001,
            RuntimeErrorKind::NoMatchingOverload { .. } => ErrorCode::E6002,
            RuntimeErrorKind::NativeFailure { .. } => ErrorCode::E6003,
            RuntimeErrorKind::InvalidCoercion { .. } => ErrorCode::E6004,
            RuntimeErrorKind::DivisionByZero => ErrorCode::E6005,
            RuntimeErrorKind::UnboundVariable { .. } => ErrorCode::E6007,
        }
    }

    /// Convert to a host-facing diagnostic, trace frames as notes.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.code(), self.to_string())
            .with_label(Label::primary(self.span, "raised here"));
        for frame in &self.trace {
            diag = diag.with_note(format!("while calling `{}`", frame.function));
        }
        diag
    }
}

impl fmt::Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeErrorKind::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} is out of bounds for length {len}")
            }
            RuntimeErrorKind::NoMatchingOverload { name, detail } => {
                write!(f, "no matching overload of `{name}`: {detail}")
            }
            RuntimeErrorKind::NativeFailure { name, message } => {
                write!(f, "`{name}` failed: {message}")
            }
            RuntimeErrorKind::InvalidCoercion { from, to } => {
                write!(f, "cannot coerce `{from}` to `{to}`")
            }
            RuntimeErrorKind::DivisionByZero => write!(f, "division by zero"),
            RuntimeErrorKind::UnboundVariable { name } => {
                write!(f, "variable `{name}` is unbound (engine bug)")
            }
        }
    }
}
