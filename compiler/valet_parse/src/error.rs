//! Parse and type errors.
//!
//! The single parse pass reports both syntax errors (E1xxx) and type
//! errors (E2xxx) through the same type; each error is fatal to its
//! enclosing statement, and the parser recovers at the next statement
//! boundary so a script's problems are reported in one batch.

use thiserror::Error;
use valet_diagnostic::{Diagnostic, ErrorCode, Label};
use valet_ir::Span;

/// An error produced during the parse/typecheck pass.
#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("{message}")]
pub struct ParseError {
    pub code: ErrorCode,
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        ParseError {
            code,
            message: message.into(),
            span,
        }
    }

    /// Convert to a host-facing diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.code, self.message.clone())
            .with_label(Label::primary(self.span, self.code.description()))
    }
}
