//! Lexer errors.

use std::fmt;

use valet_diagnostic::{Diagnostic, ErrorCode, Label};
use valet_ir::Span;

/// A malformed token, pinpointing the offending character.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

/// Lexer failure categories.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum LexErrorKind {
    /// String literal not closed before newline or end of input.
    UnterminatedString,
    /// Character that starts no token.
    InvalidCharacter(char),
    /// Number literal that does not parse (overflow, stray exponent).
    InvalidNumber,
    /// Unknown escape sequence inside a string literal.
    InvalidEscape(char),
}

impl LexError {
    pub fn new(kind: LexErrorKind, span: Span) -> Self {
        LexError { kind, span }
    }

    /// Error code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self.kind {
            LexErrorKind::UnterminatedString => ErrorCode::E0001,
            LexErrorKind::InvalidCharacter(_) => ErrorCode::E0002,
            LexErrorKind::InvalidNumber => ErrorCode::E0003,
            LexErrorKind::InvalidEscape(_) => ErrorCode::E0004,
        }
    }

    /// Convert to a host-facing diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.code(), self.to_string())
            .with_label(Label::primary(self.span, "here"))
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            LexErrorKind::UnterminatedString => write!(f, "unterminated string literal"),
            LexErrorKind::InvalidCharacter(c) => {
                write!(f, "invalid character {c:?} in script source")
            }
            LexErrorKind::InvalidNumber => write!(f, "invalid number literal"),
            LexErrorKind::InvalidEscape(c) => write!(f, "invalid escape sequence '\\{c}'"),
        }
    }
}

impl std::error::Error for LexError {}
