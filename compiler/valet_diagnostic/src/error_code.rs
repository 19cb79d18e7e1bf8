//! Error codes for all engine diagnostics.
//!
//! Each error code is a unique identifier (e.g., `E1001`) with the first
//! digit indicating the phase that produced it.

use std::fmt;

/// Error codes for all engine diagnostics.
///
/// Format: E#### where first digit indicates phase:
/// - E0xxx: Lexer errors
/// - E1xxx: Parser errors
/// - E2xxx: Type errors (reported during the single parse pass)
/// - E6xxx: Runtime / eval errors
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Lexer errors (E0xxx)
    /// Unterminated string literal
    E0001,
    /// Invalid character in source
    E0002,
    /// Invalid number literal
    E0003,
    /// Invalid escape sequence
    E0004,

    // Parser errors (E1xxx)
    /// Unexpected token
    E1001,
    /// Expected expression
    E1002,
    /// Unclosed delimiter
    E1003,
    /// Expected identifier
    E1004,
    /// Expected type name
    E1005,
    /// Invalid aggregate dimension
    E1006,
    /// Empty aggregate literal without declared type
    E1007,

    // Type errors (E2xxx)
    /// Type mismatch
    E2001,
    /// Unknown type name
    E2002,
    /// Unknown identifier
    E2003,
    /// Argument count mismatch
    E2004,
    /// Duplicate definition in the same scope
    E2005,
    /// Unknown function
    E2006,
    /// Ambiguous aggregate literal (no common element type)
    E2007,
    /// Invalid index type for aggregate
    E2008,
    /// No such field on record
    E2009,
    /// Invalid assignment target
    E2010,
    /// Return outside function / wrong return type
    E2011,
    /// Break or continue outside a loop
    E2012,

    // Runtime errors (E6xxx)
    /// Index out of bounds
    E6001,
    /// Overload resolution failure
    E6002,
    /// Native call failure
    E6003,
    /// Invalid runtime coercion
    E6004,
    /// Division by zero
    E6005,
    /// Evaluation aborted by host (cooperative cancellation)
    E6006,
    /// Variable unbound at runtime (engine invariant violation)
    E6007,
}

impl ErrorCode {
    /// Every defined code, in phase order.
    pub const ALL: [ErrorCode; 30] = [
        ErrorCode::E0001,
        ErrorCode::E0002,
        ErrorCode::E0003,
        ErrorCode::E0004,
        ErrorCode::E1001,
        ErrorCode::E1002,
        ErrorCode::E1003,
        ErrorCode::E1004,
        ErrorCode::E1005,
        ErrorCode::E1006,
        ErrorCode::E1007,
        ErrorCode::E2001,
        ErrorCode::E2002,
        ErrorCode::E2003,
        ErrorCode::E2004,
        ErrorCode::E2005,
        ErrorCode::E2006,
        ErrorCode::E2007,
        ErrorCode::E2008,
        ErrorCode::E2009,
        ErrorCode::E2010,
        ErrorCode::E2011,
        ErrorCode::E2012,
        ErrorCode::E6001,
        ErrorCode::E6002,
        ErrorCode::E6003,
        ErrorCode::E6004,
        ErrorCode::E6005,
        ErrorCode::E6006,
        ErrorCode::E6007,
    ];

    /// Look up a code by its `E####` name, case-insensitively.
    pub fn parse(code: &str) -> Option<ErrorCode> {
        let upper = code.to_uppercase();
        Self::ALL.into_iter().find(|c| c.to_string() == upper)
    }

    /// Short description for `--explain` style lookups.
    pub fn description(self) -> &'static str {
        match self {
            ErrorCode::E0001 => "unterminated string literal",
            ErrorCode::E0002 => "invalid character in source",
            ErrorCode::E0003 => "invalid number literal",
            ErrorCode::E0004 => "invalid escape sequence",
            ErrorCode::E1001 => "unexpected token",
            ErrorCode::E1002 => "expected expression",
            ErrorCode::E1003 => "unclosed delimiter",
            ErrorCode::E1004 => "expected identifier",
            ErrorCode::E1005 => "expected type name",
            ErrorCode::E1006 => "invalid aggregate dimension",
            ErrorCode::E1007 => "empty aggregate literal without declared type",
            ErrorCode::E2001 => "type mismatch",
            ErrorCode::E2002 => "unknown type name",
            ErrorCode::E2003 => "unknown identifier",
            ErrorCode::E2004 => "argument count mismatch",
            ErrorCode::E2005 => "duplicate definition in the same scope",
            ErrorCode::E2006 => "unknown function",
            ErrorCode::E2007 => "ambiguous aggregate literal",
            ErrorCode::E2008 => "invalid index type for aggregate",
            ErrorCode::E2009 => "no such field on record",
            ErrorCode::E2010 => "invalid assignment target",
            ErrorCode::E2011 => "invalid return",
            ErrorCode::E2012 => "break or continue outside a loop",
            ErrorCode::E6001 => "index out of bounds",
            ErrorCode::E6002 => "overload resolution failure",
            ErrorCode::E6003 => "native call failure",
            ErrorCode::E6004 => "invalid runtime coercion",
            ErrorCode::E6005 => "division by zero",
            ErrorCode::E6006 => "evaluation aborted by host",
            ErrorCode::E6007 => "variable unbound at runtime",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_debug() {
        assert_eq!(ErrorCode::E2001.to_string(), "E2001");
    }

    #[test]
    fn descriptions_are_nonempty() {
        assert!(!ErrorCode::E6002.description().is_empty());
    }

    #[test]
    fn parse_round_trips_and_folds_case() {
        assert_eq!(ErrorCode::parse("E2001"), Some(ErrorCode::E2001));
        assert_eq!(ErrorCode::parse("e6005"), Some(ErrorCode::E6005));
        assert_eq!(ErrorCode::parse("E9999"), None);
    }
}
