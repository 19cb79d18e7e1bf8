//! Diagnostics and error reporting for the Valet scripting engine.
//!
//! Every phase (lexer, parser, evaluator) reports through `Diagnostic`.
//! The engine core never prints; the host receives the diagnostic
//! sequence and decides how to display it (console, dialog, log). The
//! bundled `TerminalEmitter` is the default console renderer used by the
//! CLI driver.

mod diagnostic;
mod emitter;
mod error_code;
pub mod span_utils;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use emitter::{count_by_severity, DiagnosticEmitter, TerminalEmitter};
pub use error_code::ErrorCode;
pub use span_utils::LineOffsetTable;
