//! Diagnostic emitters.
//!
//! The engine hands diagnostics to the host as data; emitters are the
//! built-in renderers. `TerminalEmitter` produces the `error[E1001]:
//! message` / `--> line:col` format used by the CLI driver.

use std::fmt::Write as _;

use crate::{Diagnostic, LineOffsetTable, Severity};

/// Trait for emitting diagnostics in various formats.
pub trait DiagnosticEmitter {
    /// Emit a single diagnostic.
    fn emit(&mut self, diagnostic: &Diagnostic);

    /// Emit multiple diagnostics.
    fn emit_all(&mut self, diagnostics: &[Diagnostic]) {
        for diag in diagnostics {
            self.emit(diag);
        }
    }

    /// Emit a summary of errors/warnings.
    fn emit_summary(&mut self, error_count: usize, warning_count: usize);
}

/// Human-readable terminal renderer.
///
/// Renders into an internal buffer; the host drains it with
/// [`TerminalEmitter::take_output`] (the CLI prints it to stderr).
pub struct TerminalEmitter<'src> {
    source: &'src str,
    table: LineOffsetTable,
    buffer: String,
}

impl<'src> TerminalEmitter<'src> {
    /// Create an emitter over one script's source text.
    pub fn new(source: &'src str) -> Self {
        TerminalEmitter {
            source,
            table: LineOffsetTable::build(source),
            buffer: String::new(),
        }
    }

    /// Drain the rendered output.
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }
}

impl DiagnosticEmitter for TerminalEmitter<'_> {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        let _ = writeln!(
            self.buffer,
            "{}[{}]: {}",
            diagnostic.severity, diagnostic.code, diagnostic.message
        );

        for label in &diagnostic.labels {
            let (line, col) = self.table.span_start(self.source, label.span);
            let _ = writeln!(self.buffer, "  --> {line}:{col}");
            let text = self.table.line_text(self.source, line);
            if !text.is_empty() {
                let _ = writeln!(self.buffer, "   | {text}");
                let marker_len = usize::max(1, label.span.len() as usize).min(text.len());
                let _ = writeln!(
                    self.buffer,
                    "   | {}{}",
                    " ".repeat((col as usize).saturating_sub(1)),
                    (if label.is_primary { "^" } else { "-" }).repeat(marker_len)
                );
            }
            if !label.message.is_empty() {
                let _ = writeln!(self.buffer, "   = {}", label.message);
            }
        }

        for note in &diagnostic.notes {
            let _ = writeln!(self.buffer, "   = note: {note}");
        }
    }

    fn emit_summary(&mut self, error_count: usize, warning_count: usize) {
        if error_count == 0 && warning_count == 0 {
            return;
        }
        let plural = |n: usize| if n == 1 { "" } else { "s" };
        let _ = match (error_count, warning_count) {
            (e, 0) => writeln!(self.buffer, "{e} error{} emitted", plural(e)),
            (0, w) => writeln!(self.buffer, "{w} warning{} emitted", plural(w)),
            (e, w) => writeln!(
                self.buffer,
                "{e} error{}, {w} warning{} emitted",
                plural(e),
                plural(w)
            ),
        };
    }
}

/// Count diagnostics by severity, for summaries.
pub fn count_by_severity(diagnostics: &[Diagnostic]) -> (usize, usize) {
    let errors = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    let warnings = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .count();
    (errors, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorCode, Label};
    use valet_ir::Span;

    #[test]
    fn emit_renders_location_and_marker() {
        let source = "int x = true;";
        let mut emitter = TerminalEmitter::new(source);
        let diag = Diagnostic::error(ErrorCode::E2001, "type mismatch")
            .with_label(Label::primary(Span::new(8, 12), "expected int, found boolean"));
        emitter.emit(&diag);
        let out = emitter.take_output();
        assert!(out.contains("error[E2001]: type mismatch"));
        assert!(out.contains("--> 1:9"));
        assert!(out.contains("^^^^"));
    }

    #[test]
    fn summary_counts() {
        let mut emitter = TerminalEmitter::new("");
        emitter.emit_summary(2, 1);
        assert_eq!(emitter.take_output(), "2 errors, 1 warning emitted\n");
    }
}
