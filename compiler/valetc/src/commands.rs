//! CLI subcommand implementations.

use std::process::exit;
use std::rc::Rc;

use valet_diagnostic::{count_by_severity, Diagnostic, DiagnosticEmitter, ErrorCode, LineOffsetTable, TerminalEmitter};
use valet_eval::{natives, CancelToken, FunctionRegistry, Interpreter, Termination};
use valet_ir::SharedInterner;
use valet_parse::{parse_source, ParseOutcome};
use valet_types::TypeTable;

fn read_source(path: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: cannot read `{path}`: {err}");
            exit(1);
        }
    }
}

/// Render diagnostics to stderr and return the error count.
fn report(source: &str, diagnostics: &[Diagnostic]) -> usize {
    let mut emitter = TerminalEmitter::new(source);
    emitter.emit_all(diagnostics);
    let (errors, warnings) = count_by_severity(diagnostics);
    emitter.emit_summary(errors, warnings);
    eprint!("{}", emitter.take_output());
    errors
}

struct Compiled {
    interner: SharedInterner,
    table: TypeTable,
    registry: FunctionRegistry,
    outcome: ParseOutcome,
}

/// Lex and parse, reporting all diagnostics. Exits on any error.
fn compile(source: &str) -> Compiled {
    let interner = SharedInterner::new();
    let mut table = TypeTable::new(&interner);
    let mut registry = FunctionRegistry::new();
    natives::install(
        &mut registry,
        &interner,
        Rc::new(|line: &str| println!("{line}")),
    );

    let (outcome, lex_errors) = parse_source(source, &interner, &mut table, &registry.signatures());
    let diagnostics: Vec<Diagnostic> = lex_errors
        .iter()
        .map(valet_lexer::LexError::to_diagnostic)
        .chain(outcome.errors.iter().map(valet_parse::ParseError::to_diagnostic))
        .collect();
    if report(source, &diagnostics) > 0 {
        exit(1);
    }

    registry.register_script(&outcome.script);
    Compiled {
        interner,
        table,
        registry,
        outcome,
    }
}

/// `valet check <file>`: lex, parse, and type check without running.
pub fn check_file(path: &str) {
    let source = read_source(path);
    let compiled = compile(&source);
    println!(
        "{path}: ok ({} function{})",
        compiled.outcome.script.functions.len(),
        if compiled.outcome.script.functions.len() == 1 { "" } else { "s" }
    );
}

/// `valet run <file>`: full pipeline, `print` goes to stdout.
pub fn run_file(path: &str) {
    let source = read_source(path);
    let compiled = compile(&source);
    tracing::debug!(path, "script compiled, starting run");

    let cancel = CancelToken::new();
    let mut interp = Interpreter::new(
        &compiled.outcome.script,
        &compiled.table,
        &compiled.interner,
        &compiled.registry,
        cancel,
    );
    match interp.run() {
        Ok(Termination::Completed) => {}
        Ok(Termination::Aborted) => {
            eprintln!("script aborted");
            exit(130);
        }
        Err(err) => {
            report(&source, &[err.to_diagnostic()]);
            exit(1);
        }
    }
}

/// `valet lex <file>`: dump the token stream with line/column positions.
pub fn lex_file(path: &str) {
    let source = read_source(path);
    let interner = SharedInterner::new();
    let (tokens, errors) = valet_lexer::lex(&source, &interner);
    let table = LineOffsetTable::build(&source);
    for token in &tokens {
        let (line, col) = table.span_start(&source, token.span);
        println!("{line}:{col}\t{:?}", token.kind);
    }
    let diagnostics: Vec<Diagnostic> = errors
        .iter()
        .map(valet_lexer::LexError::to_diagnostic)
        .collect();
    if report(&source, &diagnostics) > 0 {
        exit(1);
    }
}

/// `valet --explain <code>`: describe an error code.
pub fn explain_error(code: &str) {
    match ErrorCode::parse(code) {
        Some(code) => println!("{code}: {}", code.description()),
        None => {
            eprintln!("error: unknown error code `{code}`");
            eprintln!("Codes are E0xxx (lexer), E1xxx (parser), E2xxx (types), E6xxx (runtime).");
            exit(1);
        }
    }
}
