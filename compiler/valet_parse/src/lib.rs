//! One-pass parser and type checker for Valet scripts.
//!
//! Parsing and type checking are a single pass: the recursive-descent
//! grammar builds arena AST nodes and resolves each expression's type
//! bottom-up as it goes. There is no separate typecheck phase and the
//! evaluator never re-infers types.
//!
//! The entry points are [`parse`] over a token stream and
//! [`parse_source`] over raw text.

mod cursor;
mod error;
mod parser;

pub use error::ParseError;
pub use parser::{parse, ParseOutcome};

use valet_ir::{Name, StringInterner, TypeId};
use valet_lexer::LexError;
use valet_types::TypeTable;

/// A callable signature the parser can type calls against: one native
/// registration or one user function overload.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct FunctionSig {
    pub name: Name,
    pub params: Vec<TypeId>,
    pub ret: TypeId,
}

/// Lex and parse in one step.
pub fn parse_source(
    source: &str,
    interner: &StringInterner,
    table: &mut TypeTable,
    natives: &[FunctionSig],
) -> (ParseOutcome, Vec<LexError>) {
    let (tokens, lex_errors) = valet_lexer::lex(source, interner);
    (parse(&tokens, interner, table, natives), lex_errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use valet_diagnostic::ErrorCode;
    use valet_ir::{ExprKind, SharedInterner, StmtKind};

    fn check(source: &str) -> (SharedInterner, TypeTable, ParseOutcome) {
        let interner = SharedInterner::new();
        let mut table = TypeTable::new(&interner);
        let natives = [
            FunctionSig {
                name: interner.intern("print"),
                params: vec![TypeId::STRING],
                ret: TypeId::VOID,
            },
            FunctionSig {
                name: interner.intern("sink"),
                params: vec![TypeId::INT],
                ret: TypeId::VOID,
            },
        ];
        let (outcome, lex_errors) = parse_source(source, &interner, &mut table, &natives);
        assert_eq!(lex_errors, vec![], "unexpected lex errors");
        (interner, table, outcome)
    }

    fn check_ok(source: &str) -> (SharedInterner, TypeTable, ParseOutcome) {
        let (interner, table, outcome) = check(source);
        assert_eq!(outcome.errors, vec![], "expected a clean parse");
        (interner, table, outcome)
    }

    fn first_code(source: &str) -> ErrorCode {
        let (_, _, outcome) = check(source);
        let Some(err) = outcome.errors.first() else {
            panic!("expected at least one error for {source:?}");
        };
        err.code
    }

    #[test]
    fn empty_script() {
        let (_, _, outcome) = check_ok("");
        assert!(outcome.script.body.is_empty());
    }

    #[test]
    fn var_decl_annotates_type() {
        let (_, _, outcome) = check_ok("int x = 5;");
        let script = &outcome.script;
        let body = script.arena.block(script.body);
        assert_eq!(body.len(), 1);
        let StmtKind::VarDecl { ty, init, .. } = body[0].kind else {
            panic!("expected a declaration");
        };
        assert_eq!(ty, TypeId::INT);
        assert_eq!(script.arena.expr(init).ty, TypeId::INT);
    }

    #[test]
    fn widening_and_display_initializers() {
        check_ok("float f = 1;");
        check_ok("string s = 5;");
        check_ok("string s = \"a\" + 1;");
    }

    #[test]
    fn narrowing_initializer_rejected() {
        assert_eq!(first_code("int x = 1.5;"), ErrorCode::E2001);
    }

    #[test]
    fn nested_array_declaration() {
        let (interner, table, outcome) = check_ok("int [3, 4] grid;");
        let script = &outcome.script;
        let StmtKind::VarDecl { ty, .. } = script.arena.block(script.body)[0].kind else {
            panic!("expected a declaration");
        };
        assert_eq!(table.type_name(ty, &interner), "int [3, 4]");
    }

    #[test]
    fn map_declaration_shapes() {
        let (_, table, outcome) = check_ok("string [int] m; boolean [string] flags;");
        let script = &outcome.script;
        let body = script.arena.block(script.body);
        let StmtKind::VarDecl { ty: m_ty, .. } = body[0].kind else {
            panic!("expected a declaration");
        };
        let Some(m_agg) = table.get(m_ty).as_aggregate() else {
            panic!("expected an aggregate");
        };
        assert!(m_agg.is_map());
        assert_eq!(m_agg.index, TypeId::INT);
        assert_eq!(m_agg.data, TypeId::STRING);
        // String-keyed maps fold case by default.
        let StmtKind::VarDecl { ty: f_ty, .. } = body[1].kind else {
            panic!("expected a declaration");
        };
        let Some(f_agg) = table.get(f_ty).as_aggregate() else {
            panic!("expected an aggregate");
        };
        assert!(f_agg.case_insensitive);
    }

    #[test]
    fn float_map_index_rejected() {
        assert_eq!(first_code("int [float] m;"), ErrorCode::E2008);
    }

    #[test]
    fn redeclaration_in_same_scope() {
        assert_eq!(first_code("int x; string x;"), ErrorCode::E2005);
    }

    #[test]
    fn shadowing_in_nested_scope_allowed() {
        check_ok("int x; while (x < 3) { string x; x = \"s\"; }");
    }

    #[test]
    fn unknown_identifier() {
        assert_eq!(first_code("int x = y;"), ErrorCode::E2003);
    }

    #[test]
    fn record_and_field_access() {
        let (_, _, outcome) = check_ok(
            "record point { int x; int y; };\n\
             point p;\n\
             int x = p.x;",
        );
        let script = &outcome.script;
        let body = script.arena.block(script.body);
        let StmtKind::VarDecl { init, .. } = body[1].kind else {
            panic!("expected a declaration");
        };
        assert_eq!(script.arena.expr(init).ty, TypeId::INT);
    }

    #[test]
    fn unknown_field_rejected() {
        assert_eq!(
            first_code("record point { int x; };\npoint p;\nint z = p.z;"),
            ErrorCode::E2009
        );
    }

    #[test]
    fn unknown_record_field_type() {
        assert_eq!(first_code("record r { widget w; };"), ErrorCode::E2002);
    }

    #[test]
    fn function_declaration_and_call() {
        let (_, _, outcome) = check_ok(
            "int twice(int n) { return n * 2; }\n\
             int y = twice(3);",
        );
        let script = &outcome.script;
        assert_eq!(script.functions.len(), 1);
        let StmtKind::VarDecl { init, .. } = script.arena.block(script.body)[0].kind else {
            panic!("expected a declaration");
        };
        assert!(matches!(script.arena.expr(init).kind, ExprKind::Call { .. }));
        assert_eq!(script.arena.expr(init).ty, TypeId::INT);
    }

    #[test]
    fn unknown_function() {
        assert_eq!(first_code("missing();"), ErrorCode::E2006);
    }

    #[test]
    fn wrong_arity() {
        assert_eq!(first_code("print(\"a\", \"b\");"), ErrorCode::E2004);
    }

    #[test]
    fn duplicate_overload_rejected() {
        assert_eq!(
            first_code("int f(int n) { return n; } int f(int m) { return m; }"),
            ErrorCode::E2005
        );
    }

    #[test]
    fn distinct_overloads_allowed() {
        check_ok("int f(int n) { return n; } int f(string s) { return 0; }");
    }

    #[test]
    fn break_outside_loop() {
        assert_eq!(first_code("break;"), ErrorCode::E2012);
        check_ok("while (true) { break; }");
    }

    #[test]
    fn return_outside_function() {
        assert_eq!(first_code("return 1;"), ErrorCode::E2011);
    }

    #[test]
    fn array_literal_with_declared_type() {
        check_ok("int [3] a = {1, 2, 3};");
        check_ok("float [3] f = {1, 2.5, 3};");
    }

    #[test]
    fn empty_literal_needs_a_type() {
        check_ok("int [int] m = {};");
        assert_eq!(first_code("{};"), ErrorCode::E1007);
    }

    #[test]
    fn literal_inference_failure() {
        assert_eq!(first_code("sink({1, \"a\"});"), ErrorCode::E2007);
    }

    #[test]
    fn map_literal_with_declared_type() {
        check_ok("int [string] scores = {\"a\": 1, \"b\": 2};");
    }

    #[test]
    fn else_if_chains() {
        check_ok(
            "int x;\n\
             if (x < 0) { x = 0; } else if (x > 10) { x = 10; } else { x = 5; }",
        );
    }

    #[test]
    fn non_boolean_condition() {
        assert_eq!(first_code("if (1) { }"), ErrorCode::E2001);
    }

    #[test]
    fn repeat_until() {
        check_ok("int n; repeat { n = n + 1; } until (n > 3);");
    }

    #[test]
    fn foreach_variable_takes_index_type() {
        let (_, _, outcome) = check_ok(
            "int [string] m;\n\
             foreach k in m { string s = k; }",
        );
        assert!(outcome.is_clean());
        assert_eq!(first_code("int x; foreach k in x { }"), ErrorCode::E2001);
    }

    #[test]
    fn assignment_to_rvalue() {
        assert_eq!(first_code("1 = 2;"), ErrorCode::E2010);
    }

    #[test]
    fn errors_batch_across_statements() {
        let (_, _, outcome) = check("int x = y;\nint z = w;");
        assert_eq!(outcome.errors.len(), 2);
        assert!(outcome.errors.iter().all(|e| e.code == ErrorCode::E2003));
    }
}
