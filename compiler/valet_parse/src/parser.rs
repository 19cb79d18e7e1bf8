//! The recursive-descent parser.
//!
//! One pass, one token of lookahead. Every expression is annotated with
//! its resolved `TypeId` bottom-up as it is built; type errors surface
//! as `ParseError`s alongside syntax errors. Functions and records must
//! be declared before use.
//!
//! Error recovery is per statement: on failure the parser records the
//! error, skips to the next `;` or `}`, and keeps going, so one bad
//! statement does not hide the rest of the script's problems.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use valet_diagnostic::ErrorCode;
use valet_ir::{
    BinaryOp, Expr, ExprId, ExprKind, ExprRange, FunctionDecl, MapEntry, MapEntryRange, Name,
    Param, Script, ScriptArena, Span, Stmt, StmtKind, StmtRange, StringInterner, TokenKind,
    TokenList, TypeId, UnaryOp,
};
use valet_types::{coercion_cost, AggregateType, RecordType, Type, TypeTable};

use crate::cursor::TokenCursor;
use crate::{FunctionSig, ParseError};

type PResult<T> = Result<T, ParseError>;

/// Output of a parse: the script (possibly partial when errors are
/// present) plus every error collected during the pass.
pub struct ParseOutcome {
    pub script: Script,
    pub errors: Vec<ParseError>,
}

impl ParseOutcome {
    /// Check if the script parsed and type-checked cleanly.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse a token stream into a typed script.
///
/// `natives` seeds the callable-function table; user functions are added
/// as they are parsed, so scripts may call natives and any function
/// declared earlier in the source.
pub fn parse(
    tokens: &TokenList,
    interner: &StringInterner,
    table: &mut TypeTable,
    natives: &[FunctionSig],
) -> ParseOutcome {
    let mut sigs: FxHashMap<Name, Vec<FunctionSig>> = FxHashMap::default();
    for sig in natives {
        sigs.entry(sig.name).or_default().push(sig.clone());
    }
    let mut parser = Parser {
        cursor: TokenCursor::new(tokens),
        interner,
        table,
        arena: ScriptArena::new(),
        functions: Vec::new(),
        sigs,
        scopes: vec![FxHashMap::default()],
        errors: Vec::new(),
        loop_depth: 0,
        return_ty: None,
    };
    let mut top = Vec::new();
    while !parser.cursor.at_eof() {
        let before = parser.cursor.pos();
        if let Err(err) = parser.top_level(&mut top) {
            parser.recover(err, before);
        }
    }
    let body = parser.arena.alloc_block(top);
    ParseOutcome {
        script: Script {
            arena: parser.arena,
            functions: parser.functions,
            body,
        },
        errors: parser.errors,
    }
}

struct Parser<'a> {
    cursor: TokenCursor<'a>,
    interner: &'a StringInterner,
    table: &'a mut TypeTable,
    arena: ScriptArena,
    functions: Vec<FunctionDecl>,
    /// Callable functions by name, overloads in declaration order.
    sigs: FxHashMap<Name, Vec<FunctionSig>>,
    /// Lexical scope stack for variable typing and redeclaration checks.
    scopes: Vec<FxHashMap<Name, TypeId>>,
    errors: Vec<ParseError>,
    loop_depth: u32,
    /// Return type of the function body being parsed, `None` at top level.
    return_ty: Option<TypeId>,
}

/// One dimension of an aggregate type suffix.
enum Dim {
    Fixed(u32),
    Keyed(TypeId),
}

impl Parser<'_> {
    // ---- error recovery ----

    fn recover(&mut self, err: ParseError, before: usize) {
        self.errors.push(err);
        while !self.cursor.at_eof() {
            match self.cursor.kind() {
                TokenKind::Semi => {
                    self.cursor.advance();
                    break;
                }
                TokenKind::RBrace => break,
                _ => {
                    self.cursor.advance();
                }
            }
        }
        // A stray token the loop refuses to consume must not stall us.
        if self.cursor.pos() == before && !self.cursor.at_eof() {
            self.cursor.advance();
        }
    }

    // ---- small helpers ----

    fn expr_ty(&self, id: ExprId) -> TypeId {
        self.arena.expr(id).ty
    }

    fn expr_span(&self, id: ExprId) -> Span {
        self.arena.expr(id).span
    }

    fn ty_name(&self, id: TypeId) -> String {
        self.table.type_name(id, self.interner)
    }

    fn text(&self, name: Name) -> &str {
        self.interner.lookup(name)
    }

    fn is_numeric(ty: TypeId) -> bool {
        ty == TypeId::INT || ty == TypeId::FLOAT
    }

    fn expect_ident(&mut self) -> PResult<(Name, Span)> {
        let token = *self.cursor.current();
        if let TokenKind::Ident(name) = token.kind {
            self.cursor.advance();
            Ok((name, token.span))
        } else {
            Err(ParseError::new(
                ErrorCode::E1004,
                format!("expected identifier, found {}", token.kind.describe()),
                token.span,
            ))
        }
    }

    fn lookup_var(&self, name: Name) -> Option<TypeId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(&name).copied())
    }

    fn declare(&mut self, name: Name, ty: TypeId, span: Span) -> PResult<()> {
        let scope = match self.scopes.last_mut() {
            Some(scope) => scope,
            None => return Ok(()), // scope stack is never empty in practice
        };
        if scope.contains_key(&name) {
            return Err(ParseError::new(
                ErrorCode::E2005,
                format!("`{}` is already declared in this scope", self.interner.lookup(name)),
                span,
            ));
        }
        scope.insert(name, ty);
        Ok(())
    }

    fn require_boolean(&self, cond: ExprId, what: &str) -> PResult<()> {
        let ty = self.expr_ty(cond);
        if ty == TypeId::BOOLEAN {
            Ok(())
        } else {
            Err(ParseError::new(
                ErrorCode::E2001,
                format!("{what} must be boolean, found `{}`", self.ty_name(ty)),
                self.expr_span(cond),
            ))
        }
    }

    fn check_assignable(&self, value: ExprId, expected: TypeId) -> PResult<()> {
        let found = self.expr_ty(value);
        if coercion_cost(self.table, found, expected).is_some() {
            Ok(())
        } else {
            Err(ParseError::new(
                ErrorCode::E2001,
                format!(
                    "expected `{}`, found `{}`",
                    self.ty_name(expected),
                    self.ty_name(found)
                ),
                self.expr_span(value),
            ))
        }
    }

    // ---- top level ----

    fn top_level(&mut self, out: &mut Vec<Stmt>) -> PResult<()> {
        match self.cursor.kind() {
            TokenKind::Record => self.record_decl(),
            TokenKind::Ident(name) if self.table.lookup_named(name).is_some() => {
                let start = self.cursor.span();
                let ty = self.parse_type()?;
                let (name, name_span) = self.expect_ident()?;
                if self.cursor.check(TokenKind::LParen) {
                    self.function_decl(ty, name, start)
                } else {
                    self.declaration(out, ty, name, name_span, start)
                }
            }
            _ => self.statement(out),
        }
    }

    fn record_decl(&mut self) -> PResult<()> {
        self.cursor.advance(); // record
        let (name, name_span) = self.expect_ident()?;
        self.cursor.expect(TokenKind::LBrace, ErrorCode::E1001)?;
        let mut fields: Vec<(Name, TypeId)> = Vec::new();
        while !self.cursor.check(TokenKind::RBrace) && !self.cursor.at_eof() {
            let field_ty = self.parse_type()?;
            let (field_name, field_span) = self.expect_ident()?;
            if field_ty == TypeId::VOID {
                return Err(ParseError::new(
                    ErrorCode::E2001,
                    "record field cannot have type `void`",
                    field_span,
                ));
            }
            if fields.iter().any(|&(existing, _)| existing == field_name) {
                return Err(ParseError::new(
                    ErrorCode::E2005,
                    format!("duplicate field `{}`", self.text(field_name)),
                    field_span,
                ));
            }
            self.cursor.expect(TokenKind::Semi, ErrorCode::E1001)?;
            fields.push((field_name, field_ty));
        }
        self.cursor.expect(TokenKind::RBrace, ErrorCode::E1003)?;
        self.cursor.expect(TokenKind::Semi, ErrorCode::E1001)?;
        if self.table.define_record(RecordType { name, fields }).is_none() {
            return Err(ParseError::new(
                ErrorCode::E2005,
                format!("type `{}` is already defined", self.text(name)),
                name_span,
            ));
        }
        Ok(())
    }

    fn function_decl(&mut self, ret: TypeId, name: Name, start: Span) -> PResult<()> {
        self.cursor.advance(); // (
        let mut params: Vec<Param> = Vec::new();
        if !self.cursor.check(TokenKind::RParen) {
            loop {
                let ty = self.parse_type()?;
                let (param_name, param_span) = self.expect_ident()?;
                if params.iter().any(|p| p.name == param_name) {
                    return Err(ParseError::new(
                        ErrorCode::E2005,
                        format!("duplicate parameter `{}`", self.text(param_name)),
                        param_span,
                    ));
                }
                params.push(Param {
                    name: param_name,
                    ty,
                    span: param_span,
                });
                if !self.cursor.bump_if(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.cursor.expect(TokenKind::RParen, ErrorCode::E1003)?;

        let param_tys: Vec<TypeId> = params.iter().map(|p| p.ty).collect();
        if let Some(overloads) = self.sigs.get(&name) {
            let duplicate = overloads.iter().any(|sig| {
                sig.params.len() == param_tys.len()
                    && sig
                        .params
                        .iter()
                        .zip(&param_tys)
                        .all(|(&a, &b)| self.table.equals(a, b))
            });
            if duplicate {
                return Err(ParseError::new(
                    ErrorCode::E2005,
                    format!(
                        "function `{}` with this signature is already defined",
                        self.text(name)
                    ),
                    start.merge(self.cursor.prev_span()),
                ));
            }
        }
        // Registered before the body so the function can recurse.
        self.sigs.entry(name).or_default().push(FunctionSig {
            name,
            params: param_tys,
            ret,
        });

        self.scopes.push(FxHashMap::default());
        for param in &params {
            if let Some(scope) = self.scopes.last_mut() {
                scope.insert(param.name, param.ty);
            }
        }
        let saved_ret = self.return_ty.replace(ret);
        let saved_depth = std::mem::replace(&mut self.loop_depth, 0);

        self.cursor.expect(TokenKind::LBrace, ErrorCode::E1001)?;
        let mut stmts = Vec::new();
        while !self.cursor.check(TokenKind::RBrace) && !self.cursor.at_eof() {
            let before = self.cursor.pos();
            if let Err(err) = self.statement(&mut stmts) {
                self.recover(err, before);
            }
        }
        let close = self.cursor.expect(TokenKind::RBrace, ErrorCode::E1003);

        self.return_ty = saved_ret;
        self.loop_depth = saved_depth;
        self.scopes.pop();
        close?;

        let params = self.arena.alloc_params(params);
        let body = self.arena.alloc_block(stmts);
        self.functions.push(FunctionDecl {
            name,
            params,
            return_ty: ret,
            body,
            span: start.merge(self.cursor.prev_span()),
        });
        Ok(())
    }

    // ---- types ----

    /// Parse a type reference: base name plus an optional bracketed
    /// dimension list. `int [3, 4]` nests left-to-right outermost-first;
    /// a type-name dimension makes that level a map.
    fn parse_type(&mut self) -> PResult<TypeId> {
        let token = *self.cursor.current();
        let TokenKind::Ident(name) = token.kind else {
            return Err(ParseError::new(
                ErrorCode::E1005,
                format!("expected type name, found {}", token.kind.describe()),
                token.span,
            ));
        };
        let Some(base) = self.table.lookup_named(name) else {
            return Err(ParseError::new(
                ErrorCode::E2002,
                format!("unknown type `{}`", self.text(name)),
                token.span,
            ));
        };
        self.cursor.advance();
        if !self.cursor.bump_if(TokenKind::LBracket) {
            return Ok(base);
        }

        let mut dims: SmallVec<[Dim; 4]> = SmallVec::new();
        loop {
            let dim_token = *self.cursor.current();
            let dim = match dim_token.kind {
                TokenKind::Int(n) => {
                    let Ok(size) = u32::try_from(n) else {
                        return Err(ParseError::new(
                            ErrorCode::E1006,
                            format!("array size {n} is out of range"),
                            dim_token.span,
                        ));
                    };
                    Dim::Fixed(size)
                }
                TokenKind::Ident(index_name) => {
                    let Some(index) = self.table.lookup_named(index_name) else {
                        return Err(ParseError::new(
                            ErrorCode::E2002,
                            format!("unknown type `{}`", self.text(index_name)),
                            dim_token.span,
                        ));
                    };
                    let valid = matches!(
                        self.table.get(index),
                        Type::Primitive(p) if p.is_valid_index()
                    );
                    if !valid {
                        return Err(ParseError::new(
                            ErrorCode::E2008,
                            format!("`{}` cannot index a map", self.ty_name(index)),
                            dim_token.span,
                        ));
                    }
                    Dim::Keyed(index)
                }
                other => {
                    return Err(ParseError::new(
                        ErrorCode::E1006,
                        format!("expected array size or index type, found {}", other.describe()),
                        dim_token.span,
                    ));
                }
            };
            self.cursor.advance();
            dims.push(dim);
            if !self.cursor.bump_if(TokenKind::Comma) {
                break;
            }
        }
        self.cursor.expect(TokenKind::RBracket, ErrorCode::E1003)?;

        // Rightmost dimension is innermost; fold outward.
        let mut ty = base;
        for dim in dims.iter().rev() {
            ty = match *dim {
                Dim::Fixed(size) => self.table.alloc_array(ty, size),
                // String-keyed maps fold case by default.
                Dim::Keyed(index) => self.table.alloc_map(ty, index, index == TypeId::STRING),
            };
        }
        Ok(ty)
    }

    // ---- statements ----

    fn statement(&mut self, out: &mut Vec<Stmt>) -> PResult<()> {
        match self.cursor.kind() {
            TokenKind::If => self.if_stmt(out),
            TokenKind::While => self.while_stmt(out),
            TokenKind::Repeat => self.repeat_stmt(out),
            TokenKind::Foreach => self.foreach_stmt(out),
            TokenKind::Break | TokenKind::Continue => self.break_continue(out),
            TokenKind::Return => self.return_stmt(out),
            TokenKind::Record => Err(ParseError::new(
                ErrorCode::E1001,
                "record declarations are only allowed at top level",
                self.cursor.span(),
            )),
            TokenKind::Ident(name) if self.table.lookup_named(name).is_some() => {
                let start = self.cursor.span();
                let ty = self.parse_type()?;
                let (name, name_span) = self.expect_ident()?;
                self.declaration(out, ty, name, name_span, start)
            }
            _ => self.expr_stmt(out),
        }
    }

    fn declaration(
        &mut self,
        out: &mut Vec<Stmt>,
        ty: TypeId,
        first_name: Name,
        first_span: Span,
        start: Span,
    ) -> PResult<()> {
        if ty == TypeId::VOID {
            return Err(ParseError::new(
                ErrorCode::E2001,
                "cannot declare a variable of type `void`",
                start,
            ));
        }
        let mut name = first_name;
        let mut name_span = first_span;
        loop {
            let init = if self.cursor.bump_if(TokenKind::Assign) {
                self.initializer(ty)?
            } else {
                ExprId::INVALID
            };
            self.declare(name, ty, name_span)?;
            out.push(Stmt::new(
                StmtKind::VarDecl { name, ty, init },
                start.merge(self.cursor.prev_span()),
            ));
            if self.cursor.bump_if(TokenKind::Comma) {
                let (next_name, next_span) = self.expect_ident()?;
                name = next_name;
                name_span = next_span;
            } else {
                break;
            }
        }
        self.cursor.expect(TokenKind::Semi, ErrorCode::E1001)?;
        Ok(())
    }

    /// An initializer or assignment right-hand side: a brace literal
    /// adopts the expected type, anything else must coerce to it.
    fn initializer(&mut self, expected: TypeId) -> PResult<ExprId> {
        if self.cursor.check(TokenKind::LBrace) {
            return self.aggregate_literal(Some(expected));
        }
        let value = self.expr()?;
        self.check_assignable(value, expected)?;
        Ok(value)
    }

    /// A block body: braced statement list, or a single statement.
    /// Opens a fresh lexical scope either way.
    fn block(&mut self) -> PResult<StmtRange> {
        self.scopes.push(FxHashMap::default());
        let mut stmts = Vec::new();
        let result = if self.cursor.bump_if(TokenKind::LBrace) {
            while !self.cursor.check(TokenKind::RBrace) && !self.cursor.at_eof() {
                let before = self.cursor.pos();
                if let Err(err) = self.statement(&mut stmts) {
                    self.recover(err, before);
                }
            }
            self.cursor.expect(TokenKind::RBrace, ErrorCode::E1003).map(|_| ())
        } else {
            self.statement(&mut stmts)
        };
        self.scopes.pop();
        result?;
        Ok(self.arena.alloc_block(stmts))
    }

    fn if_stmt(&mut self, out: &mut Vec<Stmt>) -> PResult<()> {
        let start = self.cursor.span();
        self.cursor.advance(); // if
        self.cursor.expect(TokenKind::LParen, ErrorCode::E1001)?;
        let cond = self.expr()?;
        self.require_boolean(cond, "if condition")?;
        self.cursor.expect(TokenKind::RParen, ErrorCode::E1003)?;
        let then_body = self.block()?;
        // `else if` rides the single-statement body path.
        let else_body = if self.cursor.bump_if(TokenKind::Else) {
            self.block()?
        } else {
            StmtRange::EMPTY
        };
        out.push(Stmt::new(
            StmtKind::If {
                cond,
                then_body,
                else_body,
            },
            start.merge(self.cursor.prev_span()),
        ));
        Ok(())
    }

    fn while_stmt(&mut self, out: &mut Vec<Stmt>) -> PResult<()> {
        let start = self.cursor.span();
        self.cursor.advance(); // while
        self.cursor.expect(TokenKind::LParen, ErrorCode::E1001)?;
        let cond = self.expr()?;
        self.require_boolean(cond, "while condition")?;
        self.cursor.expect(TokenKind::RParen, ErrorCode::E1003)?;
        self.loop_depth += 1;
        let body = self.block();
        self.loop_depth -= 1;
        let body = body?;
        out.push(Stmt::new(
            StmtKind::While { cond, body },
            start.merge(self.cursor.prev_span()),
        ));
        Ok(())
    }

    fn repeat_stmt(&mut self, out: &mut Vec<Stmt>) -> PResult<()> {
        let start = self.cursor.span();
        self.cursor.advance(); // repeat
        self.loop_depth += 1;
        let body = self.block();
        self.loop_depth -= 1;
        let body = body?;
        self.cursor.expect(TokenKind::Until, ErrorCode::E1001)?;
        self.cursor.expect(TokenKind::LParen, ErrorCode::E1001)?;
        let until = self.expr()?;
        self.require_boolean(until, "until condition")?;
        self.cursor.expect(TokenKind::RParen, ErrorCode::E1003)?;
        self.cursor.expect(TokenKind::Semi, ErrorCode::E1001)?;
        out.push(Stmt::new(
            StmtKind::Repeat { body, until },
            start.merge(self.cursor.prev_span()),
        ));
        Ok(())
    }

    fn foreach_stmt(&mut self, out: &mut Vec<Stmt>) -> PResult<()> {
        let start = self.cursor.span();
        self.cursor.advance(); // foreach
        let (var, var_span) = self.expect_ident()?;
        self.cursor.expect(TokenKind::In, ErrorCode::E1001)?;
        let iterable = self.expr()?;
        let iter_ty = self.expr_ty(iterable);
        let Some(agg) = self.table.get(iter_ty).as_aggregate().copied() else {
            return Err(ParseError::new(
                ErrorCode::E2001,
                format!(
                    "foreach needs an array or map, found `{}`",
                    self.ty_name(iter_ty)
                ),
                self.expr_span(iterable),
            ));
        };
        // The loop variable holds array indices or map keys; both are
        // the aggregate's index type.
        self.scopes.push(FxHashMap::default());
        let declared = self.declare(var, agg.index, var_span);
        self.loop_depth += 1;
        let body = declared.and_then(|()| self.block());
        self.loop_depth -= 1;
        self.scopes.pop();
        let body = body?;
        out.push(Stmt::new(
            StmtKind::Foreach {
                var,
                iterable,
                body,
            },
            start.merge(self.cursor.prev_span()),
        ));
        Ok(())
    }

    fn break_continue(&mut self, out: &mut Vec<Stmt>) -> PResult<()> {
        let token = self.cursor.advance();
        if self.loop_depth == 0 {
            return Err(ParseError::new(
                ErrorCode::E2012,
                format!("{} outside a loop", token.kind.describe()),
                token.span,
            ));
        }
        self.cursor.expect(TokenKind::Semi, ErrorCode::E1001)?;
        let kind = if matches!(token.kind, TokenKind::Break) {
            StmtKind::Break
        } else {
            StmtKind::Continue
        };
        out.push(Stmt::new(kind, token.span));
        Ok(())
    }

    fn return_stmt(&mut self, out: &mut Vec<Stmt>) -> PResult<()> {
        let start = self.cursor.span();
        self.cursor.advance(); // return
        let Some(ret) = self.return_ty else {
            return Err(ParseError::new(
                ErrorCode::E2011,
                "return outside a function",
                start,
            ));
        };
        if self.cursor.bump_if(TokenKind::Semi) {
            if ret != TypeId::VOID {
                return Err(ParseError::new(
                    ErrorCode::E2011,
                    format!("missing return value of type `{}`", self.ty_name(ret)),
                    start,
                ));
            }
            out.push(Stmt::new(StmtKind::Return(ExprId::INVALID), start));
            return Ok(());
        }
        if ret == TypeId::VOID {
            return Err(ParseError::new(
                ErrorCode::E2011,
                "void function cannot return a value",
                self.cursor.span(),
            ));
        }
        let value = self.initializer(ret)?;
        self.cursor.expect(TokenKind::Semi, ErrorCode::E1001)?;
        out.push(Stmt::new(
            StmtKind::Return(value),
            start.merge(self.cursor.prev_span()),
        ));
        Ok(())
    }

    fn expr_stmt(&mut self, out: &mut Vec<Stmt>) -> PResult<()> {
        let start = self.cursor.span();
        let target = self.expr()?;
        if self.cursor.bump_if(TokenKind::Assign) {
            if !self.is_lvalue(target) {
                return Err(ParseError::new(
                    ErrorCode::E2010,
                    "invalid assignment target",
                    self.expr_span(target),
                ));
            }
            let value = self.initializer(self.expr_ty(target))?;
            self.cursor.expect(TokenKind::Semi, ErrorCode::E1001)?;
            out.push(Stmt::new(
                StmtKind::Assign { target, value },
                start.merge(self.cursor.prev_span()),
            ));
        } else {
            self.cursor.expect(TokenKind::Semi, ErrorCode::E1001)?;
            out.push(Stmt::new(
                StmtKind::Expr(target),
                start.merge(self.cursor.prev_span()),
            ));
        }
        Ok(())
    }

    /// An assignable place: a variable, or an index/field chain rooted
    /// at one.
    fn is_lvalue(&self, expr: ExprId) -> bool {
        match self.arena.expr(expr).kind {
            ExprKind::Ident(_) => true,
            ExprKind::Index { base, .. } | ExprKind::Field { base, .. } => self.is_lvalue(base),
            _ => false,
        }
    }

    // ---- expressions ----

    fn expr(&mut self) -> PResult<ExprId> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> PResult<ExprId> {
        let mut lhs = self.and_expr()?;
        while self.cursor.bump_if(TokenKind::PipePipe) {
            let rhs = self.and_expr()?;
            lhs = self.logical(BinaryOp::Or, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> PResult<ExprId> {
        let mut lhs = self.equality()?;
        while self.cursor.bump_if(TokenKind::AmpAmp) {
            let rhs = self.equality()?;
            lhs = self.logical(BinaryOp::And, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn logical(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId) -> PResult<ExprId> {
        self.require_boolean(lhs, "logical operand")?;
        self.require_boolean(rhs, "logical operand")?;
        let span = self.expr_span(lhs).merge(self.expr_span(rhs));
        Ok(self.arena.alloc_expr(Expr::new(
            ExprKind::Binary { op, lhs, rhs },
            span,
            TypeId::BOOLEAN,
        )))
    }

    fn equality(&mut self) -> PResult<ExprId> {
        let mut lhs = self.comparison()?;
        loop {
            let op = match self.cursor.kind() {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::BangEq => BinaryOp::Ne,
                _ => break,
            };
            self.cursor.advance();
            let rhs = self.comparison()?;
            let (lt, rt) = (self.expr_ty(lhs), self.expr_ty(rhs));
            if coercion_cost(self.table, lt, rt).is_none()
                && coercion_cost(self.table, rt, lt).is_none()
            {
                return Err(ParseError::new(
                    ErrorCode::E2001,
                    format!(
                        "cannot compare `{}` and `{}`",
                        self.ty_name(lt),
                        self.ty_name(rt)
                    ),
                    self.expr_span(lhs).merge(self.expr_span(rhs)),
                ));
            }
            let span = self.expr_span(lhs).merge(self.expr_span(rhs));
            lhs = self.arena.alloc_expr(Expr::new(
                ExprKind::Binary { op, lhs, rhs },
                span,
                TypeId::BOOLEAN,
            ));
        }
        Ok(lhs)
    }

    fn comparison(&mut self) -> PResult<ExprId> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.cursor.kind() {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Le => BinaryOp::Le,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::Ge => BinaryOp::Ge,
                _ => break,
            };
            self.cursor.advance();
            let rhs = self.term()?;
            let (lt, rt) = (self.expr_ty(lhs), self.expr_ty(rhs));
            let ordered = (Self::is_numeric(lt) && Self::is_numeric(rt))
                || (lt == TypeId::STRING && rt == TypeId::STRING);
            if !ordered {
                return Err(ParseError::new(
                    ErrorCode::E2001,
                    format!(
                        "cannot order `{}` and `{}`",
                        self.ty_name(lt),
                        self.ty_name(rt)
                    ),
                    self.expr_span(lhs).merge(self.expr_span(rhs)),
                ));
            }
            let span = self.expr_span(lhs).merge(self.expr_span(rhs));
            lhs = self.arena.alloc_expr(Expr::new(
                ExprKind::Binary { op, lhs, rhs },
                span,
                TypeId::BOOLEAN,
            ));
        }
        Ok(lhs)
    }

    fn term(&mut self) -> PResult<ExprId> {
        let mut lhs = self.factor()?;
        loop {
            let op = match self.cursor.kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.cursor.advance();
            let rhs = self.factor()?;
            lhs = self.arith(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn factor(&mut self) -> PResult<ExprId> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.cursor.kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.cursor.advance();
            let rhs = self.unary()?;
            lhs = self.arith(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn arith(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId) -> PResult<ExprId> {
        let (lt, rt) = (self.expr_ty(lhs), self.expr_ty(rhs));
        let span = self.expr_span(lhs).merge(self.expr_span(rhs));
        // `+` with a string side is concatenation; the other side
        // coerces to its display form.
        let ty = if op == BinaryOp::Add && (lt == TypeId::STRING || rt == TypeId::STRING) {
            let other = if lt == TypeId::STRING { rt } else { lt };
            if coercion_cost(self.table, other, TypeId::STRING).is_none() {
                return Err(ParseError::new(
                    ErrorCode::E2001,
                    format!("cannot concatenate `{}` to a string", self.ty_name(other)),
                    span,
                ));
            }
            TypeId::STRING
        } else if Self::is_numeric(lt) && Self::is_numeric(rt) {
            if lt == TypeId::FLOAT || rt == TypeId::FLOAT {
                TypeId::FLOAT
            } else {
                TypeId::INT
            }
        } else {
            return Err(ParseError::new(
                ErrorCode::E2001,
                format!(
                    "operator `{op}` expects numbers, found `{}` and `{}`",
                    self.ty_name(lt),
                    self.ty_name(rt)
                ),
                span,
            ));
        };
        Ok(self
            .arena
            .alloc_expr(Expr::new(ExprKind::Binary { op, lhs, rhs }, span, ty)))
    }

    fn unary(&mut self) -> PResult<ExprId> {
        let token = *self.cursor.current();
        match token.kind {
            TokenKind::Minus => {
                self.cursor.advance();
                let operand = self.unary()?;
                let ty = self.expr_ty(operand);
                if !Self::is_numeric(ty) {
                    return Err(ParseError::new(
                        ErrorCode::E2001,
                        format!("cannot negate `{}`", self.ty_name(ty)),
                        token.span.merge(self.expr_span(operand)),
                    ));
                }
                let span = token.span.merge(self.expr_span(operand));
                Ok(self.arena.alloc_expr(Expr::new(
                    ExprKind::Unary {
                        op: UnaryOp::Neg,
                        operand,
                    },
                    span,
                    ty,
                )))
            }
            TokenKind::Bang => {
                self.cursor.advance();
                let operand = self.unary()?;
                self.require_boolean(operand, "operand of `!`")?;
                let span = token.span.merge(self.expr_span(operand));
                Ok(self.arena.alloc_expr(Expr::new(
                    ExprKind::Unary {
                        op: UnaryOp::Not,
                        operand,
                    },
                    span,
                    TypeId::BOOLEAN,
                )))
            }
            _ => self.postfix(),
        }
    }

    fn postfix(&mut self) -> PResult<ExprId> {
        let mut expr = self.primary()?;
        loop {
            if self.cursor.bump_if(TokenKind::LBracket) {
                let base_ty = self.expr_ty(expr);
                let Some(agg) = self.table.get(base_ty).as_aggregate().copied() else {
                    return Err(ParseError::new(
                        ErrorCode::E2001,
                        format!("cannot index into `{}`", self.ty_name(base_ty)),
                        self.expr_span(expr),
                    ));
                };
                let index = self.expr()?;
                let index_ty = self.expr_ty(index);
                if coercion_cost(self.table, index_ty, agg.index).is_none() {
                    return Err(ParseError::new(
                        ErrorCode::E2008,
                        format!(
                            "index must be `{}`, found `{}`",
                            self.ty_name(agg.index),
                            self.ty_name(index_ty)
                        ),
                        self.expr_span(index),
                    ));
                }
                self.cursor.expect(TokenKind::RBracket, ErrorCode::E1003)?;
                let span = self.expr_span(expr).merge(self.cursor.prev_span());
                expr = self.arena.alloc_expr(Expr::new(
                    ExprKind::Index { base: expr, index },
                    span,
                    agg.data,
                ));
            } else if self.cursor.bump_if(TokenKind::Dot) {
                let (field, field_span) = self.expect_ident()?;
                let base_ty = self.expr_ty(expr);
                let (field_info, record_name) = match self.table.get(base_ty) {
                    Type::Record(rec) => (rec.field(field), rec.name),
                    _ => {
                        return Err(ParseError::new(
                            ErrorCode::E2001,
                            format!("`{}` has no fields", self.ty_name(base_ty)),
                            self.expr_span(expr).merge(field_span),
                        ));
                    }
                };
                let Some((_, field_ty)) = field_info else {
                    return Err(ParseError::new(
                        ErrorCode::E2009,
                        format!(
                            "no field `{}` on record `{}`",
                            self.text(field),
                            self.text(record_name)
                        ),
                        field_span,
                    ));
                };
                let span = self.expr_span(expr).merge(field_span);
                expr = self.arena.alloc_expr(Expr::new(
                    ExprKind::Field { base: expr, field },
                    span,
                    field_ty,
                ));
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn primary(&mut self) -> PResult<ExprId> {
        let token = *self.cursor.current();
        let expr = match token.kind {
            TokenKind::Int(n) => {
                self.cursor.advance();
                Expr::new(ExprKind::Int(n), token.span, TypeId::INT)
            }
            TokenKind::Float(bits) => {
                self.cursor.advance();
                Expr::new(ExprKind::Float(bits), token.span, TypeId::FLOAT)
            }
            TokenKind::String(name) => {
                self.cursor.advance();
                Expr::new(ExprKind::String(name), token.span, TypeId::STRING)
            }
            TokenKind::True => {
                self.cursor.advance();
                Expr::new(ExprKind::Bool(true), token.span, TypeId::BOOLEAN)
            }
            TokenKind::False => {
                self.cursor.advance();
                Expr::new(ExprKind::Bool(false), token.span, TypeId::BOOLEAN)
            }
            TokenKind::Ident(name) => {
                self.cursor.advance();
                if self.cursor.check(TokenKind::LParen) {
                    return self.call(name, token.span);
                }
                let Some(ty) = self.lookup_var(name) else {
                    return Err(ParseError::new(
                        ErrorCode::E2003,
                        format!("unknown identifier `{}`", self.text(name)),
                        token.span,
                    ));
                };
                Expr::new(ExprKind::Ident(name), token.span, ty)
            }
            TokenKind::LParen => {
                self.cursor.advance();
                let inner = self.expr()?;
                self.cursor.expect(TokenKind::RParen, ErrorCode::E1003)?;
                return Ok(inner);
            }
            TokenKind::LBrace => return self.aggregate_literal(None),
            other => {
                return Err(ParseError::new(
                    ErrorCode::E1002,
                    format!("expected expression, found {}", other.describe()),
                    token.span,
                ));
            }
        };
        Ok(self.arena.alloc_expr(expr))
    }

    /// A call argument: a brace literal infers its own type here.
    fn argument(&mut self) -> PResult<ExprId> {
        if self.cursor.check(TokenKind::LBrace) {
            self.aggregate_literal(None)
        } else {
            self.expr()
        }
    }

    fn call(&mut self, callee: Name, start: Span) -> PResult<ExprId> {
        self.cursor.advance(); // (
        let mut args = Vec::new();
        if !self.cursor.check(TokenKind::RParen) {
            loop {
                args.push(self.argument()?);
                if !self.cursor.bump_if(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.cursor.expect(TokenKind::RParen, ErrorCode::E1003)?;
        let span = start.merge(self.cursor.prev_span());

        let Some(overloads) = self.sigs.get(&callee) else {
            return Err(ParseError::new(
                ErrorCode::E2006,
                format!("unknown function `{}`", self.text(callee)),
                span,
            ));
        };
        // The result type comes from the first arity-matching overload;
        // full overload selection happens at call time.
        let Some(sig) = overloads.iter().find(|sig| sig.params.len() == args.len()) else {
            return Err(ParseError::new(
                ErrorCode::E2004,
                format!(
                    "no overload of `{}` takes {} argument(s)",
                    self.text(callee),
                    args.len()
                ),
                span,
            ));
        };
        let ret = sig.ret;
        let args = self.arena.alloc_expr_list(args);
        Ok(self
            .arena
            .alloc_expr(Expr::new(ExprKind::Call { callee, args }, span, ret)))
    }

    // ---- aggregate literals ----

    /// `{e1, e2, ...}` or `{k1: v1, ...}`. With an expected type the
    /// literal adopts it and elements are checked against it; without
    /// one the type is inferred from the contents.
    fn aggregate_literal(&mut self, expected: Option<TypeId>) -> PResult<ExprId> {
        let start = self.cursor.span();
        self.cursor.advance(); // {

        let expected_agg = match expected {
            Some(ty) => match self.table.get(ty).as_aggregate().copied() {
                Some(agg) => Some(agg),
                None => {
                    return Err(ParseError::new(
                        ErrorCode::E2001,
                        format!(
                            "aggregate literal cannot initialize `{}`",
                            self.ty_name(ty)
                        ),
                        start,
                    ));
                }
            },
            None => None,
        };

        if self.cursor.bump_if(TokenKind::RBrace) {
            let span = start.merge(self.cursor.prev_span());
            let (Some(ty), Some(agg)) = (expected, expected_agg) else {
                return Err(ParseError::new(
                    ErrorCode::E1007,
                    "empty aggregate literal needs a declared type",
                    span,
                ));
            };
            let kind = if agg.is_map() {
                ExprKind::MapLit(MapEntryRange::EMPTY)
            } else {
                ExprKind::ArrayLit(ExprRange::EMPTY)
            };
            return Ok(self.arena.alloc_expr(Expr::new(kind, span, ty)));
        }

        // A nested `{` can only start an array element, never a map key.
        if self.cursor.check(TokenKind::LBrace) {
            return self.array_literal(None, expected, expected_agg, start);
        }
        let first = self.expr()?;
        if self.cursor.bump_if(TokenKind::Colon) {
            self.map_literal(first, expected, expected_agg, start)
        } else {
            self.array_literal(Some(first), expected, expected_agg, start)
        }
    }

    fn array_literal(
        &mut self,
        first: Option<ExprId>,
        expected: Option<TypeId>,
        expected_agg: Option<AggregateType>,
        start: Span,
    ) -> PResult<ExprId> {
        if let Some(agg) = expected_agg {
            if agg.is_map() {
                return Err(ParseError::new(
                    ErrorCode::E2001,
                    "expected `key: value` entries for a map",
                    start,
                ));
            }
        }
        let elem_expected = expected_agg.map(|agg| agg.data);
        let mut elems = Vec::new();
        match first {
            Some(elem) => {
                if let Some(data) = elem_expected {
                    self.check_assignable(elem, data)?;
                }
                elems.push(elem);
            }
            None => elems.push(self.element(elem_expected)?),
        }
        while self.cursor.bump_if(TokenKind::Comma) {
            if self.cursor.check(TokenKind::RBrace) {
                break; // trailing comma
            }
            elems.push(self.element(elem_expected)?);
        }
        self.cursor.expect(TokenKind::RBrace, ErrorCode::E1003)?;
        let span = start.merge(self.cursor.prev_span());

        let ty = match expected {
            Some(ty) => ty,
            None => {
                let Some(data) = self.unify(&elems) else {
                    return Err(ParseError::new(
                        ErrorCode::E2007,
                        "array literal has no common element type",
                        span,
                    ));
                };
                let len = u32::try_from(elems.len()).unwrap_or(u32::MAX);
                self.table.alloc_array(data, len)
            }
        };
        let range = self.arena.alloc_expr_list(elems);
        Ok(self
            .arena
            .alloc_expr(Expr::new(ExprKind::ArrayLit(range), span, ty)))
    }

    fn map_literal(
        &mut self,
        first_key: ExprId,
        expected: Option<TypeId>,
        expected_agg: Option<AggregateType>,
        start: Span,
    ) -> PResult<ExprId> {
        if let Some(agg) = expected_agg {
            if agg.is_array() {
                return Err(ParseError::new(
                    ErrorCode::E2001,
                    "array literal cannot contain `key: value` entries",
                    start,
                ));
            }
        }
        let value_expected = expected_agg.map(|agg| agg.data);
        let mut entries = Vec::new();
        let mut keys = vec![first_key];
        let mut values = Vec::new();
        let first_value = self.element(value_expected)?;
        values.push(first_value);
        entries.push(MapEntry {
            key: first_key,
            value: first_value,
        });
        while self.cursor.bump_if(TokenKind::Comma) {
            if self.cursor.check(TokenKind::RBrace) {
                break;
            }
            let key = self.expr()?;
            self.cursor.expect(TokenKind::Colon, ErrorCode::E1001)?;
            let value = self.element(value_expected)?;
            keys.push(key);
            values.push(value);
            entries.push(MapEntry { key, value });
        }
        self.cursor.expect(TokenKind::RBrace, ErrorCode::E1003)?;
        let span = start.merge(self.cursor.prev_span());

        let ty = match (expected, expected_agg) {
            (Some(ty), Some(agg)) => {
                for &key in &keys {
                    if coercion_cost(self.table, self.expr_ty(key), agg.index).is_none() {
                        return Err(ParseError::new(
                            ErrorCode::E2008,
                            format!(
                                "map key must be `{}`, found `{}`",
                                self.ty_name(agg.index),
                                self.ty_name(self.expr_ty(key))
                            ),
                            self.expr_span(key),
                        ));
                    }
                }
                ty
            }
            _ => {
                let index = self.expr_ty(keys[0]);
                let valid = matches!(
                    self.table.get(index),
                    Type::Primitive(p) if p.is_valid_index()
                );
                if !valid {
                    return Err(ParseError::new(
                        ErrorCode::E2008,
                        format!("`{}` cannot index a map", self.ty_name(index)),
                        self.expr_span(keys[0]),
                    ));
                }
                if keys
                    .iter()
                    .any(|&key| !self.table.equals(self.expr_ty(key), index))
                {
                    return Err(ParseError::new(
                        ErrorCode::E2007,
                        "map literal keys have no common type",
                        span,
                    ));
                }
                let Some(data) = self.unify(&values) else {
                    return Err(ParseError::new(
                        ErrorCode::E2007,
                        "map literal values have no common type",
                        span,
                    ));
                };
                self.table.alloc_map(data, index, index == TypeId::STRING)
            }
        };
        let range = self.arena.alloc_map_entries(entries);
        Ok(self
            .arena
            .alloc_expr(Expr::new(ExprKind::MapLit(range), span, ty)))
    }

    /// One array element or map value inside a literal.
    fn element(&mut self, expected: Option<TypeId>) -> PResult<ExprId> {
        if self.cursor.check(TokenKind::LBrace) {
            return self.aggregate_literal(expected);
        }
        let elem = self.expr()?;
        if let Some(ty) = expected {
            self.check_assignable(elem, ty)?;
        }
        Ok(elem)
    }

    /// Common type of the given expressions: all equal, or mixed
    /// int/float unifying to float.
    fn unify(&self, exprs: &[ExprId]) -> Option<TypeId> {
        let mut common = self.expr_ty(*exprs.first()?);
        for &expr in &exprs[1..] {
            let ty = self.expr_ty(expr);
            if self.table.equals(ty, common) {
                continue;
            }
            if Self::is_numeric(ty) && Self::is_numeric(common) {
                common = TypeId::FLOAT;
            } else {
                return None;
            }
        }
        Some(common)
    }
}
