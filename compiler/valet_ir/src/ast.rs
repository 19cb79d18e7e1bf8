//! AST nodes for Valet scripts.
//!
//! All children are indices into `ScriptArena`, not boxes. Every
//! expression carries the `TypeId` the parser resolved for it; the
//! evaluator never re-infers types.

use std::fmt;

use crate::{ExprId, ExprRange, MapEntryRange, Name, ParamRange, Span, StmtRange, TypeId};

/// Unary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    /// Arithmetic negation: `-x`
    Neg,
    /// Logical not: `!b`
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Neg => f.write_str("-"),
            UnaryOp::Not => f.write_str("!"),
        }
    }
}

/// Binary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Short-circuit logical AND.
    And,
    /// Short-circuit logical OR.
    Or,
}

impl BinaryOp {
    /// Check if this operator short-circuits.
    pub fn is_short_circuit(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    /// Check if this is a comparison operator (result type boolean).
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        };
        f.write_str(s)
    }
}

/// Expression node, annotated with its resolved type.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    /// Type resolved bottom-up during the single parse pass.
    pub ty: TypeId,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span, ty: TypeId) -> Self {
        Expr { kind, span, ty }
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} : {:?} @ {:?}", self.kind, self.ty, self.span)
    }
}

/// Expression variants.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ExprKind {
    /// Integer literal: `42`
    Int(i64),
    /// Float literal (stored as bits): `3.14`
    Float(u64),
    /// Boolean literal: `true`, `false`
    Bool(bool),
    /// String literal (interned, escapes cooked)
    String(Name),
    /// Variable reference
    Ident(Name),
    /// Unary operation
    Unary { op: UnaryOp, operand: ExprId },
    /// Binary operation
    Binary {
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    /// Function call; overload selection happens at call time.
    Call { callee: Name, args: ExprRange },
    /// Aggregate element access: `a[i]`
    Index { base: ExprId, index: ExprId },
    /// Record field access: `r.f`
    Field { base: ExprId, field: Name },
    /// Array-form aggregate literal: `{1, 2, 3}`
    ArrayLit(ExprRange),
    /// Map-form aggregate literal: `{"a": 1, "b": 2}`
    MapLit(MapEntryRange),
}

/// One `key: value` entry of a map literal.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct MapEntry {
    pub key: ExprId,
    pub value: ExprId,
}

/// Statement node.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Stmt { kind, span }
    }
}

impl fmt::Debug for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} @ {:?}", self.kind, self.span)
    }
}

/// Statement kinds.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum StmtKind {
    /// Expression statement (usually a call)
    Expr(ExprId),
    /// Variable declaration; `init` is `ExprId::INVALID` when the
    /// variable starts at its type's zero value.
    VarDecl {
        name: Name,
        ty: TypeId,
        init: ExprId,
    },
    /// Assignment to a variable, element, or field lvalue.
    Assign { target: ExprId, value: ExprId },
    /// Conditional; `else if` chains nest as a single-statement else body.
    If {
        cond: ExprId,
        then_body: StmtRange,
        else_body: StmtRange,
    },
    /// Pre-test loop.
    While { cond: ExprId, body: StmtRange },
    /// Post-test loop: `repeat { ... } until (cond);`
    Repeat { body: StmtRange, until: ExprId },
    /// Iteration over an aggregate: array indices in order, map keys in
    /// first-write order.
    Foreach {
        var: Name,
        iterable: ExprId,
        body: StmtRange,
    },
    Break,
    Continue,
    /// Return; `value` is `ExprId::INVALID` for void functions.
    Return(ExprId),
}

/// Function parameter.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Param {
    pub name: Name,
    pub ty: TypeId,
    pub span: Span,
}

/// A user-defined function.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct FunctionDecl {
    pub name: Name,
    pub params: ParamRange,
    pub return_ty: TypeId,
    pub body: StmtRange,
    pub span: Span,
}

/// A fully parsed, type-checked script.
#[derive(Clone, Debug, Default)]
pub struct Script {
    /// Arena holding every node of this script.
    pub arena: crate::ScriptArena,
    /// User-defined functions, in declaration order.
    pub functions: Vec<FunctionDecl>,
    /// Top-level statements.
    pub body: StmtRange,
}
