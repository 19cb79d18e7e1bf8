//! Arena allocation for the flat AST.
//!
//! Contiguous storage for all nodes of one script; child references are
//! IDs, lists are ranges into flattened side arrays. Nested blocks stay
//! contiguous because the parser collects each block into a temporary
//! buffer and allocates it in one call.

use crate::ast::{Expr, MapEntry, Param, Stmt};
use crate::{ExprId, ExprRange, MapEntryRange, ParamRange, StmtId, StmtRange};
use std::fmt;

/// Contiguous storage for all nodes in a script.
#[derive(Clone, Default, Eq, PartialEq)]
pub struct ScriptArena {
    /// All expressions (indexed by `ExprId`).
    exprs: Vec<Expr>,
    /// Flattened expression lists (call args, array literal elements).
    expr_lists: Vec<ExprId>,
    /// All statements (indexed by `StmtId`); each block body is one
    /// contiguous run.
    stmts: Vec<Stmt>,
    /// Map literal entries.
    map_entries: Vec<MapEntry>,
    /// Function parameters.
    params: Vec<Param>,
}

impl ScriptArena {
    /// Create a new empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with estimated capacity based on source size.
    /// Heuristic: ~1 expression per 20 bytes of source.
    pub fn with_capacity(source_len: usize) -> Self {
        let estimated = source_len / 20;
        ScriptArena {
            exprs: Vec::with_capacity(estimated),
            expr_lists: Vec::with_capacity(estimated / 2),
            stmts: Vec::with_capacity(estimated / 4),
            map_entries: Vec::with_capacity(estimated / 16),
            params: Vec::with_capacity(estimated / 8),
        }
    }

    /// Allocate an expression, returning its ID.
    #[inline]
    pub fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId::new(u32::try_from(self.exprs.len()).unwrap_or(u32::MAX - 1));
        self.exprs.push(expr);
        id
    }

    /// Get an expression by ID.
    ///
    /// # Panics
    /// Panics if `id` is out of bounds or `INVALID`.
    #[inline]
    #[track_caller]
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    /// Number of allocated expressions.
    #[inline]
    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    /// Allocate an expression list, returning its range.
    pub fn alloc_expr_list(&mut self, ids: impl IntoIterator<Item = ExprId>) -> ExprRange {
        let start = u32::try_from(self.expr_lists.len()).unwrap_or(u32::MAX);
        self.expr_lists.extend(ids);
        let len = (self.expr_lists.len() - start as usize).min(u16::MAX as usize) as u16;
        ExprRange::new(start, len)
    }

    /// Get an expression list by range.
    #[inline]
    pub fn expr_list(&self, range: ExprRange) -> &[ExprId] {
        let start = range.start as usize;
        &self.expr_lists[start..start + range.len()]
    }

    /// Allocate a contiguous block of statements, returning its range.
    pub fn alloc_block(&mut self, block: impl IntoIterator<Item = Stmt>) -> StmtRange {
        let start = u32::try_from(self.stmts.len()).unwrap_or(u32::MAX);
        self.stmts.extend(block);
        let len = (self.stmts.len() - start as usize).min(u16::MAX as usize) as u16;
        StmtRange::new(start, len)
    }

    /// Get a statement by ID.
    ///
    /// # Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    #[track_caller]
    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    /// Get a block body by range.
    #[inline]
    pub fn block(&self, range: StmtRange) -> &[Stmt] {
        let start = range.start as usize;
        &self.stmts[start..start + range.len()]
    }

    /// Allocate map entries, returning their range.
    pub fn alloc_map_entries(
        &mut self,
        entries: impl IntoIterator<Item = MapEntry>,
    ) -> MapEntryRange {
        let start = u32::try_from(self.map_entries.len()).unwrap_or(u32::MAX);
        self.map_entries.extend(entries);
        let len = (self.map_entries.len() - start as usize).min(u16::MAX as usize) as u16;
        MapEntryRange::new(start, len)
    }

    /// Get map entries by range.
    #[inline]
    pub fn map_entries(&self, range: MapEntryRange) -> &[MapEntry] {
        let start = range.start as usize;
        &self.map_entries[start..start + range.len()]
    }

    /// Allocate parameters, returning their range.
    pub fn alloc_params(&mut self, params: impl IntoIterator<Item = Param>) -> ParamRange {
        let start = u32::try_from(self.params.len()).unwrap_or(u32::MAX);
        self.params.extend(params);
        let len = (self.params.len() - start as usize).min(u16::MAX as usize) as u16;
        ParamRange::new(start, len)
    }

    /// Get parameters by range.
    #[inline]
    pub fn params(&self, range: ParamRange) -> &[Param] {
        let start = range.start as usize;
        &self.params[start..start + range.len()]
    }

    /// Check if the arena holds no expressions.
    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }
}

impl fmt::Debug for ScriptArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ScriptArena {{ {} exprs, {} lists, {} stmts, {} params }}",
            self.exprs.len(),
            self.expr_lists.len(),
            self.stmts.len(),
            self.params.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ExprKind;
    use crate::{Span, TypeId};

    fn int_expr(n: i64) -> Expr {
        Expr::new(ExprKind::Int(n), Span::DUMMY, TypeId::INT)
    }

    #[test]
    fn alloc_expr_ids_are_dense() {
        let mut arena = ScriptArena::new();
        let a = arena.alloc_expr(int_expr(1));
        let b = arena.alloc_expr(int_expr(2));
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert!(matches!(arena.expr(a).kind, ExprKind::Int(1)));
    }

    #[test]
    fn expr_list_roundtrip() {
        let mut arena = ScriptArena::new();
        let ids: Vec<ExprId> = (0..3).map(|n| arena.alloc_expr(int_expr(n))).collect();
        let range = arena.alloc_expr_list(ids.iter().copied());
        assert_eq!(arena.expr_list(range), ids.as_slice());
    }

    #[test]
    fn nested_blocks_stay_contiguous() {
        let mut arena = ScriptArena::new();
        let inner = arena.alloc_block(vec![
            Stmt::new(crate::ast::StmtKind::Break, Span::DUMMY),
            Stmt::new(crate::ast::StmtKind::Continue, Span::DUMMY),
        ]);
        let cond = arena.alloc_expr(Expr::new(
            ExprKind::Bool(true),
            Span::DUMMY,
            TypeId::BOOLEAN,
        ));
        let outer = arena.alloc_block(vec![Stmt::new(
            crate::ast::StmtKind::While { cond, body: inner },
            Span::DUMMY,
        )]);
        assert_eq!(arena.block(inner).len(), 2);
        assert_eq!(arena.block(outer).len(), 1);
    }
}
