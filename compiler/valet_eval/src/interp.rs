//! The tree-walking interpreter.
//!
//! Walks the arena AST directly; the parser already resolved every
//! expression's type, so evaluation never re-infers. Non-local exits
//! travel as [`Control`] through the `Err` position and are handled at
//! loop and function boundaries.

use std::rc::Rc;

use valet_ir::{
    BinaryOp, ExprId, ExprKind, ExprRange, MapEntryRange, Name, Script, Span, Stmt, StmtId,
    StmtKind, StmtRange, StringInterner, TypeId, UnaryOp,
};
use valet_types::{AggregateSize, TypeTable};

use crate::registry::{FunctionRegistry, ResolveFailure, Target};
use crate::{
    ArrayValue, CancelToken, Control, Environment, EvalResult, MapValue, RuntimeError,
    RuntimeErrorKind, Value,
};

/// How a run ended, when it did not fail.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Termination {
    Completed,
    /// The host's cancel token was set mid-run.
    Aborted,
}

/// One evaluation of a parsed script.
pub struct Interpreter<'a> {
    script: &'a Script,
    table: &'a TypeTable,
    interner: &'a StringInterner,
    registry: &'a FunctionRegistry,
    env: Environment,
    cancel: CancelToken,
}

/// One step of an lvalue path, outermost first.
enum PathStep {
    Index(Value, Span),
    Field(usize),
}

impl<'a> Interpreter<'a> {
    pub fn new(
        script: &'a Script,
        table: &'a TypeTable,
        interner: &'a StringInterner,
        registry: &'a FunctionRegistry,
        cancel: CancelToken,
    ) -> Self {
        Interpreter {
            script,
            table,
            interner,
            registry,
            env: Environment::new(),
            cancel,
        }
    }

    /// Execute the script's top-level body.
    pub fn run(&mut self) -> Result<Termination, RuntimeError> {
        tracing::debug!(
            functions = self.script.functions.len(),
            "starting evaluation"
        );
        match self.exec_block(self.script.body) {
            Ok(()) => Ok(Termination::Completed),
            Err(Control::Abort) => Ok(Termination::Aborted),
            Err(Control::Runtime(err)) => Err(err),
            // The parser rejects top-level return/break/continue.
            Err(Control::Return(_) | Control::Break | Control::Continue) => {
                Ok(Termination::Completed)
            }
        }
    }

    /// Copy of the global scope, for host-side persistence.
    pub fn snapshot_globals(&self) -> rustc_hash::FxHashMap<Name, Value> {
        self.env.snapshot_globals()
    }

    /// Restore global bindings from an earlier snapshot.
    pub fn restore_globals(&mut self, snapshot: rustc_hash::FxHashMap<Name, Value>) {
        self.env.restore_globals(snapshot);
    }

    // ---- statements ----

    fn exec_block(&mut self, range: StmtRange) -> EvalResult<()> {
        for offset in 0..range.len {
            let stmt = *self.script.arena.stmt(StmtId::new(range.start + u32::from(offset)));
            self.exec_stmt(&stmt)?;
        }
        Ok(())
    }

    /// Execute a block in a fresh scope that dies with it.
    fn exec_scoped(&mut self, range: StmtRange) -> EvalResult<()> {
        self.env.push_scope();
        let result = self.exec_block(range);
        self.env.pop_scope();
        result
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> EvalResult<()> {
        match stmt.kind {
            StmtKind::Expr(expr) => {
                self.eval(expr)?;
                Ok(())
            }
            StmtKind::VarDecl { name, ty, init } => {
                let value = if init.is_present() {
                    let value = self.eval(init)?;
                    coerce(value, ty)
                } else {
                    Value::initial(self.table, ty)
                };
                self.env.define(name, value);
                Ok(())
            }
            StmtKind::Assign { target, value } => {
                let value = self.eval(value)?;
                self.assign_path(target, value)
            }
            StmtKind::If {
                cond,
                then_body,
                else_body,
            } => {
                if self.eval_bool(cond)? {
                    self.exec_scoped(then_body)
                } else if !else_body.is_empty() {
                    self.exec_scoped(else_body)
                } else {
                    Ok(())
                }
            }
            StmtKind::While { cond, body } => {
                loop {
                    self.check_cancel()?;
                    if !self.eval_bool(cond)? {
                        break;
                    }
                    match self.exec_scoped(body) {
                        Ok(()) | Err(Control::Continue) => {}
                        Err(Control::Break) => break,
                        Err(other) => return Err(other),
                    }
                }
                Ok(())
            }
            StmtKind::Repeat { body, until } => {
                loop {
                    self.check_cancel()?;
                    match self.exec_scoped(body) {
                        Ok(()) | Err(Control::Continue) => {}
                        Err(Control::Break) => break,
                        Err(other) => return Err(other),
                    }
                    if self.eval_bool(until)? {
                        break;
                    }
                }
                Ok(())
            }
            StmtKind::Foreach {
                var,
                iterable,
                body,
            } => self.exec_foreach(var, iterable, body, stmt.span),
            StmtKind::Break => Err(Control::Break),
            StmtKind::Continue => Err(Control::Continue),
            StmtKind::Return(value) => {
                let value = if value.is_present() {
                    self.eval(value)?
                } else {
                    Value::Void
                };
                Err(Control::Return(value))
            }
        }
    }

    fn exec_foreach(
        &mut self,
        var: Name,
        iterable: ExprId,
        body: StmtRange,
        span: Span,
    ) -> EvalResult<()> {
        let collection = self.eval(iterable)?;
        // Arrays iterate indices in order; maps iterate keys in
        // first-write order, snapshotted so the body may mutate freely.
        let keys: Vec<Value> = match &collection {
            Value::Array(arr) => (0..arr.elems.len() as i64).map(Value::Int).collect(),
            Value::Map(map) => map.keys().cloned().collect(),
            other => {
                return Err(self.invalid_value(other, "array or map", span));
            }
        };
        for key in keys {
            self.check_cancel()?;
            self.env.push_scope();
            self.env.define(var, key);
            let result = self.exec_scoped(body);
            self.env.pop_scope();
            match result {
                Ok(()) | Err(Control::Continue) => {}
                Err(Control::Break) => break,
                Err(other) => return Err(other),
            }
        }
        Ok(())
    }

    // ---- assignment ----

    fn assign_path(&mut self, target: ExprId, value: Value) -> EvalResult<()> {
        // Evaluate the path before borrowing the slot: index
        // expressions may run arbitrary code.
        let mut steps: Vec<PathStep> = Vec::new();
        let mut cursor = target;
        let root = loop {
            let expr = *self.script.arena.expr(cursor);
            match expr.kind {
                ExprKind::Ident(name) => break name,
                ExprKind::Index { base, index } => {
                    let index_span = self.script.arena.expr(index).span;
                    let key = self.eval(index)?;
                    let base_ty = self.script.arena.expr(base).ty;
                    let key = match self.table.get(base_ty).as_aggregate() {
                        Some(agg) => coerce(key, agg.index),
                        None => key,
                    };
                    steps.push(PathStep::Index(key, index_span));
                    cursor = base;
                }
                ExprKind::Field { base, field } => {
                    let base_ty = self.script.arena.expr(base).ty;
                    let Some((position, _)) = self
                        .table
                        .get(base_ty)
                        .as_record()
                        .and_then(|rec| rec.field(field))
                    else {
                        return Err(self.unbound(field, expr.span));
                    };
                    steps.push(PathStep::Field(position));
                    cursor = base;
                }
                _ => {
                    return Err(Control::Runtime(RuntimeError::new(
                        RuntimeErrorKind::UnboundVariable {
                            name: "assignment target".to_string(),
                        },
                        expr.span,
                    )));
                }
            }
        };
        steps.reverse();
        let value = coerce(value, self.script.arena.expr(target).ty);
        let root_span = self.script.arena.expr(target).span;

        let table = self.table;
        let interner = self.interner;
        let Some(mut slot) = self.env.lookup_mut(root) else {
            return Err(Control::Runtime(RuntimeError::new(
                RuntimeErrorKind::UnboundVariable {
                    name: interner.lookup(root).to_string(),
                },
                root_span,
            )));
        };
        for step in steps {
            slot = match (slot, step) {
                (Value::Array(arr), PathStep::Index(key, span)) => {
                    let index = key.as_int().unwrap_or(-1);
                    let len = arr.elems.len();
                    if index < 0 || index as usize >= len {
                        return Err(Control::Runtime(RuntimeError::new(
                            RuntimeErrorKind::IndexOutOfBounds { index, len },
                            span,
                        )));
                    }
                    &mut arr.elems[index as usize]
                }
                // Writes vivify absent map keys.
                (Value::Map(map), PathStep::Index(key, _)) => {
                    let zero = Value::initial(table, map.data_ty);
                    map.slot(key, zero)
                }
                (Value::Record(rec), PathStep::Field(position)) => &mut rec.fields[position],
                (other, _) => {
                    return Err(Control::Runtime(RuntimeError::new(
                        RuntimeErrorKind::InvalidCoercion {
                            from: kind_name(other).to_string(),
                            to: "aggregate".to_string(),
                        },
                        root_span,
                    )));
                }
            };
        }
        *slot = value;
        Ok(())
    }

    // ---- expressions ----

    fn eval(&mut self, id: ExprId) -> EvalResult<Value> {
        let expr = *self.script.arena.expr(id);
        match expr.kind {
            ExprKind::Int(n) => Ok(Value::Int(n)),
            ExprKind::Float(bits) => Ok(Value::Float(f64::from_bits(bits))),
            ExprKind::Bool(b) => Ok(Value::Boolean(b)),
            ExprKind::String(name) => Ok(Value::String(Rc::from(self.interner.lookup(name)))),
            ExprKind::Ident(name) => match self.env.lookup(name) {
                Some(value) => Ok(value.clone()),
                None => Err(self.unbound(name, expr.span)),
            },
            ExprKind::Unary { op, operand } => {
                let value = self.eval(operand)?;
                match (op, value) {
                    (UnaryOp::Neg, Value::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
                    (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
                    (UnaryOp::Not, Value::Boolean(b)) => Ok(Value::Boolean(!b)),
                    (_, other) => Err(self.invalid_value(&other, "number or boolean", expr.span)),
                }
            }
            ExprKind::Binary { op, lhs, rhs } => self.eval_binary(op, lhs, rhs, expr.ty, expr.span),
            ExprKind::Call { callee, args } => self.eval_call(callee, args, expr.span),
            ExprKind::Index { base, index } => self.eval_index(base, index, expr.span),
            ExprKind::Field { base, field } => {
                let base_ty = self.script.arena.expr(base).ty;
                let Some((position, _)) = self
                    .table
                    .get(base_ty)
                    .as_record()
                    .and_then(|rec| rec.field(field))
                else {
                    return Err(self.unbound(field, expr.span));
                };
                let base_value = self.eval(base)?;
                match base_value {
                    Value::Record(rec) => Ok(rec.fields[position].clone()),
                    other => Err(self.invalid_value(&other, "record", expr.span)),
                }
            }
            ExprKind::ArrayLit(elems) => self.eval_array_literal(elems, expr.ty, expr.span),
            ExprKind::MapLit(entries) => self.eval_map_literal(entries, expr.ty),
        }
    }

    fn eval_bool(&mut self, id: ExprId) -> EvalResult<bool> {
        let span = self.script.arena.expr(id).span;
        let value = self.eval(id)?;
        match value.as_bool() {
            Some(b) => Ok(b),
            None => Err(self.invalid_value(&value, "boolean", span)),
        }
    }

    fn eval_binary(
        &mut self,
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
        result_ty: TypeId,
        span: Span,
    ) -> EvalResult<Value> {
        // Short-circuit before touching the right-hand side.
        if op == BinaryOp::And {
            return Ok(Value::Boolean(
                self.eval_bool(lhs)? && self.eval_bool(rhs)?,
            ));
        }
        if op == BinaryOp::Or {
            return Ok(Value::Boolean(
                self.eval_bool(lhs)? || self.eval_bool(rhs)?,
            ));
        }

        let left = self.eval(lhs)?;
        let right = self.eval(rhs)?;
        match op {
            BinaryOp::Add if result_ty == TypeId::STRING => {
                let mut s = left.to_string();
                s.push_str(&right.to_string());
                Ok(Value::String(Rc::from(s.as_str())))
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                self.arith(op, &left, &right, span)
            }
            BinaryOp::Eq => Ok(Value::Boolean(eq_values(&left, &right))),
            BinaryOp::Ne => Ok(Value::Boolean(!eq_values(&left, &right))),
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                self.compare(op, &left, &right, span)
            }
            BinaryOp::And | BinaryOp::Or => Ok(Value::Boolean(false)), // handled above
        }
    }

    fn arith(&self, op: BinaryOp, left: &Value, right: &Value, span: Span) -> EvalResult<Value> {
        if let (Value::Int(a), Value::Int(b)) = (left, right) {
            let (a, b) = (*a, *b);
            return match op {
                BinaryOp::Add => Ok(Value::Int(a.wrapping_add(b))),
                BinaryOp::Sub => Ok(Value::Int(a.wrapping_sub(b))),
                BinaryOp::Mul => Ok(Value::Int(a.wrapping_mul(b))),
                BinaryOp::Div | BinaryOp::Mod if b == 0 => Err(Control::Runtime(
                    RuntimeError::new(RuntimeErrorKind::DivisionByZero, span),
                )),
                BinaryOp::Div => Ok(Value::Int(a.wrapping_div(b))),
                BinaryOp::Mod => Ok(Value::Int(a.wrapping_rem(b))),
                _ => Err(self.invalid_value(left, "number", span)),
            };
        }
        let (Some(a), Some(b)) = (left.as_float(), right.as_float()) else {
            return Err(self.invalid_value(left, "number", span));
        };
        let result = match op {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            BinaryOp::Mod => a % b,
            _ => return Err(self.invalid_value(left, "number", span)),
        };
        Ok(Value::Float(result))
    }

    fn compare(&self, op: BinaryOp, left: &Value, right: &Value, span: Span) -> EvalResult<Value> {
        let ordering = match (left, right) {
            (Value::String(a), Value::String(b)) => a.cmp(b),
            _ => {
                let (Some(a), Some(b)) = (left.as_float(), right.as_float()) else {
                    return Err(self.invalid_value(left, "number or string", span));
                };
                let Some(ordering) = a.partial_cmp(&b) else {
                    // NaN compares false against everything.
                    return Ok(Value::Boolean(false));
                };
                ordering
            }
        };
        let result = match op {
            BinaryOp::Lt => ordering.is_lt(),
            BinaryOp::Le => ordering.is_le(),
            BinaryOp::Gt => ordering.is_gt(),
            BinaryOp::Ge => ordering.is_ge(),
            _ => false,
        };
        Ok(Value::Boolean(result))
    }

    fn eval_index(&mut self, base: ExprId, index: ExprId, span: Span) -> EvalResult<Value> {
        let base_value = self.eval(base)?;
        let key = self.eval(index)?;
        match base_value {
            Value::Array(arr) => {
                let index = key.as_int().unwrap_or(-1);
                let len = arr.elems.len();
                if index < 0 || index as usize >= len {
                    return Err(Control::Runtime(RuntimeError::new(
                        RuntimeErrorKind::IndexOutOfBounds { index, len },
                        span,
                    )));
                }
                Ok(arr.elems[index as usize].clone())
            }
            Value::Map(map) => {
                let key = coerce(key, map.key_ty);
                // Absent keys read as the zero value without inserting.
                match map.get(&key) {
                    Some(value) => Ok(value.clone()),
                    None => Ok(Value::initial(self.table, map.data_ty)),
                }
            }
            other => Err(self.invalid_value(&other, "array or map", span)),
        }
    }

    fn eval_array_literal(
        &mut self,
        elems: ExprRange,
        ty: TypeId,
        span: Span,
    ) -> EvalResult<Value> {
        let Some(agg) = self.table.get(ty).as_aggregate().copied() else {
            return Err(Control::Runtime(RuntimeError::new(
                RuntimeErrorKind::InvalidCoercion {
                    from: "array literal".to_string(),
                    to: self.table.type_name(ty, self.interner),
                },
                span,
            )));
        };
        let ids: Vec<ExprId> = self.script.arena.expr_list(elems).to_vec();
        let mut values = Vec::with_capacity(ids.len());
        for id in ids {
            let value = self.eval(id)?;
            values.push(coerce(value, agg.data));
        }
        // A literal shorter than a fixed-size target zero-fills the
        // tail; a longer one is an out-of-range write.
        if let AggregateSize::Fixed(n) = agg.size {
            let n = n as usize;
            if values.len() > n {
                return Err(Control::Runtime(RuntimeError::new(
                    RuntimeErrorKind::IndexOutOfBounds {
                        index: values.len() as i64 - 1,
                        len: n,
                    },
                    span,
                )));
            }
            while values.len() < n {
                values.push(Value::initial(self.table, agg.data));
            }
        }
        Ok(Value::Array(ArrayValue {
            elem_ty: agg.data,
            elems: values,
        }))
    }

    fn eval_map_literal(&mut self, entries: MapEntryRange, ty: TypeId) -> EvalResult<Value> {
        let Some(agg) = self.table.get(ty).as_aggregate().copied() else {
            return Err(Control::Runtime(RuntimeError::new(
                RuntimeErrorKind::InvalidCoercion {
                    from: "map literal".to_string(),
                    to: self.table.type_name(ty, self.interner),
                },
                Span::DUMMY,
            )));
        };
        let pairs: Vec<(ExprId, ExprId)> = self
            .script
            .arena
            .map_entries(entries)
            .iter()
            .map(|entry| (entry.key, entry.value))
            .collect();
        let mut map = MapValue::new(agg.index, agg.data, agg.case_insensitive);
        for (key_id, value_id) in pairs {
            let key = self.eval(key_id)?;
            let value = self.eval(value_id)?;
            map.insert(coerce(key, agg.index), coerce(value, agg.data));
        }
        Ok(Value::Map(map))
    }

    // ---- calls ----

    fn eval_call(&mut self, callee: Name, args: ExprRange, span: Span) -> EvalResult<Value> {
        let ids: Vec<ExprId> = self.script.arena.expr_list(args).to_vec();
        let mut arg_tys = Vec::with_capacity(ids.len());
        let mut values = Vec::with_capacity(ids.len());
        for id in ids {
            arg_tys.push(self.script.arena.expr(id).ty);
            values.push(self.eval(id)?);
        }

        let overload = match self.registry.resolve(self.table, callee, &arg_tys) {
            Ok(overload) => overload.clone(),
            Err(failure) => {
                let detail = match failure {
                    ResolveFailure::UnknownName => "not defined".to_string(),
                    ResolveFailure::NoViableOverload => format!(
                        "no overload accepts {}",
                        FunctionRegistry::describe_args(self.table, self.interner, &arg_tys)
                    ),
                };
                return Err(Control::Runtime(RuntimeError::new(
                    RuntimeErrorKind::NoMatchingOverload {
                        name: self.interner.lookup(callee).to_string(),
                        detail,
                    },
                    span,
                )));
            }
        };
        for (value, &param) in values.iter_mut().zip(&overload.params) {
            if param != TypeId::UNRESOLVED {
                let taken = std::mem::replace(value, Value::Void);
                *value = coerce(taken, param);
            }
        }

        match overload.target {
            Target::Native(body) => {
                self.check_cancel()?;
                tracing::trace!(function = self.interner.lookup(callee), "native call");
                match body.call(&values) {
                    Ok(result) => Ok(result),
                    Err(message) => Err(Control::Runtime(RuntimeError::new(
                        RuntimeErrorKind::NativeFailure {
                            name: self.interner.lookup(callee).to_string(),
                            message,
                        },
                        span,
                    ))),
                }
            }
            Target::User(index) => {
                tracing::trace!(function = self.interner.lookup(callee), "user call");
                let func = self.script.functions[index];
                let params = self.script.arena.params(func.params).to_vec();
                self.env.push_frame();
                for (param, value) in params.iter().zip(values) {
                    self.env.define(param.name, value);
                }
                let result = self.exec_block(func.body);
                self.env.pop_frame();
                match result {
                    // Falling off the end yields the return type's zero.
                    Ok(()) => Ok(Value::initial(self.table, func.return_ty)),
                    Err(Control::Return(value)) => Ok(coerce(value, func.return_ty)),
                    Err(Control::Runtime(mut err)) => {
                        err.push_frame(self.interner.lookup(func.name), span);
                        Err(Control::Runtime(err))
                    }
                    Err(other) => Err(other),
                }
            }
        }
    }

    // ---- support ----

    fn check_cancel(&self) -> EvalResult<()> {
        if self.cancel.is_cancelled() {
            Err(Control::Abort)
        } else {
            Ok(())
        }
    }

    fn unbound(&self, name: Name, span: Span) -> Control {
        Control::Runtime(RuntimeError::new(
            RuntimeErrorKind::UnboundVariable {
                name: self.interner.lookup(name).to_string(),
            },
            span,
        ))
    }

    fn invalid_value(&self, value: &Value, expected: &str, span: Span) -> Control {
        Control::Runtime(RuntimeError::new(
            RuntimeErrorKind::InvalidCoercion {
                from: kind_name(value).to_string(),
                to: expected.to_string(),
            },
            span,
        ))
    }
}

/// Apply an implicit runtime coercion. The parser has already verified
/// the conversion exists, so this is a total function: values already
/// of the target shape pass through.
fn coerce(value: Value, to: TypeId) -> Value {
    match (&value, to) {
        (Value::Int(n), TypeId::FLOAT) => Value::Float(*n as f64),
        (Value::String(_) | Value::Array(_) | Value::Map(_) | Value::Record(_) | Value::Void, _) => {
            value
        }
        (other, TypeId::STRING) => Value::String(Rc::from(other.to_string().as_str())),
        _ => value,
    }
}

/// Value equality with the implicit numeric and display coercions.
fn eq_values(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => (*a as f64) == *b,
        (Value::String(s), other) | (other, Value::String(s))
            if !matches!(other, Value::String(_)) =>
        {
            s.as_ref() == other.to_string()
        }
        _ => left == right,
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Void => "void",
        Value::Boolean(_) => "boolean",
        Value::Int(_) => "int",
        Value::Float(_) => "float",
        Value::String(_) => "string",
        Value::Tagged(_) => "handle",
        Value::Array(_) => "array",
        Value::Map(_) => "map",
        Value::Record(_) => "record",
    }
}
