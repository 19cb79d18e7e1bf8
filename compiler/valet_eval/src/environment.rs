//! Lexical scopes and variable storage.

use rustc_hash::FxHashMap;
use valet_ir::Name;

use crate::Value;

/// The scope stack for one evaluation.
///
/// Index 0 is the global scope; every block pushes a scope, every user
/// function call pushes a frame boundary so lookups inside a function
/// see its own scopes plus globals, never the caller's locals.
pub struct Environment {
    scopes: Vec<FxHashMap<Name, Value>>,
    /// Indices into `scopes` where each active call frame begins.
    frame_starts: Vec<usize>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            scopes: vec![FxHashMap::default()],
            frame_starts: Vec::new(),
        }
    }

    /// Open a block scope.
    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    /// Close the innermost block scope; its bindings die with it.
    pub fn pop_scope(&mut self) {
        debug_assert!(self.scopes.len() > 1);
        self.scopes.pop();
    }

    /// Open a function call frame with one fresh scope for parameters.
    pub fn push_frame(&mut self) {
        self.frame_starts.push(self.scopes.len());
        self.scopes.push(FxHashMap::default());
    }

    /// Close the current call frame, dropping all its scopes.
    pub fn pop_frame(&mut self) {
        if let Some(start) = self.frame_starts.pop() {
            self.scopes.truncate(start);
        }
    }

    /// First scope index visible from the current frame (besides globals).
    fn visible_floor(&self) -> usize {
        self.frame_starts.last().copied().unwrap_or(0)
    }

    /// Bind a new variable in the innermost scope.
    pub fn define(&mut self, name: Name, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, value);
        }
    }

    /// Read a variable: innermost visible scope outward, then globals.
    pub fn lookup(&self, name: Name) -> Option<&Value> {
        let floor = self.visible_floor();
        for scope in self.scopes[floor..].iter().rev() {
            if let Some(value) = scope.get(&name) {
                return Some(value);
            }
        }
        self.scopes.first().and_then(|globals| globals.get(&name))
    }

    /// Mutable access with the same visibility as `lookup`.
    pub fn lookup_mut(&mut self, name: Name) -> Option<&mut Value> {
        let floor = self.visible_floor();
        let position = self.scopes[floor..]
            .iter()
            .rposition(|scope| scope.contains_key(&name))
            .map(|i| floor + i)
            .or_else(|| {
                self.scopes
                    .first()
                    .is_some_and(|globals| globals.contains_key(&name))
                    .then_some(0)
            })?;
        self.scopes[position].get_mut(&name)
    }

    /// Copy of the global scope, for host-side persistence.
    pub fn snapshot_globals(&self) -> FxHashMap<Name, Value> {
        self.scopes.first().cloned().unwrap_or_default()
    }

    /// Replace global bindings from a snapshot. Bindings not present in
    /// the snapshot are kept.
    pub fn restore_globals(&mut self, snapshot: FxHashMap<Name, Value>) {
        if let Some(globals) = self.scopes.first_mut() {
            for (name, value) in snapshot {
                globals.insert(name, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn name(n: u32) -> Name {
        Name::from_raw(n)
    }

    #[test]
    fn inner_scope_shadows_and_dies() {
        let mut env = Environment::new();
        env.define(name(1), Value::Int(1));
        env.push_scope();
        env.define(name(1), Value::Int(2));
        assert_eq!(env.lookup(name(1)), Some(&Value::Int(2)));
        env.pop_scope();
        assert_eq!(env.lookup(name(1)), Some(&Value::Int(1)));
    }

    #[test]
    fn frames_hide_caller_locals_but_not_globals() {
        let mut env = Environment::new();
        env.define(name(1), Value::Int(10)); // global
        env.push_scope();
        env.define(name(2), Value::Int(20)); // caller local
        env.push_frame();
        assert_eq!(env.lookup(name(1)), Some(&Value::Int(10)));
        assert_eq!(env.lookup(name(2)), None);
        env.pop_frame();
        assert_eq!(env.lookup(name(2)), Some(&Value::Int(20)));
    }

    #[test]
    fn snapshot_and_restore_globals() {
        let mut env = Environment::new();
        env.define(name(1), Value::Int(5));
        let snapshot = env.snapshot_globals();
        let mut fresh = Environment::new();
        fresh.restore_globals(snapshot);
        assert_eq!(fresh.lookup(name(1)), Some(&Value::Int(5)));
    }
}
