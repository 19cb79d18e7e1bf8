//! The function registry: natives and user functions behind one
//! name-plus-overloads table.
//!
//! The registry is populated before evaluation starts (natives by the
//! host, user functions from the parsed script) and is read-only while
//! a script runs.

use std::rc::Rc;

use rustc_hash::FxHashMap;
use valet_ir::{Name, Script, StringInterner, TypeId};
use valet_parse::FunctionSig;
use valet_types::{coercion_cost, TypeTable};

use crate::Value;

/// A native function body. Returning `Err` converts to a runtime error
/// carrying the native's name at the call site.
pub trait NativeFn {
    fn call(&self, args: &[Value]) -> Result<Value, String>;
}

impl<F> NativeFn for F
where
    F: Fn(&[Value]) -> Result<Value, String>,
{
    fn call(&self, args: &[Value]) -> Result<Value, String> {
        self(args)
    }
}

/// What a resolved call dispatches to.
#[derive(Clone)]
pub enum Target {
    Native(Rc<dyn NativeFn>),
    /// Index into `Script::functions`.
    User(usize),
}

/// One registered overload.
#[derive(Clone)]
pub struct Overload {
    pub params: Vec<TypeId>,
    pub ret: TypeId,
    pub target: Target,
}

/// Why resolution failed; the interpreter turns this into a runtime
/// error at the call site.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ResolveFailure {
    UnknownName,
    NoViableOverload,
}

/// Functions callable from scripts, overloads in registration order.
#[derive(Default)]
pub struct FunctionRegistry {
    functions: FxHashMap<Name, Vec<Overload>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a native overload.
    ///
    /// A parameter of `TypeId::UNRESOLVED` accepts any argument type at
    /// zero cost; polymorphic natives like `count` use it.
    pub fn register_native(
        &mut self,
        name: Name,
        params: Vec<TypeId>,
        ret: TypeId,
        body: Rc<dyn NativeFn>,
    ) {
        self.functions.entry(name).or_default().push(Overload {
            params,
            ret,
            target: Target::Native(body),
        });
    }

    /// Register every function of a parsed script, in declaration order.
    pub fn register_script(&mut self, script: &Script) {
        for (index, func) in script.functions.iter().enumerate() {
            let params = script
                .arena
                .params(func.params)
                .iter()
                .map(|p| p.ty)
                .collect();
            self.functions.entry(func.name).or_default().push(Overload {
                params,
                ret: func.return_ty,
                target: Target::User(index),
            });
        }
    }

    /// Signatures of everything registered so far, for seeding the
    /// parser's call typing.
    pub fn signatures(&self) -> Vec<FunctionSig> {
        let mut sigs: Vec<FunctionSig> = self
            .functions
            .iter()
            .flat_map(|(&name, overloads)| {
                overloads.iter().map(move |o| FunctionSig {
                    name,
                    params: o.params.clone(),
                    ret: o.ret,
                })
            })
            .collect();
        sigs.sort_by_key(|sig| sig.name);
        sigs
    }

    /// Resolve a call against the argument types.
    ///
    /// An exact match wins; otherwise the viable candidate with the
    /// fewest total coercions (int to float costs less than to-string),
    /// ties broken by registration order.
    pub fn resolve(
        &self,
        table: &TypeTable,
        name: Name,
        arg_tys: &[TypeId],
    ) -> Result<&Overload, ResolveFailure> {
        let overloads = self
            .functions
            .get(&name)
            .ok_or(ResolveFailure::UnknownName)?;
        let mut best: Option<(u32, &Overload)> = None;
        for overload in overloads {
            if overload.params.len() != arg_tys.len() {
                continue;
            }
            let mut total = 0u32;
            let mut viable = true;
            for (&param, &arg) in overload.params.iter().zip(arg_tys) {
                if param == TypeId::UNRESOLVED {
                    continue; // wildcard parameter
                }
                match coercion_cost(table, arg, param) {
                    Some(cost) => total += cost,
                    None => {
                        viable = false;
                        break;
                    }
                }
            }
            if !viable {
                continue;
            }
            if total == 0 {
                return Ok(overload);
            }
            // Strictly-less keeps the first registration on ties.
            if best.as_ref().is_none_or(|&(cost, _)| total < cost) {
                best = Some((total, overload));
            }
        }
        best.map(|(_, overload)| overload)
            .ok_or(ResolveFailure::NoViableOverload)
    }

    /// Render the argument types for an error message.
    pub fn describe_args(
        table: &TypeTable,
        interner: &StringInterner,
        arg_tys: &[TypeId],
    ) -> String {
        let names: Vec<String> = arg_tys
            .iter()
            .map(|&ty| table.type_name(ty, interner))
            .collect();
        format!("({})", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use valet_ir::SharedInterner;

    fn noop() -> Rc<dyn NativeFn> {
        Rc::new(|_args: &[Value]| Ok(Value::Void))
    }

    fn setup() -> (SharedInterner, TypeTable, FunctionRegistry) {
        let interner = SharedInterner::new();
        let table = TypeTable::new(&interner);
        (interner, table, FunctionRegistry::new())
    }

    #[test]
    fn exact_match_beats_cheaper_registration() {
        let (interner, table, mut registry) = setup();
        let name = interner.intern("f");
        registry.register_native(name, vec![TypeId::FLOAT], TypeId::INT, noop());
        registry.register_native(name, vec![TypeId::INT], TypeId::STRING, noop());
        let Ok(overload) = registry.resolve(&table, name, &[TypeId::INT]) else {
            panic!("resolution should succeed");
        };
        assert_eq!(overload.ret, TypeId::STRING);
    }

    #[test]
    fn fewest_coercions_wins() {
        let (interner, table, mut registry) = setup();
        let name = interner.intern("f");
        // string param needs a display coercion (2); float needs a widen (1).
        registry.register_native(name, vec![TypeId::STRING], TypeId::STRING, noop());
        registry.register_native(name, vec![TypeId::FLOAT], TypeId::FLOAT, noop());
        let Ok(overload) = registry.resolve(&table, name, &[TypeId::INT]) else {
            panic!("resolution should succeed");
        };
        assert_eq!(overload.ret, TypeId::FLOAT);
    }

    #[test]
    fn ties_go_to_first_registered() {
        let (interner, table, mut registry) = setup();
        let name = interner.intern("f");
        registry.register_native(name, vec![TypeId::FLOAT], TypeId::BOOLEAN, noop());
        registry.register_native(name, vec![TypeId::FLOAT], TypeId::ITEM, noop());
        let Ok(overload) = registry.resolve(&table, name, &[TypeId::INT]) else {
            panic!("resolution should succeed");
        };
        assert_eq!(overload.ret, TypeId::BOOLEAN);
    }

    #[test]
    fn wildcard_param_accepts_anything() {
        let (interner, mut table, mut registry) = setup();
        let name = interner.intern("count");
        registry.register_native(name, vec![TypeId::UNRESOLVED], TypeId::INT, noop());
        let arr = table.alloc_array(TypeId::STRING, 3);
        assert!(registry.resolve(&table, name, &[arr]).is_ok());
    }

    #[test]
    fn failures_are_distinguished() {
        let (interner, table, mut registry) = setup();
        let name = interner.intern("f");
        assert!(matches!(
            registry.resolve(&table, name, &[]),
            Err(ResolveFailure::UnknownName)
        ));
        registry.register_native(name, vec![TypeId::BOOLEAN], TypeId::VOID, noop());
        assert!(matches!(
            registry.resolve(&table, name, &[TypeId::ITEM]),
            Err(ResolveFailure::NoViableOverload)
        ));
    }
}
