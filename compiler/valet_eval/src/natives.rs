//! The standard native library.
//!
//! Every native here is pure except `print`, which writes through the
//! host-supplied sink. Game-domain natives are the host's business and
//! are registered the same way.

use std::rc::Rc;

use valet_ir::{StringInterner, TypeId};

use crate::registry::FunctionRegistry;
use crate::Value;

/// Where `print` output goes.
pub type PrintSink = Rc<dyn Fn(&str)>;

fn arg(args: &[Value], i: usize) -> Result<&Value, String> {
    args.get(i).ok_or_else(|| "missing argument".to_string())
}

fn string_arg(args: &[Value], i: usize) -> Result<Rc<str>, String> {
    match arg(args, i)? {
        Value::String(s) => Ok(s.clone()),
        other => Err(format!("expected a string, got `{other}`")),
    }
}

fn int_arg(args: &[Value], i: usize) -> Result<i64, String> {
    arg(args, i)?
        .as_int()
        .ok_or_else(|| "expected an int".to_string())
}

fn float_arg(args: &[Value], i: usize) -> Result<f64, String> {
    arg(args, i)?
        .as_float()
        .ok_or_else(|| "expected a number".to_string())
}

/// Register the standard natives. The overload order here is load-bearing
/// for tie-breaking, so additions go at the end of their name group.
pub fn install(registry: &mut FunctionRegistry, interner: &StringInterner, sink: PrintSink) {
    let print = interner.intern("print");
    registry.register_native(
        print,
        vec![TypeId::STRING],
        TypeId::VOID,
        Rc::new(move |args: &[Value]| {
            sink(&string_arg(args, 0)?);
            Ok(Value::Void)
        }),
    );

    // count works on any aggregate; the wildcard parameter defers the
    // shape check to the body.
    let count = interner.intern("count");
    registry.register_native(
        count,
        vec![TypeId::UNRESOLVED],
        TypeId::INT,
        Rc::new(|args: &[Value]| match arg(args, 0)? {
            Value::Array(arr) => Ok(Value::Int(arr.elems.len() as i64)),
            Value::Map(map) => Ok(Value::Int(map.len() as i64)),
            other => Err(format!("expected an aggregate, got `{other}`")),
        }),
    );

    let to_string = interner.intern("to_string");
    registry.register_native(
        to_string,
        vec![TypeId::UNRESOLVED],
        TypeId::STRING,
        Rc::new(|args: &[Value]| Ok(Value::String(Rc::from(arg(args, 0)?.to_string().as_str())))),
    );

    let to_int = interner.intern("to_int");
    registry.register_native(
        to_int,
        vec![TypeId::STRING],
        TypeId::INT,
        Rc::new(|args: &[Value]| {
            let s = string_arg(args, 0)?;
            s.trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| format!("`{s}` is not an int"))
        }),
    );
    registry.register_native(
        to_int,
        vec![TypeId::FLOAT],
        TypeId::INT,
        Rc::new(|args: &[Value]| Ok(Value::Int(float_arg(args, 0)? as i64))),
    );
    registry.register_native(
        to_int,
        vec![TypeId::BOOLEAN],
        TypeId::INT,
        Rc::new(|args: &[Value]| match arg(args, 0)?.as_bool() {
            Some(true) => Ok(Value::Int(1)),
            _ => Ok(Value::Int(0)),
        }),
    );

    let to_float = interner.intern("to_float");
    registry.register_native(
        to_float,
        vec![TypeId::INT],
        TypeId::FLOAT,
        Rc::new(|args: &[Value]| Ok(Value::Float(int_arg(args, 0)? as f64))),
    );
    registry.register_native(
        to_float,
        vec![TypeId::STRING],
        TypeId::FLOAT,
        Rc::new(|args: &[Value]| {
            let s = string_arg(args, 0)?;
            s.trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| format!("`{s}` is not a float"))
        }),
    );

    let length = interner.intern("length");
    registry.register_native(
        length,
        vec![TypeId::STRING],
        TypeId::INT,
        Rc::new(|args: &[Value]| Ok(Value::Int(string_arg(args, 0)?.chars().count() as i64))),
    );

    let to_upper_case = interner.intern("to_upper_case");
    registry.register_native(
        to_upper_case,
        vec![TypeId::STRING],
        TypeId::STRING,
        Rc::new(|args: &[Value]| {
            Ok(Value::String(Rc::from(
                string_arg(args, 0)?.to_uppercase().as_str(),
            )))
        }),
    );

    let to_lower_case = interner.intern("to_lower_case");
    registry.register_native(
        to_lower_case,
        vec![TypeId::STRING],
        TypeId::STRING,
        Rc::new(|args: &[Value]| {
            Ok(Value::String(Rc::from(
                string_arg(args, 0)?.to_lowercase().as_str(),
            )))
        }),
    );

    let min = interner.intern("min");
    registry.register_native(
        min,
        vec![TypeId::INT, TypeId::INT],
        TypeId::INT,
        Rc::new(|args: &[Value]| Ok(Value::Int(int_arg(args, 0)?.min(int_arg(args, 1)?)))),
    );
    registry.register_native(
        min,
        vec![TypeId::FLOAT, TypeId::FLOAT],
        TypeId::FLOAT,
        Rc::new(|args: &[Value]| Ok(Value::Float(float_arg(args, 0)?.min(float_arg(args, 1)?)))),
    );

    let max = interner.intern("max");
    registry.register_native(
        max,
        vec![TypeId::INT, TypeId::INT],
        TypeId::INT,
        Rc::new(|args: &[Value]| Ok(Value::Int(int_arg(args, 0)?.max(int_arg(args, 1)?)))),
    );
    registry.register_native(
        max,
        vec![TypeId::FLOAT, TypeId::FLOAT],
        TypeId::FLOAT,
        Rc::new(|args: &[Value]| Ok(Value::Float(float_arg(args, 0)?.max(float_arg(args, 1)?)))),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use valet_ir::SharedInterner;
    use valet_types::TypeTable;

    fn setup() -> (SharedInterner, TypeTable, FunctionRegistry) {
        let interner = SharedInterner::new();
        let table = TypeTable::new(&interner);
        let mut registry = FunctionRegistry::new();
        install(&mut registry, &interner, Rc::new(|_line: &str| {}));
        (interner, table, registry)
    }

    fn call(
        registry: &FunctionRegistry,
        table: &TypeTable,
        interner: &StringInterner,
        name: &str,
        arg_tys: &[TypeId],
        args: &[Value],
    ) -> Result<Value, String> {
        let Ok(overload) = registry.resolve(table, interner.intern(name), arg_tys) else {
            return Err("resolution failed".to_string());
        };
        match &overload.target {
            crate::registry::Target::Native(f) => f.call(args),
            crate::registry::Target::User(_) => Err("expected a native".to_string()),
        }
    }

    #[test]
    fn print_writes_through_the_sink() {
        let interner = SharedInterner::new();
        let table = TypeTable::new(&interner);
        let mut registry = FunctionRegistry::new();
        let lines = Rc::new(RefCell::new(Vec::new()));
        let captured = lines.clone();
        install(
            &mut registry,
            &interner,
            Rc::new(move |line: &str| captured.borrow_mut().push(line.to_string())),
        );
        let result = call(
            &registry,
            &table,
            &interner,
            "print",
            &[TypeId::STRING],
            &[Value::String(Rc::from("hello"))],
        );
        assert_eq!(result, Ok(Value::Void));
        assert_eq!(*lines.borrow(), vec!["hello"]);
    }

    #[test]
    fn to_int_parses_and_rejects() {
        let (interner, table, registry) = setup();
        assert_eq!(
            call(
                &registry,
                &table,
                &interner,
                "to_int",
                &[TypeId::STRING],
                &[Value::String(Rc::from(" 42 "))]
            ),
            Ok(Value::Int(42))
        );
        assert!(call(
            &registry,
            &table,
            &interner,
            "to_int",
            &[TypeId::STRING],
            &[Value::String(Rc::from("forty"))]
        )
        .is_err());
    }

    #[test]
    fn to_int_overloads_resolve_by_argument_type() {
        let (interner, table, registry) = setup();
        assert_eq!(
            call(
                &registry,
                &table,
                &interner,
                "to_int",
                &[TypeId::FLOAT],
                &[Value::Float(3.9)]
            ),
            Ok(Value::Int(3))
        );
        assert_eq!(
            call(
                &registry,
                &table,
                &interner,
                "to_int",
                &[TypeId::BOOLEAN],
                &[Value::Boolean(true)]
            ),
            Ok(Value::Int(1))
        );
    }

    #[test]
    fn count_accepts_any_aggregate() {
        let (interner, mut table, registry) = setup();
        let arr_ty = table.alloc_array(TypeId::INT, 3);
        let arr = Value::initial(&table, arr_ty);
        assert_eq!(
            call(&registry, &table, &interner, "count", &[arr_ty], &[arr]),
            Ok(Value::Int(3))
        );
    }

    #[test]
    fn min_prefers_exact_int_overload() {
        let (interner, table, registry) = setup();
        assert_eq!(
            call(
                &registry,
                &table,
                &interner,
                "min",
                &[TypeId::INT, TypeId::INT],
                &[Value::Int(7), Value::Int(3)]
            ),
            Ok(Value::Int(3))
        );
    }
}
