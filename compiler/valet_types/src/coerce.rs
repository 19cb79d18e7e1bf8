//! Implicit coercion rules shared by the parser and the evaluator.
//!
//! Two coercions exist: numeric widening (`int` → `float`) and display
//! coercion (any non-void primitive → `string`). Overload resolution
//! ranks candidates by total coercion cost; the parser uses cost 0/1 to
//! decide assignment compatibility.

use valet_ir::TypeId;

use crate::{Type, TypeTable};

/// Cost of widening `int` to `float`.
pub const COST_WIDEN: u32 = 1;

/// Cost of coercing a displayable primitive to `string`.
pub const COST_DISPLAY: u32 = 2;

/// Cost of implicitly coercing `from` into `to`.
///
/// `Some(0)` means the types are already equal; `None` means no implicit
/// coercion exists (the call site must report a mismatch).
pub fn coercion_cost(table: &TypeTable, from: TypeId, to: TypeId) -> Option<u32> {
    if table.equals(from, to) {
        return Some(0);
    }
    if from == TypeId::INT && to == TypeId::FLOAT {
        return Some(COST_WIDEN);
    }
    if to == TypeId::STRING {
        if let Type::Primitive(prim) = table.get(from) {
            if !matches!(prim, crate::Primitive::Void) {
                return Some(COST_DISPLAY);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use valet_ir::SharedInterner;

    #[test]
    fn exact_match_is_free() {
        let interner = SharedInterner::new();
        let table = TypeTable::new(&interner);
        assert_eq!(coercion_cost(&table, TypeId::INT, TypeId::INT), Some(0));
    }

    #[test]
    fn widening_beats_display() {
        let interner = SharedInterner::new();
        let table = TypeTable::new(&interner);
        let widen = coercion_cost(&table, TypeId::INT, TypeId::FLOAT);
        let display = coercion_cost(&table, TypeId::INT, TypeId::STRING);
        assert_eq!(widen, Some(COST_WIDEN));
        assert_eq!(display, Some(COST_DISPLAY));
        assert!(widen < display);
    }

    #[test]
    fn no_narrowing_or_void_display() {
        let interner = SharedInterner::new();
        let table = TypeTable::new(&interner);
        assert_eq!(coercion_cost(&table, TypeId::FLOAT, TypeId::INT), None);
        assert_eq!(coercion_cost(&table, TypeId::VOID, TypeId::STRING), None);
    }

    #[test]
    fn aggregates_do_not_coerce() {
        let interner = SharedInterner::new();
        let mut table = TypeTable::new(&interner);
        let arr = table.alloc_array(TypeId::INT, 3);
        assert_eq!(coercion_cost(&table, arr, TypeId::STRING), None);
        // But an equal aggregate (different size) costs 0.
        let arr2 = table.alloc_array(TypeId::INT, 9);
        assert_eq!(coercion_cost(&table, arr, arr2), Some(0));
    }
}
