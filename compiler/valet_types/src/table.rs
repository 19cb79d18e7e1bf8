//! The type table: storage and the structural operations.

use rustc_hash::FxHashMap;
use valet_ir::{Name, StringInterner, TypeId};

use crate::{AggregateSize, AggregateType, FunctionType, Primitive, RecordType, Type};

/// Storage for every type a script mentions, addressed by `TypeId`.
///
/// Primitives are pre-interned in `TypeId` constant order. Aggregates
/// are allocated per occurrence; two array types of different length
/// are distinct entries that nevertheless compare equal, since size is
/// not part of aggregate identity.
pub struct TypeTable {
    types: Vec<Type>,
    /// Named types: primitives by keyword, records by declared name.
    named: FxHashMap<Name, TypeId>,
}

impl TypeTable {
    /// Create a table with the primitives pre-interned and registered
    /// under their source-level names.
    pub fn new(interner: &StringInterner) -> Self {
        let mut table = TypeTable {
            types: Vec::with_capacity(Primitive::ALL.len() + 16),
            named: FxHashMap::default(),
        };
        for prim in Primitive::ALL {
            let id = TypeId::new(u32::try_from(table.types.len()).unwrap_or(u32::MAX));
            debug_assert_eq!(id, prim.type_id());
            table.types.push(Type::Primitive(prim));
            table.named.insert(interner.intern(prim.name()), id);
        }
        table
    }

    /// Get a type by ID.
    ///
    /// # Panics
    /// Panics if `id` is `UNRESOLVED` or out of bounds.
    #[inline]
    #[track_caller]
    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.index()]
    }

    /// Look up a named type (primitive keyword or record name).
    pub fn lookup_named(&self, name: Name) -> Option<TypeId> {
        self.named.get(&name).copied()
    }

    /// Allocate an array type. The index type is always `int`.
    pub fn alloc_array(&mut self, data: TypeId, size: u32) -> TypeId {
        self.alloc(Type::Aggregate(AggregateType {
            data,
            index: TypeId::INT,
            size: AggregateSize::Fixed(size),
            case_insensitive: false,
        }))
    }

    /// Allocate a map type.
    ///
    /// `case_insensitive` is silently downgraded to `false` unless the
    /// index type is `string`, making the invalid combination
    /// unrepresentable in the table.
    pub fn alloc_map(&mut self, data: TypeId, index: TypeId, case_insensitive: bool) -> TypeId {
        self.alloc(Type::Aggregate(AggregateType {
            data,
            index,
            size: AggregateSize::Unbounded,
            case_insensitive: case_insensitive && index == TypeId::STRING,
        }))
    }

    /// Allocate a function signature type.
    pub fn alloc_function(&mut self, params: Vec<TypeId>, ret: TypeId) -> TypeId {
        self.alloc(Type::Function(FunctionType { params, ret }))
    }

    /// Define a record type under its name.
    ///
    /// Returns `None` if the name is already taken (the parser reports
    /// the redefinition).
    pub fn define_record(&mut self, record: RecordType) -> Option<TypeId> {
        if self.named.contains_key(&record.name) {
            return None;
        }
        let name = record.name;
        let id = self.alloc(Type::Record(record));
        self.named.insert(name, id);
        Some(id)
    }

    fn alloc(&mut self, ty: Type) -> TypeId {
        let id = TypeId::new(u32::try_from(self.types.len()).unwrap_or(u32::MAX - 1));
        self.types.push(ty);
        id
    }

    /// Structural type equality.
    ///
    /// - Primitives: same tag.
    /// - Aggregates: data and index types equal; size and case
    ///   sensitivity are NOT part of identity.
    /// - Records: nominal (same declared name).
    /// - Functions: parameter and return types all equal.
    pub fn equals(&self, a: TypeId, b: TypeId) -> bool {
        if a == b {
            return true;
        }
        match (self.get(a), self.get(b)) {
            (Type::Primitive(pa), Type::Primitive(pb)) => pa == pb,
            (Type::Aggregate(aa), Type::Aggregate(ab)) => {
                self.equals(aa.data, ab.data) && self.equals(aa.index, ab.index)
            }
            (Type::Record(ra), Type::Record(rb)) => ra.name == rb.name,
            (Type::Function(fa), Type::Function(fb)) => {
                fa.params.len() == fb.params.len()
                    && self.equals(fa.ret, fb.ret)
                    && fa
                        .params
                        .iter()
                        .zip(&fb.params)
                        .all(|(&pa, &pb)| self.equals(pa, pb))
            }
            _ => false,
        }
    }

    /// Recursively unwrap nested aggregates down to the leaf element type.
    pub fn simple_type(&self, id: TypeId) -> TypeId {
        match self.get(id) {
            Type::Aggregate(agg) => self.simple_type(agg.data),
            _ => id,
        }
    }

    /// Human-readable comma-joined index descriptor for an aggregate,
    /// recursing through nested dimensions: a fixed size renders as its
    /// integer literal, a map as its index type's name.
    ///
    /// Non-aggregate types render as the empty string.
    pub fn index_string(&self, id: TypeId, interner: &StringInterner) -> String {
        let Type::Aggregate(agg) = self.get(id) else {
            return String::new();
        };
        let own = match agg.size {
            AggregateSize::Fixed(n) => n.to_string(),
            AggregateSize::Unbounded => self.type_name(agg.index, interner),
        };
        if matches!(self.get(agg.data), Type::Aggregate(_)) {
            format!("{own}, {}", self.index_string(agg.data, interner))
        } else {
            own
        }
    }

    /// Total number of primitive scalar slots a fully-populated value of
    /// this type contains, or `None` when the type contains any map or a
    /// zero-sized dimension ("unknown/unbounded").
    pub fn data_values(&self, id: TypeId) -> Option<u64> {
        match self.get(id) {
            Type::Primitive(_) => Some(1),
            Type::Aggregate(agg) => match agg.size {
                AggregateSize::Fixed(n) if n > 0 => {
                    self.data_values(agg.data).map(|k| u64::from(n) * k)
                }
                _ => None,
            },
            Type::Record(rec) => {
                let mut total = 0u64;
                for &(_, field_ty) in &rec.fields {
                    total += self.data_values(field_ty)?;
                }
                Some(total)
            }
            Type::Function(_) => None,
        }
    }

    /// Display name of a type: `int`, `point`,
    /// `string [3, 4]`, `int [string]`, `int (int, string)`.
    pub fn type_name(&self, id: TypeId, interner: &StringInterner) -> String {
        match self.get(id) {
            Type::Primitive(prim) => prim.name().to_string(),
            Type::Aggregate(_) => {
                let leaf = self.type_name(self.simple_type(id), interner);
                format!("{leaf} [{}]", self.index_string(id, interner))
            }
            Type::Record(rec) => interner.lookup(rec.name).to_string(),
            Type::Function(func) => {
                let params: Vec<String> = func
                    .params
                    .iter()
                    .map(|&p| self.type_name(p, interner))
                    .collect();
                format!(
                    "{} ({})",
                    self.type_name(func.ret, interner),
                    params.join(", ")
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use valet_ir::SharedInterner;

    fn setup() -> (SharedInterner, TypeTable) {
        let interner = SharedInterner::new();
        let table = TypeTable::new(&interner);
        (interner, table)
    }

    #[test]
    fn primitives_equal_iff_same_tag() {
        let (_, table) = setup();
        assert!(table.equals(TypeId::INT, TypeId::INT));
        assert!(!table.equals(TypeId::INT, TypeId::FLOAT));
        assert!(!table.equals(TypeId::ITEM, TypeId::EFFECT));
    }

    #[test]
    fn aggregate_equality_ignores_size() {
        let (_, mut table) = setup();
        let a3 = table.alloc_array(TypeId::INT, 3);
        let a7 = table.alloc_array(TypeId::INT, 7);
        assert!(table.equals(a3, a7));
    }

    #[test]
    fn aggregate_equality_ignores_case_sensitivity() {
        let (_, mut table) = setup();
        let ci = table.alloc_map(TypeId::INT, TypeId::STRING, true);
        let cs = table.alloc_map(TypeId::INT, TypeId::STRING, false);
        assert!(table.equals(ci, cs));
    }

    #[test]
    fn aggregate_equality_respects_data_and_index() {
        let (_, mut table) = setup();
        let int_by_string = table.alloc_map(TypeId::INT, TypeId::STRING, false);
        let int_by_int = table.alloc_map(TypeId::INT, TypeId::INT, false);
        let float_by_string = table.alloc_map(TypeId::FLOAT, TypeId::STRING, false);
        assert!(!table.equals(int_by_string, int_by_int));
        assert!(!table.equals(int_by_string, float_by_string));
    }

    #[test]
    fn case_insensitive_downgrades_on_non_string_index() {
        let (_, mut table) = setup();
        let id = table.alloc_map(TypeId::STRING, TypeId::INT, true);
        let Type::Aggregate(agg) = table.get(id) else {
            panic!("expected aggregate");
        };
        assert!(!agg.case_insensitive);
        // And the downgraded type equals its honestly-constructed twin.
        let plain = table.alloc_map(TypeId::STRING, TypeId::INT, false);
        assert!(table.equals(id, plain));
    }

    #[test]
    fn simple_type_unwraps_nested_aggregates() {
        let (_, mut table) = setup();
        let inner = table.alloc_array(TypeId::BOOLEAN, 2);
        let by_string = table.alloc_map(inner, TypeId::STRING, false);
        let outer = table.alloc_array(by_string, 5);
        assert_eq!(table.simple_type(outer), TypeId::BOOLEAN);
    }

    #[test]
    fn index_string_two_level_array() {
        let (interner, mut table) = setup();
        let inner = table.alloc_array(TypeId::INT, 4);
        let outer = table.alloc_array(inner, 3);
        assert_eq!(table.index_string(outer, &interner), "3, 4");
    }

    #[test]
    fn index_string_map_renders_index_type_name() {
        let (interner, mut table) = setup();
        let map = table.alloc_map(TypeId::INT, TypeId::STRING, false);
        assert_eq!(table.index_string(map, &interner), "string");
    }

    #[test]
    fn index_string_mixed_dimensions() {
        let (interner, mut table) = setup();
        let inner = table.alloc_array(TypeId::FLOAT, 6);
        let outer = table.alloc_map(inner, TypeId::ITEM, false);
        assert_eq!(table.index_string(outer, &interner), "item, 6");
    }

    #[test]
    fn data_values_multiplies_fixed_dimensions() {
        let (_, mut table) = setup();
        let inner = table.alloc_array(TypeId::INT, 2);
        let outer = table.alloc_array(inner, 3);
        assert_eq!(table.data_values(outer), Some(6));
    }

    #[test]
    fn data_values_unknown_for_maps_and_zero_size() {
        let (_, mut table) = setup();
        let map = table.alloc_map(TypeId::INT, TypeId::STRING, false);
        assert_eq!(table.data_values(map), None);
        let empty = table.alloc_array(TypeId::INT, 0);
        assert_eq!(table.data_values(empty), None);
        let holding_map = table.alloc_array(map, 3);
        assert_eq!(table.data_values(holding_map), None);
    }

    #[test]
    fn data_values_sums_record_fields() {
        let (interner, mut table) = setup();
        let name = interner.intern("point");
        let x = interner.intern("x");
        let y = interner.intern("y");
        let Some(id) = table.define_record(RecordType {
            name,
            fields: vec![(x, TypeId::INT), (y, TypeId::INT)],
        }) else {
            panic!("record definition should succeed");
        };
        assert_eq!(table.data_values(id), Some(2));
        // Array of records multiplies through.
        let arr = table.alloc_array(id, 5);
        assert_eq!(table.data_values(arr), Some(10));
    }

    #[test]
    fn record_redefinition_rejected() {
        let (interner, mut table) = setup();
        let name = interner.intern("stats");
        let rec = RecordType {
            name,
            fields: vec![(interner.intern("hp"), TypeId::INT)],
        };
        assert!(table.define_record(rec.clone()).is_some());
        assert!(table.define_record(rec).is_none());
    }

    #[test]
    fn named_lookup_finds_primitives_and_records() {
        let (interner, mut table) = setup();
        assert_eq!(
            table.lookup_named(interner.intern("int")),
            Some(TypeId::INT)
        );
        let rec_name = interner.intern("gear");
        let Some(id) = table.define_record(RecordType {
            name: rec_name,
            fields: vec![(interner.intern("slot"), TypeId::STRING)],
        }) else {
            panic!("record definition should succeed");
        };
        assert_eq!(table.lookup_named(rec_name), Some(id));
        assert_eq!(table.lookup_named(interner.intern("missing")), None);
    }

    #[test]
    fn type_name_rendering() {
        let (interner, mut table) = setup();
        let inner = table.alloc_array(TypeId::INT, 4);
        let outer = table.alloc_array(inner, 3);
        assert_eq!(table.type_name(outer, &interner), "int [3, 4]");
        let map = table.alloc_map(TypeId::BOOLEAN, TypeId::STRING, true);
        assert_eq!(table.type_name(map, &interner), "boolean [string]");
    }
}
