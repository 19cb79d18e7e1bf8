//! Runtime values.
//!
//! Every type has a zero value and every variable starts at it; there
//! is no null. Assignment copies by value, so aggregates never alias.

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use valet_ir::TypeId;
use valet_types::{AggregateSize, Primitive, Type, TypeTable};

/// A runtime value.
#[derive(Clone, PartialEq, Debug)]
pub enum Value {
    Void,
    Boolean(bool),
    Int(i64),
    Float(f64),
    String(Rc<str>),
    /// A game-domain handle (item, location, ...).
    Tagged(TaggedValue),
    Array(ArrayValue),
    Map(MapValue),
    Record(RecordValue),
}

/// A value of one of the opaque game-handle types: a numeric id plus a
/// display name. Only natives give these meaning.
#[derive(Clone, Debug)]
pub struct TaggedValue {
    pub ty: TypeId,
    pub id: i64,
    pub name: Rc<str>,
}

impl TaggedValue {
    /// The zero value of a handle type: id -1, name "none".
    pub fn none(ty: TypeId) -> Self {
        TaggedValue {
            ty,
            id: -1,
            name: Rc::from("none"),
        }
    }
}

// Identity is the (type, id) pair; the display name is cosmetic.
impl PartialEq for TaggedValue {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty && self.id == other.id
    }
}

/// A fixed-size array value.
#[derive(Clone, PartialEq, Debug)]
pub struct ArrayValue {
    pub elem_ty: TypeId,
    pub elems: Vec<Value>,
}

/// An ordered record value; fields sit at their declaration positions.
#[derive(Clone, PartialEq, Debug)]
pub struct RecordValue {
    pub ty: TypeId,
    pub fields: Vec<Value>,
}

/// Hashable lookup form of a map key. String keys fold to lowercase
/// when the map is case-insensitive.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
enum MapKey {
    Bool(bool),
    Int(i64),
    Str(String),
    Tagged(u32, i64),
}

/// An insertion-ordered map value.
///
/// Iteration and display follow first-write order, and for
/// case-insensitive maps the first-written casing of each key is the
/// one preserved. Reads of absent keys do not insert; the evaluator
/// returns the data type's zero value instead.
#[derive(Clone, Debug)]
pub struct MapValue {
    pub key_ty: TypeId,
    pub data_ty: TypeId,
    pub case_insensitive: bool,
    entries: Vec<(Value, Value)>,
    index: FxHashMap<MapKey, usize>,
}

impl MapValue {
    pub fn new(key_ty: TypeId, data_ty: TypeId, case_insensitive: bool) -> Self {
        MapValue {
            key_ty,
            data_ty,
            case_insensitive,
            entries: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    fn fold(&self, key: &Value) -> Option<MapKey> {
        Some(match key {
            Value::Boolean(b) => MapKey::Bool(*b),
            Value::Int(n) => MapKey::Int(*n),
            Value::String(s) => {
                if self.case_insensitive {
                    MapKey::Str(s.to_lowercase())
                } else {
                    MapKey::Str(s.to_string())
                }
            }
            Value::Tagged(tagged) => MapKey::Tagged(tagged.ty.raw(), tagged.id),
            _ => return None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a key. Never inserts.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        let folded = self.fold(key)?;
        self.index.get(&folded).map(|&i| &self.entries[i].1)
    }

    /// Check for a key without touching the value.
    pub fn contains(&self, key: &Value) -> bool {
        self.fold(key).is_some_and(|k| self.index.contains_key(&k))
    }

    /// Write through a key, inserting it (with its current casing) if
    /// absent. Overwrites keep the first-write casing.
    pub fn insert(&mut self, key: Value, value: Value) {
        let Some(folded) = self.fold(&key) else {
            return;
        };
        match self.index.get(&folded) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.index.insert(folded, self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    /// Mutable slot for a key, vivifying it with `zero` if absent.
    pub fn slot(&mut self, key: Value, zero: Value) -> &mut Value {
        let folded = self.fold(&key);
        let position = match folded {
            Some(ref k) => self.index.get(k).copied(),
            None => None,
        };
        let i = match position {
            Some(i) => i,
            None => {
                let i = self.entries.len();
                if let Some(k) = folded {
                    self.index.insert(k, i);
                }
                self.entries.push((key, zero));
                i
            }
        };
        &mut self.entries[i].1
    }

    /// Keys in first-write order.
    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Entries in first-write order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

// Content equality, independent of insertion order.
impl PartialEq for MapValue {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|ov| ov == v))
    }
}

impl Value {
    /// The zero value of a type. Arrays are filled eagerly and
    /// recursively; maps start empty regardless of use; records are
    /// zeroed field by field.
    pub fn initial(table: &TypeTable, ty: TypeId) -> Value {
        match table.get(ty) {
            Type::Primitive(prim) => match prim {
                Primitive::Void => Value::Void,
                Primitive::Boolean => Value::Boolean(false),
                Primitive::Int => Value::Int(0),
                Primitive::Float => Value::Float(0.0),
                Primitive::String => Value::String(Rc::from("")),
                _ => Value::Tagged(TaggedValue::none(ty)),
            },
            Type::Aggregate(agg) => match agg.size {
                AggregateSize::Fixed(n) => {
                    let zero = Value::initial(table, agg.data);
                    Value::Array(ArrayValue {
                        elem_ty: agg.data,
                        elems: vec![zero; n as usize],
                    })
                }
                AggregateSize::Unbounded => {
                    Value::Map(MapValue::new(agg.index, agg.data, agg.case_insensitive))
                }
            },
            Type::Record(rec) => Value::Record(RecordValue {
                ty,
                fields: rec
                    .fields
                    .iter()
                    .map(|&(_, field_ty)| Value::initial(table, field_ty))
                    .collect(),
            }),
            Type::Function(_) => Value::Void,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric view, widening int to float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => Ok(()),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => {
                // Always show a decimal point so floats read as floats.
                if x.fract() == 0.0 && x.is_finite() {
                    write!(f, "{x:.1}")
                } else {
                    write!(f, "{x}")
                }
            }
            Value::String(s) => f.write_str(s),
            Value::Tagged(tagged) => f.write_str(&tagged.name),
            Value::Array(arr) => {
                f.write_str("{")?;
                for (i, elem) in arr.elems.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{elem}")?;
                }
                f.write_str("}")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Value::Record(rec) => {
                f.write_str("{")?;
                for (i, field) in rec.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{field}")?;
                }
                f.write_str("}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use valet_ir::SharedInterner;

    #[test]
    fn array_zero_fills_eagerly() {
        let interner = SharedInterner::new();
        let mut table = TypeTable::new(&interner);
        let inner = table.alloc_array(TypeId::INT, 2);
        let outer = table.alloc_array(inner, 3);
        let Value::Array(arr) = Value::initial(&table, outer) else {
            panic!("expected an array");
        };
        assert_eq!(arr.elems.len(), 3);
        let Value::Array(row) = &arr.elems[0] else {
            panic!("expected a nested array");
        };
        assert_eq!(row.elems, vec![Value::Int(0), Value::Int(0)]);
    }

    #[test]
    fn map_zero_is_empty_regardless_of_nesting() {
        let interner = SharedInterner::new();
        let mut table = TypeTable::new(&interner);
        let map_ty = table.alloc_map(TypeId::INT, TypeId::STRING, false);
        let arr_of_maps = table.alloc_array(map_ty, 4);
        let Value::Array(arr) = Value::initial(&table, arr_of_maps) else {
            panic!("expected an array");
        };
        let Value::Map(map) = &arr.elems[0] else {
            panic!("expected a map");
        };
        assert!(map.is_empty());
    }

    #[test]
    fn handle_zero_is_none() {
        let interner = SharedInterner::new();
        let table = TypeTable::new(&interner);
        let Value::Tagged(tagged) = Value::initial(&table, TypeId::ITEM) else {
            panic!("expected a tagged value");
        };
        assert_eq!(tagged.id, -1);
        assert_eq!(&*tagged.name, "none");
    }

    #[test]
    fn case_insensitive_map_folds_lookup_keeps_first_casing() {
        let mut map = MapValue::new(TypeId::STRING, TypeId::INT, true);
        map.insert(Value::String(Rc::from("Sword")), Value::Int(1));
        map.insert(Value::String(Rc::from("SWORD")), Value::Int(2));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&Value::String(Rc::from("sword"))), Some(&Value::Int(2)));
        let keys: Vec<String> = map.keys().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["Sword"]);
    }

    #[test]
    fn case_sensitive_map_distinguishes_casing() {
        let mut map = MapValue::new(TypeId::STRING, TypeId::INT, false);
        map.insert(Value::String(Rc::from("a")), Value::Int(1));
        map.insert(Value::String(Rc::from("A")), Value::Int(2));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn map_iteration_is_first_write_order() {
        let mut map = MapValue::new(TypeId::INT, TypeId::INT, false);
        map.insert(Value::Int(30), Value::Int(1));
        map.insert(Value::Int(10), Value::Int(2));
        map.insert(Value::Int(20), Value::Int(3));
        map.insert(Value::Int(10), Value::Int(9)); // overwrite keeps position
        let keys: Vec<&Value> = map.keys().collect();
        assert_eq!(keys, vec![&Value::Int(30), &Value::Int(10), &Value::Int(20)]);
    }

    #[test]
    fn get_never_inserts() {
        let mut map = MapValue::new(TypeId::STRING, TypeId::INT, false);
        assert_eq!(map.get(&Value::String(Rc::from("missing"))), None);
        assert!(map.is_empty());
        map.slot(Value::String(Rc::from("k")), Value::Int(0));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn float_display_keeps_a_decimal_point() {
        assert_eq!(Value::Float(1.0).to_string(), "1.0");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::Int(1).to_string(), "1");
    }
}
