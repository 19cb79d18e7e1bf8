//! Type variants.

use valet_ir::{Name, TypeId};

use crate::Primitive;

/// Sizing of an aggregate.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum AggregateSize {
    /// Fixed element count: the aggregate is an array.
    Fixed(u32),
    /// Dynamic key set: the aggregate is a map.
    Unbounded,
}

impl AggregateSize {
    /// Fixed size, if this is an array.
    pub fn fixed(self) -> Option<u32> {
        match self {
            AggregateSize::Fixed(n) => Some(n),
            AggregateSize::Unbounded => None,
        }
    }
}

/// An array or map type.
///
/// Constructed only through `TypeTable::alloc_array` /
/// `TypeTable::alloc_map`, which enforce the two structural invariants:
/// arrays index by `int`, and `case_insensitive` survives only on a
/// string index.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct AggregateType {
    /// Element type.
    pub data: TypeId,
    /// Index type; always `int` for arrays.
    pub index: TypeId,
    pub size: AggregateSize,
    /// String keys fold case on lookup; first-write casing is preserved
    /// for display. Never true unless `index` is `string`.
    pub case_insensitive: bool,
}

impl AggregateType {
    /// Check if this aggregate is an array.
    pub fn is_array(&self) -> bool {
        matches!(self.size, AggregateSize::Fixed(_))
    }

    /// Check if this aggregate is a map.
    pub fn is_map(&self) -> bool {
        matches!(self.size, AggregateSize::Unbounded)
    }
}

/// A named record type with ordered fields.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct RecordType {
    pub name: Name,
    /// Ordered (field name, field type) pairs.
    pub fields: Vec<(Name, TypeId)>,
}

impl RecordType {
    /// Position and type of a field, if present.
    pub fn field(&self, name: Name) -> Option<(usize, TypeId)> {
        self.fields
            .iter()
            .position(|&(f, _)| f == name)
            .map(|i| (i, self.fields[i].1))
    }
}

/// A function signature: ordered parameter types plus return type.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct FunctionType {
    pub params: Vec<TypeId>,
    pub ret: TypeId,
}

/// A Valet type.
///
/// One tagged variant per category; every equality/formatting rule is an
/// exhaustive match in `TypeTable`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Type {
    Primitive(Primitive),
    Aggregate(AggregateType),
    Record(RecordType),
    Function(FunctionType),
}

impl Type {
    /// The aggregate payload, if this is an aggregate.
    pub fn as_aggregate(&self) -> Option<&AggregateType> {
        match self {
            Type::Aggregate(agg) => Some(agg),
            _ => None,
        }
    }

    /// The record payload, if this is a record.
    pub fn as_record(&self) -> Option<&RecordType> {
        match self {
            Type::Record(rec) => Some(rec),
            _ => None,
        }
    }
}
