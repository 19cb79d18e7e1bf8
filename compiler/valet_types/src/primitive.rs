//! Primitive type tags.

use std::fmt;

use valet_ir::TypeId;

/// The fixed enumeration of primitive types.
///
/// Two primitives are equal iff they are the same tag. The tags past
/// `String` are the domain-specific game handles; their values are
/// opaque (id + display name) and only natives give them meaning.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Primitive {
    Void,
    Boolean,
    Int,
    Float,
    String,
    Item,
    Location,
    Monster,
    Skill,
    Effect,
}

impl Primitive {
    /// All primitives, in `TypeId` pre-interning order.
    pub const ALL: [Primitive; 10] = [
        Primitive::Void,
        Primitive::Boolean,
        Primitive::Int,
        Primitive::Float,
        Primitive::String,
        Primitive::Item,
        Primitive::Location,
        Primitive::Monster,
        Primitive::Skill,
        Primitive::Effect,
    ];

    /// Source-level name of the type.
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Void => "void",
            Primitive::Boolean => "boolean",
            Primitive::Int => "int",
            Primitive::Float => "float",
            Primitive::String => "string",
            Primitive::Item => "item",
            Primitive::Location => "location",
            Primitive::Monster => "monster",
            Primitive::Skill => "skill",
            Primitive::Effect => "effect",
        }
    }

    /// The pre-interned `TypeId` for this primitive.
    pub fn type_id(self) -> TypeId {
        match self {
            Primitive::Void => TypeId::VOID,
            Primitive::Boolean => TypeId::BOOLEAN,
            Primitive::Int => TypeId::INT,
            Primitive::Float => TypeId::FLOAT,
            Primitive::String => TypeId::STRING,
            Primitive::Item => TypeId::ITEM,
            Primitive::Location => TypeId::LOCATION,
            Primitive::Monster => TypeId::MONSTER,
            Primitive::Skill => TypeId::SKILL,
            Primitive::Effect => TypeId::EFFECT,
        }
    }

    /// Domain game handles (item, location, ...) as opposed to the
    /// scalar computational primitives.
    pub fn is_game_handle(self) -> bool {
        matches!(
            self,
            Primitive::Item
                | Primitive::Location
                | Primitive::Monster
                | Primitive::Skill
                | Primitive::Effect
        )
    }

    /// Types that may index a map. Floats are excluded: folded-key
    /// hashing on floats is ill-defined.
    pub fn is_valid_index(self) -> bool {
        !matches!(self, Primitive::Void | Primitive::Float)
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_ordering_matches_type_ids() {
        for (i, prim) in Primitive::ALL.iter().enumerate() {
            assert_eq!(prim.type_id().index(), i);
        }
    }

    #[test]
    fn float_cannot_index() {
        assert!(!Primitive::Float.is_valid_index());
        assert!(Primitive::String.is_valid_index());
        assert!(Primitive::Item.is_valid_index());
    }
}
