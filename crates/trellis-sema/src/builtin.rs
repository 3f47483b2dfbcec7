//! The names every file's implicit root reserves.

use derive_more::Display;
use enum_as_inner::EnumAsInner;
use serde::{Deserialize, Serialize};

/// The primitive types of the language.
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum PrimitiveType {
    Void,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Text,
    Data,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 14] = [
        PrimitiveType::Void,
        PrimitiveType::Bool,
        PrimitiveType::Int8,
        PrimitiveType::Int16,
        PrimitiveType::Int32,
        PrimitiveType::Int64,
        PrimitiveType::UInt8,
        PrimitiveType::UInt16,
        PrimitiveType::UInt32,
        PrimitiveType::UInt64,
        PrimitiveType::Float32,
        PrimitiveType::Float64,
        PrimitiveType::Text,
        PrimitiveType::Data,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Void => "Void",
            PrimitiveType::Bool => "Bool",
            PrimitiveType::Int8 => "Int8",
            PrimitiveType::Int16 => "Int16",
            PrimitiveType::Int32 => "Int32",
            PrimitiveType::Int64 => "Int64",
            PrimitiveType::UInt8 => "UInt8",
            PrimitiveType::UInt16 => "UInt16",
            PrimitiveType::UInt32 => "UInt32",
            PrimitiveType::UInt64 => "UInt64",
            PrimitiveType::Float32 => "Float32",
            PrimitiveType::Float64 => "Float64",
            PrimitiveType::Text => "Text",
            PrimitiveType::Data => "Data",
        }
    }
}

/// A pseudo-descriptor for a reserved name. Builtins have no parent, no
/// members and no annotations; they only exist to be found by lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumAsInner)]
pub enum Builtin {
    Type(PrimitiveType),
    List,
    Inline,
    InlineList,
    Id,
}

impl Builtin {
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Type(prim) => prim.name(),
            Builtin::List => "List",
            Builtin::Inline => "Inline",
            Builtin::InlineList => "InlineList",
            Builtin::Id => "id",
        }
    }
}

/// Looks a name up in the built-in table. Consulted only after the file
/// scope itself misses, so user declarations shadow these.
pub fn builtin(name: &str) -> Option<Builtin> {
    let found = match name {
        "List" => Builtin::List,
        "Inline" => Builtin::Inline,
        "InlineList" => Builtin::InlineList,
        "id" => Builtin::Id,
        _ => {
            return PrimitiveType::ALL
                .into_iter()
                .find(|prim| prim.name() == name)
                .map(Builtin::Type);
        }
    };
    Some(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_covers_primitives_and_specials() {
        assert_eq!(builtin("Int32"), Some(Builtin::Type(PrimitiveType::Int32)));
        assert_eq!(builtin("Text"), Some(Builtin::Type(PrimitiveType::Text)));
        assert_eq!(builtin("List"), Some(Builtin::List));
        assert_eq!(builtin("id"), Some(Builtin::Id));
        assert_eq!(builtin("int32"), None);
        assert_eq!(builtin("Foo"), None);
    }
}
