use std::fmt;

use enum_as_inner::EnumAsInner;

use crate::builtin::PrimitiveType;

use super::{DataSectionSize, FieldSize, Node};

/// A fully resolved type.
#[derive(Debug, Clone, PartialEq, EnumAsInner)]
pub enum Type {
    Prim(PrimitiveType),
    Enum(Node),
    Struct(Node),
    Interface(Node),
    List(Box<Type>),
    /// A struct whose storage is merged into its container. Only
    /// fixed-width structs qualify.
    InlineStruct(Node),
    /// A fixed-length list merged into its container.
    InlineList(Box<Type>, u32),
}

impl Type {
    pub const VOID: Type = Type::Prim(PrimitiveType::Void);
    pub const TEXT: Type = Type::Prim(PrimitiveType::Text);

    /// How much room a field of this type takes up in its struct.
    pub fn field_size(&self) -> FieldSize {
        match self {
            Type::Prim(prim) => prim_size(*prim),
            Type::Enum(_) => FieldSize::Data(super::DataSize::Size16),
            Type::Struct(_) | Type::Interface(_) | Type::List(_) => FieldSize::Reference,
            Type::InlineStruct(node) => {
                let (data, pointers) = inline_footprint(node);
                FieldSize::InlineComposite(data, pointers)
            }
            Type::InlineList(element, count) => inline_list_size(element, *count),
        }
    }

    /// Nodes this type refers to, including through list elements. Used
    /// to compute a file's runtime imports.
    pub fn referenced_nodes(&self, into: &mut Vec<Node>) {
        match self {
            Type::Prim(_) => {}
            Type::Enum(node) | Type::Struct(node) | Type::Interface(node)
            | Type::InlineStruct(node) => into.push(node.clone()),
            Type::List(element) | Type::InlineList(element, _) => {
                element.referenced_nodes(into)
            }
        }
    }
}

fn prim_size(prim: PrimitiveType) -> FieldSize {
    use super::DataSize::*;
    match prim {
        PrimitiveType::Void => FieldSize::Void,
        PrimitiveType::Bool => FieldSize::Data(Size1),
        PrimitiveType::Int8 | PrimitiveType::UInt8 => FieldSize::Data(Size8),
        PrimitiveType::Int16 | PrimitiveType::UInt16 => FieldSize::Data(Size16),
        PrimitiveType::Int32 | PrimitiveType::UInt32 | PrimitiveType::Float32 => {
            FieldSize::Data(Size32)
        }
        PrimitiveType::Int64 | PrimitiveType::UInt64 | PrimitiveType::Float64 => {
            FieldSize::Data(Size64)
        }
        PrimitiveType::Text | PrimitiveType::Data => FieldSize::Reference,
    }
}

/// The wire footprint of an inlined struct: its *declared* fixed size.
///
/// The packed sizes may come out smaller, but inline storage must stay
/// stable when the struct later gains fields within its fixed budget, so
/// the declaration governs.
fn inline_footprint(node: &Node) -> (DataSectionSize, u32) {
    match node.fixed() {
        Some(spec) => (
            DataSectionSize::holding_bits(spec.data_bits),
            spec.pointer_count,
        ),
        // Only fixed-width structs pass the type compiler; reaching this
        // arm means an error was already reported.
        None => (DataSectionSize::EMPTY, 0),
    }
}

fn inline_list_size(element: &Type, count: u32) -> FieldSize {
    let count = count as u64;
    match element.field_size() {
        FieldSize::Void => FieldSize::InlineComposite(DataSectionSize::EMPTY, 0),
        FieldSize::Data(size) => FieldSize::InlineComposite(
            DataSectionSize::holding_bits(size.bits() * count),
            0,
        ),
        FieldSize::Reference => {
            FieldSize::InlineComposite(DataSectionSize::EMPTY, count as u32)
        }
        FieldSize::InlineComposite(data, pointers) => FieldSize::InlineComposite(
            DataSectionSize::holding_bits(data.bits() * count),
            pointers * count as u32,
        ),
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Prim(prim) => write!(f, "{}", prim.name()),
            Type::Enum(node) | Type::Struct(node) | Type::Interface(node) => {
                write!(f, "{}", node.name())
            }
            Type::List(element) => write!(f, "List({element})"),
            Type::InlineStruct(node) => write!(f, "Inline({})", node.name()),
            Type::InlineList(element, count) => write!(f, "InlineList({element}, {count})"),
        }
    }
}
