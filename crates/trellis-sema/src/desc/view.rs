//! Kind-checked windows onto descriptor nodes.
//!
//! Each view wraps a [`Node`] whose kind has been verified, and exposes
//! the attributes that kind actually has. Construction via `try_from`
//! returns the node back on a kind mismatch.

use indexmap::IndexMap;
use trellis_ast::DeclKind;

use super::{
    DataSectionSize, Desc, FieldOffset, Node, StructLayout, Type, UnionLayout, Value,
};

macro_rules! view {
    ($(#[$doc:meta])* $name:ident, $kind:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name(Node);

        impl $name {
            pub fn node(&self) -> &Node {
                &self.0
            }

            pub fn name(&self) -> &str {
                self.0.name()
            }

            pub fn id(&self) -> Option<&str> {
                self.0.id()
            }
        }

        impl TryFrom<Node> for $name {
            type Error = Node;

            fn try_from(node: Node) -> Result<Self, Node> {
                if node.kind() == DeclKind::$kind {
                    Ok(Self(node))
                } else {
                    Err(node)
                }
            }
        }

        impl std::ops::Deref for $name {
            type Target = Node;

            fn deref(&self) -> &Node {
                &self.0
            }
        }
    };
}

view!(
    /// The root of a compiled file.
    FileDesc,
    File
);
view!(StructDesc, Struct);
view!(EnumDesc, Enum);
view!(EnumerantDesc, Enumerant);
view!(UnionDesc, Union);
view!(FieldDesc, Field);
view!(InterfaceDesc, Interface);
view!(MethodDesc, Method);
view!(ConstantDesc, Constant);
view!(AnnotationDesc, Annotation);

impl FileDesc {
    /// The import table: import name to resolved file.
    pub fn imports(&self) -> &IndexMap<String, FileDesc> {
        self.0.imports().expect("file imports not compiled")
    }

    /// The transitive closure of foreign files referenced by member
    /// types.
    pub fn runtime_imports(&self) -> &[FileDesc] {
        self.0.runtime_imports()
    }

    /// Looks a top-level member up by name, descending aliases.
    pub fn member(&self, name: &str) -> Option<Desc> {
        self.0.member(name)
    }
}

impl StructDesc {
    pub fn layout(&self) -> &StructLayout {
        self.0.layout().expect("struct layout not packed")
    }

    pub fn data_size(&self) -> DataSectionSize {
        self.layout().data_size
    }

    pub fn pointer_count(&self) -> u32 {
        self.layout().pointer_count
    }

    /// The fields declared directly in the struct, union members
    /// included, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = FieldDesc> + '_ {
        self.0
            .members()
            .values()
            .filter_map(|node| FieldDesc::try_from(node.clone()).ok())
    }

    pub fn unions(&self) -> impl Iterator<Item = UnionDesc> + '_ {
        self.0
            .members()
            .values()
            .filter_map(|node| UnionDesc::try_from(node.clone()).ok())
    }
}

impl EnumDesc {
    pub fn enumerants(&self) -> impl Iterator<Item = EnumerantDesc> + '_ {
        self.0
            .members()
            .values()
            .filter_map(|node| EnumerantDesc::try_from(node.clone()).ok())
    }
}

impl EnumerantDesc {
    pub fn number(&self) -> u32 {
        self.0.ordinal().expect("enumerant without a number")
    }
}

impl UnionDesc {
    pub fn number(&self) -> u32 {
        self.0.ordinal().expect("union without a number")
    }

    pub fn layout(&self) -> &UnionLayout {
        self.0.union_layout().expect("union layout not computed")
    }

    /// The discriminant assigned to a member field, by its number.
    pub fn discriminant(&self, field_number: u32) -> Option<u16> {
        self.layout().discriminants.get(&field_number).copied()
    }

    pub fn fields(&self) -> impl Iterator<Item = FieldDesc> + '_ {
        self.0
            .members()
            .values()
            .filter_map(|node| FieldDesc::try_from(node.clone()).ok())
    }
}

impl FieldDesc {
    pub fn number(&self) -> u32 {
        self.0.ordinal().expect("field without a number")
    }

    pub fn ty(&self) -> Option<&Type> {
        self.0.ty()
    }

    pub fn default(&self) -> Option<&Value> {
        self.0.value()
    }

    /// The union this field is a variant of, if any.
    pub fn containing_union(&self) -> Option<UnionDesc> {
        self.0.parent().and_then(|p| UnionDesc::try_from(p).ok())
    }

    /// Where the field landed in its struct's footprint.
    pub fn offset(&self) -> Option<FieldOffset> {
        let mut parent = self.0.parent()?;
        if parent.kind() == DeclKind::Union {
            parent = parent.parent()?;
        }
        parent.layout()?.offset_of(self.number())
    }
}

impl InterfaceDesc {
    pub fn methods(&self) -> impl Iterator<Item = MethodDesc> + '_ {
        self.0
            .members()
            .values()
            .filter_map(|node| MethodDesc::try_from(node.clone()).ok())
    }
}

impl MethodDesc {
    pub fn number(&self) -> u32 {
        self.0.ordinal().expect("method without a number")
    }

    pub fn return_ty(&self) -> Option<&Type> {
        self.0.ty()
    }

    /// Parameters in declaration order.
    pub fn params(&self) -> &[Node] {
        self.0.children()
    }
}

impl ConstantDesc {
    pub fn ty(&self) -> Option<&Type> {
        self.0.ty()
    }

    pub fn value(&self) -> Option<&Value> {
        self.0.value()
    }
}

impl AnnotationDesc {
    /// The type annotation values must coerce to.
    pub fn ty(&self) -> Option<&Type> {
        self.0.ty()
    }

    pub fn targets(&self) -> &[DeclKind] {
        self.0.targets()
    }
}

