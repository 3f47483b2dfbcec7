use trellis_span::Located;

use crate::Name;

/// A type expression: a name with optional parameters, `List(Text)` or
/// `InlineList(Bool, 16)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeExpr {
    pub name: Name,
    pub args: Vec<Located<TypeArg>>,
}

impl TypeExpr {
    pub fn plain(name: Name) -> Self {
        Self {
            name,
            args: Vec::new(),
        }
    }

    pub fn new(name: Name, args: Vec<Located<TypeArg>>) -> Self {
        Self { name, args }
    }

    pub(crate) fn collect_imports(&self, into: &mut Vec<Located<String>>) {
        self.name.collect_imports(into);
        for (arg, _) in &self.args {
            if let TypeArg::Type(inner) = arg {
                inner.collect_imports(into);
            }
        }
    }
}

/// A parameter of a generic type expression. `InlineList` takes a type
/// and an element count; everything else takes types only.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeArg {
    Type(TypeExpr),
    Int(i128),
}
