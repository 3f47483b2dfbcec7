use std::fmt;

use trellis_span::{Loc, Located};

/// A possibly-qualified name as written in source.
///
/// How a name is resolved depends on its form, see the lookup rules of
/// the semantic crate. Every form records where it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Name {
    /// Root-anchored identifier, resolved from the file scope.
    Absolute(Located<String>),
    /// Unqualified identifier, resolved via the scope walk.
    Relative(Located<String>),
    /// Names an entry of the file's import table.
    Import(Located<String>),
    /// Dotted-path selection from a resolved parent.
    Member(Box<Name>, Located<String>),
}

impl Name {
    pub fn relative(name: impl Into<String>, loc: Loc) -> Self {
        Name::Relative((name.into(), loc))
    }

    pub fn absolute(name: impl Into<String>, loc: Loc) -> Self {
        Name::Absolute((name.into(), loc))
    }

    pub fn import(name: impl Into<String>, loc: Loc) -> Self {
        Name::Import((name.into(), loc))
    }

    pub fn member(self, leaf: impl Into<String>, loc: Loc) -> Self {
        Name::Member(Box::new(self), (leaf.into(), loc))
    }

    /// The last path segment.
    pub fn leaf(&self) -> &str {
        match self {
            Name::Absolute((name, _)) | Name::Relative((name, _)) | Name::Import((name, _)) => {
                name
            }
            Name::Member(_, (leaf, _)) => leaf,
        }
    }

    /// The location of the last path segment.
    pub fn leaf_loc(&self) -> Loc {
        match self {
            Name::Absolute((_, loc)) | Name::Relative((_, loc)) | Name::Import((_, loc)) => *loc,
            Name::Member(_, (_, loc)) => *loc,
        }
    }

    /// The location of the whole name.
    pub fn loc(&self) -> Loc {
        match self {
            Name::Member(parent, (_, loc)) => parent.loc().union(*loc),
            _ => self.leaf_loc(),
        }
    }

    /// Walks the name for import-table references.
    pub(crate) fn collect_imports(&self, into: &mut Vec<Located<String>>) {
        match self {
            Name::Import(located) => into.push(located.clone()),
            Name::Member(parent, _) => parent.collect_imports(into),
            Name::Absolute(_) | Name::Relative(_) => {}
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Name::Absolute((name, _)) => write!(f, ".{name}"),
            Name::Relative((name, _)) => write!(f, "{name}"),
            Name::Import((name, _)) => write!(f, "import {name:?}"),
            Name::Member(parent, (leaf, _)) => write!(f, "{parent}.{leaf}"),
        }
    }
}
