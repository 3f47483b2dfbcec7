//! The abstract syntax tree the semantic analyzer consumes.
//!
//! Lexing and parsing live outside this workspace; a host brings its own
//! parser by implementing [`Parse`]. The types here are the contract
//! between that parser and the compiler core: every node carries the
//! [`trellis_span::Loc`] the parser recorded for it.

mod decl;
mod name;
mod parse;
mod ty;
mod value;

pub use decl::{
    AnnotationApp, AnnotationDecl, ConstantDecl, Decl, DeclKind, EnumDecl, EnumerantDecl,
    FieldDecl, FixedSpec, InterfaceDecl, MethodDecl, ParamDecl, StructDecl, UnionDecl, UsingDecl,
};
pub use name::Name;
pub use parse::{Parse, ParsedFile};
pub use ty::{TypeArg, TypeExpr};
pub use value::ValueExpr;
