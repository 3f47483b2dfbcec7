use derive_more::Display;
use trellis_span::Located;

use crate::{Name, TypeExpr, ValueExpr};

/// The kind of a declaration. Also the vocabulary of annotation targets.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeclKind {
    #[display("file")]
    File,
    #[display("using")]
    Using,
    #[display("constant")]
    Constant,
    #[display("enum")]
    Enum,
    #[display("enumerant")]
    Enumerant,
    #[display("struct")]
    Struct,
    #[display("union")]
    Union,
    #[display("field")]
    Field,
    #[display("interface")]
    Interface,
    #[display("method")]
    Method,
    #[display("parameter")]
    Param,
    #[display("annotation")]
    Annotation,
}

/// An annotation application, `$name(value)`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationApp {
    pub name: Name,
    pub value: Located<ValueExpr>,
}

/// The declared fixed wire footprint of a struct,
/// `fixed(<bits> bits, <n> pointers)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSpec {
    pub data_bits: u64,
    pub pointer_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UsingDecl {
    pub name: Located<String>,
    pub target: Name,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstantDecl {
    pub name: Located<String>,
    pub ty: TypeExpr,
    pub value: Located<ValueExpr>,
    pub annotations: Vec<AnnotationApp>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub name: Located<String>,
    pub annotations: Vec<AnnotationApp>,
    pub body: Vec<Located<Decl>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumerantDecl {
    pub name: Located<String>,
    pub number: Located<u32>,
    pub annotations: Vec<AnnotationApp>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub name: Located<String>,
    pub fixed: Option<Located<FixedSpec>>,
    pub annotations: Vec<AnnotationApp>,
    pub body: Vec<Located<Decl>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionDecl {
    pub name: Located<String>,
    pub number: Located<u32>,
    pub annotations: Vec<AnnotationApp>,
    pub body: Vec<Located<Decl>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: Located<String>,
    pub number: Located<u32>,
    pub ty: TypeExpr,
    pub annotations: Vec<AnnotationApp>,
    pub default: Option<Located<ValueExpr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDecl {
    pub name: Located<String>,
    pub annotations: Vec<AnnotationApp>,
    pub body: Vec<Located<Decl>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub name: Located<String>,
    pub number: Located<u32>,
    pub params: Vec<Located<ParamDecl>>,
    pub return_ty: TypeExpr,
    pub annotations: Vec<AnnotationApp>,
}

/// A method parameter. Parameters are numbered by position, so they
/// carry no explicit ordinal.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub name: Located<String>,
    pub ty: TypeExpr,
    pub annotations: Vec<AnnotationApp>,
    pub default: Option<Located<ValueExpr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationDecl {
    pub name: Located<String>,
    pub ty: TypeExpr,
    pub annotations: Vec<AnnotationApp>,
    pub targets: Vec<Located<DeclKind>>,
}

/// A declaration as produced by the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Using(UsingDecl),
    Constant(ConstantDecl),
    Enum(EnumDecl),
    Enumerant(EnumerantDecl),
    Struct(StructDecl),
    Union(UnionDecl),
    Field(FieldDecl),
    Interface(InterfaceDecl),
    Method(MethodDecl),
    Annotation(AnnotationDecl),
}

impl Decl {
    pub fn kind(&self) -> DeclKind {
        match self {
            Decl::Using(_) => DeclKind::Using,
            Decl::Constant(_) => DeclKind::Constant,
            Decl::Enum(_) => DeclKind::Enum,
            Decl::Enumerant(_) => DeclKind::Enumerant,
            Decl::Struct(_) => DeclKind::Struct,
            Decl::Union(_) => DeclKind::Union,
            Decl::Field(_) => DeclKind::Field,
            Decl::Interface(_) => DeclKind::Interface,
            Decl::Method(_) => DeclKind::Method,
            Decl::Annotation(_) => DeclKind::Annotation,
        }
    }

    pub fn name(&self) -> &Located<String> {
        match self {
            Decl::Using(d) => &d.name,
            Decl::Constant(d) => &d.name,
            Decl::Enum(d) => &d.name,
            Decl::Enumerant(d) => &d.name,
            Decl::Struct(d) => &d.name,
            Decl::Union(d) => &d.name,
            Decl::Field(d) => &d.name,
            Decl::Interface(d) => &d.name,
            Decl::Method(d) => &d.name,
            Decl::Annotation(d) => &d.name,
        }
    }

    /// Child declarations, for the kinds that have a body.
    pub fn body(&self) -> &[Located<Decl>] {
        match self {
            Decl::Enum(d) => &d.body,
            Decl::Struct(d) => &d.body,
            Decl::Union(d) => &d.body,
            Decl::Interface(d) => &d.body,
            _ => &[],
        }
    }

    pub fn annotations(&self) -> &[AnnotationApp] {
        match self {
            Decl::Using(_) => &[],
            Decl::Constant(d) => &d.annotations,
            Decl::Enum(d) => &d.annotations,
            Decl::Enumerant(d) => &d.annotations,
            Decl::Struct(d) => &d.annotations,
            Decl::Union(d) => &d.annotations,
            Decl::Field(d) => &d.annotations,
            Decl::Interface(d) => &d.annotations,
            Decl::Method(d) => &d.annotations,
            Decl::Annotation(d) => &d.annotations,
        }
    }

    pub(crate) fn collect_imports(&self, into: &mut Vec<Located<String>>) {
        for app in self.annotations() {
            app.name.collect_imports(into);
        }
        match self {
            Decl::Using(d) => d.target.collect_imports(into),
            Decl::Constant(d) => d.ty.collect_imports(into),
            Decl::Field(d) => d.ty.collect_imports(into),
            Decl::Annotation(d) => d.ty.collect_imports(into),
            Decl::Method(d) => {
                for (param, _) in &d.params {
                    param.ty.collect_imports(into);
                    for app in &param.annotations {
                        app.name.collect_imports(into);
                    }
                }
                d.return_ty.collect_imports(into);
            }
            Decl::Enum(_) | Decl::Struct(_) | Decl::Union(_) | Decl::Interface(_) => {}
            Decl::Enumerant(_) => {}
        }
        for (child, _) in self.body() {
            child.collect_imports(into);
        }
    }
}
