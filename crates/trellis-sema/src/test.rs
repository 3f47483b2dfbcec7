//! Test support: programmatic ASTs against a mocked source.

use std::cell::Cell;

use trellis_ast::{
    AnnotationApp, AnnotationDecl, ConstantDecl, Decl, DeclKind, EnumDecl, EnumerantDecl,
    FieldDecl, FixedSpec, InterfaceDecl, MethodDecl, Name, ParamDecl, ParsedFile, StructDecl,
    TypeArg, TypeExpr, UnionDecl, UsingDecl, ValueExpr,
};
use trellis_span::{Loc, Located, SourceId, SourceMap, Span};

use crate::{
    desc::{Desc, FileDesc, Node},
    driver::{compile_file, CompileOptions, ImportResolver},
    outcome::Outcome,
};

/// Builds AST nodes with distinct, strictly increasing locations, so
/// tests can tell diagnostics at different declarations apart.
pub(crate) struct AstBuilder {
    source: SourceId,
    counter: Cell<usize>,
}

impl AstBuilder {
    pub fn new() -> Self {
        let mut sources = SourceMap::new();
        Self {
            source: sources.add("test", ""),
            counter: Cell::new(0),
        }
    }

    pub fn loc(&self) -> Loc {
        let n = self.counter.get();
        self.counter.set(n + 1);
        Loc::new(self.source, Span::new(n, n + 1))
    }

    pub fn name(&self, name: &str) -> Located<String> {
        (name.to_owned(), self.loc())
    }

    pub fn num(&self, number: u32) -> Located<u32> {
        (number, self.loc())
    }

    pub fn rel(&self, name: &str) -> Name {
        Name::relative(name, self.loc())
    }

    pub fn ty(&self, name: &str) -> TypeExpr {
        TypeExpr::plain(self.rel(name))
    }

    pub fn inline_of(&self, element: TypeExpr) -> TypeExpr {
        TypeExpr::new(
            self.rel("Inline"),
            vec![(TypeArg::Type(element), self.loc())],
        )
    }

    pub fn inline_list_of(&self, element: TypeExpr, count: i128) -> TypeExpr {
        TypeExpr::new(
            self.rel("InlineList"),
            vec![
                (TypeArg::Type(element), self.loc()),
                (TypeArg::Int(count), self.loc()),
            ],
        )
    }

    pub fn lit(&self, expr: ValueExpr) -> Located<ValueExpr> {
        (expr, self.loc())
    }

    pub fn field(&self, name: &str, number: u32, ty: TypeExpr) -> Located<Decl> {
        let loc = self.loc();
        (
            Decl::Field(FieldDecl {
                name: self.name(name),
                number: self.num(number),
                ty,
                annotations: Vec::new(),
                default: None,
            }),
            loc,
        )
    }

    pub fn field_with_default(
        &self,
        name: &str,
        number: u32,
        ty: TypeExpr,
        default: ValueExpr,
    ) -> Located<Decl> {
        let loc = self.loc();
        (
            Decl::Field(FieldDecl {
                name: self.name(name),
                number: self.num(number),
                ty,
                annotations: Vec::new(),
                default: Some(self.lit(default)),
            }),
            loc,
        )
    }

    pub fn strukt(&self, name: &str, body: Vec<Located<Decl>>) -> Located<Decl> {
        let loc = self.loc();
        (
            Decl::Struct(StructDecl {
                name: self.name(name),
                fixed: None,
                annotations: Vec::new(),
                body,
            }),
            loc,
        )
    }

    pub fn fixed_struct(
        &self,
        name: &str,
        data_bits: u64,
        pointer_count: u32,
        body: Vec<Located<Decl>>,
    ) -> Located<Decl> {
        let loc = self.loc();
        (
            Decl::Struct(StructDecl {
                name: self.name(name),
                fixed: Some((
                    FixedSpec {
                        data_bits,
                        pointer_count,
                    },
                    self.loc(),
                )),
                annotations: Vec::new(),
                body,
            }),
            loc,
        )
    }

    pub fn union_decl(
        &self,
        name: &str,
        number: u32,
        body: Vec<Located<Decl>>,
    ) -> Located<Decl> {
        let loc = self.loc();
        (
            Decl::Union(UnionDecl {
                name: self.name(name),
                number: self.num(number),
                annotations: Vec::new(),
                body,
            }),
            loc,
        )
    }

    pub fn enum_decl(&self, name: &str, body: Vec<Located<Decl>>) -> Located<Decl> {
        let loc = self.loc();
        (
            Decl::Enum(EnumDecl {
                name: self.name(name),
                annotations: Vec::new(),
                body,
            }),
            loc,
        )
    }

    pub fn enumerant(&self, name: &str, number: u32) -> Located<Decl> {
        let loc = self.loc();
        (
            Decl::Enumerant(EnumerantDecl {
                name: self.name(name),
                number: self.num(number),
                annotations: Vec::new(),
            }),
            loc,
        )
    }

    pub fn constant(&self, name: &str, ty: TypeExpr, value: ValueExpr) -> Located<Decl> {
        let loc = self.loc();
        (
            Decl::Constant(ConstantDecl {
                name: self.name(name),
                ty,
                value: self.lit(value),
                annotations: Vec::new(),
            }),
            loc,
        )
    }

    pub fn using(&self, name: &str, target: Name) -> Located<Decl> {
        let loc = self.loc();
        (
            Decl::Using(UsingDecl {
                name: self.name(name),
                target,
            }),
            loc,
        )
    }

    pub fn interface(&self, name: &str, body: Vec<Located<Decl>>) -> Located<Decl> {
        let loc = self.loc();
        (
            Decl::Interface(InterfaceDecl {
                name: self.name(name),
                annotations: Vec::new(),
                body,
            }),
            loc,
        )
    }

    pub fn method(
        &self,
        name: &str,
        number: u32,
        params: Vec<Located<ParamDecl>>,
        return_ty: TypeExpr,
    ) -> Located<Decl> {
        let loc = self.loc();
        (
            Decl::Method(MethodDecl {
                name: self.name(name),
                number: self.num(number),
                params,
                return_ty,
                annotations: Vec::new(),
            }),
            loc,
        )
    }

    pub fn param(&self, name: &str, ty: TypeExpr) -> Located<ParamDecl> {
        let loc = self.loc();
        (
            ParamDecl {
                name: self.name(name),
                ty,
                annotations: Vec::new(),
                default: None,
            },
            loc,
        )
    }

    pub fn annotation(
        &self,
        name: &str,
        ty: TypeExpr,
        targets: Vec<DeclKind>,
        annotations: Vec<AnnotationApp>,
    ) -> Located<Decl> {
        let loc = self.loc();
        (
            Decl::Annotation(AnnotationDecl {
                name: self.name(name),
                ty,
                annotations,
                targets: targets.into_iter().map(|kind| (kind, self.loc())).collect(),
            }),
            loc,
        )
    }

    pub fn app(&self, name: &str, value: ValueExpr) -> AnnotationApp {
        AnnotationApp {
            name: self.rel(name),
            value: self.lit(value),
        }
    }

    pub fn compile(&self, decls: Vec<Located<Decl>>) -> Outcome<FileDesc> {
        let mut imports =
            |name: &str| -> Result<FileDesc, String> { Err(format!("no such import {name:?}")) };
        self.compile_with(decls, Vec::new(), &mut imports, &CompileOptions::default())
    }

    pub fn compile_with(
        &self,
        decls: Vec<Located<Decl>>,
        annotations: Vec<AnnotationApp>,
        imports: &mut dyn ImportResolver,
        options: &CompileOptions,
    ) -> Outcome<FileDesc> {
        let parsed = ParsedFile {
            decls,
            annotations,
            errors: Vec::new(),
        };
        let parser = move |_: SourceId, _: &str| parsed.clone();
        compile_file("test.idl", self.source, "", &parser, imports, options)
    }
}

/// Unwraps a clean compilation; panics with the diagnostics otherwise.
pub(crate) fn assert_clean(outcome: Outcome<FileDesc>) -> FileDesc {
    match outcome {
        Outcome::Active(file, errors) => {
            assert!(!errors.has_errors(), "unexpected diagnostics:\n{errors}");
            file
        }
        Outcome::Failed(errors) => panic!("compilation failed:\n{errors}"),
    }
}

/// The file descriptor of an outcome that may carry errors.
pub(crate) fn result_file(outcome: &Outcome<FileDesc>) -> FileDesc {
    match outcome {
        Outcome::Active(file, _) => file.clone(),
        Outcome::Failed(errors) => panic!("driver must stay active:\n{errors}"),
    }
}

pub(crate) fn diagnostics_containing(outcome: &Outcome<FileDesc>, needle: &str) -> usize {
    outcome
        .errors()
        .iter()
        .filter(|d| d.rendered_message().contains(needle))
        .count()
}

pub(crate) fn member_node(file: &FileDesc, name: &str) -> Node {
    match file.member(name) {
        Some(Desc::Node(node)) => node,
        other => panic!("member {name:?} missing or not a node: {other:?}"),
    }
}
