//! The diagnostic vocabulary, grouped by cause.
//!
//! Every enum here implements [`IntoDiagnostic`], so an error plus the
//! location it refers to becomes a located [`Diagnostic`]. Nothing is
//! thrown; callers collect the diagnostics through [`crate::outcome`].

use thiserror::Error;
use trellis_ast::DeclKind;
use trellis_span::IntoDiagnostic;

/// Name resolution failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("'{0}' is not defined.")]
    NotDefined(String),
    #[error("'{leaf}' is not a member of '{parent}'.")]
    NotMember { leaf: String, parent: String },
    #[error("{0:?} does not name an import of this file.")]
    NotImported(String),
    #[error("'{0}' is declared in terms of itself.")]
    CyclicAlias(String),
}

impl IntoDiagnostic for LookupError {}

/// Misuse of type expressions and the built-in generics.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeExprError {
    #[error("'{0}' requires exactly one type parameter.")]
    ExactlyOneParameter(String),
    #[error("'{0}' requires exactly two parameters: a type and a size.")]
    TypeAndSizeParameters(String),
    #[error("'{0}' does not accept type parameters.")]
    NotGeneric(String),
    #[error("'{0}' is not a type.")]
    NotType(String),
    #[error("Don't declare list elements 'Inline'.")]
    ListOfInline,
    #[error("'Inline' parameter must be a struct type.")]
    InlineNotStruct,
    #[error("'{0}' is not a fixed-width struct, so it cannot be inlined.")]
    InlineNotFixed(String),
    #[error("InlineList elements cannot themselves be inline.")]
    InlineListOfInline,
    #[error("InlineList size must be a non-negative integer.")]
    BadInlineListSize,
}

impl IntoDiagnostic for TypeExprError {}

/// Literal values that do not fit their expected type.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValueError {
    #[error("void fields cannot have values")]
    VoidValue,
    #[error("Integer value {value} is out of range for type {ty}.")]
    OutOfRange { value: i128, ty: &'static str },
    #[error("'{name}' is not a member of enum '{enum_name}'.")]
    NoSuchEnumerant { enum_name: String, name: String },
    #[error("'{name}' is not a field of '{struct_name}'.")]
    NoSuchField { struct_name: String, name: String },
    #[error("'{name}' is not a member of union '{union_name}'.")]
    NoSuchUnionVariant { union_name: String, name: String },
    #[error("Interface fields cannot have values.")]
    InterfaceValue,
    #[error("InlineList of size {expected} cannot be initialized with {got} elements.")]
    WrongElementCount { expected: u32, got: usize },
}

impl IntoDiagnostic for ValueError {}

/// Structural problems in declarations and literals.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StructureError {
    #[error("'{0}' is already defined in this scope.")]
    DuplicateName(String),
    #[error("assigns fields more than once: {0}")]
    DuplicateFieldAssignment(String),
    #[error("assigns multiple fields belonging to the same union '{union_name}': {names}")]
    MultipleUnionAssignment { union_name: String, names: String },
    #[error("Inline fields cannot have default values.")]
    InlineDefault,
}

impl IntoDiagnostic for StructureError {}

/// Declaration numbering violations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NumberError {
    #[error("{label} are not numbered uniquely; number {number} appears more than once.")]
    Duplicate { label: &'static str, number: u32 },
    #[error("{label} must be numbered sequentially starting from zero; number {missing} is missing.")]
    Gap { label: &'static str, missing: u32 },
    #[error("Number {number} is too large; the maximum ordinal is {max}.")]
    TooLarge { number: u32, max: u32 },
    #[error("No more than one field of union '{0}' may have a number lower than the union's.")]
    UnionRetrofit(String),
}

impl IntoDiagnostic for NumberError {}

/// Fixed-width layout violations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("A fixed-width struct's data section must be 0, 1, 8, 16, 32, or a multiple of 64 bits.")]
    BadFixedSize,
    #[error("Struct needs {actual} bits of data, but is fixed at {requested} bits.")]
    FixedDataExceeded { actual: u64, requested: u64 },
    #[error("Struct needs {actual} pointers, but is fixed at {requested}.")]
    FixedPointersExceeded { actual: u64, requested: u32 },
}

impl IntoDiagnostic for LayoutError {}

/// Declarations appearing under the wrong parent.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScopeError {
    #[error("Enumerants may only appear inside enums.")]
    EnumerantOutsideEnum,
    #[error("Fields may only appear inside structs or unions.")]
    FieldOutsideStruct,
    #[error("Unions may only appear inside structs.")]
    UnionOutsideStruct,
    #[error("Methods may only appear inside interfaces.")]
    MethodOutsideInterface,
    #[error("A {child} may not be declared inside a {parent}.")]
    Misplaced { child: DeclKind, parent: DeclKind },
}

impl IntoDiagnostic for ScopeError {}

/// Misapplied annotations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnnotationError {
    #[error("'{0}' is not an annotation.")]
    NotAnnotation(String),
    #[error("'{name}' cannot annotate a {kind}.")]
    WrongTarget { name: String, kind: DeclKind },
    #[error("Duplicate 'id' annotation.")]
    DuplicateId,
    #[error("Duplicate annotation with id '{0}'.")]
    DuplicateKey(String),
}

impl IntoDiagnostic for AnnotationError {}

/// Failures reported by the host's import callback.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("Import {name:?} failed: {reason}")]
    Failed { name: String, reason: String },
}

impl IntoDiagnostic for ImportError {}
