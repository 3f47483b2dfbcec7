use trellis_span::Located;

/// A literal value as written in source.
///
/// Literals are untyped until the semantic pass coerces them against an
/// expected type; the same `Int` literal may become any integer width,
/// and an `Ident` may name an enumerant or a float special.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueExpr {
    Void,
    Bool(bool),
    /// Wide enough for the full `UInt64`/`Int64` range plus detection of
    /// anything beyond it.
    Int(i128),
    Float(f64),
    String(String),
    Ident(String),
    /// `[a, b, c]`
    List(Vec<Located<ValueExpr>>),
    /// `(name = value, ...)`
    Record(Vec<(Located<String>, Located<ValueExpr>)>),
    /// `member(value)` selecting a variant of a union.
    Union(Located<String>, Box<Located<ValueExpr>>),
}
