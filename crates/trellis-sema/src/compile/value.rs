//! The value compiler: coerces literal expressions against an expected
//! type.
//!
//! Coercion is type-driven; the same literal may compile differently
//! under different expected types. All diagnostics land on the literal's
//! own position.

use trellis_span::{Diagnostic, Errors, IntoDiagnostic, Loc, Located};

use trellis_ast::{Decl, DeclKind, ValueExpr};

use crate::{
    builtin::PrimitiveType,
    desc::{Desc, Node, Type, Value},
    error::{StructureError, ValueError},
    outcome::Outcome,
};

/// Compiles constant values and field/parameter defaults across the
/// tree. Runs after the type pass, so every expected type is known.
pub(crate) fn value_pass(node: &Node, decls: &[Located<Decl>], report: &mut Errors<Diagnostic>) {
    for (child, (decl, _)) in node.children().iter().zip(decls) {
        match decl {
            Decl::Constant(d) => {
                child.set_value(compile_against(child.ty(), &d.value, report));
            }
            Decl::Field(d) => {
                child.set_value(compile_default(child.ty(), d.default.as_ref(), report));
            }
            Decl::Method(d) => {
                for (param, (param_decl, _)) in child.children().iter().zip(&d.params) {
                    param.set_value(compile_default(
                        param.ty(),
                        param_decl.default.as_ref(),
                        report,
                    ));
                }
            }
            Decl::Enum(_) | Decl::Struct(_) | Decl::Union(_) | Decl::Interface(_) => {
                value_pass(child, decl.body(), report);
            }
            Decl::Using(_) | Decl::Enumerant(_) | Decl::Annotation(_) => {}
        }
    }
}

fn compile_against(
    ty: Option<&Type>,
    value: &Located<ValueExpr>,
    report: &mut Errors<Diagnostic>,
) -> Option<Value> {
    // A missing type already produced diagnostics of its own; there is
    // nothing to check the literal against.
    let ty = ty?;
    compile_value(ty, value).take(report)
}

fn compile_default(
    ty: Option<&Type>,
    default: Option<&Located<ValueExpr>>,
    report: &mut Errors<Diagnostic>,
) -> Option<Value> {
    let default = default?;
    if let Some(Type::InlineStruct(_)) = ty {
        report.push(StructureError::InlineDefault.into_diagnostic(default.1));
        return None;
    }
    compile_against(ty, default, report)
}

/// Compiles one literal against the expected type.
pub fn compile_value(expected: &Type, value: &Located<ValueExpr>) -> Outcome<Value> {
    let (expr, loc) = value;
    let loc = *loc;

    match expected {
        Type::Prim(prim) => compile_prim(*prim, expr, loc),
        Type::Enum(node) => compile_enumerant(node, expr, loc),
        Type::Struct(node) | Type::InlineStruct(node) => match expr {
            ValueExpr::Record(pairs) => compile_struct_literal(node, pairs, loc),
            _ => expected_form(loc, "parenthesized list of field assignments"),
        },
        Type::Interface(_) => Outcome::error(ValueError::InterfaceValue.into_diagnostic(loc)),
        Type::List(element) => match expr {
            ValueExpr::List(items) => compile_elements(element, items).map(Value::List),
            _ => expected_form(loc, "list"),
        },
        Type::InlineList(element, size) => match expr {
            ValueExpr::List(items) => {
                let mut out = compile_elements(element, items).map(Value::List);
                if items.len() != *size as usize {
                    out.push(
                        ValueError::WrongElementCount {
                            expected: *size,
                            got: items.len(),
                        }
                        .into_diagnostic(loc),
                    );
                }
                out
            }
            _ => expected_form(loc, "list"),
        },
    }
}

fn expected_form<T>(loc: Loc, form: &str) -> Outcome<T> {
    Outcome::error(Diagnostic::expected(loc, form))
}

fn compile_elements(element: &Type, items: &[Located<ValueExpr>]) -> Outcome<Vec<Value>> {
    Outcome::do_all(items.iter().map(|item| compile_value(element, item)))
}

fn compile_prim(prim: PrimitiveType, expr: &ValueExpr, loc: Loc) -> Outcome<Value> {
    use PrimitiveType::*;

    match prim {
        Void => match expr {
            ValueExpr::Void => Outcome::ok(Value::Void),
            _ => Outcome::error(ValueError::VoidValue.into_diagnostic(loc)),
        },
        Bool => match expr {
            ValueExpr::Bool(b) => Outcome::ok(Value::Bool(*b)),
            _ => expected_form(loc, "boolean"),
        },
        Int8 => compile_int(expr, loc, "Int8", i8::MIN as i128, i8::MAX as i128, |n| {
            Value::Int8(n as i8)
        }),
        Int16 => compile_int(expr, loc, "Int16", i16::MIN as i128, i16::MAX as i128, |n| {
            Value::Int16(n as i16)
        }),
        Int32 => compile_int(expr, loc, "Int32", i32::MIN as i128, i32::MAX as i128, |n| {
            Value::Int32(n as i32)
        }),
        Int64 => compile_int(expr, loc, "Int64", i64::MIN as i128, i64::MAX as i128, |n| {
            Value::Int64(n as i64)
        }),
        UInt8 => compile_int(expr, loc, "UInt8", 0, u8::MAX as i128, |n| {
            Value::UInt8(n as u8)
        }),
        UInt16 => compile_int(expr, loc, "UInt16", 0, u16::MAX as i128, |n| {
            Value::UInt16(n as u16)
        }),
        UInt32 => compile_int(expr, loc, "UInt32", 0, u32::MAX as i128, |n| {
            Value::UInt32(n as u32)
        }),
        UInt64 => compile_int(expr, loc, "UInt64", 0, u64::MAX as i128, |n| {
            Value::UInt64(n as u64)
        }),
        Float32 => compile_float(expr, loc).map(|f| Value::Float32(f as f32)),
        Float64 => compile_float(expr, loc).map(Value::Float64),
        Text => match expr {
            ValueExpr::String(s) => Outcome::ok(Value::Text(s.clone())),
            _ => expected_form(loc, "string"),
        },
        Data => match expr {
            // The blob carries the string's code units, truncated to
            // bytes.
            ValueExpr::String(s) => Outcome::ok(Value::Data(
                s.chars().map(|c| (c as u32) as u8).collect(),
            )),
            _ => expected_form(loc, "string"),
        },
    }
}

fn compile_int(
    expr: &ValueExpr,
    loc: Loc,
    ty: &'static str,
    min: i128,
    max: i128,
    make: impl FnOnce(i128) -> Value,
) -> Outcome<Value> {
    match expr {
        ValueExpr::Int(n) => {
            if (min..=max).contains(n) {
                Outcome::ok(make(*n))
            } else {
                Outcome::error(ValueError::OutOfRange { value: *n, ty }.into_diagnostic(loc))
            }
        }
        _ => expected_form(loc, "integer"),
    }
}

fn compile_float(expr: &ValueExpr, loc: Loc) -> Outcome<f64> {
    match expr {
        ValueExpr::Float(f) => Outcome::ok(*f),
        ValueExpr::Int(n) => Outcome::ok(*n as f64),
        ValueExpr::Ident(ident) if ident == "inf" => Outcome::ok(f64::INFINITY),
        ValueExpr::Ident(ident) if ident == "nan" => Outcome::ok(f64::NAN),
        _ => expected_form(loc, "number"),
    }
}

fn compile_enumerant(node: &Node, expr: &ValueExpr, loc: Loc) -> Outcome<Value> {
    match expr {
        ValueExpr::Ident(name) => match node.member(name) {
            Some(Desc::Node(member)) if member.kind() == DeclKind::Enumerant => {
                Outcome::ok(Value::Enumerant(member))
            }
            _ => Outcome::error(
                ValueError::NoSuchEnumerant {
                    enum_name: node.name().to_owned(),
                    name: name.clone(),
                }
                .into_diagnostic(loc),
            ),
        },
        _ => expected_form(loc, "enumerant name"),
    }
}

fn compile_struct_literal(
    struct_node: &Node,
    pairs: &[(Located<String>, Located<ValueExpr>)],
    loc: Loc,
) -> Outcome<Value> {
    let mut errors = Errors::new();
    let mut values = Vec::new();
    // Every targeted field, compiled or not, for the duplication checks.
    let mut assigned: Vec<(Node, String)> = Vec::new();

    for ((name, name_loc), value) in pairs {
        match struct_node.member(name) {
            Some(Desc::Node(member)) if member.kind() == DeclKind::Field => {
                if let Some(ty) = member.ty() {
                    if let Some(v) = compile_value(ty, value).take(&mut errors) {
                        values.push((member.clone(), v));
                    }
                }
                assigned.push((member, name.clone()));
            }
            Some(Desc::Node(member)) if member.kind() == DeclKind::Union => {
                compile_union_assignment(&member, value, &mut values, &mut assigned, &mut errors);
            }
            _ => errors.push(
                ValueError::NoSuchField {
                    struct_name: struct_node.name().to_owned(),
                    name: name.clone(),
                }
                .into_diagnostic(*name_loc),
            ),
        }
    }

    check_duplicate_assignments(&assigned, loc, &mut errors);
    check_union_assignments(&assigned, loc, &mut errors);

    Outcome::with_errors(Value::Struct(values), errors)
}

fn compile_union_assignment(
    union: &Node,
    value: &Located<ValueExpr>,
    values: &mut Vec<(Node, Value)>,
    assigned: &mut Vec<(Node, String)>,
    errors: &mut Errors<Diagnostic>,
) {
    let (expr, loc) = value;
    match expr {
        ValueExpr::Union((member_name, member_loc), inner) => match union.member(member_name) {
            Some(Desc::Node(field)) if field.kind() == DeclKind::Field => {
                if let Some(ty) = field.ty() {
                    if let Some(v) = compile_value(ty, inner).take(errors) {
                        values.push((field.clone(), v));
                    }
                }
                assigned.push((field, member_name.clone()));
            }
            _ => errors.push(
                ValueError::NoSuchUnionVariant {
                    union_name: union.name().to_owned(),
                    name: member_name.clone(),
                }
                .into_diagnostic(*member_loc),
            ),
        },
        _ => errors.push(Diagnostic::expected(*loc, "union value")),
    }
}

/// One diagnostic listing every field the literal assigns more than
/// once.
fn check_duplicate_assignments(
    assigned: &[(Node, String)],
    loc: Loc,
    errors: &mut Errors<Diagnostic>,
) {
    let mut names = Vec::new();
    for (index, (field, name)) in assigned.iter().enumerate() {
        let repeated = assigned[..index].iter().any(|(earlier, _)| earlier == field);
        if repeated && !names.contains(name) {
            names.push(name.clone());
        }
    }
    if !names.is_empty() {
        errors.push(
            StructureError::DuplicateFieldAssignment(names.join(", ")).into_diagnostic(loc),
        );
    }
}

/// One diagnostic per union the literal assigns several distinct fields
/// of.
fn check_union_assignments(
    assigned: &[(Node, String)],
    loc: Loc,
    errors: &mut Errors<Diagnostic>,
) {
    let mut unions: Vec<(Node, Vec<(Node, String)>)> = Vec::new();
    for (field, name) in assigned {
        let Some(parent) = field.parent() else { continue };
        if parent.kind() != DeclKind::Union {
            continue;
        }
        match unions.iter_mut().find(|(union, _)| union == &parent) {
            Some((_, fields)) => {
                if !fields.iter().any(|(f, _)| f == field) {
                    fields.push((field.clone(), name.clone()));
                }
            }
            None => unions.push((parent, vec![(field.clone(), name.clone())])),
        }
    }

    for (union, fields) in unions {
        if fields.len() > 1 {
            let names: Vec<_> = fields.into_iter().map(|(_, name)| name).collect();
            errors.push(
                StructureError::MultipleUnionAssignment {
                    union_name: union.name().to_owned(),
                    names: names.join(", "),
                }
                .into_diagnostic(loc),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_span::{SourceMap, Span};

    fn lit(expr: ValueExpr) -> Located<ValueExpr> {
        let mut sources = SourceMap::new();
        let source = sources.add("test", "");
        (expr, Loc::new(source, Span::at(0)))
    }

    fn int_ty(prim: PrimitiveType) -> Type {
        Type::Prim(prim)
    }

    fn assert_ok(expected: &Type, expr: ValueExpr, want: Value) {
        match compile_value(expected, &lit(expr)) {
            Outcome::Active(value, errors) => {
                assert!(!errors.has_errors(), "unexpected diagnostics: {errors}");
                assert_eq!(value, want);
            }
            Outcome::Failed(errors) => panic!("failed: {errors}"),
        }
    }

    fn assert_rejected(expected: &Type, expr: ValueExpr, needle: &str) {
        let out = compile_value(expected, &lit(expr));
        assert!(
            out.errors()
                .iter()
                .any(|d| d.rendered_message().contains(needle)),
            "no diagnostic containing {needle:?}: {}",
            out.errors()
        );
    }

    #[test]
    fn integers_at_the_exact_boundaries() {
        use PrimitiveType::*;

        assert_ok(&int_ty(Int8), ValueExpr::Int(127), Value::Int8(127));
        assert_ok(&int_ty(Int8), ValueExpr::Int(-128), Value::Int8(-128));
        assert_rejected(&int_ty(Int8), ValueExpr::Int(128), "out of range");
        assert_rejected(&int_ty(Int8), ValueExpr::Int(-129), "out of range");

        assert_ok(
            &int_ty(Int64),
            ValueExpr::Int(i64::MAX as i128),
            Value::Int64(i64::MAX),
        );
        assert_ok(
            &int_ty(Int64),
            ValueExpr::Int(i64::MIN as i128),
            Value::Int64(i64::MIN),
        );
        assert_rejected(&int_ty(Int64), ValueExpr::Int(i64::MAX as i128 + 1), "out of range");

        assert_ok(&int_ty(UInt8), ValueExpr::Int(0), Value::UInt8(0));
        assert_ok(&int_ty(UInt8), ValueExpr::Int(255), Value::UInt8(255));
        assert_rejected(&int_ty(UInt8), ValueExpr::Int(-1), "out of range");
        assert_ok(
            &int_ty(UInt64),
            ValueExpr::Int(u64::MAX as i128),
            Value::UInt64(u64::MAX),
        );
        assert_rejected(&int_ty(UInt64), ValueExpr::Int(u64::MAX as i128 + 1), "out of range");
    }

    #[test]
    fn void_takes_only_void() {
        assert_ok(&Type::VOID, ValueExpr::Void, Value::Void);
        assert_rejected(
            &Type::VOID,
            ValueExpr::Int(0),
            "void fields cannot have values",
        );
    }

    #[test]
    fn floats_convert_integers_and_specials() {
        let ty = Type::Prim(PrimitiveType::Float64);
        assert_ok(&ty, ValueExpr::Int(3), Value::Float64(3.0));
        assert_ok(&ty, ValueExpr::Float(1.5), Value::Float64(1.5));
        assert_ok(
            &ty,
            ValueExpr::Ident("inf".to_owned()),
            Value::Float64(f64::INFINITY),
        );

        match compile_value(&ty, &lit(ValueExpr::Ident("nan".to_owned()))) {
            Outcome::Active(Value::Float64(f), _) => assert!(f.is_nan()),
            other => panic!("expected a float, got {other:?}"),
        }

        assert_rejected(&ty, ValueExpr::String("x".to_owned()), "expected number");
    }

    #[test]
    fn data_takes_code_units() {
        assert_ok(
            &Type::Prim(PrimitiveType::Data),
            ValueExpr::String("AB\u{100}".to_owned()),
            Value::Data(vec![0x41, 0x42, 0x00]),
        );
    }

    #[test]
    fn list_elements_compile_against_the_element_type() {
        let ty = Type::List(Box::new(int_ty(PrimitiveType::Int32)));
        assert_ok(
            &ty,
            ValueExpr::List(vec![lit(ValueExpr::Int(1)), lit(ValueExpr::Int(2))]),
            Value::List(vec![Value::Int32(1), Value::Int32(2)]),
        );
        assert_rejected(&ty, ValueExpr::Int(1), "expected list");
    }

    #[test]
    fn inline_list_counts_must_match() {
        let ty = Type::InlineList(Box::new(int_ty(PrimitiveType::Bool)), 0);
        assert_ok(&ty, ValueExpr::List(Vec::new()), Value::List(Vec::new()));
        assert_rejected(
            &ty,
            ValueExpr::List(vec![lit(ValueExpr::Bool(true))]),
            "cannot be initialized with 1 elements",
        );

        let ty = Type::InlineList(Box::new(int_ty(PrimitiveType::Bool)), 2);
        assert_ok(
            &ty,
            ValueExpr::List(vec![lit(ValueExpr::Bool(true)), lit(ValueExpr::Bool(false))]),
            Value::List(vec![Value::Bool(true), Value::Bool(false)]),
        );
    }

    #[test]
    fn text_wants_a_string() {
        assert_ok(
            &Type::TEXT,
            ValueExpr::String("hi".to_owned()),
            Value::Text("hi".to_owned()),
        );
        assert_rejected(&Type::TEXT, ValueExpr::Int(1), "expected string");
    }
}
