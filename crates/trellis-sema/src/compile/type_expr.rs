//! The type expression compiler.
//!
//! Turns a syntactic `TypeExpr` into a resolved [`Type`], applying the
//! rules for the built-in generics `List`, `Inline` and `InlineList`.

use trellis_span::{Diagnostic, Errors, IntoDiagnostic, Loc, Located};

use trellis_ast::{Decl, DeclKind, TypeArg, TypeExpr};

use crate::{
    builtin::Builtin,
    desc::{Desc, Node, Type},
    error::TypeExprError,
    outcome::Outcome,
    resolve::lookup,
};

/// Compiles the type expressions of every declaration in the tree.
pub(crate) fn type_pass(node: &Node, decls: &[Located<Decl>], report: &mut Errors<Diagnostic>) {
    for (child, (decl, _)) in node.children().iter().zip(decls) {
        match decl {
            Decl::Constant(d) => child.set_ty(compile_type(child, &d.ty).take(report)),
            Decl::Field(d) => child.set_ty(compile_type(child, &d.ty).take(report)),
            Decl::Annotation(d) => child.set_ty(compile_type(child, &d.ty).take(report)),
            Decl::Method(d) => {
                for (param, (param_decl, _)) in child.children().iter().zip(&d.params) {
                    param.set_ty(compile_type(param, &param_decl.ty).take(report));
                }
                child.set_ty(compile_type(child, &d.return_ty).take(report));
            }
            Decl::Enum(_) | Decl::Struct(_) | Decl::Union(_) | Decl::Interface(_) => {
                type_pass(child, decl.body(), report);
            }
            Decl::Using(_) | Decl::Enumerant(_) => {}
        }
    }
}

/// Compiles one type expression in the given scope.
pub fn compile_type(scope: &Node, expr: &TypeExpr) -> Outcome<Type> {
    let name_loc = expr.name.loc();
    lookup(scope, &expr.name).and_then(|desc| match desc {
        Desc::Builtin(Builtin::List) => compile_list(scope, expr, name_loc),
        Desc::Builtin(Builtin::Inline) => compile_inline(scope, expr, name_loc),
        Desc::Builtin(Builtin::InlineList) => compile_inline_list(scope, expr, name_loc),
        Desc::Builtin(Builtin::Type(prim)) => {
            plain(expr, name_loc).map(|()| Type::Prim(prim))
        }
        Desc::Builtin(Builtin::Id) => Outcome::error(
            TypeExprError::NotType("id".to_owned()).into_diagnostic(name_loc),
        ),
        Desc::Node(node) => plain(expr, name_loc).and_then(|()| descriptor_type(node, name_loc)),
    })
}

/// Non-generic names take no parameters.
fn plain(expr: &TypeExpr, loc: Loc) -> Outcome<()> {
    if expr.args.is_empty() {
        Outcome::ok(())
    } else {
        Outcome::error(
            TypeExprError::NotGeneric(expr.name.leaf().to_owned()).into_diagnostic(loc),
        )
    }
}

fn descriptor_type(node: Node, loc: Loc) -> Outcome<Type> {
    match node.kind() {
        DeclKind::Enum => Outcome::ok(Type::Enum(node)),
        DeclKind::Struct => Outcome::ok(Type::Struct(node)),
        DeclKind::Interface => Outcome::ok(Type::Interface(node)),
        _ => Outcome::error(
            TypeExprError::NotType(node.name().to_owned()).into_diagnostic(loc),
        ),
    }
}

/// The single type parameter of `List` or `Inline`.
fn one_type_arg<'e>(expr: &'e TypeExpr, loc: Loc) -> Outcome<&'e TypeExpr> {
    match expr.args.as_slice() {
        [(TypeArg::Type(inner), _)] => Outcome::ok(inner),
        _ => Outcome::error(
            TypeExprError::ExactlyOneParameter(expr.name.leaf().to_owned())
                .into_diagnostic(loc),
        ),
    }
}

fn compile_list(scope: &Node, expr: &TypeExpr, loc: Loc) -> Outcome<Type> {
    one_type_arg(expr, loc)
        .and_then(|inner| compile_type(scope, inner))
        .and_then(|element| {
            if matches!(element, Type::InlineStruct(_)) {
                Outcome::error(TypeExprError::ListOfInline.into_diagnostic(loc))
            } else {
                Outcome::ok(Type::List(Box::new(element)))
            }
        })
}

fn compile_inline(scope: &Node, expr: &TypeExpr, loc: Loc) -> Outcome<Type> {
    one_type_arg(expr, loc)
        .and_then(|inner| compile_type(scope, inner))
        .and_then(|inner| match inner {
            Type::Struct(node) => fixed_struct(node, loc).map(Type::InlineStruct),
            _ => Outcome::error(TypeExprError::InlineNotStruct.into_diagnostic(loc)),
        })
}

fn fixed_struct(node: Node, loc: Loc) -> Outcome<Node> {
    if node.fixed().is_some() {
        Outcome::ok(node)
    } else {
        Outcome::error(
            TypeExprError::InlineNotFixed(node.name().to_owned()).into_diagnostic(loc),
        )
    }
}

fn compile_inline_list(scope: &Node, expr: &TypeExpr, loc: Loc) -> Outcome<Type> {
    let (inner, count, count_loc) = match expr.args.as_slice() {
        [(TypeArg::Type(inner), _), (TypeArg::Int(count), count_loc)] => {
            (inner, *count, *count_loc)
        }
        _ => {
            return Outcome::error(
                TypeExprError::TypeAndSizeParameters(expr.name.leaf().to_owned())
                    .into_diagnostic(loc),
            );
        }
    };

    if !(0..=i128::from(u32::MAX)).contains(&count) {
        return Outcome::error(TypeExprError::BadInlineListSize.into_diagnostic(count_loc));
    }
    let size = count as u32;

    compile_type(scope, inner).and_then(|element| match element {
        Type::InlineStruct(_) | Type::InlineList(..) => {
            Outcome::error(TypeExprError::InlineListOfInline.into_diagnostic(loc))
        }
        // Struct elements are stored inline, which is the point of an
        // inline list; they must therefore be fixed-width.
        Type::Struct(node) => fixed_struct(node, loc)
            .map(|node| Type::InlineList(Box::new(Type::InlineStruct(node)), size)),
        element => Outcome::ok(Type::InlineList(Box::new(element), size)),
    })
}
