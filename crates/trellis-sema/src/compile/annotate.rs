//! The annotation compiler.
//!
//! Runs in two passes. The id pass extracts the reserved `id` annotation
//! for every declaration first, because the annotation *map* of any
//! declaration is keyed by the ids of the annotation declarations applied
//! to it. The main pass then compiles every other application against
//! its annotation's declared type and target set.

use std::sync::Arc;

use trellis_span::{Diagnostic, Errors, IntoDiagnostic, Located};

use trellis_ast::{AnnotationApp, Decl, DeclKind, ParsedFile};

use crate::{
    builtin::Builtin,
    desc::{AnnotationMap, Desc, Node, Type, Value},
    error::AnnotationError,
    outcome::Outcome,
    resolve::lookup,
};

use super::value::compile_value;

pub(crate) fn id_pass(file: &Node, parsed: &ParsedFile, report: &mut Errors<Diagnostic>) {
    file.set_id(extract_id(file, &parsed.annotations, report));
    id_walk(file, &parsed.decls, report);
}

fn id_walk(node: &Node, decls: &[Located<Decl>], report: &mut Errors<Diagnostic>) {
    for (child, (decl, _)) in node.children().iter().zip(decls) {
        child.set_id(extract_id(child, decl.annotations(), report));
        if let Decl::Method(d) = decl {
            for (param, (param_decl, _)) in child.children().iter().zip(&d.params) {
                param.set_id(extract_id(param, &param_decl.annotations, report));
            }
        }
        id_walk(child, decl.body(), report);
    }
}

/// The first `id` annotation wins; later ones are duplicates. Whether a
/// name resolves at all is the main pass's business, so resolution
/// failures are ignored here.
fn extract_id(
    scope: &Node,
    apps: &[AnnotationApp],
    report: &mut Errors<Diagnostic>,
) -> Option<Arc<str>> {
    let mut id = None;

    for app in apps {
        let Outcome::Active(Desc::Builtin(Builtin::Id), _) = lookup(scope, &app.name) else {
            continue;
        };
        if id.is_some() {
            report.push(AnnotationError::DuplicateId.into_diagnostic(app.name.loc()));
            continue;
        }
        if let Some(Value::Text(text)) = compile_value(&Type::TEXT, &app.value).take(report) {
            id = Some(Arc::from(text));
        }
    }

    id
}

pub(crate) fn annotate_pass(file: &Node, parsed: &ParsedFile, report: &mut Errors<Diagnostic>) {
    let map = compile_annotations(file, DeclKind::File, &parsed.annotations).take(report);
    file.set_annotations(map.unwrap_or_default());
    annotate_walk(file, &parsed.decls, report);
}

fn annotate_walk(node: &Node, decls: &[Located<Decl>], report: &mut Errors<Diagnostic>) {
    for (child, (decl, _)) in node.children().iter().zip(decls) {
        let map = compile_annotations(child, decl.kind(), decl.annotations()).take(report);
        child.set_annotations(map.unwrap_or_default());

        if let Decl::Method(d) = decl {
            for (param, (param_decl, _)) in child.children().iter().zip(&d.params) {
                let map =
                    compile_annotations(param, DeclKind::Param, &param_decl.annotations)
                        .take(report);
                param.set_annotations(map.unwrap_or_default());
            }
        }
        annotate_walk(child, decl.body(), report);
    }
}

/// Compiles the non-`id` annotations of one declaration into its map.
pub fn compile_annotations(
    scope: &Node,
    target: DeclKind,
    apps: &[AnnotationApp],
) -> Outcome<AnnotationMap> {
    let compiled = Outcome::do_all(
        apps.iter()
            .map(|app| compile_application(scope, target, app)),
    );

    compiled.map(|entries| {
        let mut entries: Vec<_> = entries.into_iter().flatten().collect();
        entries.sort_by(|(a, ..), (b, ..)| a.cmp(b));
        entries
    })
    .and_then(|entries| {
        let mut errors = Errors::new();
        let mut map = AnnotationMap::new();
        for (key, decl, value, loc) in entries {
            if map.contains_key(&key) {
                errors.push(AnnotationError::DuplicateKey(key).into_diagnostic(loc));
            } else {
                map.insert(key, (decl, value));
            }
        }
        Outcome::with_errors(map, errors)
    })
}

type Entry = (String, Node, Value, trellis_span::Loc);

fn compile_application(
    scope: &Node,
    target: DeclKind,
    app: &AnnotationApp,
) -> Outcome<Option<Entry>> {
    let name_loc = app.name.loc();
    lookup(scope, &app.name).and_then(|desc| match desc {
        // Handled by the id pass.
        Desc::Builtin(Builtin::Id) => Outcome::ok(None),
        Desc::Builtin(builtin) => Outcome::error(
            AnnotationError::NotAnnotation(builtin.name().to_owned()).into_diagnostic(name_loc),
        ),
        Desc::Node(node) if node.kind() == DeclKind::Annotation => {
            let mut errors = Errors::new();
            if !node.targets().contains(&target) {
                errors.push(
                    AnnotationError::WrongTarget {
                        name: node.name().to_owned(),
                        kind: target,
                    }
                    .into_diagnostic(name_loc),
                );
            }

            let value = node
                .ty()
                .and_then(|ty| compile_value(ty, &app.value).take(&mut errors));

            // An annotation whose declaration has no id cannot be keyed;
            // it drops out of the map, but its diagnostics were kept.
            let entry = match (node.id(), value) {
                (Some(id), Some(value)) => {
                    Some((id.to_owned(), node.clone(), value, name_loc))
                }
                _ => None,
            };
            Outcome::with_errors(entry, errors)
        }
        Desc::Node(node) => Outcome::error(
            AnnotationError::NotAnnotation(node.name().to_owned()).into_diagnostic(name_loc),
        ),
    })
}
