//! Declaration numbering rules.
//!
//! Numbers are what the wire format versions on, so they must be dense,
//! unique, and within the ordinal range the encoding can represent. The
//! checks run over the shells; a field whose type failed to compile
//! still occupies its number.

use trellis_span::{Diagnostic, Errors, IntoDiagnostic, Loc};

use trellis_ast::DeclKind;

use crate::{desc::Node, error::NumberError};

pub(crate) fn validate_pass(node: &Node, max_ordinal: u32, report: &mut Errors<Diagnostic>) {
    match node.kind() {
        DeclKind::Enum => check_numbering(
            "Enumerants",
            numbered(node, DeclKind::Enumerant),
            max_ordinal,
            report,
        ),
        DeclKind::Struct => {
            let mut items = Vec::new();
            for child in node.children() {
                if child.is_misplaced() {
                    continue;
                }
                match child.kind() {
                    DeclKind::Field => push_numbered(&mut items, child),
                    DeclKind::Union => {
                        push_numbered(&mut items, child);
                        for field in child.children() {
                            if field.kind() == DeclKind::Field && !field.is_misplaced() {
                                push_numbered(&mut items, field);
                            }
                        }
                        check_retrofit(child, report);
                    }
                    _ => {}
                }
            }
            check_numbering("Fields", items, max_ordinal, report);
        }
        DeclKind::Interface => check_numbering(
            "Methods",
            numbered(node, DeclKind::Method),
            max_ordinal,
            report,
        ),
        _ => {}
    }

    for child in node.children() {
        validate_pass(child, max_ordinal, report);
    }
}

fn numbered(node: &Node, kind: DeclKind) -> Vec<(u32, Loc)> {
    let mut items = Vec::new();
    for child in node.children() {
        if child.kind() == kind && !child.is_misplaced() {
            push_numbered(&mut items, child);
        }
    }
    items
}

fn push_numbered(items: &mut Vec<(u32, Loc)>, node: &Node) {
    if let (Some(number), Some(loc)) = (node.ordinal(), node.ordinal_loc()) {
        items.push((number, loc));
    }
}

/// Numbers of one kind must form `0, 1, 2, ...` with no gaps or repeats,
/// and every number must fit the encoding's ordinal range.
fn check_numbering(
    label: &'static str,
    mut items: Vec<(u32, Loc)>,
    max_ordinal: u32,
    report: &mut Errors<Diagnostic>,
) {
    for &(number, loc) in &items {
        if number > max_ordinal {
            report.push(
                NumberError::TooLarge {
                    number,
                    max: max_ordinal,
                }
                .into_diagnostic(loc),
            );
        }
    }

    items.sort_by_key(|&(number, _)| number);

    // Repeats: a diagnostic at every occurrence of a repeated number,
    // later ones pointing back at the first.
    let mut index = 0;
    while index < items.len() {
        let (number, first_loc) = items[index];
        let mut end = index + 1;
        while end < items.len() && items[end].0 == number {
            end += 1;
        }
        if end - index > 1 {
            for &(_, loc) in &items[index..end] {
                let mut diagnostic =
                    NumberError::Duplicate { label, number }.into_diagnostic(loc);
                if loc != first_loc {
                    diagnostic = diagnostic
                        .with_trace([("also numbered here".to_owned(), first_loc)]);
                }
                report.push(diagnostic);
            }
        }
        index = end;
    }

    // The first gap only; once the sequence is broken every later number
    // would be off as well.
    let mut expected = 0;
    for &(number, loc) in &items {
        if number < expected {
            continue; // a repeat, already reported
        }
        if number != expected {
            report.push(
                NumberError::Gap {
                    label,
                    missing: expected,
                }
                .into_diagnostic(loc),
            );
            break;
        }
        expected = number + 1;
    }
}

/// In a union numbered N, at most one member field may be numbered below
/// N. Those fields predate the union; older readers saw them as plain
/// fields, and only one such field can be retrofitted compatibly.
fn check_retrofit(union: &Node, report: &mut Errors<Diagnostic>) {
    let Some(union_number) = union.ordinal() else {
        return;
    };
    let retrofitted = union
        .children()
        .iter()
        .filter(|field| field.ordinal().is_some_and(|n| n < union_number))
        .count();
    if retrofitted > 1 {
        report.push(
            NumberError::UnionRetrofit(union.name().to_owned()).into_diagnostic(union.loc()),
        );
    }
}
