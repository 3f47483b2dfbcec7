//! The declare pass: builds the shell tree and the member maps.
//!
//! Runs before everything else so that sibling declarations can resolve
//! each other by name regardless of source order. Shells carry only what
//! the declaration itself says (kind, name, number, fixed spec, targets);
//! later passes fill in the compiled attributes.

use trellis_span::{Diagnostic, Errors, IntoDiagnostic, Loc, Located};

use trellis_ast::{Decl, DeclKind, ParsedFile};

use crate::{
    desc::{MemberMap, Node, ShellInit},
    error::{ScopeError, StructureError},
};

pub(crate) fn declare_file(file: &Node, parsed: &ParsedFile, report: &mut Errors<Diagnostic>) {
    let (children, members) = declare_body(file, &parsed.decls, report);
    file.set_children(children);
    file.set_members(members);
}

fn declare_body(
    parent: &Node,
    decls: &[Located<Decl>],
    report: &mut Errors<Diagnostic>,
) -> (Vec<Node>, MemberMap) {
    let mut children = Vec::with_capacity(decls.len());
    let mut members = MemberMap::new();

    for (decl, loc) in decls {
        let misplaced = !allowed_in(decl.kind(), parent.kind());
        if misplaced {
            report.push(misplacement(decl.kind(), parent.kind()).into_diagnostic(*loc));
        }

        let shell = declare_decl(parent, decl, misplaced, report);

        if !misplaced {
            bind(&mut members, &shell, report);

            // Union member fields are addressable from the struct scope
            // as well, both for literals and for uniqueness.
            if decl.kind() == DeclKind::Union {
                for field in shell.children() {
                    bind_union_field(&mut members, field, &shell, report);
                }
            }
        }

        children.push(shell);
    }

    (children, members)
}

fn declare_decl(
    parent: &Node,
    decl: &Decl,
    misplaced: bool,
    report: &mut Errors<Diagnostic>,
) -> Node {
    let mut init = ShellInit::new(decl.kind(), decl.name().clone());
    init.misplaced = misplaced;

    match decl {
        Decl::Using(d) => init.alias_target = Some(d.target.clone()),
        Decl::Enumerant(d) => init.ordinal = Some(d.number),
        Decl::Field(d) => init.ordinal = Some(d.number),
        Decl::Union(d) => init.ordinal = Some(d.number),
        Decl::Method(d) => init.ordinal = Some(d.number),
        Decl::Struct(d) => init.fixed = d.fixed,
        Decl::Annotation(d) => {
            init.targets = d.targets.iter().map(|(kind, _)| *kind).collect()
        }
        Decl::Constant(_) | Decl::Enum(_) | Decl::Interface(_) => {}
    }

    let shell = Node::shell(Some(parent), init);

    match decl {
        Decl::Method(d) => {
            let mut params = Vec::with_capacity(d.params.len());
            let mut members = MemberMap::new();
            for (param, _) in &d.params {
                let param_shell = Node::shell(
                    Some(&shell),
                    ShellInit::new(DeclKind::Param, param.name.clone()),
                );
                param_shell.set_children(Vec::new());
                param_shell.set_members(MemberMap::new());
                bind(&mut members, &param_shell, report);
                params.push(param_shell);
            }
            shell.set_children(params);
            shell.set_members(members);
        }
        _ => {
            let (children, members) = declare_body(&shell, decl.body(), report);
            shell.set_children(children);
            shell.set_members(members);
        }
    }

    shell
}

/// Inserts a binding, reporting a collision when the name is taken. The
/// first binding wins; the map never rebinds a name.
fn bind(members: &mut MemberMap, shell: &Node, report: &mut Errors<Diagnostic>) {
    if let Some(existing) = members.get(shell.name()) {
        report.push(duplicate(shell.name(), shell.loc(), existing.loc()));
    } else {
        members.insert(shell.name().to_owned(), shell.clone());
    }
}

fn bind_union_field(
    members: &mut MemberMap,
    field: &Node,
    union: &Node,
    report: &mut Errors<Diagnostic>,
) {
    if let Some(existing) = members.get(field.name()) {
        // A duplicate within the union was already reported when the
        // union's own member map was built.
        if existing.parent().as_ref() != Some(union) {
            report.push(duplicate(field.name(), field.loc(), existing.loc()));
        }
    } else {
        members.insert(field.name().to_owned(), field.clone());
    }
}

fn duplicate(name: &str, loc: Loc, first: Loc) -> Diagnostic {
    StructureError::DuplicateName(name.to_owned())
        .into_diagnostic(loc)
        .with_trace([("first defined here".to_owned(), first)])
}

fn allowed_in(child: DeclKind, parent: DeclKind) -> bool {
    match parent {
        DeclKind::File => matches!(
            child,
            DeclKind::Using
                | DeclKind::Constant
                | DeclKind::Enum
                | DeclKind::Struct
                | DeclKind::Interface
                | DeclKind::Annotation
        ),
        DeclKind::Struct => matches!(
            child,
            DeclKind::Using
                | DeclKind::Constant
                | DeclKind::Enum
                | DeclKind::Struct
                | DeclKind::Interface
                | DeclKind::Annotation
                | DeclKind::Field
                | DeclKind::Union
        ),
        DeclKind::Interface => matches!(
            child,
            DeclKind::Using
                | DeclKind::Constant
                | DeclKind::Enum
                | DeclKind::Struct
                | DeclKind::Interface
                | DeclKind::Annotation
                | DeclKind::Method
        ),
        DeclKind::Enum => child == DeclKind::Enumerant,
        DeclKind::Union => child == DeclKind::Field,
        _ => false,
    }
}

fn misplacement(child: DeclKind, parent: DeclKind) -> ScopeError {
    match child {
        DeclKind::Enumerant => ScopeError::EnumerantOutsideEnum,
        DeclKind::Field => ScopeError::FieldOutsideStruct,
        DeclKind::Union => ScopeError::UnionOutsideStruct,
        DeclKind::Method => ScopeError::MethodOutsideInterface,
        _ => ScopeError::Misplaced { child, parent },
    }
}
