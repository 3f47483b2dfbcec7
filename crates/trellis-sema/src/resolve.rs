//! Name resolution.
//!
//! [`lookup`] resolves a possibly-qualified name against a scope chain:
//! member names select from their resolved parent, relative names walk
//! enclosing scopes outward, and absolute and import names go straight
//! to the file scope. The built-in table is consulted only after the
//! file's own members miss, so user declarations shadow built-ins.
//!
//! `using` aliases are transparent: finding one hands back its target.
//! Targets resolve on first demand through a small state machine so that
//! circular alias chains terminate with a diagnostic instead of looping.

use trellis_ast::{DeclKind, Name};
use trellis_span::{Diagnostic, Errors, IntoDiagnostic, Loc};

use crate::{
    builtin,
    desc::{AliasState, Desc, Node},
    error::LookupError,
    outcome::Outcome,
};

/// Resolves `name` in the given scope.
pub fn lookup(scope: &Node, name: &Name) -> Outcome<Desc> {
    match name {
        Name::Member(parent, (leaf, loc)) => {
            lookup(scope, parent).and_then(|desc| direct_member(&desc, leaf, *loc))
        }
        _ if scope.kind() == DeclKind::File => file_lookup(scope, name),
        Name::Relative((ident, loc)) => match member_of(scope, ident, *loc) {
            Some(found) => found,
            None => lookup(&enclosing(scope), name),
        },
        _ => lookup(&enclosing(scope), name),
    }
}

fn enclosing(scope: &Node) -> Node {
    scope.parent().expect("non-file scope without a parent")
}

fn file_lookup(file: &Node, name: &Name) -> Outcome<Desc> {
    match name {
        Name::Absolute((ident, loc)) => member_of(file, ident, *loc)
            .unwrap_or_else(|| not_defined(ident, *loc)),
        Name::Relative((ident, loc)) => member_of(file, ident, *loc)
            .or_else(|| builtin::builtin(ident).map(|b| Outcome::ok(Desc::Builtin(b))))
            .unwrap_or_else(|| not_defined(ident, *loc)),
        Name::Import((ident, loc)) => {
            let import = file
                .imports()
                .and_then(|imports| imports.get(ident))
                .cloned();
            match import {
                Some(found) => Outcome::ok(Desc::Node(found.node().clone())),
                None => Outcome::error(
                    LookupError::NotImported(ident.clone()).into_diagnostic(*loc),
                ),
            }
        }
        Name::Member(..) => unreachable!("member names are resolved structurally"),
    }
}

fn not_defined(ident: &str, loc: Loc) -> Outcome<Desc> {
    Outcome::error(LookupError::NotDefined(ident.to_owned()).into_diagnostic(loc))
}

/// This scope's own binding for `ident`, descending `using` aliases.
/// `None` means the scope does not bind the name at all.
fn member_of(scope: &Node, ident: &str, use_loc: Loc) -> Option<Outcome<Desc>> {
    let node = scope.members().get(ident)?.clone();
    if node.kind() == DeclKind::Using {
        Some(alias_target(&node, ident, use_loc))
    } else {
        Some(Outcome::ok(Desc::Node(node)))
    }
}

/// Looks `leaf` up as a direct member of an already-resolved descriptor.
fn direct_member(desc: &Desc, leaf: &str, loc: Loc) -> Outcome<Desc> {
    let not_member = || {
        Outcome::error(
            LookupError::NotMember {
                leaf: leaf.to_owned(),
                parent: desc.name().to_owned(),
            }
            .into_diagnostic(loc),
        )
    };

    match desc {
        Desc::Builtin(_) => not_member(),
        Desc::Node(node) => match member_of(node, leaf, loc) {
            Some(found) => found,
            None => not_member(),
        },
    }
}

/// The target of a `using` alias, resolving it now if this is the first
/// demand. A broken alias reads as an undefined name at the use site;
/// its own failure was reported when it resolved.
fn alias_target(alias: &Node, ident: &str, use_loc: Loc) -> Outcome<Desc> {
    match alias.alias_state() {
        AliasState::Done => match alias.alias() {
            Some(target) => Outcome::ok(target),
            None => not_defined(ident, use_loc),
        },
        AliasState::InProgress => Outcome::error(
            LookupError::CyclicAlias(alias.name().to_owned()).into_diagnostic(alias.loc()),
        ),
        AliasState::Pending => resolve_alias(alias),
    }
}

/// Resolves a pending alias, recording the result on the node. The
/// returned outcome carries the resolution diagnostics exactly once, for
/// whoever demanded the alias first.
pub(crate) fn resolve_alias(alias: &Node) -> Outcome<Desc> {
    debug_assert_eq!(alias.alias_state(), AliasState::Pending);

    alias.set_alias_state(AliasState::InProgress);
    let target = alias
        .alias_target()
        .expect("using declaration without a target")
        .clone();

    match lookup(alias, &target) {
        Outcome::Active(desc, errors) => {
            alias.set_alias(Some(desc.clone()));
            Outcome::with_errors(desc, errors)
        }
        Outcome::Failed(errors) => {
            alias.set_alias(None);
            Outcome::failed(errors)
        }
    }
}

/// Resolves every alias in the tree that nothing has demanded yet, so
/// all resolution diagnostics surface even for unused aliases.
pub(crate) fn resolve_aliases(node: &Node, report: &mut Errors<Diagnostic>) {
    for child in node.children() {
        if child.kind() == DeclKind::Using && child.alias_state() == AliasState::Pending {
            let _ = resolve_alias(child).take(report);
        }
        resolve_aliases(child, report);
    }
}
