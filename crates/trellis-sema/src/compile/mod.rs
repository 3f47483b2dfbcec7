//! The declaration compiler.
//!
//! Compilation is a fixed sequence of passes over the shell tree, each
//! of which only reads attributes the passes before it populated:
//!
//! 1. declare  - shells, member maps, name collisions, scope placement
//! 2. aliases  - `using` targets
//! 3. types    - every type expression
//! 4. ids      - the reserved `id` annotation of every declaration
//! 5. layout   - struct packing, union tags and discriminants
//! 6. validate - numbering rules
//! 7. values   - constant values and defaults
//! 8. annotate - full annotation maps
//!
//! This staging is what stands in for the lazily self-referential
//! construction a non-strict host language would use: children observe
//! their parent only through its identity and through state an earlier
//! pass froze.

pub(crate) mod annotate;
pub(crate) mod declare;
pub(crate) mod pack;
pub(crate) mod type_expr;
pub(crate) mod validate;
pub(crate) mod value;

pub use annotate::compile_annotations;
pub use type_expr::compile_type;
pub use value::compile_value;

use std::collections::HashSet;

use trellis_ast::ParsedFile;
use trellis_span::{Diagnostic, Errors};

use crate::{
    desc::{FileDesc, Node},
    driver::CompileOptions,
    resolve,
};

pub(crate) struct Compiler<'a> {
    options: &'a CompileOptions,
    pub report: Errors<Diagnostic>,
}

impl<'a> Compiler<'a> {
    pub fn new(options: &'a CompileOptions, report: Errors<Diagnostic>) -> Self {
        Self { options, report }
    }

    pub fn run(&mut self, file: &Node, parsed: &ParsedFile) {
        declare::declare_file(file, parsed, &mut self.report);
        resolve::resolve_aliases(file, &mut self.report);
        type_expr::type_pass(file, &parsed.decls, &mut self.report);
        annotate::id_pass(file, parsed, &mut self.report);
        pack::layout_pass(file, &mut self.report);
        validate::validate_pass(file, self.options.max_ordinal, &mut self.report);
        value::value_pass(file, &parsed.decls, &mut self.report);
        annotate::annotate_pass(file, parsed, &mut self.report);
        file.set_runtime_imports(runtime_imports(file));
    }
}

/// The transitive closure of foreign files whose descriptors appear in
/// this file's member types.
fn runtime_imports(file: &Node) -> Vec<FileDesc> {
    let mut referenced = Vec::new();
    collect_type_references(file, &mut referenced);

    let mut seen: HashSet<Node> = HashSet::new();
    let mut imports = Vec::new();
    for node in referenced {
        let owner = node.file();
        if owner == *file || !seen.insert(owner.clone()) {
            continue;
        }
        let Ok(foreign) = FileDesc::try_from(owner) else {
            continue;
        };
        for indirect in foreign.runtime_imports() {
            if seen.insert(indirect.node().clone()) {
                imports.push(indirect.clone());
            }
        }
        imports.push(foreign);
    }
    imports
}

fn collect_type_references(node: &Node, into: &mut Vec<Node>) {
    if let Some(ty) = node.ty() {
        ty.referenced_nodes(into);
    }
    for child in node.children() {
        collect_type_references(child, into);
    }
}
