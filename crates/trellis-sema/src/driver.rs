//! The file driver: parse, resolve imports, compile.
//!
//! The driver owns no I/O. The host registers source texts in a
//! [`trellis_span::SourceMap`], brings a [`Parse`] implementation, and
//! answers import requests through an [`ImportResolver`]; files must be
//! compiled in dependency order, imports first.

use indexmap::IndexMap;
use log::debug;
use trellis_ast::{DeclKind, Parse};
use trellis_span::{Errors, IntoDiagnostic, Loc, SourceId};

use crate::{
    compile::Compiler,
    desc::{FileDesc, MemberMap, Node, ShellInit},
    error::ImportError,
    outcome::Outcome,
};

/// Tunables of the compilation.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// The largest declaration number the binary encoding can represent.
    pub max_ordinal: u32,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self { max_ordinal: 65534 }
    }
}

/// The import callback: maps an import name to an already-compiled file,
/// or explains why it cannot. Each distinct name is requested exactly
/// once per file compilation.
pub trait ImportResolver {
    fn resolve(&mut self, name: &str) -> Result<FileDesc, String>;
}

impl<F> ImportResolver for F
where
    F: FnMut(&str) -> Result<FileDesc, String>,
{
    fn resolve(&mut self, name: &str) -> Result<FileDesc, String> {
        self(name)
    }
}

/// Parses and compiles one file.
///
/// Diagnostics are ordered parse errors first, then import failures,
/// then compilation. The outcome is always `Active`: whatever portion
/// compiled is returned alongside the diagnostics, so callers can
/// inspect both.
pub fn compile_file(
    name: &str,
    source: SourceId,
    text: &str,
    parser: &dyn Parse,
    imports: &mut dyn ImportResolver,
    options: &CompileOptions,
) -> Outcome<FileDesc> {
    let parsed = parser.parse(source, text);
    debug!(
        "compiling {name}: {} declarations, {} parse errors",
        parsed.decls.len(),
        parsed.errors.len()
    );

    let mut report = Errors::new();
    report.extend(parsed.errors.iter().cloned());

    let mut import_map = IndexMap::new();
    for (import_name, loc) in parsed.import_names() {
        match imports.resolve(&import_name) {
            Ok(file) => {
                import_map.insert(import_name, file);
            }
            Err(reason) => {
                debug!("import {import_name:?} failed: {reason}");
                report.push(
                    ImportError::Failed {
                        name: import_name.clone(),
                        reason,
                    }
                    .into_diagnostic(loc),
                );
                // Substitute an empty file so the rest of this file still
                // compiles; lookups into it fail with ordinary errors.
                import_map.insert(import_name.clone(), empty_file(&import_name, loc));
            }
        }
    }

    let file = Node::shell(
        None,
        ShellInit::new(DeclKind::File, (name.to_owned(), Loc::start_of(source))),
    );
    file.set_imports(import_map);

    let mut compiler = Compiler::new(options, report);
    compiler.run(&file, &parsed);

    let file = FileDesc::try_from(file).expect("root shell is a file");
    Outcome::with_errors(file, compiler.report)
}

fn empty_file(name: &str, loc: Loc) -> FileDesc {
    let file = Node::shell(None, ShellInit::new(DeclKind::File, (name.to_owned(), loc)));
    file.set_children(Vec::new());
    file.set_members(MemberMap::new());
    file.set_imports(IndexMap::new());
    file.set_id(None);
    file.set_annotations(Default::default());
    file.set_runtime_imports(Vec::new());
    FileDesc::try_from(file).expect("root shell is a file")
}

/// Collects the diagnostics of an outcome into a [`trellis_span::Report`]
/// for rendering.
pub fn report_of<T>(outcome: &Outcome<T>) -> trellis_span::Report {
    let mut report = trellis_span::Report::new();
    report.extend(outcome.errors().iter().cloned());
    report
}
