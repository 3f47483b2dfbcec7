use trellis_span::{Diagnostic, Located, SourceId};

use crate::{AnnotationApp, Decl};

/// What the external parser hands the compiler for one file.
#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    pub decls: Vec<Located<Decl>>,
    /// Annotations applied to the file itself.
    pub annotations: Vec<AnnotationApp>,
    /// Parse errors. The compiler forwards these ahead of its own
    /// diagnostics and compiles whatever the parser recovered.
    pub errors: Vec<Diagnostic>,
}

impl ParsedFile {
    /// The distinct import names referenced anywhere in the tree, in
    /// first-appearance order, each with the location of its first
    /// occurrence.
    pub fn import_names(&self) -> Vec<Located<String>> {
        let mut names = Vec::new();
        for app in &self.annotations {
            app.name.collect_imports(&mut names);
        }
        for (decl, _) in &self.decls {
            decl.collect_imports(&mut names);
        }

        let mut seen = std::collections::HashSet::new();
        names.retain(|(name, _)| seen.insert(name.clone()));
        names
    }
}

/// The parser contract. Hosts implement this; the compiler never reads
/// source text itself.
pub trait Parse {
    fn parse(&self, source: SourceId, text: &str) -> ParsedFile;
}

impl<F> Parse for F
where
    F: Fn(SourceId, &str) -> ParsedFile,
{
    fn parse(&self, source: SourceId, text: &str) -> ParsedFile {
        self(source, text)
    }
}
