use derive_more::Display;
use owo_colors::{OwoColorize, Style};
use std::{
    fmt,
    io::{self, Write},
};

use crate::{Errors, Loc, Located, SourceMap};

/// Represents the severity of a diagnostic message.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl From<Severity> for ariadne::ReportKind<'_> {
    fn from(value: Severity) -> Self {
        match value {
            Severity::Info => ariadne::ReportKind::Advice,
            Severity::Warning => ariadne::ReportKind::Warning,
            Severity::Error => ariadne::ReportKind::Error,
        }
    }
}

/// Distinguishes plain messages from expectation failures.
///
/// An `Expect` diagnostic names the form that was expected at the
/// location ("integer", "string", a "parenthesized list of field
/// assignments") and renders with an `expected` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DiagKind {
    #[default]
    Message,
    Expect,
}

/// Converts a type into a source diagnostic.
pub trait IntoDiagnostic: fmt::Display + Sized {
    /// Converts the type into an error diagnostic at the given location.
    fn into_diagnostic(self, loc: Loc) -> Diagnostic {
        Diagnostic::error(loc, self.to_string())
    }
}

/// A message with source location information.
///
/// Diagnostics carry a severity, a [`DiagKind`], the location they refer
/// to, and optional help text, trace labels and notes for context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    /// The main diagnostic message.
    pub message: String,
    /// Optional help text that provides additional guidance.
    pub help: Option<String>,
    /// The severity of the diagnostic.
    pub severity: Severity,
    /// Whether this is a plain message or an expectation failure.
    pub kind: DiagKind,
    /// The source location this diagnostic refers to.
    pub loc: Loc,
    /// Additional context information with their respective locations.
    pub trace: Vec<Located<String>>,
    /// Additional notes related to the diagnostic.
    pub notes: Vec<String>,
}

impl Diagnostic {
    fn new(loc: Loc, severity: Severity, kind: DiagKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            help: None,
            severity,
            kind,
            loc,
            trace: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Creates a new error diagnostic.
    pub fn error(loc: Loc, message: impl Into<String>) -> Self {
        Self::new(loc, Severity::Error, DiagKind::Message, message)
    }

    /// Creates a new warning diagnostic.
    pub fn warn(loc: Loc, message: impl Into<String>) -> Self {
        Self::new(loc, Severity::Warning, DiagKind::Message, message)
    }

    /// Creates a new informational diagnostic.
    pub fn info(loc: Loc, message: impl Into<String>) -> Self {
        Self::new(loc, Severity::Info, DiagKind::Message, message)
    }

    /// Creates an expectation-failure diagnostic. `form` names what was
    /// expected at the location.
    pub fn expected(loc: Loc, form: impl Into<String>) -> Self {
        Self::new(loc, Severity::Error, DiagKind::Expect, form)
    }

    /// Adds help text to the diagnostic and returns self for chaining.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Adds trace labels to the diagnostic and returns self for chaining.
    pub fn with_trace(mut self, trace: impl IntoIterator<Item = Located<String>>) -> Self {
        self.trace = trace.into_iter().collect();
        self
    }

    /// Adds notes to the diagnostic and returns self for chaining.
    pub fn with_notes(mut self, notes: impl IntoIterator<Item = String>) -> Self {
        self.notes = notes.into_iter().collect();
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// The message as rendered, with the `expected` prefix applied for
    /// [`DiagKind::Expect`] diagnostics.
    pub fn rendered_message(&self) -> String {
        match self.kind {
            DiagKind::Message => self.message.clone(),
            DiagKind::Expect => format!("expected {}", self.message),
        }
    }

    /// Prints the diagnostic to the standard output.
    pub fn print(self, sources: &SourceMap) -> io::Result<()> {
        ariadne::Report::from(self).print(sources)
    }

    /// Prints the diagnostic to the standard error output.
    pub fn eprint(self, sources: &SourceMap) -> io::Result<()> {
        ariadne::Report::from(self).eprint(sources)
    }
}

impl From<Diagnostic> for ariadne::Report<'_, Loc> {
    fn from(diag: Diagnostic) -> Self {
        let message = diag.rendered_message();
        let Diagnostic {
            help,
            severity,
            loc,
            trace,
            notes,
            ..
        } = diag;

        let mut builder = ariadne::Report::build(severity.into(), loc)
            .with_message(message)
            .with_labels(
                trace
                    .into_iter()
                    .map(|(label, loc)| ariadne::Label::new(loc).with_message(label)),
            );

        builder.with_helps(help);
        builder.with_notes(notes);

        builder.finish()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DiagKind::Message => self.message.fmt(f),
            DiagKind::Expect => write!(f, "expected {}", self.message),
        }
    }
}

impl std::error::Error for Diagnostic {}

/// A batch of diagnostics ready for rendering.
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub diagnostics: Errors<Diagnostic>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    fn write(self, sources: &SourceMap, mut w: impl Write) -> io::Result<()> {
        let errors = self.diagnostics.iter().filter(|d| d.is_error()).count();
        let total = self.diagnostics.len();

        for diagnostic in self.diagnostics {
            ariadne::Report::from(diagnostic).write(sources, &mut w)?;
        }

        if total > 0 {
            let style = if errors > 0 {
                Style::new().red()
            } else {
                Style::new().yellow()
            };
            writeln!(
                w,
                "{} {errors} error(s), {} other diagnostic(s)",
                "Summary:".style(style),
                total - errors
            )?;
        }

        Ok(())
    }

    /// Prints the report to the standard output.
    pub fn print(self, sources: &SourceMap) -> io::Result<()> {
        self.write(sources, io::stdout())
    }

    /// Prints the report to the standard error output.
    pub fn eprint(self, sources: &SourceMap) -> io::Result<()> {
        self.write(sources, io::stderr())
    }
}

impl Extend<Diagnostic> for Report {
    fn extend<I: IntoIterator<Item = Diagnostic>>(&mut self, iter: I) {
        self.diagnostics.extend(iter);
    }
}
