//! Source positions and located diagnostics.
//!
//! Everything the compiler reports is anchored to a [`Loc`]: a byte
//! [`Span`] inside a registered source. The [`SourceMap`] owns the
//! registered texts and turns spans back into file/line/column when a
//! [`Diagnostic`] is rendered.

mod diag;
mod errors;
mod loc;
mod source;
mod span;

pub use diag::{DiagKind, Diagnostic, IntoDiagnostic, Report, Severity};
pub use errors::Errors;
pub use loc::{Loc, Located};
pub use source::{SourceId, SourceMap};
pub use span::Span;
