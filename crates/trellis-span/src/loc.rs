use std::fmt;

use crate::{SourceId, Span};

/// A value together with the location it came from.
pub type Located<T> = (T, Loc);

/// A span anchored to a registered source.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Loc {
    pub source: SourceId,
    pub span: Span,
}

impl Loc {
    #[inline]
    pub fn new(source: SourceId, span: Span) -> Self {
        Self { source, span }
    }

    /// An empty location at the start of a source. Used for synthesized
    /// nodes such as the file descriptor itself.
    #[inline]
    pub fn start_of(source: SourceId) -> Self {
        Self::new(source, Span::at(0))
    }

    #[inline]
    pub fn source(self) -> SourceId {
        self.source
    }

    #[inline]
    pub fn span(self) -> Span {
        self.span
    }

    /// The smallest location covering both. Both must live in the same
    /// source.
    #[inline]
    pub fn union(self, other: Self) -> Self {
        debug_assert_eq!(self.source, other.source);

        Self::new(self.source, self.span.union(&other.span))
    }
}

impl fmt::Debug for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { source, span } = self;
        write!(f, "{span} in {source}")
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { source, span } = self;
        write!(f, "{span} in {source}")
    }
}

impl ariadne::Span for Loc {
    type SourceId = SourceId;

    fn source(&self) -> &Self::SourceId {
        &self.source
    }

    fn start(&self) -> usize {
        self.span.start
    }

    fn end(&self) -> usize {
        self.span.end
    }
}
