use std::{fmt, sync::Arc};

use ariadne::Cache;

pub type Source = ariadne::Source<Arc<str>>;

/// Identifies a source registered in a [`SourceMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId(u32);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'f{}", self.0)
    }
}

/// Registered source texts, keyed by [`SourceId`].
///
/// The host feeds this with every file it hands to the compiler. It
/// doubles as the [`ariadne::Cache`] used when diagnostics are rendered.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    entries: Vec<(Arc<str>, Source)>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a source and returns its id. Names are not deduplicated;
    /// registering the same name twice yields two ids.
    pub fn add(&mut self, name: impl Into<Arc<str>>, text: impl Into<Arc<str>>) -> SourceId {
        let id = SourceId(self.entries.len() as u32);
        self.entries.push((name.into(), Source::from(text.into())));
        id
    }

    pub fn name(&self, id: SourceId) -> Option<&str> {
        self.entries.get(id.0 as usize).map(|(name, _)| &**name)
    }

    pub fn get(&self, id: SourceId) -> Option<&Source> {
        self.entries.get(id.0 as usize).map(|(_, source)| source)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Cache<SourceId> for &SourceMap {
    type Storage = Arc<str>;

    fn fetch(&mut self, id: &SourceId) -> Result<&Source, impl fmt::Debug> {
        self.get(*id).ok_or("source id not registered")
    }

    fn display<'a>(&self, id: &'a SourceId) -> Option<impl fmt::Display + 'a> {
        self.name(*id).map(str::to_owned)
    }
}
