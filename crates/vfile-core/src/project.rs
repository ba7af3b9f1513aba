//! Project association.

use std::fmt;
use std::sync::Arc;

use compact_str::CompactString;

/// A project owning resources.
///
/// Resources only ever look at the project's name.
pub trait Project: fmt::Debug + Send + Sync {
    /// Name of the project.
    fn name(&self) -> &str;
}

/// Shared handle to a project.
pub type ProjectRef = Arc<dyn Project>;

/// Minimal project identified by name alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedProject {
    name: CompactString,
}

impl NamedProject {
    /// Create a project with the given name.
    pub fn new(name: impl Into<CompactString>) -> Self {
        Self { name: name.into() }
    }

    /// Create a shared handle to a project with the given name.
    pub fn shared(name: impl Into<CompactString>) -> ProjectRef {
        Arc::new(Self::new(name))
    }
}

impl Project for NamedProject {
    fn name(&self) -> &str {
        &self.name
    }
}
