//! Change tracking handles supplied by adapters.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use compact_str::CompactString;

/// Capability to read and write a "content modified" flag.
///
/// An adapter hands one of these to the resources it creates so it can later
/// tell whether content was replaced since the resource was obtained.
pub trait ChangeTracker: fmt::Debug + Send + Sync {
    /// Whether content was modified.
    fn is_modified(&self) -> bool;

    /// Overwrite the modified flag.
    fn set_modified(&self, modified: bool);
}

/// Shared handle to a change tracker.
pub type SourceRef = Arc<dyn ChangeTracker>;

/// Default change tracker recording where a resource came from.
#[derive(Debug, Default)]
pub struct SourceMetadata {
    adapter: CompactString,
    fs_path: Option<PathBuf>,
    modified: AtomicBool,
}

impl SourceMetadata {
    /// Create source metadata for the named adapter.
    pub fn new(adapter: impl Into<CompactString>) -> Self {
        Self {
            adapter: adapter.into(),
            fs_path: None,
            modified: AtomicBool::new(false),
        }
    }

    /// Record the on-disk path the resource was read from.
    pub fn with_fs_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.fs_path = Some(path.into());
        self
    }

    /// Wrap into a shared handle.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Name of the adapter that created the resource.
    pub fn adapter(&self) -> &str {
        &self.adapter
    }

    /// On-disk path, if the resource came from the local filesystem.
    pub fn fs_path(&self) -> Option<&Path> {
        self.fs_path.as_deref()
    }
}

impl ChangeTracker for SourceMetadata {
    fn is_modified(&self) -> bool {
        self.modified.load(Ordering::Acquire)
    }

    fn set_modified(&self, modified: bool) {
        self.modified.store(modified, Ordering::Release);
    }
}
