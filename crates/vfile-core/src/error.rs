//! Error types for resource operations.

use std::sync::Arc;

use thiserror::Error;

/// Result type used throughout vfile.
pub type Result<T, E = ResourceError> = std::result::Result<T, E>;

/// Errors that can occur while constructing or reading a resource.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// No path was supplied at construction.
    #[error("Unable to create Resource: Missing parameter 'path'")]
    MissingPath,

    /// More than one content parameter was supplied at construction.
    #[error("Unable to create Resource {path}: Please set only one content parameter ({given})")]
    ConflictingContent { path: String, given: String },

    /// No buffer, stream or stream factory was ever set.
    #[error("Resource {path} has no content")]
    NoContent { path: String },

    /// A stream view was handed out and no new content has been set since.
    #[error("{message}", message = drained_message(.path, *.stream_drained))]
    ContentDrained {
        path: String,
        /// Set when the single underlying stream instance was already pulled from.
        stream_drained: bool,
    },

    /// The resource is already associated with a project.
    #[error(
        "Unable to assign project {attempted} to resource {path}: \
         Resource is already associated to project {existing}"
    )]
    ProjectAlreadyAssigned {
        path: String,
        existing: String,
        attempted: String,
    },

    /// The underlying stream signalled an error while being drained.
    #[error("Failed to read content stream of Resource {path}: {source}")]
    Stream {
        path: String,
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The content could not be decoded as UTF-8.
    #[error("Content of Resource {path} is not valid UTF-8: {source}")]
    InvalidUtf8 {
        path: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

fn drained_message(path: &str, stream_drained: bool) -> String {
    if stream_drained {
        format!("Content stream of Resource {path} is flagged as drained.")
    } else {
        format!(
            "Content of Resource {path} has been drained. This might be caused by requesting \
             resource content after a content stream has been requested and no new content \
             (e.g. a new stream) has been set."
        )
    }
}

impl ResourceError {
    /// Create a "no content" error.
    pub fn no_content(path: impl Into<String>) -> Self {
        Self::NoContent { path: path.into() }
    }

    /// Create a "content drained" error.
    pub fn content_drained(path: impl Into<String>) -> Self {
        Self::ContentDrained {
            path: path.into(),
            stream_drained: false,
        }
    }

    /// Create the error reported when a single-use stream was already consumed.
    pub fn stream_drained(path: impl Into<String>) -> Self {
        Self::ContentDrained {
            path: path.into(),
            stream_drained: true,
        }
    }

    /// Wrap a stream error that may be shared between several waiters.
    pub fn stream(path: impl Into<String>, source: Arc<std::io::Error>) -> Self {
        Self::Stream {
            path: path.into(),
            source,
        }
    }

    /// Check if this error reports drained content.
    pub fn is_drained(&self) -> bool {
        matches!(self, Self::ContentDrained { .. })
    }
}
