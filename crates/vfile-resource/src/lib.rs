//! Virtual file resources for vfile.
//!
//! A [`Resource`] is a named entity with stat info and content that need not
//! exist on disk. Its content is backed by exactly one of:
//!
//! - **a buffer** of bytes, readable any number of times
//! - **a stream**, readable once
//! - **a stream factory**, invoked for a fresh stream whenever one is needed
//!
//! Buffer and string access drain a stream into a buffer on first use.
//! Concurrent callers share that drain. Handing out a stream view marks the
//! content as drained until new content is set.
//!
//! # Example
//!
//! ```rust,no_run
//! use vfile_resource::{Resource, ResourceOptions};
//!
//! # async fn run() -> vfile_resource::Result<()> {
//! let mut resource = Resource::new(ResourceOptions::new("/app/index.js").with_string("1"))?;
//! assert_eq!(resource.get_string().await?, "1");
//!
//! let _stream = resource.get_stream()?;
//! assert!(resource.get_buffer().await.is_err());
//!
//! resource.set_string("2");
//! assert_eq!(resource.get_size().await?, 1);
//! # Ok(())
//! # }
//! ```

mod materialize;
mod resource;
mod tree;

pub use resource::Resource;
pub use tree::PathTree;

// Re-export core types for convenience
pub use vfile_core::{
    ByteStream, ChangeTracker, FileKind, NamedProject, Project, ProjectRef, ResourceError,
    ResourceOptions, Result, SourceMetadata, SourceRef, StatInfo, StatInfoBuilder, StreamContent,
    StreamFactory, Timestamps, bytes_stream,
};
