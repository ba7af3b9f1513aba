//! Core types and contracts for vfile.
//!
//! This crate provides the building blocks a resource is made of: stat info,
//! content primitives (byte streams and stream factories), the project and
//! change tracking capabilities, construction options and the error type.

mod content;
mod error;
mod options;
mod project;
mod source;
mod stat;

pub use content::{ByteStream, StreamContent, StreamFactory, bytes_stream};
pub use error::{ResourceError, Result};
pub use options::ResourceOptions;
pub use project::{NamedProject, Project, ProjectRef};
pub use source::{ChangeTracker, SourceMetadata, SourceRef};
pub use stat::{FileKind, StatInfo, StatInfoBuilder, Timestamps};
