//! Construction options for resources.

use std::fmt;

use bytes::Bytes;

use crate::content::{ByteStream, StreamContent, StreamFactory};
use crate::error::{ResourceError, Result};
use crate::project::ProjectRef;
use crate::source::SourceRef;
use crate::stat::StatInfo;

/// Parameters for creating a resource.
///
/// At most one of `buffer`, `string`, `stream` and `stream_factory` may be set.
#[derive(Default)]
pub struct ResourceOptions {
    /// Virtual path. Required.
    pub path: String,

    /// Stat info (defaults to a regular file with all times set to now).
    pub stat_info: Option<StatInfo>,

    /// Content as bytes.
    pub buffer: Option<Bytes>,

    /// Content as text, stored UTF-8 encoded.
    pub string: Option<String>,

    /// Content as a single-use stream.
    pub stream: Option<ByteStream>,

    /// Content as a stream factory.
    pub stream_factory: Option<StreamFactory>,

    /// Owning project.
    pub project: Option<ProjectRef>,

    /// Change tracking handle.
    pub source: Option<SourceRef>,
}

impl ResourceOptions {
    /// Create options for the given path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Set the stat info.
    pub fn with_stat_info(mut self, stat_info: StatInfo) -> Self {
        self.stat_info = Some(stat_info);
        self
    }

    /// Set byte content.
    pub fn with_buffer(mut self, buffer: impl Into<Bytes>) -> Self {
        self.buffer = Some(buffer.into());
        self
    }

    /// Set text content.
    pub fn with_string(mut self, string: impl Into<String>) -> Self {
        self.string = Some(string.into());
        self
    }

    /// Set stream content.
    pub fn with_stream(mut self, stream: ByteStream) -> Self {
        self.stream = Some(stream);
        self
    }

    /// Set stream factory content.
    pub fn with_stream_factory(mut self, factory: StreamFactory) -> Self {
        self.stream_factory = Some(factory);
        self
    }

    /// Set either form of stream content.
    pub fn with_stream_content(self, content: impl Into<StreamContent>) -> Self {
        match content.into() {
            StreamContent::Stream(stream) => self.with_stream(stream),
            StreamContent::Factory(factory) => self.with_stream_factory(factory),
        }
    }

    /// Set the owning project.
    pub fn with_project(mut self, project: ProjectRef) -> Self {
        self.project = Some(project);
        self
    }

    /// Set the change tracking handle.
    pub fn with_source(mut self, source: SourceRef) -> Self {
        self.source = Some(source);
        self
    }

    /// Names of the content parameters that are set.
    pub fn content_parameters(&self) -> Vec<&'static str> {
        [
            ("buffer", self.buffer.is_some()),
            ("string", self.string.is_some()),
            ("stream", self.stream.is_some()),
            ("stream_factory", self.stream_factory.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect()
    }

    /// Check the path and content parameters.
    pub fn validate(&self) -> Result<()> {
        if self.path.is_empty() {
            return Err(ResourceError::MissingPath);
        }

        let given = self.content_parameters();
        if given.len() > 1 {
            return Err(ResourceError::ConflictingContent {
                path: self.path.clone(),
                given: given.join(", "),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for ResourceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceOptions")
            .field("path", &self.path)
            .field("stat_info", &self.stat_info)
            .field("content", &self.content_parameters())
            .field("project", &self.project)
            .field("source", &self.source)
            .finish()
    }
}
