//! The resource entity and its content lifecycle.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use compact_str::CompactString;
use tokio_util::io::StreamReader;
use tracing::{debug, trace};

use vfile_core::{
    ByteStream, ProjectRef, ResourceError, ResourceOptions, Result, SourceRef, StatInfo,
    StreamContent, StreamFactory,
};

use crate::materialize::{self, Content, ContentState, Materialized};
use crate::tree::PathTree;

/// A virtual file: a path, stat info and content.
///
/// Content is backed by exactly one of a buffer, a single-use stream or a
/// stream factory. Buffer and string access convert a stream into a buffer
/// on first use. Handing out a stream view marks the content as drained
/// until new content is set, even when the view was produced from a buffer.
///
/// Readers take `&self` and may run concurrently; concurrent buffer requests
/// on a stream-backed resource share a single drain. Setters take `&mut self`.
pub struct Resource {
    path: String,
    name: CompactString,
    stat_info: StatInfo,
    state: Arc<Mutex<ContentState>>,
    source: Option<SourceRef>,
    project: Option<ProjectRef>,
    collections: Vec<CompactString>,
}

impl Resource {
    /// Create a resource from options.
    ///
    /// Fails if the path is empty or more than one content parameter is set.
    pub fn new(options: ResourceOptions) -> Result<Self> {
        options.validate()?;

        let ResourceOptions {
            path,
            stat_info,
            buffer,
            string,
            stream,
            stream_factory,
            project,
            source,
        } = options;

        let content = if let Some(buffer) = buffer {
            Content::Buffer(buffer)
        } else if let Some(string) = string {
            Content::Buffer(Bytes::from(string))
        } else if let Some(stream) = stream {
            Content::Stream(Some(stream))
        } else if let Some(factory) = stream_factory {
            Content::Factory(factory)
        } else {
            Content::None
        };

        trace!(path = %path, kind = content.kind(), "creating resource");
        Ok(Self {
            name: base_name(&path),
            path,
            stat_info: stat_info.unwrap_or_default(),
            state: Arc::new(Mutex::new(ContentState::new(content))),
            source,
            project,
            collections: Vec::new(),
        })
    }

    /// Create a resource without content, such as a directory entry.
    pub fn new_directory(path: impl Into<String>, stat_info: Option<StatInfo>) -> Result<Self> {
        let options = ResourceOptions::new(path)
            .with_stat_info(stat_info.unwrap_or_else(StatInfo::directory));
        Self::new(options)
    }

    /// Virtual path.
    pub fn get_path(&self) -> &str {
        &self.path
    }

    /// Change the path. The name is derived again; content is untouched.
    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
        self.name = base_name(&self.path);
    }

    /// Last path segment.
    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Stat info as supplied at construction.
    pub fn get_stat_info(&self) -> &StatInfo {
        &self.stat_info
    }

    /// Mutable stat info.
    pub fn get_stat_info_mut(&mut self) -> &mut StatInfo {
        &mut self.stat_info
    }

    /// Change tracking handle, if any.
    pub fn get_source(&self) -> Option<&SourceRef> {
        self.source.as_ref()
    }

    /// Whether any content representation is set.
    pub fn has_content(&self) -> bool {
        !matches!(self.lock().content, Content::None)
    }

    /// Whether a stream view was handed out since content was last set.
    pub fn is_drained(&self) -> bool {
        self.lock().content_drained
    }

    /// Get the content as bytes.
    ///
    /// A stream or stream factory is drained into a buffer first; the buffer
    /// then replaces it without flagging the source as modified.
    pub async fn get_buffer(&self) -> Result<Bytes> {
        let pending = {
            let mut state = self.lock();
            if state.content_drained {
                return Err(ResourceError::content_drained(&self.path));
            }
            match &state.content {
                Content::Buffer(buffer) => return Ok(buffer.clone()),
                Content::None => return Err(ResourceError::no_content(&self.path)),
                Content::Stream(_) | Content::Factory(_) => {}
            }
            self.start_materialize(&mut state)?
        };
        self.await_materialized(pending).await
    }

    /// Get the content as a UTF-8 string.
    pub async fn get_string(&self) -> Result<String> {
        if self.is_drained() {
            return Err(ResourceError::content_drained(&self.path));
        }
        let buffer = self.get_buffer().await?;
        String::from_utf8(buffer.to_vec()).map_err(|source| ResourceError::InvalidUtf8 {
            path: self.path.clone(),
            source,
        })
    }

    /// Get a stream of the content.
    ///
    /// Buffers are wrapped in a fresh stream, factories are invoked and a
    /// single stream is handed over. In every case the content is marked
    /// drained afterwards.
    pub fn get_stream(&self) -> Result<ByteStream> {
        let mut state = self.lock();
        if state.content_drained {
            return Err(ResourceError::content_drained(&self.path));
        }
        let stream = state.pull_stream(&self.path)?;
        state.content_drained = true;
        debug!(path = %self.path, kind = state.content.kind(), "content stream handed out");
        Ok(stream)
    }

    /// Get the content as an `AsyncRead`.
    ///
    /// Same drain semantics as [`get_stream`](Self::get_stream).
    pub fn get_reader(&self) -> Result<StreamReader<ByteStream, Bytes>> {
        self.get_stream().map(StreamReader::new)
    }

    /// Size of the content in bytes, 0 without content.
    ///
    /// Materializes stream content.
    pub async fn get_size(&self) -> Result<u64> {
        if !self.has_content() {
            return Ok(0);
        }
        let buffer = self.get_buffer().await?;
        Ok(buffer.len() as u64)
    }

    /// Replace the content with bytes.
    pub fn set_buffer(&mut self, buffer: impl Into<Bytes>) {
        self.set_content(Content::Buffer(buffer.into()));
    }

    /// Replace the content with UTF-8 encoded text.
    pub fn set_string(&mut self, string: impl Into<String>) {
        self.set_buffer(Bytes::from(string.into()));
    }

    /// Replace the content with a stream or stream factory.
    pub fn set_stream(&mut self, content: impl Into<StreamContent>) {
        let content = match content.into() {
            StreamContent::Stream(stream) => Content::Stream(Some(stream)),
            StreamContent::Factory(factory) => Content::Factory(factory),
        };
        self.set_content(content);
    }

    /// Replace the content with a stream factory.
    pub fn set_stream_factory(&mut self, factory: StreamFactory) {
        self.set_content(Content::Factory(factory));
    }

    fn set_content(&mut self, content: Content) {
        debug!(path = %self.path, kind = content.kind(), "setting content");
        self.lock().install(content, self.source.as_ref());
    }

    /// Create an independent copy.
    ///
    /// The copy shares the source handle, gets its own stat info and starts
    /// without project or collections. Stream content is materialized first
    /// (the original becomes buffer-backed too); factories and buffers are
    /// shared.
    pub async fn try_clone(&self) -> Result<Resource> {
        let snapshot = {
            let mut state = self.lock();
            let shared = match &state.content {
                Content::None => Some(Content::None),
                Content::Buffer(buffer) => Some(Content::Buffer(buffer.clone())),
                Content::Factory(factory) => Some(Content::Factory(factory.clone())),
                Content::Stream(_) => None,
            };
            match shared {
                Some(content) => Snapshot::Ready(content),
                None => Snapshot::Pending(self.start_materialize(&mut state)?),
            }
        };
        let content = match snapshot {
            Snapshot::Ready(content) => content,
            Snapshot::Pending(pending) => Content::Buffer(self.await_materialized(pending).await?),
        };

        debug!(path = %self.path, kind = content.kind(), "cloning resource");
        Ok(Self {
            path: self.path.clone(),
            name: self.name.clone(),
            stat_info: self.stat_info.clone(),
            state: Arc::new(Mutex::new(ContentState::new(content))),
            source: self.source.clone(),
            project: None,
            collections: Vec::new(),
        })
    }

    /// Record a collection the resource was located through.
    pub fn push_collection(&mut self, name: impl Into<CompactString>) {
        self.collections.push(name.into());
    }

    /// Collections in the order they were pushed.
    pub fn get_collections(&self) -> &[CompactString] {
        &self.collections
    }

    /// Provenance tree: the path, then collections from most recent to earliest.
    pub fn get_path_tree(&self) -> PathTree {
        PathTree::from_chain(
            std::iter::once(self.path.as_str())
                .chain(self.collections.iter().rev().map(CompactString::as_str)),
        )
    }

    /// Associate the resource with a project. Fails if one is already set.
    pub fn set_project(&mut self, project: ProjectRef) -> Result<()> {
        if let Some(existing) = &self.project {
            return Err(ResourceError::ProjectAlreadyAssigned {
                path: self.path.clone(),
                existing: existing.name().to_owned(),
                attempted: project.name().to_owned(),
            });
        }
        debug!(path = %self.path, project = project.name(), "assigning project");
        self.project = Some(project);
        Ok(())
    }

    /// Owning project, if any.
    pub fn get_project(&self) -> Option<&ProjectRef> {
        self.project.as_ref()
    }

    /// Whether a project is set.
    pub fn has_project(&self) -> bool {
        self.project.is_some()
    }

    fn lock(&self) -> MutexGuard<'_, ContentState> {
        materialize::lock(&self.state)
    }

    fn start_materialize(&self, state: &mut ContentState) -> Result<Materialized> {
        materialize::start(&self.state, state, &self.path, self.source.clone())
    }

    async fn await_materialized(&self, pending: Materialized) -> Result<Bytes> {
        pending
            .await
            .map_err(|source| ResourceError::stream(&self.path, source))
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Resource")
            .field("path", &self.path)
            .field("content", &state.content.kind())
            .field("content_drained", &state.content_drained)
            .field("stream_drained", &state.stream_drained())
            .field("project", &self.project.as_ref().map(|p| p.name()))
            .field("collections", &self.collections)
            .finish()
    }
}

/// Content captured for a clone.
enum Snapshot {
    Ready(Content),
    Pending(Materialized),
}

/// Last segment of a slash separated path, ignoring trailing slashes.
fn base_name(path: &str) -> CompactString {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .into()
}
