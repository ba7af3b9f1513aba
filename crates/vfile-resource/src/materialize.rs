//! Content state and deduplicated stream materialization.
//!
//! A resource's content lives in a [`ContentState`] behind a mutex shared with
//! at most one in-flight drain. Draining a stream into a buffer is started
//! once; every caller that asks for the buffer while the drain is running
//! awaits the same [`Shared`] future.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use bytes::{Bytes, BytesMut};
use futures::future::{BoxFuture, FutureExt, Shared};
use futures::TryStreamExt;
use tracing::{debug, trace, warn};

use vfile_core::{
    ByteStream, ResourceError, Result, SourceRef, StreamFactory, bytes_stream,
};

/// Pending stream to buffer conversion, shared by all waiters.
pub(crate) type Materialized = Shared<BoxFuture<'static, Result<Bytes, Arc<io::Error>>>>;

/// The active content representation.
pub(crate) enum Content {
    None,
    Buffer(Bytes),
    /// Single-use stream; `None` once it has been pulled from.
    Stream(Option<ByteStream>),
    Factory(StreamFactory),
}

impl Content {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Buffer(_) => "buffer",
            Self::Stream(_) => "stream",
            Self::Factory(_) => "stream-factory",
        }
    }
}

pub(crate) struct ContentState {
    pub(crate) content: Content,
    /// Set once a stream view was handed to a caller.
    pub(crate) content_drained: bool,
    buffering: Option<Materialized>,
    /// Bumped on every content replacement so a stale drain cannot install
    /// its result over newer content.
    generation: u64,
}

impl ContentState {
    pub(crate) fn new(content: Content) -> Self {
        Self {
            content,
            content_drained: false,
            buffering: None,
            generation: 0,
        }
    }

    /// Whether the single underlying stream instance was already pulled from.
    pub(crate) fn stream_drained(&self) -> bool {
        matches!(self.content, Content::Stream(None))
    }

    /// Replace the content and reset both drain flags.
    ///
    /// Flags an attached source as modified unless it already is.
    pub(crate) fn install(&mut self, content: Content, source: Option<&SourceRef>) {
        trace!(kind = content.kind(), "replacing content");
        self.content = content;
        self.content_drained = false;
        self.buffering = None;
        self.generation += 1;

        if let Some(source) = source {
            if !source.is_modified() {
                source.set_modified(true);
            }
        }
    }

    /// Obtain a stream of the current content without marking it drained.
    pub(crate) fn pull_stream(&mut self, path: &str) -> Result<ByteStream> {
        match &mut self.content {
            Content::None => Err(ResourceError::no_content(path)),
            Content::Buffer(buffer) => Ok(bytes_stream(buffer.clone())),
            Content::Factory(factory) => Ok(factory.create()),
            Content::Stream(slot) => slot.take().ok_or_else(|| ResourceError::stream_drained(path)),
        }
    }
}

/// Lock the state, recovering from poisoning.
pub(crate) fn lock(state: &Mutex<ContentState>) -> MutexGuard<'_, ContentState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Start draining the current stream into a buffer, or join the drain that
/// is already running.
pub(crate) fn start(
    shared: &Arc<Mutex<ContentState>>,
    state: &mut ContentState,
    path: &str,
    source: Option<SourceRef>,
) -> Result<Materialized> {
    if let Some(pending) = &state.buffering {
        trace!(path, "joining in-flight materialization");
        return Ok(pending.clone());
    }

    let stream = state.pull_stream(path)?;
    debug!(path, kind = state.content.kind(), "materializing content stream");

    let pending = drain(
        stream,
        Arc::downgrade(shared),
        state.generation,
        source,
        path.to_owned(),
    )
    .boxed()
    .shared();
    state.buffering = Some(pending.clone());
    Ok(pending)
}

async fn drain(
    stream: ByteStream,
    shared: Weak<Mutex<ContentState>>,
    generation: u64,
    source: Option<SourceRef>,
    path: String,
) -> Result<Bytes, Arc<io::Error>> {
    let collected = stream
        .try_fold(BytesMut::new(), |mut acc, chunk| async move {
            acc.extend_from_slice(&chunk);
            Ok(acc)
        })
        .await
        .map(BytesMut::freeze)
        .map_err(Arc::new);

    let Some(shared) = shared.upgrade() else {
        return collected;
    };
    let mut state = lock(&shared);
    if state.generation != generation {
        debug!(path = %path, "content replaced while draining, discarding result");
        return collected;
    }

    match &collected {
        Ok(buffer) => {
            // Reading must not count as a modification.
            let modified = source.as_ref().map(|source| source.is_modified());
            state.install(Content::Buffer(buffer.clone()), source.as_ref());
            if let (Some(source), Some(modified)) = (&source, modified) {
                source.set_modified(modified);
            }
            debug!(path = %path, size = buffer.len(), "content stream materialized");
        }
        Err(err) => {
            warn!(path = %path, error = %err, "failed to drain content stream");
            state.buffering = None;
        }
    }
    collected
}
