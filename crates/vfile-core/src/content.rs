//! Content primitives: byte streams and stream factories.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use tokio_util::io::ReaderStream;

/// A single-use stream of content chunks.
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

/// Wrap a buffer in a stream that yields it as one chunk.
pub fn bytes_stream(buffer: Bytes) -> ByteStream {
    stream::once(async move { Ok(buffer) }).boxed()
}

/// Callback producing a fresh, independently consumable stream on every call.
///
/// Cloning shares the callback.
#[derive(Clone)]
pub struct StreamFactory(Arc<dyn Fn() -> ByteStream + Send + Sync>);

impl StreamFactory {
    /// Create a factory from a closure.
    pub fn new<F>(create: F) -> Self
    where
        F: Fn() -> ByteStream + Send + Sync + 'static,
    {
        Self(Arc::new(create))
    }

    /// Factory replaying the same buffer on every call.
    pub fn from_bytes(buffer: impl Into<Bytes>) -> Self {
        let buffer = buffer.into();
        Self::new(move || bytes_stream(buffer.clone()))
    }

    /// Factory opening `path` anew on every call.
    ///
    /// Open errors surface as the first item of the returned stream.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::new(move || {
            let path = path.clone();
            stream::once(async move { tokio::fs::File::open(path).await })
                .map_ok(ReaderStream::new)
                .try_flatten()
                .boxed()
        })
    }

    /// Invoke the factory.
    pub fn create(&self) -> ByteStream {
        (self.0)()
    }

    /// Check if two factories share the same callback.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for StreamFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StreamFactory").finish_non_exhaustive()
    }
}

/// Either form accepted when replacing content with a stream.
pub enum StreamContent {
    /// A single stream instance that can be drained once.
    Stream(ByteStream),
    /// A factory invoked whenever a stream is needed.
    Factory(StreamFactory),
}

impl fmt::Debug for StreamContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stream(_) => f.write_str("StreamContent::Stream(..)"),
            Self::Factory(factory) => f.debug_tuple("StreamContent::Factory").field(factory).finish(),
        }
    }
}

impl From<ByteStream> for StreamContent {
    fn from(stream: ByteStream) -> Self {
        Self::Stream(stream)
    }
}

impl From<StreamFactory> for StreamContent {
    fn from(factory: StreamFactory) -> Self {
        Self::Factory(factory)
    }
}
