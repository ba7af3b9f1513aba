use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use futures::channel::mpsc;
use futures::stream::{self, StreamExt, TryStreamExt};
use tokio::io::AsyncReadExt;
use vfile_resource::{
    ByteStream, NamedProject, Resource, ResourceError, ResourceOptions,
    SourceMetadata, SourceRef, StatInfo, StreamFactory, bytes_stream,
};

fn chunked(chunks: &[&'static str]) -> ByteStream {
    let chunks: Vec<io::Result<Bytes>> = chunks
        .iter()
        .map(|chunk| Ok(Bytes::from_static(chunk.as_bytes())))
        .collect();
    stream::iter(chunks).boxed()
}

fn counting_factory(content: &'static str) -> (StreamFactory, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let factory = StreamFactory::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        chunked(&[content])
    });
    (factory, calls)
}

async fn read_all(stream: ByteStream) -> Vec<u8> {
    stream
        .try_fold(Vec::new(), |mut acc, chunk| async move {
            acc.extend_from_slice(&chunk);
            Ok(acc)
        })
        .await
        .unwrap()
}

fn string_resource(path: &str, content: &str) -> Resource {
    Resource::new(ResourceOptions::new(path).with_string(content)).unwrap()
}

#[tokio::test]
async fn test_buffer_from_every_content_parameter() {
    let from_buffer =
        Resource::new(ResourceOptions::new("/a.js").with_buffer(Bytes::from_static(b"abc")))
            .unwrap();
    let from_string = string_resource("/a.js", "abc");
    let from_stream =
        Resource::new(ResourceOptions::new("/a.js").with_stream(chunked(&["a", "b", "c"])))
            .unwrap();
    let from_factory = Resource::new(
        ResourceOptions::new("/a.js").with_stream_factory(StreamFactory::from_bytes("abc")),
    )
    .unwrap();

    for resource in [from_buffer, from_string, from_stream, from_factory] {
        assert_eq!(resource.get_buffer().await.unwrap(), Bytes::from_static(b"abc"));
    }
}

#[test]
fn test_construction_failures() {
    assert!(matches!(
        Resource::new(ResourceOptions::default().with_string("x")),
        Err(ResourceError::MissingPath)
    ));

    let conflicting = ResourceOptions::new("/a.js")
        .with_buffer("x")
        .with_stream_factory(StreamFactory::from_bytes("y"));
    assert!(matches!(
        Resource::new(conflicting),
        Err(ResourceError::ConflictingContent { .. })
    ));
}

#[tokio::test]
async fn test_no_content() {
    let resource = Resource::new(ResourceOptions::new("/dir")).unwrap();

    assert_eq!(resource.get_size().await.unwrap(), 0);
    assert!(matches!(
        resource.get_buffer().await,
        Err(ResourceError::NoContent { .. })
    ));
    assert!(matches!(
        resource.get_stream(),
        Err(ResourceError::NoContent { .. })
    ));
}

#[tokio::test]
async fn test_stream_view_drains_buffer_content() {
    let resource = string_resource("/a.js", "content");

    let stream = resource.get_stream().unwrap();
    assert_eq!(read_all(stream).await, b"content");
    assert!(resource.is_drained());

    assert!(resource.get_buffer().await.unwrap_err().is_drained());
    assert!(resource.get_string().await.unwrap_err().is_drained());
    assert!(resource.get_stream().is_err());
}

#[tokio::test]
async fn test_setting_content_ends_drained_state() {
    let mut resource = string_resource("/a.js", "one");
    let _ = resource.get_stream().unwrap();

    resource.set_string("two");
    assert!(!resource.is_drained());
    assert_eq!(read_all(resource.get_stream().unwrap()).await, b"two");

    resource.set_buffer(Bytes::from_static(b"three"));
    assert_eq!(resource.get_string().await.unwrap(), "three");

    let _ = resource.get_stream().unwrap();
    resource.set_stream(chunked(&["fo", "ur"]));
    assert_eq!(resource.get_string().await.unwrap(), "four");

    let _ = resource.get_stream().unwrap();
    resource.set_stream(StreamFactory::from_bytes("five"));
    assert!(resource.get_stream().is_ok());
}

#[tokio::test]
async fn test_single_stream_cannot_be_handed_out_twice() {
    let mut resource =
        Resource::new(ResourceOptions::new("/a.js").with_stream(chunked(&["x"]))).unwrap();
    let _ = resource.get_stream().unwrap();

    match resource.get_buffer().await {
        Err(ResourceError::ContentDrained { stream_drained, .. }) => assert!(!stream_drained),
        other => panic!("Expected drained content, got {other:?}"),
    }

    resource.set_stream(chunked(&["y"]));
    assert_eq!(resource.get_string().await.unwrap(), "y");
}

#[tokio::test]
async fn test_factory_streams_are_fresh() {
    let (factory, calls) = counting_factory("data");
    let mut resource =
        Resource::new(ResourceOptions::new("/a.js").with_stream_factory(factory.clone()))
            .unwrap();

    assert_eq!(read_all(resource.get_stream().unwrap()).await, b"data");
    resource.set_stream_factory(factory);
    assert_eq!(read_all(resource.get_stream().unwrap()).await, b"data");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_concurrent_buffer_requests_share_one_drain() {
    let (tx, rx) = mpsc::unbounded::<io::Result<Bytes>>();
    let resource = Resource::new(ResourceOptions::new("/a.js").with_stream(rx.boxed())).unwrap();

    let (first, second, _) = tokio::join!(resource.get_buffer(), resource.get_buffer(), async {
        tx.unbounded_send(Ok(Bytes::from_static(b"hello "))).unwrap();
        tx.unbounded_send(Ok(Bytes::from_static(b"world"))).unwrap();
        drop(tx);
    });

    assert_eq!(first.unwrap(), Bytes::from_static(b"hello world"));
    assert_eq!(second.unwrap(), Bytes::from_static(b"hello world"));
    assert_eq!(resource.get_string().await.unwrap(), "hello world");
}

#[tokio::test]
async fn test_concurrent_factory_requests_invoke_factory_once() {
    let (factory, calls) = counting_factory("shared");
    let resource =
        Resource::new(ResourceOptions::new("/a.js").with_stream_factory(factory)).unwrap();

    let (a, b, c) = tokio::join!(
        resource.get_buffer(),
        resource.get_string(),
        resource.get_size()
    );

    assert_eq!(a.unwrap(), Bytes::from_static(b"shared"));
    assert_eq!(b.unwrap(), "shared");
    assert_eq!(c.unwrap(), 6);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_stream_error_reaches_every_waiter() {
    let (tx, rx) = mpsc::unbounded::<io::Result<Bytes>>();
    let resource = Resource::new(ResourceOptions::new("/a.js").with_stream(rx.boxed())).unwrap();

    let (first, second, _) = tokio::join!(resource.get_buffer(), resource.get_buffer(), async {
        tx.unbounded_send(Ok(Bytes::from_static(b"partial"))).unwrap();
        tx.unbounded_send(Err(io::Error::other("disk gone"))).unwrap();
        drop(tx);
    });
    assert!(matches!(first, Err(ResourceError::Stream { .. })));
    assert!(matches!(second, Err(ResourceError::Stream { .. })));

    // No partial buffer is installed and the stream cannot be read again.
    assert!(!resource.is_drained());
    assert!(matches!(
        resource.get_buffer().await,
        Err(ResourceError::ContentDrained {
            stream_drained: true,
            ..
        })
    ));
}

#[tokio::test]
async fn test_setting_content_after_failed_drain() {
    let failing: ByteStream = stream::iter(vec![
        Ok(Bytes::from_static(b"part")),
        Err(io::Error::other("disk gone")),
    ])
    .boxed();
    let mut resource = Resource::new(ResourceOptions::new("/a.js").with_stream(failing)).unwrap();

    assert!(matches!(
        resource.get_buffer().await,
        Err(ResourceError::Stream { .. })
    ));
    assert!(resource.get_buffer().await.unwrap_err().is_drained());

    resource.set_stream(chunked(&["re", "set"]));
    assert_eq!(resource.get_buffer().await.unwrap(), Bytes::from_static(b"reset"));

    resource.set_buffer(Bytes::from_static(b"buffer"));
    assert_eq!(resource.get_string().await.unwrap(), "buffer");
}

#[tokio::test]
async fn test_factory_retries_after_failed_drain() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let factory = StreamFactory::new(move || {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            stream::iter(vec![Err(io::Error::other("boom"))]).boxed()
        } else {
            chunked(&["ok"])
        }
    });
    let resource =
        Resource::new(ResourceOptions::new("/a.js").with_stream_factory(factory)).unwrap();

    assert!(matches!(
        resource.get_buffer().await,
        Err(ResourceError::Stream { .. })
    ));
    assert!(!resource.is_drained());
    assert_eq!(resource.get_buffer().await.unwrap(), Bytes::from_static(b"ok"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_invalid_utf8() {
    let resource =
        Resource::new(ResourceOptions::new("/a.bin").with_buffer(vec![0xffu8, 0xfe])).unwrap();
    assert!(matches!(
        resource.get_string().await,
        Err(ResourceError::InvalidUtf8 { .. })
    ));
}

#[tokio::test]
async fn test_reading_does_not_flag_source_modified() {
    let source: SourceRef = SourceMetadata::new("memory").shared();
    let mut resource = Resource::new(
        ResourceOptions::new("/a.js")
            .with_stream(chunked(&["lazy"]))
            .with_source(source.clone()),
    )
    .unwrap();

    assert_eq!(resource.get_string().await.unwrap(), "lazy");
    assert!(!source.is_modified());

    resource.set_buffer(Bytes::from_static(b"changed"));
    assert!(source.is_modified());
}

#[tokio::test]
async fn test_materialization_keeps_existing_modified_flag() {
    let source: SourceRef = SourceMetadata::new("memory").shared();
    let mut resource =
        Resource::new(ResourceOptions::new("/a.js").with_source(source.clone())).unwrap();

    resource.set_stream(chunked(&["new"]));
    assert!(source.is_modified());

    assert_eq!(resource.get_string().await.unwrap(), "new");
    assert!(source.is_modified());
}

#[tokio::test]
async fn test_clone_of_stream_resource() {
    let source: SourceRef = SourceMetadata::new("memory").shared();
    let mut original = Resource::new(
        ResourceOptions::new("/app/a.js")
            .with_stream(chunked(&["cl", "one"]))
            .with_source(source.clone())
            .with_project(NamedProject::shared("app")),
    )
    .unwrap();
    original.push_collection("workspace");

    let clone = original.try_clone().await.unwrap();

    assert_eq!(clone.get_path(), "/app/a.js");
    assert_eq!(clone.get_name(), "a.js");
    assert_eq!(clone.get_string().await.unwrap(), "clone");
    assert!(!clone.has_project());
    assert!(clone.get_collections().is_empty());
    assert!(Arc::ptr_eq(clone.get_source().unwrap(), &source));
    assert!(!source.is_modified());

    // The clone is independent of the original.
    let _ = clone.get_stream().unwrap();
    assert_eq!(original.get_string().await.unwrap(), "clone");
    original.set_string("changed");
    assert!(clone.is_drained());
}

#[tokio::test]
async fn test_clone_shares_factory_and_copies_stat_info() {
    let (factory, calls) = counting_factory("f");
    let mut original = Resource::new(
        ResourceOptions::new("/a.js")
            .with_stream_factory(factory)
            .with_stat_info(StatInfo::builder().size(1u64).build().unwrap()),
    )
    .unwrap();

    let clone = original.try_clone().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(clone.get_stat_info(), original.get_stat_info());

    original.get_stat_info_mut().size = 99;
    assert_eq!(clone.get_stat_info().size, 1);

    assert_eq!(clone.get_string().await.unwrap(), "f");
    assert_eq!(original.get_string().await.unwrap(), "f");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_clone_of_drained_buffer_resource_is_readable() {
    let original = string_resource("/a.js", "buffered");
    let _ = original.get_stream().unwrap();

    let clone = original.try_clone().await.unwrap();
    assert!(!clone.is_drained());
    assert_eq!(clone.get_string().await.unwrap(), "buffered");
}

#[tokio::test]
async fn test_reader_view() {
    let resource = string_resource("/a.txt", "read me");
    let mut reader = resource.get_reader().unwrap();
    let mut out = String::new();
    reader.read_to_string(&mut out).await.unwrap();

    assert_eq!(out, "read me");
    assert!(resource.is_drained());
}

#[test]
fn test_project_assigned_once() {
    let mut resource = string_resource("/a.js", "x");
    assert!(!resource.has_project());

    resource.set_project(NamedProject::shared("first")).unwrap();
    let err = resource
        .set_project(NamedProject::shared("second"))
        .unwrap_err();

    assert!(matches!(err, ResourceError::ProjectAlreadyAssigned { .. }));
    assert!(err.to_string().contains("first"));
    assert!(err.to_string().contains("second"));
    assert!(resource.has_project());
    assert_eq!(resource.get_project().unwrap().name(), "first");
}

#[test]
fn test_project_from_options_blocks_assignment() {
    let mut resource = Resource::new(
        ResourceOptions::new("/a.js")
            .with_string("x")
            .with_project(NamedProject::shared("owner")),
    )
    .unwrap();
    assert!(resource.set_project(NamedProject::shared("other")).is_err());
}

#[test]
fn test_path_tree_innermost_first() {
    let mut resource = string_resource("/a.js", "x");
    resource.push_collection("outer");
    resource.push_collection("inner");

    let tree = resource.get_path_tree();
    assert_eq!(tree.first_chain(), vec!["/a.js", "inner", "outer"]);
    assert_eq!(
        serde_json::to_value(&tree).unwrap(),
        serde_json::json!({ "/a.js": { "inner": { "outer": {} } } })
    );
}

#[tokio::test]
async fn test_default_stat_info_untouched_by_content_changes() {
    let mut resource = string_resource("/a.js", "x");
    let before = resource.get_stat_info().clone();
    assert!(before.is_file());

    resource.set_string("much longer content");
    assert_eq!(resource.get_stat_info(), &before);
    assert_eq!(resource.get_size().await.unwrap(), 19);
}

#[tokio::test]
async fn test_set_path_keeps_content() {
    let mut resource =
        Resource::new(ResourceOptions::new("/a.js").with_stream(bytes_stream("x".into())))
            .unwrap();
    resource.set_path("/lib/b.js");

    assert_eq!(resource.get_name(), "b.js");
    assert_eq!(resource.get_string().await.unwrap(), "x");
}
