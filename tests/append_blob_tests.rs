//! Append blob workflow tests.

mod common;

use bytes::Bytes;
use common::{TestFixture, CONTAINER};

use azure_blob_samples::config::AppendSettings;
use azure_blob_samples::models::{BlobType, DEFAULT_CONTENT_TYPE};
use azure_blob_samples::workflow::append;
use azure_blob_samples::{BlobStore, ErrorCode, MemoryBlobStore, SampleError, WorkflowEvent};

fn settings(fixture: &TestFixture, blob: &str, len: usize, file: &str) -> AppendSettings {
    AppendSettings {
        blob: blob.to_string(),
        content_type: DEFAULT_CONTENT_TYPE.to_string(),
        payload_len: len,
        output_file: fixture.path(file),
    }
}

#[tokio::test]
async fn test_append_walkthrough_downloads_payload() {
    let fixture = TestFixture::new().await;
    let ctx = fixture.ctx();
    let settings = settings(&fixture, "a1", 42, "a1.out");

    let payload = append::run(&ctx, &settings).await.unwrap();

    assert_eq!(payload.len(), 42);
    assert_eq!(fixture.store.blob_type(CONTAINER, "a1"), Some(BlobType::AppendBlob));
    let on_disk = tokio::fs::read(fixture.path("a1.out")).await.unwrap();
    assert_eq!(on_disk, payload.to_vec());

    let events = fixture.sink.events();
    assert!(events.contains(&WorkflowEvent::BlockAppended {
        blob: "a1".to_string(),
        bytes: 42,
    }));
    assert!(matches!(
        events.last(),
        Some(WorkflowEvent::BlobDownloaded { bytes: 42, .. })
    ));
}

#[tokio::test]
async fn test_append_read_back_matches_payload() {
    let fixture = TestFixture::new().await;
    let ctx = fixture.ctx();

    append::create_append_blob(&ctx, "log", "text/plain").await.unwrap();
    for line in ["first\n", "second\n", "third\n"] {
        append::append_payload(&ctx, "log", Bytes::from(line))
            .await
            .unwrap();
    }

    let data = fixture.store.get_blob(CONTAINER, "log").await.unwrap();
    assert_eq!(&data[..], b"first\nsecond\nthird\n");
}

#[tokio::test]
async fn test_append_over_capacity_is_append_error() {
    let fixture = TestFixture::with_store(MemoryBlobStore::with_limit(64));
    fixture
        .store
        .create_container_if_not_exists(CONTAINER, Default::default())
        .await
        .unwrap();
    let ctx = fixture.ctx();

    append::create_append_blob(&ctx, "a1", "text/plain").await.unwrap();
    append::append_payload(&ctx, "a1", Bytes::from(vec![b'x'; 42]))
        .await
        .unwrap();

    let err = append::append_payload(&ctx, "a1", Bytes::from(vec![b'y'; 42]))
        .await
        .unwrap_err();
    match err {
        SampleError::Append { blob, source } => {
            assert_eq!(blob, "a1");
            assert_eq!(source.code, ErrorCode::RequestBodyTooLarge);
        }
        other => panic!("expected append error, got {:?}", other),
    }

    // The rejected block left the blob unchanged
    let data = fixture.store.get_blob(CONTAINER, "a1").await.unwrap();
    assert_eq!(data.len(), 42);
}

#[tokio::test]
async fn test_append_to_page_blob_is_append_error() {
    let fixture = TestFixture::new().await;
    fixture
        .store
        .put_page_blob(CONTAINER, "a1", 512, "text/plain")
        .await
        .unwrap();
    let ctx = fixture.ctx();

    let err = append::append_payload(&ctx, "a1", Bytes::from_static(b"data"))
        .await
        .unwrap_err();
    assert!(matches!(err, SampleError::Append { .. }));

    let err = append::create_append_blob(&ctx, "a1", "text/plain")
        .await
        .unwrap_err();
    assert!(matches!(err, SampleError::Create { .. }));
}
