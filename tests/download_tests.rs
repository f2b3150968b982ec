//! Listing and download tests.

mod common;

use common::{TestFixture, CONTAINER};

use azure_blob_samples::models::BlobType;
use azure_blob_samples::workflow::{append, block, download, page};
use azure_blob_samples::{BlobStore, SampleError, WorkflowEvent};

#[tokio::test]
async fn test_download_refuses_existing_file() {
    let fixture = TestFixture::new().await;
    let ctx = fixture.ctx();
    append::create_append_blob(&ctx, "a1", "text/plain").await.unwrap();
    append::append_payload(&ctx, "a1", "remote".into()).await.unwrap();

    let path = fixture.path("a1.out");
    tokio::fs::write(&path, b"local contents").await.unwrap();

    let err = download::download_blob(&ctx, "a1", &path).await.unwrap_err();
    match err {
        SampleError::AlreadyExists(p) => assert_eq!(p, path),
        other => panic!("expected already exists, got {:?}", other),
    }
    assert_eq!(tokio::fs::read(&path).await.unwrap(), b"local contents");
    assert!(!fixture
        .sink
        .events()
        .iter()
        .any(|e| matches!(e, WorkflowEvent::BlobDownloaded { .. })));
}

#[tokio::test]
async fn test_download_writes_full_body() {
    let fixture = TestFixture::new().await;
    let ctx = fixture.ctx();
    page::create_page_blob(&ctx, "p1", 1024, "text/plain").await.unwrap();

    let path = fixture.path("p1.out");
    let data = download::download_blob(&ctx, "p1", &path).await.unwrap();
    assert_eq!(data.len(), 1024);
    assert_eq!(tokio::fs::read(&path).await.unwrap(), data.to_vec());
}

#[tokio::test]
async fn test_list_reports_every_blob_type() {
    let fixture = TestFixture::new().await;
    let ctx = fixture.ctx();
    append::create_append_blob(&ctx, "a1", "text/plain").await.unwrap();
    block::create_block_blob(&ctx, "b1").await.unwrap();
    page::create_page_blob(&ctx, "p1", 2560, "text/plain").await.unwrap();

    let items = download::list_blobs(&ctx).await.unwrap();
    let summary: Vec<_> = items
        .iter()
        .map(|i| (i.name.as_str(), i.blob_type, i.content_length))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("a1", BlobType::AppendBlob, 0),
            ("b1", BlobType::BlockBlob, 0),
            ("p1", BlobType::PageBlob, 2560),
        ]
    );

    let listed = fixture
        .sink
        .events()
        .into_iter()
        .filter(|e| matches!(e, WorkflowEvent::BlobListed { container, .. } if container == CONTAINER))
        .count();
    assert_eq!(listed, 3);
}

#[tokio::test]
async fn test_list_missing_container_fails() {
    let fixture = TestFixture::without_container();
    let err = download::list_blobs(&fixture.ctx()).await.unwrap_err();
    assert!(matches!(err, SampleError::Transport(_)));
    assert!(fixture.store.list_blobs(CONTAINER).await.is_err());
}
