//! Listing and download of blobs.

use bytes::Bytes;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::context::WorkflowContext;
use crate::error::{SampleError, SampleResult};
use crate::events::WorkflowEvent;
use crate::models::BlobItem;

/// Lists the blobs of the run's container.
///
/// Only the first result page is returned. Containers holding more blobs than
/// fit on one page are not fully enumerated.
pub async fn list_blobs(ctx: &WorkflowContext<'_>) -> SampleResult<Vec<BlobItem>> {
    let items = ctx.store.list_blobs(&ctx.container).await?;
    for item in &items {
        ctx.emit(WorkflowEvent::BlobListed {
            container: ctx.container.clone(),
            item: item.clone(),
        });
    }
    Ok(items)
}

/// Downloads a blob into a new local file and returns its content.
///
/// An existing file at `path` is refused and left untouched. The whole body
/// is fetched in one call; there is no ranged or resumable read.
pub async fn download_blob(
    ctx: &WorkflowContext<'_>,
    blob: &str,
    path: &Path,
) -> SampleResult<Bytes> {
    if tokio::fs::try_exists(path).await? {
        return Err(SampleError::AlreadyExists(path.to_path_buf()));
    }

    let data = ctx.store.get_blob(&ctx.container, blob).await?;
    write_new_file(path, &data).await?;

    debug!(run_id = %ctx.run_id, blob, path = %path.display(), "wrote local file");
    ctx.emit(WorkflowEvent::BlobDownloaded {
        blob: blob.to_string(),
        path: path.to_path_buf(),
        bytes: data.len(),
    });
    Ok(data)
}

/// Writes `data` to a file that must not exist yet.
async fn write_new_file(path: &Path, data: &[u8]) -> SampleResult<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => SampleError::AlreadyExists(path.to_path_buf()),
            _ => SampleError::Io(e),
        })?;
    file.write_all(data).await?;
    file.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::SilentSink;
    use crate::models::ContainerAccess;
    use crate::payload::FixedPayload;
    use crate::storage::{BlobStore, MemoryBlobStore};

    #[tokio::test]
    async fn test_write_new_file_refuses_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.out");
        write_new_file(&path, b"first").await.unwrap();

        let err = write_new_file(&path, b"second").await.unwrap_err();
        assert!(matches!(err, SampleError::AlreadyExists(_)));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"first");
    }

    #[tokio::test]
    async fn test_missing_blob_creates_no_file() {
        let store = MemoryBlobStore::new();
        store
            .create_container_if_not_exists("c1", ContainerAccess::Private)
            .await
            .unwrap();
        let sink = SilentSink;
        let payload = FixedPayload::new("x");
        let ctx = WorkflowContext::new("c1", &store, &sink, &payload);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.out");
        let err = download_blob(&ctx, "missing", &path).await.unwrap_err();
        assert!(matches!(err, SampleError::Transport(_)));
        assert!(!path.exists());
    }
}
