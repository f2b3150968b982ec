//! Container provisioning and cleanup.

use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, error};

use crate::context::WorkflowContext;
use crate::error::SampleResult;
use crate::events::WorkflowEvent;
use crate::models::ContainerAccess;

/// Creates the run's container with private access unless it exists.
///
/// Returns `true` if the container was created. With `emulator` set, a
/// failure also emits a hint to start the local emulator.
pub async fn provision_container(ctx: &WorkflowContext<'_>, emulator: bool) -> SampleResult<bool> {
    let access = ContainerAccess::Private;
    debug!(container = %ctx.container, access = access.as_str(), "creating container");
    match ctx
        .store
        .create_container_if_not_exists(&ctx.container, access)
        .await
    {
        Ok(created) => {
            ctx.emit(WorkflowEvent::ContainerReady {
                container: ctx.container.clone(),
                created,
            });
            Ok(created)
        }
        Err(e) => {
            error!(container = %ctx.container, error = %e, "failed to create container");
            if emulator {
                ctx.emit(WorkflowEvent::EmulatorHint {
                    container: ctx.container.clone(),
                });
            }
            Err(e.into())
        }
    }
}

/// Deletes the run's container and everything in it.
pub async fn delete_container(ctx: &WorkflowContext<'_>) -> SampleResult<()> {
    ctx.store.delete_container(&ctx.container).await?;
    ctx.emit(WorkflowEvent::ContainerDeleted {
        container: ctx.container.clone(),
    });
    Ok(())
}

/// Removes local files, skipping those that do not exist.
pub async fn remove_local_files(ctx: &WorkflowContext<'_>, paths: &[&Path]) -> SampleResult<()> {
    for path in paths {
        match tokio::fs::remove_file(path).await {
            Ok(()) => ctx.emit(WorkflowEvent::FileRemoved {
                path: path.to_path_buf(),
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "local file already gone");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorCode, SampleError, StorageError, StorageResult};
    use crate::events::RecordingSink;
    use crate::models::{BlobItem, BlockList, BlockListType, BlockRef, PageRange, PageWriteMode};
    use crate::payload::FixedPayload;
    use crate::storage::{BlobStore, MemoryBlobStore};
    use async_trait::async_trait;
    use bytes::Bytes;

    /// Store that refuses every call, like an unreachable endpoint.
    struct DownStore;

    fn down<T>() -> StorageResult<T> {
        Err(StorageError::with_message(
            ErrorCode::InternalError,
            "connection refused",
        ))
    }

    #[async_trait]
    impl BlobStore for DownStore {
        async fn create_container_if_not_exists(
            &self,
            _: &str,
            _: ContainerAccess,
        ) -> StorageResult<bool> {
            down()
        }
        async fn delete_container(&self, _: &str) -> StorageResult<()> {
            down()
        }
        async fn list_blobs(&self, _: &str) -> StorageResult<Vec<BlobItem>> {
            down()
        }
        async fn put_append_blob(&self, _: &str, _: &str, _: &str) -> StorageResult<()> {
            down()
        }
        async fn append_block(&self, _: &str, _: &str, _: Bytes) -> StorageResult<()> {
            down()
        }
        async fn create_block_blob(&self, _: &str, _: &str) -> StorageResult<()> {
            down()
        }
        async fn put_block(&self, _: &str, _: &str, _: &str, _: Bytes) -> StorageResult<()> {
            down()
        }
        async fn get_block_list(
            &self,
            _: &str,
            _: &str,
            _: BlockListType,
        ) -> StorageResult<BlockList> {
            down()
        }
        async fn put_block_list(&self, _: &str, _: &str, _: &[BlockRef]) -> StorageResult<()> {
            down()
        }
        async fn put_page_blob(&self, _: &str, _: &str, _: u64, _: &str) -> StorageResult<()> {
            down()
        }
        async fn write_range(
            &self,
            _: &str,
            _: &str,
            _: PageRange,
            _: PageWriteMode,
            _: Bytes,
        ) -> StorageResult<()> {
            down()
        }
        async fn get_page_ranges(&self, _: &str, _: &str) -> StorageResult<Vec<PageRange>> {
            down()
        }
        async fn get_blob(&self, _: &str, _: &str) -> StorageResult<Bytes> {
            down()
        }
    }

    #[tokio::test]
    async fn test_provision_is_idempotent() {
        let store = MemoryBlobStore::new();
        let sink = RecordingSink::new();
        let payload = FixedPayload::new("x");
        let ctx = WorkflowContext::new("c1", &store, &sink, &payload);

        assert!(provision_container(&ctx, false).await.unwrap());
        assert!(!provision_container(&ctx, false).await.unwrap());
        assert_eq!(store.container_access("c1"), Some(ContainerAccess::Private));
    }

    #[tokio::test]
    async fn test_emulator_hint_on_failure() {
        let store = DownStore;
        let sink = RecordingSink::new();
        let payload = FixedPayload::new("x");
        let ctx = WorkflowContext::new("c1", &store, &sink, &payload);

        let err = provision_container(&ctx, true).await.unwrap_err();
        assert!(matches!(err, SampleError::Transport(_)));
        assert_eq!(
            sink.events(),
            vec![WorkflowEvent::EmulatorHint {
                container: "c1".to_string()
            }]
        );

        let sink = RecordingSink::new();
        let ctx = WorkflowContext::new("c1", &store, &sink, &payload);
        assert!(provision_container(&ctx, false).await.is_err());
        assert!(sink.events().is_empty());
    }

    #[tokio::test]
    async fn test_remove_local_files_skips_missing() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present.txt");
        let missing = dir.path().join("missing.txt");
        tokio::fs::write(&present, b"x").await.unwrap();

        let store = MemoryBlobStore::new();
        let sink = RecordingSink::new();
        let payload = FixedPayload::new("x");
        let ctx = WorkflowContext::new("c1", &store, &sink, &payload);

        remove_local_files(&ctx, &[present.as_path(), missing.as_path()])
            .await
            .unwrap();
        assert!(!present.exists());
        assert_eq!(
            sink.events(),
            vec![WorkflowEvent::FileRemoved { path: present.clone() }]
        );
    }
}
