//! Per-call deadline for any [`BlobStore`].

use async_trait::async_trait;
use bytes::Bytes;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use super::BlobStore;
use crate::error::{ErrorCode, StorageError, StorageResult};
use crate::models::{BlobItem, BlockList, BlockListType, BlockRef, ContainerAccess, PageRange, PageWriteMode};

/// Default deadline for a single remote call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Wraps a store so that every call fails with `OperationTimedOut` after `timeout`.
pub struct TimeoutStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S: BlobStore> TimeoutStore<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn call<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = StorageResult<T>> + Send,
    ) -> StorageResult<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, timeout_ms = self.timeout.as_millis() as u64, "storage call timed out");
                Err(StorageError::with_message(
                    ErrorCode::OperationTimedOut,
                    format!("{} did not complete within {:?}", operation, self.timeout),
                ))
            }
        }
    }
}

#[async_trait]
impl<S: BlobStore> BlobStore for TimeoutStore<S> {
    async fn create_container_if_not_exists(
        &self,
        container: &str,
        access: ContainerAccess,
    ) -> StorageResult<bool> {
        self.call(
            "create_container",
            self.inner.create_container_if_not_exists(container, access),
        )
        .await
    }

    async fn delete_container(&self, container: &str) -> StorageResult<()> {
        self.call("delete_container", self.inner.delete_container(container))
            .await
    }

    async fn list_blobs(&self, container: &str) -> StorageResult<Vec<BlobItem>> {
        self.call("list_blobs", self.inner.list_blobs(container)).await
    }

    async fn put_append_blob(
        &self,
        container: &str,
        blob: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        self.call(
            "put_append_blob",
            self.inner.put_append_blob(container, blob, content_type),
        )
        .await
    }

    async fn append_block(&self, container: &str, blob: &str, data: Bytes) -> StorageResult<()> {
        self.call("append_block", self.inner.append_block(container, blob, data))
            .await
    }

    async fn create_block_blob(&self, container: &str, blob: &str) -> StorageResult<()> {
        self.call(
            "create_block_blob",
            self.inner.create_block_blob(container, blob),
        )
        .await
    }

    async fn put_block(
        &self,
        container: &str,
        blob: &str,
        block_id: &str,
        data: Bytes,
    ) -> StorageResult<()> {
        self.call(
            "put_block",
            self.inner.put_block(container, blob, block_id, data),
        )
        .await
    }

    async fn get_block_list(
        &self,
        container: &str,
        blob: &str,
        list_type: BlockListType,
    ) -> StorageResult<BlockList> {
        self.call(
            "get_block_list",
            self.inner.get_block_list(container, blob, list_type),
        )
        .await
    }

    async fn put_block_list(
        &self,
        container: &str,
        blob: &str,
        blocks: &[BlockRef],
    ) -> StorageResult<()> {
        self.call(
            "put_block_list",
            self.inner.put_block_list(container, blob, blocks),
        )
        .await
    }

    async fn put_page_blob(
        &self,
        container: &str,
        blob: &str,
        length: u64,
        content_type: &str,
    ) -> StorageResult<()> {
        self.call(
            "put_page_blob",
            self.inner.put_page_blob(container, blob, length, content_type),
        )
        .await
    }

    async fn write_range(
        &self,
        container: &str,
        blob: &str,
        range: PageRange,
        mode: PageWriteMode,
        data: Bytes,
    ) -> StorageResult<()> {
        self.call(
            "write_range",
            self.inner.write_range(container, blob, range, mode, data),
        )
        .await
    }

    async fn get_page_ranges(&self, container: &str, blob: &str) -> StorageResult<Vec<PageRange>> {
        self.call("get_page_ranges", self.inner.get_page_ranges(container, blob))
            .await
    }

    async fn get_blob(&self, container: &str, blob: &str) -> StorageResult<Bytes> {
        self.call("get_blob", self.inner.get_blob(container, blob)).await
    }
}
