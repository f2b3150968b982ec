//! Storage collaborator interface and its implementations.

mod azure;
mod memory;
mod timeout;

pub use azure::*;
pub use memory::*;
pub use timeout::*;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StorageResult;
use crate::models::{BlobItem, BlockList, BlockListType, BlockRef, ContainerAccess, PageRange, PageWriteMode};

/// Narrow blob service interface used by the workflows.
///
/// Signing, retries and transport errors belong to the implementation.
#[async_trait]
pub trait BlobStore: Send + Sync {
    // Container operations

    /// Creates the container unless it exists. Returns `true` if it was created.
    async fn create_container_if_not_exists(
        &self,
        container: &str,
        access: ContainerAccess,
    ) -> StorageResult<bool>;
    async fn delete_container(&self, container: &str) -> StorageResult<()>;

    /// Lists blobs in the container.
    ///
    /// Returns the first result page only; callers needing more than one page
    /// must follow the continuation marker, which this interface does not expose.
    async fn list_blobs(&self, container: &str) -> StorageResult<Vec<BlobItem>>;

    // Append blob operations
    async fn put_append_blob(
        &self,
        container: &str,
        blob: &str,
        content_type: &str,
    ) -> StorageResult<()>;
    async fn append_block(&self, container: &str, blob: &str, data: Bytes) -> StorageResult<()>;

    // Block blob operations
    async fn create_block_blob(&self, container: &str, blob: &str) -> StorageResult<()>;
    async fn put_block(
        &self,
        container: &str,
        blob: &str,
        block_id: &str,
        data: Bytes,
    ) -> StorageResult<()>;
    async fn get_block_list(
        &self,
        container: &str,
        blob: &str,
        list_type: BlockListType,
    ) -> StorageResult<BlockList>;
    async fn put_block_list(
        &self,
        container: &str,
        blob: &str,
        blocks: &[BlockRef],
    ) -> StorageResult<()>;

    // Page blob operations
    async fn put_page_blob(
        &self,
        container: &str,
        blob: &str,
        length: u64,
        content_type: &str,
    ) -> StorageResult<()>;

    /// Writes or clears a page range. `data` is ignored for [`PageWriteMode::Clear`].
    async fn write_range(
        &self,
        container: &str,
        blob: &str,
        range: PageRange,
        mode: PageWriteMode,
        data: Bytes,
    ) -> StorageResult<()>;
    async fn get_page_ranges(&self, container: &str, blob: &str) -> StorageResult<Vec<PageRange>>;

    // Shared
    async fn get_blob(&self, container: &str, blob: &str) -> StorageResult<Bytes>;
}
