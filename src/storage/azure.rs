//! [`BlobStore`] backed by the Azure SDK for Rust.

use async_trait::async_trait;
use azure_storage::prelude::*;
use azure_storage::CloudLocation;
use azure_storage_blobs::blob::{BlobBlockType, BlockList as SdkBlockList, BlockListType as SdkBlockListType};
use azure_storage_blobs::container::PublicAccess;
use azure_storage_blobs::prelude::*;
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use tracing::debug;

use super::BlobStore;
use crate::config::AccountConfig;
use crate::error::{ErrorCode, StorageError, StorageResult};
use crate::models::{
    BlobItem, BlobType, BlockInfo, BlockList, BlockListType, BlockRef, BlockState,
    ContainerAccess, PageRange, PageWriteMode,
};

/// Blob service reached through `azure_storage_blobs`.
pub struct AzureBlobStore {
    service: BlobServiceClient,
}

impl AzureBlobStore {
    /// Connects to the public cloud endpoint of the account.
    pub fn new(account: &AccountConfig) -> Self {
        let credentials = StorageCredentials::access_key(account.name.clone(), account.key.clone());
        Self {
            service: ClientBuilder::new(account.name.clone(), credentials).blob_service_client(),
        }
    }

    /// Connects to a custom blob endpoint, such as a local emulator.
    pub fn with_endpoint(account: &AccountConfig, endpoint: &str) -> Self {
        let credentials = StorageCredentials::access_key(account.name.clone(), account.key.clone());
        let location = CloudLocation::Custom {
            account: account.name.clone(),
            uri: endpoint.trim_end_matches('/').to_string(),
        };
        Self {
            service: ClientBuilder::with_location(location, credentials).blob_service_client(),
        }
    }

    fn blob_client(&self, container: &str, blob: &str) -> BlobClient {
        self.service.container_client(container).blob_client(blob)
    }
}

fn to_public_access(access: ContainerAccess) -> PublicAccess {
    match access {
        ContainerAccess::Private => PublicAccess::None,
        ContainerAccess::Blob => PublicAccess::Blob,
        ContainerAccess::Container => PublicAccess::Container,
    }
}

/// Block IDs travel as opaque strings; the SDK owns their wire encoding.
fn to_block_id(block_id: &str) -> BlockId {
    BlockId::new(Bytes::copy_from_slice(block_id.as_bytes()))
}

fn from_block_id(block_id: &BlockId) -> String {
    String::from_utf8_lossy(&block_id.bytes()).into_owned()
}

fn to_blob_type(blob_type: &azure_storage_blobs::blob::BlobType) -> BlobType {
    match blob_type {
        azure_storage_blobs::blob::BlobType::PageBlob => BlobType::PageBlob,
        azure_storage_blobs::blob::BlobType::AppendBlob => BlobType::AppendBlob,
        _ => BlobType::BlockBlob,
    }
}

fn is_code(err: &StorageError, code: ErrorCode) -> bool {
    err.code == code
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    async fn create_container_if_not_exists(
        &self,
        container: &str,
        access: ContainerAccess,
    ) -> StorageResult<bool> {
        let client = self.service.container_client(container);
        match client.create().public_access(to_public_access(access)).await {
            Ok(_) => Ok(true),
            Err(err) => {
                let err = StorageError::from(err);
                if is_code(&err, ErrorCode::ContainerAlreadyExists) {
                    debug!(container, "container already exists");
                    Ok(false)
                } else {
                    Err(err)
                }
            }
        }
    }

    async fn delete_container(&self, container: &str) -> StorageResult<()> {
        self.service.container_client(container).delete().await?;
        Ok(())
    }

    async fn list_blobs(&self, container: &str) -> StorageResult<Vec<BlobItem>> {
        let client = self.service.container_client(container);
        let mut stream = client.list_blobs().into_stream();
        let mut items = Vec::new();

        // First page only
        if let Some(page) = stream.next().await {
            let page = page?;
            for blob in page.blobs.blobs() {
                let properties = &blob.properties;
                let mut item = BlobItem::new(
                    blob.name.clone(),
                    to_blob_type(&properties.blob_type),
                    properties.content_length,
                );
                item.content_type = Some(properties.content_type.clone());
                item.etag = properties.etag.to_string();
                item.last_modified =
                    DateTime::from_timestamp(properties.last_modified.unix_timestamp(), 0)
                        .unwrap_or_else(Utc::now);
                items.push(item);
            }
        }
        Ok(items)
    }

    async fn put_append_blob(
        &self,
        container: &str,
        blob: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        self.blob_client(container, blob)
            .put_append_blob()
            .content_type(content_type.to_string())
            .await?;
        Ok(())
    }

    async fn append_block(&self, container: &str, blob: &str, data: Bytes) -> StorageResult<()> {
        self.blob_client(container, blob).append_block(data).await?;
        Ok(())
    }

    async fn create_block_blob(&self, container: &str, blob: &str) -> StorageResult<()> {
        self.blob_client(container, blob)
            .put_block_blob(Bytes::new())
            .await?;
        Ok(())
    }

    async fn put_block(
        &self,
        container: &str,
        blob: &str,
        block_id: &str,
        data: Bytes,
    ) -> StorageResult<()> {
        self.blob_client(container, blob)
            .put_block(to_block_id(block_id), data)
            .await?;
        Ok(())
    }

    async fn get_block_list(
        &self,
        container: &str,
        blob: &str,
        list_type: BlockListType,
    ) -> StorageResult<BlockList> {
        let sdk_type = match list_type {
            BlockListType::Committed => SdkBlockListType::Committed,
            BlockListType::Uncommitted => SdkBlockListType::Uncommitted,
            BlockListType::All => SdkBlockListType::All,
        };
        let response = self
            .blob_client(container, blob)
            .get_block_list()
            .block_list_type(sdk_type)
            .await?;

        let mut list = BlockList::default();
        for block in response.block_with_size_list.blocks {
            let size = block.size_in_bytes;
            match &block.block_list_type {
                BlobBlockType::Committed(id) => list.committed.push(BlockInfo {
                    block_id: from_block_id(id),
                    size,
                    state: BlockState::Committed,
                }),
                BlobBlockType::Uncommitted(id) | BlobBlockType::Latest(id) => {
                    list.uncommitted.push(BlockInfo {
                        block_id: from_block_id(id),
                        size,
                        state: BlockState::Uncommitted,
                    })
                }
            }
        }
        Ok(list)
    }

    async fn put_block_list(
        &self,
        container: &str,
        blob: &str,
        blocks: &[BlockRef],
    ) -> StorageResult<()> {
        let block_list = SdkBlockList {
            blocks: blocks
                .iter()
                .map(|block| match block {
                    BlockRef::Committed(id) => BlobBlockType::Committed(to_block_id(id)),
                    BlockRef::Uncommitted(id) => BlobBlockType::Uncommitted(to_block_id(id)),
                    BlockRef::Latest(id) => BlobBlockType::Latest(to_block_id(id)),
                })
                .collect(),
        };
        self.blob_client(container, blob)
            .put_block_list(block_list)
            .await?;
        Ok(())
    }

    async fn put_page_blob(
        &self,
        container: &str,
        blob: &str,
        length: u64,
        content_type: &str,
    ) -> StorageResult<()> {
        self.blob_client(container, blob)
            .put_page_blob(length as u128)
            .content_type(content_type.to_string())
            .await?;
        Ok(())
    }

    async fn write_range(
        &self,
        container: &str,
        blob: &str,
        range: PageRange,
        mode: PageWriteMode,
        data: Bytes,
    ) -> StorageResult<()> {
        let ba512 = BA512Range::new(range.start, range.end).map_err(|e| {
            StorageError::with_message(ErrorCode::InvalidPageRange, e.to_string())
        })?;
        let client = self.blob_client(container, blob);
        match mode {
            PageWriteMode::Update => {
                client.put_page(ba512, data).await?;
            }
            PageWriteMode::Clear => {
                client.clear_page(ba512).await?;
            }
        }
        Ok(())
    }

    async fn get_page_ranges(&self, container: &str, blob: &str) -> StorageResult<Vec<PageRange>> {
        let response = self.blob_client(container, blob).get_page_ranges().await?;
        Ok(response
            .page_list
            .ranges
            .iter()
            .map(to_page_range)
            .collect())
    }

    async fn get_blob(&self, container: &str, blob: &str) -> StorageResult<Bytes> {
        let mut stream = self.blob_client(container, blob).get().into_stream();
        let mut data = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            data.extend_from_slice(&chunk.data.collect().await?);
        }
        Ok(data.freeze())
    }
}

fn to_page_range(range: &BA512Range) -> PageRange {
    PageRange::new(range.start(), range.end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sdk_range_bounds_carried_inclusive() {
        let sdk = BA512Range::new(512, 2047).unwrap();
        let range = to_page_range(&sdk);
        assert_eq!(range, PageRange::new(512, 2047));
        assert_eq!(range.length(), 1536);
        assert!(range.is_aligned());
    }

    #[test]
    fn test_block_id_is_carried_verbatim() {
        let id = to_block_id("MDAwMDA=");
        assert_eq!(from_block_id(&id), "MDAwMDA=");
    }

    #[test]
    fn test_access_mapping() {
        assert!(matches!(
            to_public_access(ContainerAccess::Private),
            PublicAccess::None
        ));
        assert!(matches!(
            to_public_access(ContainerAccess::Container),
            PublicAccess::Container
        ));
    }
}
