//! In-memory blob service used by tests and offline runs.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::BlobStore;
use crate::error::{ErrorCode, StorageError, StorageResult};
use crate::models::{
    coalesce_ranges, is_valid_block_id, new_etag, BlobItem, BlobType, BlockInfo, BlockList,
    BlockListType, BlockRef, BlockState, ContainerAccess, PageRange, PageWriteMode,
    MAX_PAGE_RANGE_SIZE, PAGE_SIZE,
};

/// Maximum number of append blocks (50,000).
pub const MAX_APPEND_BLOCK_COUNT: u32 = 50_000;
/// Maximum size of a single append block (100 MiB).
pub const MAX_APPEND_BLOCK_SIZE: u64 = 100 * 1024 * 1024;

/// Largest page blob the in-memory store will back (64 MiB); content is held densely.
pub const MAX_MEMORY_PAGE_BLOB_SIZE: u64 = 64 * 1024 * 1024;

/// Key type for blobs and staged block lists - uses Arc<str> to avoid allocations.
type BlobKey = (Arc<str>, Arc<str>);

#[derive(Debug, Clone)]
struct ContainerEntry {
    access: ContainerAccess,
}

/// A block held either in a committed list or in the staging area.
#[derive(Debug, Clone)]
struct StoredBlock {
    block_id: String,
    data: Bytes,
}

impl StoredBlock {
    fn info(&self, state: BlockState) -> BlockInfo {
        BlockInfo {
            block_id: self.block_id.clone(),
            size: self.data.len() as u64,
            state,
        }
    }
}

#[derive(Debug, Clone)]
enum BlobData {
    Append {
        content: BytesMut,
        committed_block_count: u32,
    },
    Block {
        committed: Vec<StoredBlock>,
    },
    Page {
        content: Vec<u8>,
        ranges: Vec<PageRange>,
    },
}

#[derive(Debug, Clone)]
struct StoredBlob {
    item: BlobItem,
    data: BlobData,
}

impl StoredBlob {
    fn new(name: &str, blob_type: BlobType, content_type: Option<&str>, data: BlobData) -> Self {
        let content_length = match &data {
            BlobData::Page { content, .. } => content.len() as u64,
            _ => 0,
        };
        let mut item = BlobItem::new(name, blob_type, content_length);
        item.content_type = content_type.map(str::to_string);
        Self { item, data }
    }

    fn touch(&mut self, content_length: u64) {
        self.item.content_length = content_length;
        self.item.etag = new_etag();
        self.item.last_modified = Utc::now();
    }

    fn content(&self) -> Bytes {
        match &self.data {
            BlobData::Append { content, .. } => content.clone().freeze(),
            BlobData::Block { committed } => {
                let mut out = BytesMut::new();
                for block in committed {
                    out.extend_from_slice(&block.data);
                }
                out.freeze()
            }
            BlobData::Page { content, .. } => Bytes::copy_from_slice(content),
        }
    }
}

/// In-memory implementation of [`BlobStore`] with the service's blob semantics.
pub struct MemoryBlobStore {
    /// Containers indexed by name.
    containers: DashMap<Arc<str>, ContainerEntry>,

    /// Blobs indexed by (container, name).
    blobs: DashMap<BlobKey, StoredBlob>,

    /// Staged (uncommitted) blocks indexed by (container, blob), in staging order.
    staged: DashMap<BlobKey, Vec<StoredBlock>>,

    /// Payload bytes accepted so far.
    current_size: AtomicU64,

    /// Maximum payload bytes accepted (0 = unlimited).
    size_limit: u64,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::with_limit(0)
    }

    pub fn with_limit(limit: u64) -> Self {
        Self {
            containers: DashMap::new(),
            blobs: DashMap::new(),
            staged: DashMap::new(),
            current_size: AtomicU64::new(0),
            size_limit: limit,
        }
    }

    /// Returns the access level of a container, if it exists.
    pub fn container_access(&self, container: &str) -> Option<ContainerAccess> {
        self.containers.get(container).map(|c| c.access)
    }

    /// Returns the type of a blob, if it exists.
    pub fn blob_type(&self, container: &str, blob: &str) -> Option<BlobType> {
        self.blobs
            .get(&Self::blob_key(container, blob))
            .map(|b| b.item.blob_type)
    }

    #[inline]
    fn blob_key(container: &str, blob: &str) -> BlobKey {
        (Arc::from(container), Arc::from(blob))
    }

    fn require_container(&self, container: &str) -> StorageResult<()> {
        if self.containers.contains_key(container) {
            Ok(())
        } else {
            Err(StorageError::new(ErrorCode::ContainerNotFound))
        }
    }

    /// Accounts for `size` incoming bytes against the store limit.
    fn reserve(&self, size: u64) -> StorageResult<()> {
        if self.size_limit > 0 {
            let current = self.current_size.load(Ordering::Relaxed);
            if current + size > self.size_limit {
                return Err(StorageError::with_message(
                    ErrorCode::RequestBodyTooLarge,
                    "Storage limit exceeded",
                ));
            }
        }
        self.current_size.fetch_add(size, Ordering::Relaxed);
        Ok(())
    }

    /// Creates a blob, replacing an existing blob of the same type.
    fn put_blob(&self, container: &str, blob: StoredBlob) -> StorageResult<()> {
        self.require_container(container)?;
        let key = Self::blob_key(container, &blob.item.name);
        if let Some(existing) = self.blobs.get(&key) {
            if existing.item.blob_type != blob.item.blob_type {
                return Err(StorageError::with_message(
                    ErrorCode::InvalidBlobType,
                    format!(
                        "Blob {} already exists as {}",
                        blob.item.name,
                        existing.item.blob_type.as_str()
                    ),
                ));
            }
        }
        self.blobs.insert(key, blob);
        Ok(())
    }

    fn wrong_type(blob: &StoredBlob) -> StorageError {
        StorageError::with_message(
            ErrorCode::InvalidBlobType,
            format!(
                "Operation is not supported on {} {}",
                blob.item.blob_type.as_str(),
                blob.item.name
            ),
        )
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Adds `new` to a sorted, disjoint range list, merging overlapping or adjacent ranges.
fn insert_range(ranges: &mut Vec<PageRange>, new: PageRange) {
    ranges.push(new);
    *ranges = coalesce_ranges(ranges);
}

/// Removes `cut` from a sorted, disjoint range list, splitting ranges as needed.
fn remove_range(ranges: &mut Vec<PageRange>, cut: PageRange) {
    let mut out = Vec::with_capacity(ranges.len() + 1);
    for r in ranges.drain(..) {
        if r.end < cut.start || r.start > cut.end {
            out.push(r);
            continue;
        }
        if r.start < cut.start {
            out.push(PageRange::new(r.start, cut.start - 1));
        }
        if r.end > cut.end {
            out.push(PageRange::new(cut.end + 1, r.end));
        }
    }
    *ranges = out;
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn create_container_if_not_exists(
        &self,
        container: &str,
        access: ContainerAccess,
    ) -> StorageResult<bool> {
        let key: Arc<str> = Arc::from(container);
        if self.containers.contains_key(&key) {
            return Ok(false);
        }
        self.containers.insert(key, ContainerEntry { access });
        Ok(true)
    }

    async fn delete_container(&self, container: &str) -> StorageResult<()> {
        self.containers
            .remove(container)
            .ok_or_else(|| StorageError::new(ErrorCode::ContainerNotFound))?;
        self.blobs.retain(|(c, _), _| c.as_ref() != container);
        self.staged.retain(|(c, _), _| c.as_ref() != container);
        Ok(())
    }

    async fn list_blobs(&self, container: &str) -> StorageResult<Vec<BlobItem>> {
        self.require_container(container)?;
        let mut items: Vec<BlobItem> = self
            .blobs
            .iter()
            .filter(|entry| entry.key().0.as_ref() == container)
            .map(|entry| entry.value().item.clone())
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn put_append_blob(
        &self,
        container: &str,
        blob: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        let stored = StoredBlob::new(
            blob,
            BlobType::AppendBlob,
            Some(content_type),
            BlobData::Append {
                content: BytesMut::new(),
                committed_block_count: 0,
            },
        );
        self.put_blob(container, stored)
    }

    async fn append_block(&self, container: &str, blob: &str, data: Bytes) -> StorageResult<()> {
        self.require_container(container)?;
        let size = data.len() as u64;
        if size > MAX_APPEND_BLOCK_SIZE {
            return Err(StorageError::new(ErrorCode::RequestBodyTooLarge));
        }

        let mut entry = self
            .blobs
            .get_mut(&Self::blob_key(container, blob))
            .ok_or_else(|| StorageError::new(ErrorCode::BlobNotFound))?;
        let stored = entry.value_mut();
        let (content, committed_block_count) = match &mut stored.data {
            BlobData::Append {
                content,
                committed_block_count,
            } => (content, committed_block_count),
            _ => return Err(Self::wrong_type(stored)),
        };

        if *committed_block_count >= MAX_APPEND_BLOCK_COUNT {
            return Err(StorageError::new(ErrorCode::BlockCountExceedsLimit));
        }
        self.reserve(size)?;

        content.extend_from_slice(&data);
        *committed_block_count += 1;
        let length = content.len() as u64;
        stored.touch(length);
        Ok(())
    }

    async fn create_block_blob(&self, container: &str, blob: &str) -> StorageResult<()> {
        let stored = StoredBlob::new(
            blob,
            BlobType::BlockBlob,
            None,
            BlobData::Block {
                committed: Vec::new(),
            },
        );
        self.put_blob(container, stored)?;
        // A fresh upload discards anything staged against the old blob
        self.staged.remove(&Self::blob_key(container, blob));
        Ok(())
    }

    async fn put_block(
        &self,
        container: &str,
        blob: &str,
        block_id: &str,
        data: Bytes,
    ) -> StorageResult<()> {
        self.require_container(container)?;
        if !is_valid_block_id(block_id) {
            return Err(StorageError::new(ErrorCode::InvalidBlockId));
        }

        let key = Self::blob_key(container, blob);
        if let Some(existing) = self.blobs.get(&key) {
            if existing.item.blob_type != BlobType::BlockBlob {
                return Err(Self::wrong_type(&existing));
            }
        }
        self.reserve(data.len() as u64)?;

        let mut staged = self.staged.entry(key).or_default();
        // Re-staging an ID replaces the earlier block
        staged.retain(|b| b.block_id != block_id);
        staged.push(StoredBlock {
            block_id: block_id.to_string(),
            data,
        });
        Ok(())
    }

    async fn get_block_list(
        &self,
        container: &str,
        blob: &str,
        list_type: BlockListType,
    ) -> StorageResult<BlockList> {
        self.require_container(container)?;
        let key = Self::blob_key(container, blob);

        let committed = match self.blobs.get(&key) {
            Some(stored) => match &stored.data {
                BlobData::Block { committed } => committed.clone(),
                _ => return Err(Self::wrong_type(&stored)),
            },
            None => Vec::new(),
        };
        let staged = self
            .staged
            .get(&key)
            .map(|s| s.value().clone())
            .unwrap_or_default();

        if committed.is_empty() && staged.is_empty() && !self.blobs.contains_key(&key) {
            return Err(StorageError::new(ErrorCode::BlobNotFound));
        }

        let mut list = BlockList::default();
        if list_type.includes(BlockState::Committed) {
            list.committed = committed
                .iter()
                .map(|b| b.info(BlockState::Committed))
                .collect();
        }
        if list_type.includes(BlockState::Uncommitted) {
            list.uncommitted = staged
                .iter()
                .map(|b| b.info(BlockState::Uncommitted))
                .collect();
        }
        Ok(list)
    }

    async fn put_block_list(
        &self,
        container: &str,
        blob: &str,
        blocks: &[BlockRef],
    ) -> StorageResult<()> {
        self.require_container(container)?;
        let key = Self::blob_key(container, blob);

        let (committed, content_type) = match self.blobs.get(&key) {
            Some(stored) => match &stored.data {
                BlobData::Block { committed } => {
                    (committed.clone(), stored.item.content_type.clone())
                }
                _ => return Err(Self::wrong_type(&stored)),
            },
            None => (Vec::new(), None),
        };
        let staged = self
            .staged
            .get(&key)
            .map(|s| s.value().clone())
            .unwrap_or_default();

        let find = |list: &[StoredBlock], id: &str| -> Option<StoredBlock> {
            list.iter().find(|b| b.block_id == id).cloned()
        };

        let mut resolved = Vec::with_capacity(blocks.len());
        for block_ref in blocks {
            let found = match block_ref {
                BlockRef::Committed(id) => find(committed.as_slice(), id.as_str()),
                BlockRef::Uncommitted(id) => find(staged.as_slice(), id.as_str()),
                BlockRef::Latest(id) => find(staged.as_slice(), id.as_str())
                    .or_else(|| find(committed.as_slice(), id.as_str())),
            };
            match found {
                Some(block) => resolved.push(block),
                None => {
                    return Err(StorageError::with_message(
                        ErrorCode::InvalidBlockList,
                        format!("Block {} not found", block_ref.block_id()),
                    ))
                }
            }
        }

        let length = resolved.iter().map(|b| b.data.len() as u64).sum();
        let mut stored = StoredBlob::new(
            blob,
            BlobType::BlockBlob,
            content_type.as_deref(),
            BlobData::Block {
                committed: resolved,
            },
        );
        stored.touch(length);
        self.blobs.insert(key.clone(), stored);

        // Blocks left out of the commit are discarded
        self.staged.remove(&key);
        Ok(())
    }

    async fn put_page_blob(
        &self,
        container: &str,
        blob: &str,
        length: u64,
        content_type: &str,
    ) -> StorageResult<()> {
        if length % PAGE_SIZE != 0 {
            return Err(StorageError::with_message(
                ErrorCode::InvalidHeaderValue,
                "Page blob size must be aligned to 512 bytes",
            ));
        }
        if length > MAX_MEMORY_PAGE_BLOB_SIZE {
            return Err(StorageError::with_message(
                ErrorCode::OutOfRangeInput,
                format!(
                    "Page blob size {} exceeds the in-memory limit of {} bytes",
                    length, MAX_MEMORY_PAGE_BLOB_SIZE
                ),
            ));
        }
        let stored = StoredBlob::new(
            blob,
            BlobType::PageBlob,
            Some(content_type),
            BlobData::Page {
                content: vec![0u8; length as usize],
                ranges: Vec::new(),
            },
        );
        self.put_blob(container, stored)
    }

    async fn write_range(
        &self,
        container: &str,
        blob: &str,
        range: PageRange,
        mode: PageWriteMode,
        data: Bytes,
    ) -> StorageResult<()> {
        self.require_container(container)?;

        if !range.is_aligned() {
            return Err(StorageError::with_message(
                ErrorCode::InvalidPageRange,
                "Page ranges must be aligned to 512 bytes",
            ));
        }
        if mode == PageWriteMode::Update {
            if range.length() > MAX_PAGE_RANGE_SIZE {
                return Err(StorageError::new(ErrorCode::RequestBodyTooLarge));
            }
            if data.len() as u64 != range.length() {
                return Err(StorageError::with_message(
                    ErrorCode::InvalidHeaderValue,
                    format!(
                        "Body length {} does not match range length {}",
                        data.len(),
                        range.length()
                    ),
                ));
            }
        }

        let mut entry = self
            .blobs
            .get_mut(&Self::blob_key(container, blob))
            .ok_or_else(|| StorageError::new(ErrorCode::BlobNotFound))?;
        let stored = entry.value_mut();
        let (content, ranges) = match &mut stored.data {
            BlobData::Page { content, ranges } => (content, ranges),
            _ => return Err(Self::wrong_type(stored)),
        };

        if range.end >= content.len() as u64 {
            return Err(StorageError::new(ErrorCode::InvalidPageRange));
        }

        let start = range.start as usize;
        let end = range.end as usize + 1;
        match mode {
            PageWriteMode::Update => {
                self.reserve(range.length())?;
                content[start..end].copy_from_slice(&data);
                insert_range(ranges, range);
            }
            PageWriteMode::Clear => {
                content[start..end].fill(0);
                remove_range(ranges, range);
            }
        }

        let length = content.len() as u64;
        stored.touch(length);
        Ok(())
    }

    async fn get_page_ranges(&self, container: &str, blob: &str) -> StorageResult<Vec<PageRange>> {
        self.require_container(container)?;
        let stored = self
            .blobs
            .get(&Self::blob_key(container, blob))
            .ok_or_else(|| StorageError::new(ErrorCode::BlobNotFound))?;
        match &stored.data {
            BlobData::Page { ranges, .. } => Ok(ranges.clone()),
            _ => Err(Self::wrong_type(&stored)),
        }
    }

    async fn get_blob(&self, container: &str, blob: &str) -> StorageResult<Bytes> {
        self.require_container(container)?;
        self.blobs
            .get(&Self::blob_key(container, blob))
            .map(|b| b.content())
            .ok_or_else(|| StorageError::new(ErrorCode::BlobNotFound))
    }
}
