//! Block data models for block blobs.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

/// Maximum length of an encoded block ID (64 raw bytes in base64).
pub const MAX_BLOCK_ID_LEN: usize = 88;

/// Block state in the block list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    /// Block has been staged but not committed.
    Uncommitted,
    /// Block has been committed.
    Committed,
}

impl BlockState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockState::Uncommitted => "Uncommitted",
            BlockState::Committed => "Committed",
        }
    }
}

/// Block list type for GetBlockList operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockListType {
    Committed,
    Uncommitted,
    #[default]
    All,
}

impl BlockListType {
    pub fn includes(&self, state: BlockState) -> bool {
        match self {
            BlockListType::All => true,
            BlockListType::Committed => state == BlockState::Committed,
            BlockListType::Uncommitted => state == BlockState::Uncommitted,
        }
    }
}

/// A block as reported by GetBlockList.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockInfo {
    pub block_id: String,
    pub size: u64,
    pub state: BlockState,
}

/// Result of GetBlockList: committed blocks in blob order, then staged blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockList {
    pub committed: Vec<BlockInfo>,
    pub uncommitted: Vec<BlockInfo>,
}

impl BlockList {
    pub fn committed_ids(&self) -> Vec<&str> {
        self.committed.iter().map(|b| b.block_id.as_str()).collect()
    }

    pub fn uncommitted_ids(&self) -> Vec<&str> {
        self.uncommitted.iter().map(|b| b.block_id.as_str()).collect()
    }

    /// Returns the state of the given block, if it appears in the list.
    pub fn state_of(&self, block_id: &str) -> Option<BlockState> {
        if self.committed.iter().any(|b| b.block_id == block_id) {
            Some(BlockState::Committed)
        } else if self.uncommitted.iter().any(|b| b.block_id == block_id) {
            Some(BlockState::Uncommitted)
        } else {
            None
        }
    }
}

/// Entry of a PutBlockList request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockRef {
    /// Must name a block in the committed list.
    Committed(String),
    /// Must name a staged block.
    Uncommitted(String),
    /// Staged block if one exists, otherwise the committed one.
    Latest(String),
}

impl BlockRef {
    pub fn block_id(&self) -> &str {
        match self {
            BlockRef::Committed(id) | BlockRef::Uncommitted(id) | BlockRef::Latest(id) => id,
        }
    }
}

/// Encodes a raw block name into a base64 block ID.
pub fn encode_block_id(raw: &str) -> String {
    BASE64.encode(raw.as_bytes())
}

/// Checks that a block ID is non-empty, base64-safe and within the length limit.
pub fn is_valid_block_id(block_id: &str) -> bool {
    !block_id.is_empty()
        && block_id.len() <= MAX_BLOCK_ID_LEN
        && block_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='))
}
