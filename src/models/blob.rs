//! Blob data models.

use chrono::{DateTime, Utc};

/// Blob types supported by Azure Blob Storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobType {
    BlockBlob,
    PageBlob,
    AppendBlob,
}

impl BlobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlobType::BlockBlob => "BlockBlob",
            BlobType::PageBlob => "PageBlob",
            BlobType::AppendBlob => "AppendBlob",
        }
    }
}

/// Default content type for blobs created by the walkthrough.
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// A blob as reported by a container listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobItem {
    pub name: String,
    pub blob_type: BlobType,
    pub content_length: u64,
    pub content_type: Option<String>,
    pub etag: String,
    pub last_modified: DateTime<Utc>,
}

impl BlobItem {
    pub fn new(name: impl Into<String>, blob_type: BlobType, content_length: u64) -> Self {
        Self {
            name: name.into(),
            blob_type,
            content_length,
            content_type: None,
            etag: new_etag(),
            last_modified: Utc::now(),
        }
    }
}

/// Generates a fresh opaque ETag value.
pub fn new_etag() -> String {
    format!("\"0x{}\"", uuid::Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_type_names() {
        assert_eq!(BlobType::BlockBlob.as_str(), "BlockBlob");
        assert_eq!(BlobType::PageBlob.as_str(), "PageBlob");
        assert_eq!(BlobType::AppendBlob.as_str(), "AppendBlob");
    }

    #[test]
    fn test_etags_are_unique() {
        assert_ne!(new_etag(), new_etag());
    }
}
