//! Page blob data models.

use crate::error::{SampleError, SampleResult};

/// Page blob constants.
pub const PAGE_SIZE: u64 = 512;
pub const MAX_PAGE_BLOB_SIZE: u64 = 8 * 1024 * 1024 * 1024 * 1024; // 8 TiB
pub const MAX_PAGE_RANGE_SIZE: u64 = 4 * 1024 * 1024; // 4 MiB per write operation

/// A range of pages in a page blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PageRange {
    /// Start byte offset (inclusive).
    pub start: u64,
    /// End byte offset (inclusive).
    pub end: u64,
}

impl PageRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Builds an aligned range covering `len` bytes from `start`.
    pub fn with_len(start: u64, len: u64) -> SampleResult<Self> {
        if len == 0 {
            return Err(SampleError::Alignment { start, end: start });
        }
        let end = start
            .checked_add(len - 1)
            .ok_or(SampleError::Alignment { start, end: u64::MAX })?;
        let range = Self::new(start, end);
        range.validate()?;
        Ok(range)
    }

    /// Returns the length of this page range.
    pub fn length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Index of the first page covered.
    pub fn first_page(&self) -> u64 {
        self.start / PAGE_SIZE
    }

    /// Index of the last page covered.
    pub fn last_page(&self) -> u64 {
        self.end / PAGE_SIZE
    }

    /// Returns `true` if both ends sit on page boundaries.
    pub fn is_aligned(&self) -> bool {
        self.end >= self.start
            && self.start % PAGE_SIZE == 0
            && self
                .end
                .checked_add(1)
                .map_or(false, |after| after % PAGE_SIZE == 0)
    }

    /// Checks 512-byte alignment of both ends.
    pub fn validate(&self) -> SampleResult<()> {
        if !self.is_aligned() {
            return Err(SampleError::Alignment {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    /// Checks that the range fits inside a blob of `length` bytes.
    pub fn check_within(&self, length: u64) -> SampleResult<()> {
        if self.end >= length {
            return Err(SampleError::Range {
                start: self.start,
                end: self.end,
                length,
            });
        }
        Ok(())
    }
}

/// Sorts ranges and merges those that overlap or touch.
pub fn coalesce_ranges(ranges: &[PageRange]) -> Vec<PageRange> {
    let mut sorted = ranges.to_vec();
    sorted.sort();
    let mut out: Vec<PageRange> = Vec::with_capacity(sorted.len());
    for r in sorted {
        match out.last_mut() {
            Some(last) if r.start <= last.end.saturating_add(1) => {
                last.end = last.end.max(r.end);
            }
            _ => out.push(r),
        }
    }
    out
}

/// Page write mode for PutPage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageWriteMode {
    /// Overwrite the range with the request body.
    #[default]
    Update,
    /// Zero the range and release its pages.
    Clear,
}

impl PageWriteMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageWriteMode::Update => "update",
            PageWriteMode::Clear => "clear",
        }
    }
}

/// Checks a declared page blob length before the blob is created.
pub fn validate_page_blob_length(length: u64) -> SampleResult<()> {
    if length % PAGE_SIZE != 0 || length > MAX_PAGE_BLOB_SIZE {
        return Err(SampleError::InvalidSize(length));
    }
    Ok(())
}
