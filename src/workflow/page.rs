//! Page blob walkthrough.
//!
//! Sizes and offsets are checked locally so that misaligned or oversized
//! requests fail before anything reaches the service.

use bytes::Bytes;
use tracing::debug;

use crate::config::PageSettings;
use crate::context::WorkflowContext;
use crate::error::{SampleError, SampleResult};
use crate::events::WorkflowEvent;
use crate::models::{
    coalesce_ranges, validate_page_blob_length, BlobType, PageRange, PageWriteMode,
};

use super::download::download_blob;

/// Creates a zero-filled page blob of `length` bytes.
pub async fn create_page_blob(
    ctx: &WorkflowContext<'_>,
    blob: &str,
    length: u64,
    content_type: &str,
) -> SampleResult<()> {
    validate_page_blob_length(length)?;

    ctx.store
        .put_page_blob(&ctx.container, blob, length, content_type)
        .await
        .map_err(|e| SampleError::create(blob, e))?;

    ctx.emit(WorkflowEvent::BlobCreated {
        container: ctx.container.clone(),
        blob: blob.to_string(),
        kind: BlobType::PageBlob.as_str(),
    });
    Ok(())
}

/// Writes `data` at `offset` of a page blob of `blob_len` bytes.
///
/// Returns the range written.
pub async fn write_pages(
    ctx: &WorkflowContext<'_>,
    blob: &str,
    blob_len: u64,
    offset: u64,
    data: Bytes,
) -> SampleResult<PageRange> {
    let range = PageRange::with_len(offset, data.len() as u64)?;
    range.check_within(blob_len)?;

    let mode = PageWriteMode::Update;
    debug!(blob, start = range.start, end = range.end, mode = mode.as_str(), "writing pages");
    ctx.store
        .write_range(&ctx.container, blob, range, mode, data)
        .await?;

    ctx.emit(WorkflowEvent::PagesWritten {
        blob: blob.to_string(),
        range,
    });
    Ok(range)
}

/// Zeroes `range` of a page blob of `blob_len` bytes.
pub async fn clear_pages(
    ctx: &WorkflowContext<'_>,
    blob: &str,
    blob_len: u64,
    range: PageRange,
) -> SampleResult<()> {
    range.validate()?;
    range.check_within(blob_len)?;

    let mode = PageWriteMode::Clear;
    debug!(blob, start = range.start, end = range.end, mode = mode.as_str(), "writing pages");
    ctx.store
        .write_range(&ctx.container, blob, range, mode, Bytes::new())
        .await?;
    Ok(())
}

/// Returns the ranges of the blob that hold data, as reported by the service.
pub async fn page_ranges(ctx: &WorkflowContext<'_>, blob: &str) -> SampleResult<Vec<PageRange>> {
    let ranges = ctx.store.get_page_ranges(&ctx.container, blob).await?;
    ctx.emit(WorkflowEvent::PageRangesListed {
        blob: blob.to_string(),
        ranges: ranges.clone(),
    });
    Ok(ranges)
}

/// Checks a downloaded page blob: `written` at the start, zeros afterwards.
fn verify_pages(blob: &str, blob_len: u64, written: &[u8], content: &[u8]) -> SampleResult<()> {
    let fail = |reason: String| SampleError::Verification {
        blob: blob.to_string(),
        reason,
    };

    if content.len() as u64 != blob_len {
        return Err(fail(format!(
            "expected {} bytes, read {}",
            blob_len,
            content.len()
        )));
    }
    let (head, tail) = content.split_at(written.len().min(content.len()));
    if head != written {
        return Err(fail("written pages differ from the payload".to_string()));
    }
    if let Some(pos) = tail.iter().position(|b| *b != 0) {
        return Err(fail(format!(
            "byte {} outside the written range is not zero",
            written.len() + pos
        )));
    }
    Ok(())
}

/// Creates the page blob, writes the leading pages and verifies the download.
///
/// Returns the written payload.
pub async fn run(ctx: &WorkflowContext<'_>, settings: &PageSettings) -> SampleResult<Bytes> {
    let blob = settings.blob.as_str();
    // Check the write before creating anything remotely.
    PageRange::with_len(0, settings.write_len)?.check_within(settings.blob_len)?;

    create_page_blob(ctx, blob, settings.blob_len, &settings.content_type).await?;

    let payload = ctx.payload.generate(settings.write_len as usize);
    let written = write_pages(ctx, blob, settings.blob_len, 0, payload.clone()).await?;

    // The service may report the written pages split into several ranges
    let ranges = page_ranges(ctx, blob).await?;
    let coverage = coalesce_ranges(&ranges);
    if coverage != [written] {
        return Err(SampleError::Verification {
            blob: blob.to_string(),
            reason: format!("expected ranges [{:?}], got {:?}", written, coverage),
        });
    }

    let downloaded = download_blob(ctx, blob, &settings.output_file).await?;
    verify_pages(blob, settings.blob_len, &payload, &downloaded)?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::SilentSink;
    use crate::models::ContainerAccess;
    use crate::payload::FixedPayload;
    use crate::storage::{BlobStore, MemoryBlobStore};

    async fn store_with_container() -> MemoryBlobStore {
        let store = MemoryBlobStore::new();
        store
            .create_container_if_not_exists("c1", ContainerAccess::Private)
            .await
            .unwrap();
        store
    }

    #[test]
    fn test_verify_pages() {
        let mut content = vec![0u8; 1024];
        content[..512].fill(b'a');
        assert!(verify_pages("p1", 1024, &[b'a'; 512], &content).is_ok());
        assert!(verify_pages("p1", 2048, &[b'a'; 512], &content).is_err());

        content[700] = 1;
        assert!(matches!(
            verify_pages("p1", 1024, &[b'a'; 512], &content),
            Err(SampleError::Verification { ref reason, .. }) if reason.contains("700")
        ));
    }

    #[tokio::test]
    async fn test_adjacent_writes_coalesce() {
        let store = store_with_container().await;
        let sink = SilentSink;
        let payload = FixedPayload::new("x");
        let ctx = WorkflowContext::new("c1", &store, &sink, &payload);

        create_page_blob(&ctx, "p1", 4096, "text/plain").await.unwrap();
        write_pages(&ctx, "p1", 4096, 0, Bytes::from(vec![1u8; 512])).await.unwrap();
        write_pages(&ctx, "p1", 4096, 512, Bytes::from(vec![2u8; 1024])).await.unwrap();
        write_pages(&ctx, "p1", 4096, 3072, Bytes::from(vec![3u8; 512])).await.unwrap();

        let ranges = page_ranges(&ctx, "p1").await.unwrap();
        assert_eq!(ranges, vec![PageRange::new(0, 1535), PageRange::new(3072, 3583)]);
    }

    #[tokio::test]
    async fn test_clear_zeroes_and_splits_range() {
        let store = store_with_container().await;
        let sink = SilentSink;
        let payload = FixedPayload::new("x");
        let ctx = WorkflowContext::new("c1", &store, &sink, &payload);

        create_page_blob(&ctx, "p1", 2048, "text/plain").await.unwrap();
        write_pages(&ctx, "p1", 2048, 0, Bytes::from(vec![7u8; 1536])).await.unwrap();
        clear_pages(&ctx, "p1", 2048, PageRange::new(512, 1023)).await.unwrap();

        let ranges = page_ranges(&ctx, "p1").await.unwrap();
        assert_eq!(ranges, vec![PageRange::new(0, 511), PageRange::new(1024, 1535)]);
        let data = store.get_blob("c1", "p1").await.unwrap();
        assert!(data[512..1024].iter().all(|b| *b == 0));
        assert!(data[1024..1536].iter().all(|b| *b == 7));
    }

    #[tokio::test]
    async fn test_offsets_near_u64_max_are_rejected() {
        let store = store_with_container().await;
        let sink = SilentSink;
        let payload = FixedPayload::new("x");
        let ctx = WorkflowContext::new("c1", &store, &sink, &payload);

        let err = clear_pages(&ctx, "p1", 2560, PageRange::new(0, u64::MAX))
            .await
            .unwrap_err();
        assert!(matches!(err, SampleError::Alignment { .. }));

        let err = write_pages(&ctx, "p1", 2560, u64::MAX - 511, Bytes::from(vec![1u8; 1024]))
            .await
            .unwrap_err();
        assert!(matches!(err, SampleError::Alignment { .. }));
    }

    #[tokio::test]
    async fn test_write_past_end_is_range_error() {
        let store = store_with_container().await;
        let sink = SilentSink;
        let payload = FixedPayload::new("x");
        let ctx = WorkflowContext::new("c1", &store, &sink, &payload);

        create_page_blob(&ctx, "p1", 1024, "text/plain").await.unwrap();
        let err = write_pages(&ctx, "p1", 1024, 512, Bytes::from(vec![1u8; 1024]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SampleError::Range {
                start: 512,
                end: 1535,
                length: 1024
            }
        ));
        assert!(page_ranges(&ctx, "p1").await.unwrap().is_empty());
    }
}
