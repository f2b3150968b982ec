//! Append blob walkthrough.

use bytes::Bytes;

use crate::config::AppendSettings;
use crate::context::WorkflowContext;
use crate::error::{SampleError, SampleResult};
use crate::events::WorkflowEvent;
use crate::models::BlobType;

use super::download::download_blob;
use super::verify_content;

/// Creates an empty append blob.
pub async fn create_append_blob(
    ctx: &WorkflowContext<'_>,
    blob: &str,
    content_type: &str,
) -> SampleResult<()> {
    ctx.store
        .put_append_blob(&ctx.container, blob, content_type)
        .await
        .map_err(|e| SampleError::create(blob, e))?;

    ctx.emit(WorkflowEvent::BlobCreated {
        container: ctx.container.clone(),
        blob: blob.to_string(),
        kind: BlobType::AppendBlob.as_str(),
    });
    Ok(())
}

/// Appends one block to the end of an append blob.
pub async fn append_payload(ctx: &WorkflowContext<'_>, blob: &str, data: Bytes) -> SampleResult<()> {
    let bytes = data.len();
    ctx.store
        .append_block(&ctx.container, blob, data)
        .await
        .map_err(|e| SampleError::append(blob, e))?;

    ctx.emit(WorkflowEvent::BlockAppended {
        blob: blob.to_string(),
        bytes,
    });
    Ok(())
}

/// Creates the append blob, appends one payload block and downloads the result.
///
/// Returns the appended payload.
pub async fn run(ctx: &WorkflowContext<'_>, settings: &AppendSettings) -> SampleResult<Bytes> {
    create_append_blob(ctx, &settings.blob, &settings.content_type).await?;

    let payload = ctx.payload.generate(settings.payload_len);
    append_payload(ctx, &settings.blob, payload.clone()).await?;

    let downloaded = download_blob(ctx, &settings.blob, &settings.output_file).await?;
    verify_content(&settings.blob, &payload, &downloaded)?;
    Ok(payload)
}
