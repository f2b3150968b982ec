//! The walkthrough: provisioning, the three blob workflows, listing and cleanup.

pub mod append;
pub mod block;
pub mod container;
pub mod download;
pub mod page;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{info, info_span, Instrument};

use crate::config::Config;
use crate::context::WorkflowContext;
use crate::error::{SampleError, SampleResult};
use crate::events::{EventSink, WorkflowEvent};
use crate::models::BlobItem;
use crate::payload::PayloadSource;
use crate::storage::BlobStore;

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Blobs listed after the three workflows.
    pub listed: Vec<BlobItem>,
    /// Whether the container and local files were removed.
    pub cleaned_up: bool,
}

/// Compares downloaded content with what was written.
pub(crate) fn verify_content(blob: &str, expected: &[u8], actual: &[u8]) -> SampleResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(SampleError::Verification {
            blob: blob.to_string(),
            reason: format!(
                "read {} bytes that differ from the {} bytes written",
                actual.len(),
                expected.len()
            ),
        })
    }
}

pub(crate) const CLEANUP_PROMPT: &str =
    "Press enter to delete the container and the downloaded files";

/// Writes the cleanup prompt to `output` and waits for a line on `input`.
///
/// The prompt bypasses the event sink so a silenced run still shows it.
async fn wait_for_enter<R, W>(input: R, output: &mut W) -> SampleResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output.write_all(CLEANUP_PROMPT.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await?;

    let mut input = input;
    let mut line = String::new();
    input.read_line(&mut line).await?;
    Ok(())
}

/// Runs the whole walkthrough against `store`.
///
/// Any error from provisioning or a workflow ends the run immediately and
/// leaves the container and downloaded files in place.
pub async fn run(
    config: &Config,
    store: &dyn BlobStore,
    sink: &dyn EventSink,
    payload: &dyn PayloadSource,
) -> SampleResult<RunReport> {
    let ctx = WorkflowContext::new(config.container.clone(), store, sink, payload);
    let span = info_span!("run", run_id = %ctx.run_id, container = %ctx.container);
    run_in_context(config, &ctx).instrument(span).await
}

async fn run_in_context(config: &Config, ctx: &WorkflowContext<'_>) -> SampleResult<RunReport> {
    container::provision_container(ctx, config.emulator).await?;

    append::run(ctx, &config.append).await?;
    block::run(ctx, &config.block).await?;
    page::run(ctx, &config.page).await?;

    let listed = download::list_blobs(ctx).await?;

    if !config.cleanup {
        info!("Keeping container and local files");
        return Ok(RunReport {
            listed,
            cleaned_up: false,
        });
    }

    if config.confirm_cleanup {
        ctx.emit(WorkflowEvent::WaitingForConfirmation);
        let stdin = BufReader::new(tokio::io::stdin());
        wait_for_enter(stdin, &mut tokio::io::stderr()).await?;
    }

    container::delete_container(ctx).await?;
    let files = config.output_files().map(|p| p.as_path());
    container::remove_local_files(ctx, &files).await?;

    let elapsed = chrono::Utc::now() - ctx.started;
    info!(elapsed_ms = elapsed.num_milliseconds(), "Walkthrough complete");
    Ok(RunReport {
        listed,
        cleaned_up: true,
    })
}
