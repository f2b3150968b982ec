//! Workflow narration.
//!
//! Workflows report progress as [`WorkflowEvent`]s through an [`EventSink`].
//! The binary logs them with `tracing`; tests record or drop them.

use parking_lot::Mutex;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::models::{BlobItem, BlockList, PageRange, PAGE_SIZE};

/// A step of the walkthrough worth telling the operator about.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    ContainerReady {
        container: String,
        created: bool,
    },
    EmulatorHint {
        container: String,
    },
    BlobCreated {
        container: String,
        blob: String,
        kind: &'static str,
    },
    BlockAppended {
        blob: String,
        bytes: usize,
    },
    BlockStaged {
        blob: String,
        block_id: String,
        bytes: usize,
    },
    BlockListed {
        blob: String,
        committed: Vec<String>,
        uncommitted: Vec<String>,
    },
    BlocksCommitted {
        blob: String,
        blocks: usize,
    },
    PagesWritten {
        blob: String,
        range: PageRange,
    },
    PageRangesListed {
        blob: String,
        ranges: Vec<PageRange>,
    },
    BlobListed {
        container: String,
        item: BlobItem,
    },
    BlobDownloaded {
        blob: String,
        path: PathBuf,
        bytes: usize,
    },
    WaitingForConfirmation,
    ContainerDeleted {
        container: String,
    },
    FileRemoved {
        path: PathBuf,
    },
}

impl WorkflowEvent {
    pub(crate) fn block_listed(blob: &str, list: &BlockList) -> Self {
        WorkflowEvent::BlockListed {
            blob: blob.to_string(),
            committed: list.committed_ids().into_iter().map(String::from).collect(),
            uncommitted: list.uncommitted_ids().into_iter().map(String::from).collect(),
        }
    }
}

/// Receives workflow events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: WorkflowEvent);
}

/// Logs every event as a structured `tracing` record.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: WorkflowEvent) {
        match event {
            WorkflowEvent::ContainerReady { container, created } => {
                if created {
                    info!(container = %container, "Created container");
                } else {
                    info!(container = %container, "Container already exists");
                }
            }
            WorkflowEvent::EmulatorHint { container } => {
                warn!(
                    container = %container,
                    "Make sure the storage emulator is running and reachable, then run the sample again"
                );
            }
            WorkflowEvent::BlobCreated {
                container,
                blob,
                kind,
            } => {
                info!(container = %container, blob = %blob, kind, "Created blob");
            }
            WorkflowEvent::BlockAppended { blob, bytes } => {
                info!(blob = %blob, bytes, "Appended block");
            }
            WorkflowEvent::BlockStaged {
                blob,
                block_id,
                bytes,
            } => {
                info!(blob = %blob, block_id = %block_id, bytes, "Uploaded block");
            }
            WorkflowEvent::BlockListed {
                blob,
                committed,
                uncommitted,
            } => {
                info!(
                    blob = %blob,
                    committed = ?committed,
                    uncommitted = ?uncommitted,
                    "Block list"
                );
            }
            WorkflowEvent::BlocksCommitted { blob, blocks } => {
                info!(blob = %blob, blocks, "Committed block list");
            }
            WorkflowEvent::PagesWritten { blob, range } => {
                info!(
                    blob = %blob,
                    bytes = range.length(),
                    "Wrote pages {} to {}",
                    range.first_page(),
                    range.last_page()
                );
            }
            WorkflowEvent::PageRangesListed { blob, ranges } => {
                for range in &ranges {
                    info!(
                        blob = %blob,
                        start = range.start,
                        end = range.end,
                        "Valid data from page {} to page {}",
                        range.start / PAGE_SIZE,
                        range.end / PAGE_SIZE
                    );
                }
            }
            WorkflowEvent::BlobListed { container, item } => {
                info!(
                    container = %container,
                    blob = %item.name,
                    kind = item.blob_type.as_str(),
                    bytes = item.content_length,
                    "Listed blob"
                );
            }
            WorkflowEvent::BlobDownloaded { blob, path, bytes } => {
                info!(blob = %blob, path = %path.display(), bytes, "Downloaded blob");
            }
            // The prompt itself is written straight to stderr by the workflow
            WorkflowEvent::WaitingForConfirmation => {
                debug!("Waiting for confirmation before cleanup");
            }
            WorkflowEvent::ContainerDeleted { container } => {
                info!(container = %container, "Deleted container");
            }
            WorkflowEvent::FileRemoved { path } => {
                info!(path = %path.display(), "Removed local file");
            }
        }
    }
}

/// Keeps events in memory for later inspection.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<WorkflowEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything recorded so far.
    pub fn events(&self) -> Vec<WorkflowEvent> {
        self.events.lock().clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: WorkflowEvent) {
        self.events.lock().push(event);
    }
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSink;

impl EventSink for SilentSink {
    fn emit(&self, _event: WorkflowEvent) {}
}
