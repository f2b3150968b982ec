//! Shared state handed to every workflow step.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::events::{EventSink, WorkflowEvent};
use crate::payload::PayloadSource;
use crate::storage::BlobStore;

/// Collaborators and the target container of a single run.
pub struct WorkflowContext<'a> {
    /// Unique run ID, attached to log records.
    pub run_id: String,
    /// Container all blobs of the run live in.
    pub container: String,
    /// Run start timestamp.
    pub started: DateTime<Utc>,
    pub store: &'a dyn BlobStore,
    pub sink: &'a dyn EventSink,
    pub payload: &'a dyn PayloadSource,
}

impl<'a> WorkflowContext<'a> {
    pub fn new(
        container: impl Into<String>,
        store: &'a dyn BlobStore,
        sink: &'a dyn EventSink,
        payload: &'a dyn PayloadSource,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            container: container.into(),
            started: Utc::now(),
            store,
            sink,
            payload,
        }
    }

    #[inline]
    pub fn emit(&self, event: WorkflowEvent) {
        self.sink.emit(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingSink;
    use crate::payload::FixedPayload;
    use crate::storage::MemoryBlobStore;

    #[test]
    fn test_context_forwards_events() {
        let store = MemoryBlobStore::new();
        let sink = RecordingSink::new();
        let payload = FixedPayload::new("x");
        let ctx = WorkflowContext::new("c1", &store, &sink, &payload);

        assert_eq!(ctx.container, "c1");
        assert_eq!(ctx.run_id.len(), 36);
        ctx.emit(WorkflowEvent::WaitingForConfirmation);
        assert_eq!(sink.events(), vec![WorkflowEvent::WaitingForConfirmation]);
    }
}
