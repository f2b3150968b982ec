//! Common test utilities.

#![allow(dead_code)]

use std::path::PathBuf;
use tempfile::TempDir;

use azure_blob_samples::models::ContainerAccess;
use azure_blob_samples::{
    AccountConfig, BlobStore, Config, FixedPayload, MemoryBlobStore, RandomPayload,
    RecordingSink, WorkflowContext,
};

/// Container used by every test.
pub const CONTAINER: &str = "c1";

/// In-memory store, recording sink and scratch directory for one test.
pub struct TestFixture {
    pub store: MemoryBlobStore,
    pub sink: RecordingSink,
    pub payload: RandomPayload,
    pub dir: TempDir,
}

impl TestFixture {
    /// Creates a fixture whose store already holds [`CONTAINER`].
    pub async fn new() -> Self {
        let fixture = Self::without_container();
        fixture
            .store
            .create_container_if_not_exists(CONTAINER, ContainerAccess::Private)
            .await
            .unwrap();
        fixture
    }

    /// Creates a fixture with an empty store.
    pub fn without_container() -> Self {
        Self::with_store(MemoryBlobStore::new())
    }

    /// Creates a fixture around a preconfigured store.
    pub fn with_store(store: MemoryBlobStore) -> Self {
        Self {
            store,
            sink: RecordingSink::new(),
            payload: RandomPayload::seeded(42),
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Workflow context over the fixture's collaborators.
    pub fn ctx(&self) -> WorkflowContext<'_> {
        WorkflowContext::new(CONTAINER, &self.store, &self.sink, &self.payload)
    }

    /// Path of a file inside the scratch directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Walkthrough configuration writing into the scratch directory, without prompting.
    pub fn config(&self) -> Config {
        let mut config = Config::new(AccountConfig::emulator(), self.dir.path());
        config.container = CONTAINER.to_string();
        config.confirm_cleanup = false;
        config
    }
}

/// Payload source that always yields the same byte.
pub fn constant_payload(byte: u8) -> FixedPayload {
    FixedPayload::new(vec![byte])
}
