//! Azure blob samples: append, block and page blob walkthroughs.
//!
//! The walkthrough provisions a container, runs one workflow per blob type,
//! downloads each blob to a local file and finally cleans up. All storage
//! access goes through the [`BlobStore`] trait, with an Azure SDK backend for
//! real accounts and the local emulator, and an in-memory backend for tests.
//!
//! # Example
//!
//! ```no_run
//! use azure_blob_samples::{run, Config, AccountConfig, MemoryBlobStore, RandomPayload, TracingSink};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let config = Config::new(AccountConfig::emulator(), ".");
//!     let store = MemoryBlobStore::new();
//!     run(&config, &store, &TracingSink, &RandomPayload::new()).await.unwrap();
//! }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod models;
pub mod payload;
pub mod storage;
pub mod workflow;

// Re-exports for convenience
pub use config::{AccountConfig, Args, Config, DEFAULT_ACCOUNT, DEFAULT_ACCOUNT_KEY, DEFAULT_BLOB_PORT};
pub use context::WorkflowContext;
pub use error::{ErrorCode, SampleError, SampleResult, StorageError, StorageResult};
pub use events::{EventSink, RecordingSink, SilentSink, TracingSink, WorkflowEvent};
pub use payload::{FixedPayload, PayloadSource, RandomPayload};
pub use storage::{AzureBlobStore, BlobStore, MemoryBlobStore, TimeoutStore};
pub use workflow::{run, RunReport};
