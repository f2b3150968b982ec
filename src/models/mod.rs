//! Data models for the blob walkthrough.

mod blob;
mod block;
mod container;
mod page;

pub use blob::*;
pub use block::*;
pub use container::*;
pub use page::*;
