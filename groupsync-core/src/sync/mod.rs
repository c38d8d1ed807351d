//! Reconciliation between a node's local resources and the shared state
//!
//! [`Synchronizer`] resolves a group's policy and runs pull and push in the
//! order it dictates. It is generic over [`LocalResourceAdapter`], one
//! implementation per resource kind.

mod adapter;
mod memory_adapter;
mod report;
mod synchronizer;

pub use adapter::{AdapterError, AdapterResult, LocalResource, LocalResourceAdapter};
pub use memory_adapter::{LocalManifest, ManifestResource, MemoryResourceAdapter};
pub use report::{PullReport, PushReport, SyncReport};
pub use synchronizer::Synchronizer;
