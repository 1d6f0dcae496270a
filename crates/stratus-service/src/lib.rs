//! # stratus-service
//!
//! The revision and quota engine. [`coordinator::StorageCoordinator`]
//! is the single component that writes to both the metadata store and
//! the object store; everything else here is pure support logic
//! (hashing, archive expansion, revision numbering, quota arithmetic,
//! bundling) or the per-user locking registry.

pub mod archive;
pub mod bundle;
pub mod context;
pub mod coordinator;
pub mod digest;
pub mod ledger;
pub mod locks;
pub mod quota;

pub use context::Caller;
pub use coordinator::{FileDownload, StorageCoordinator, UploadRequest, UploadedRevision};
