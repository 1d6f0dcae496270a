//! # stratus-storage
//!
//! Object store implementations for Stratus. Supports the local
//! filesystem, S3-compatible object stores, and an in-process memory
//! store, plus a retrying wrapper for transient remote failures.

pub mod providers;
pub mod retry;

pub use providers::local::LocalObjectStore;
pub use providers::memory::MemoryObjectStore;
#[cfg(feature = "s3")]
pub use providers::s3::S3ObjectStore;
pub use retry::RetryingObjectStore;
