//! Object store trait for pluggable blob storage backends.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::result::AppResult;

/// A byte stream type used for reading object contents.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Trait for blob storage backends.
///
/// Objects are addressed by opaque string keys; the bucket or namespace is
/// fixed at provider construction time and never supplied per request.
/// Implementations exist for S3-compatible stores, the local filesystem,
/// and an in-memory map. The [`ObjectStore`] trait is defined here in
/// `stratus-core` and implemented in `stratus-storage`.
#[async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "s3").
    fn provider_type(&self) -> &str;

    /// Check whether the provider is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Store an object under the given key, replacing any existing content.
    async fn put(&self, key: &str, data: Bytes) -> AppResult<()>;

    /// Read an object and return its byte stream.
    ///
    /// Returns a not-found error when no object exists under the key.
    async fn get(&self, key: &str) -> AppResult<ByteStream>;

    /// Read an object into memory as a complete byte buffer.
    async fn get_bytes(&self, key: &str) -> AppResult<Bytes>;

    /// Delete the object under the given key. Deleting an absent key
    /// succeeds, so the call is safe to repeat.
    async fn delete(&self, key: &str) -> AppResult<()>;
}
