//! Retrying wrapper for object store calls.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::warn;

use stratus_core::config::object_store::RetryConfig;
use stratus_core::error::AppError;
use stratus_core::result::AppResult;
use stratus_core::traits::object_store::{ByteStream, ObjectStore};

/// Wraps an object store with per-attempt timeouts and bounded retries.
///
/// Only transient errors (timeouts, connection failures) are retried;
/// not-found and other permanent errors surface immediately. Backoff
/// doubles after each failed attempt.
#[derive(Debug, Clone)]
pub struct RetryingObjectStore {
    inner: Arc<dyn ObjectStore>,
    max_attempts: u32,
    attempt_timeout: Duration,
    base_backoff: Duration,
}

impl RetryingObjectStore {
    pub fn new(inner: Arc<dyn ObjectStore>, config: &RetryConfig) -> Self {
        Self {
            inner,
            max_attempts: config.max_attempts.max(1),
            attempt_timeout: Duration::from_secs(config.attempt_timeout_seconds),
            base_backoff: Duration::from_millis(config.base_backoff_ms),
        }
    }

    async fn run<T, F, Fut>(&self, op: &'static str, key: &str, mut call: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut attempt = 1u32;
        loop {
            let result = match tokio::time::timeout(self.attempt_timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(AppError::store_unavailable(format!(
                    "Object store {op} timed out: {key}"
                ))),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.max_attempts => {
                    let backoff = self.base_backoff * 2u32.saturating_pow(attempt - 1);
                    warn!(
                        op,
                        key,
                        attempt,
                        error = %err,
                        "Transient object store failure, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl ObjectStore for RetryingObjectStore {
    fn provider_type(&self) -> &str {
        self.inner.provider_type()
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }

    async fn put(&self, key: &str, data: Bytes) -> AppResult<()> {
        self.run("put", key, || self.inner.put(key, data.clone()))
            .await
    }

    async fn get(&self, key: &str) -> AppResult<ByteStream> {
        self.run("get", key, || self.inner.get(key)).await
    }

    async fn get_bytes(&self, key: &str) -> AppResult<Bytes> {
        self.run("get_bytes", key, || self.inner.get_bytes(key))
            .await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.run("delete", key, || self.inner.delete(key)).await
    }
}
