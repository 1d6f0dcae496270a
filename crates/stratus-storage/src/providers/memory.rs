//! In-memory object store.
//!
//! Holds objects in a process-local map. Exposes call counters and
//! failure injection knobs so engine tests can observe blob traffic and
//! exercise partial-failure paths without a real backend.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use futures::stream;

use stratus_core::error::AppError;
use stratus_core::result::AppResult;
use stratus_core::traits::object_store::{ByteStream, ObjectStore};

/// Object store held entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: DashMap<String, Bytes>,
    put_count: AtomicU64,
    get_count: AtomicU64,
    delete_count: AtomicU64,
    fail_next_puts: AtomicU32,
    failing_deletes: DashMap<String, ()>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Whether an object exists under the key.
    pub fn contains(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }

    /// Total `put` calls observed, including failed ones.
    pub fn put_count(&self) -> u64 {
        self.put_count.load(Ordering::SeqCst)
    }

    /// Total read calls observed (`get` and `get_bytes`).
    pub fn get_count(&self) -> u64 {
        self.get_count.load(Ordering::SeqCst)
    }

    /// Total `delete` calls observed, including failed ones.
    pub fn delete_count(&self) -> u64 {
        self.delete_count.load(Ordering::SeqCst)
    }

    /// Make the next `n` put calls fail with a transient error.
    pub fn fail_next_puts(&self, n: u32) {
        self.fail_next_puts.store(n, Ordering::SeqCst);
    }

    /// Make every delete of the given key fail until cleared.
    pub fn fail_deletes_for(&self, key: &str) {
        self.failing_deletes.insert(key.to_string(), ());
    }

    /// Clear a delete failure previously injected for the key.
    pub fn clear_delete_failure(&self, key: &str) {
        self.failing_deletes.remove(key);
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn put(&self, key: &str, data: Bytes) -> AppResult<()> {
        self.put_count.fetch_add(1, Ordering::SeqCst);
        let armed = self
            .fail_next_puts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if armed {
            return Err(AppError::store_unavailable(format!(
                "Injected put failure: {key}"
            )));
        }
        self.objects.insert(key.to_string(), data);
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<ByteStream> {
        let data = self.get_bytes(key).await?;
        Ok(Box::pin(stream::once(async move { Ok(data) })))
    }

    async fn get_bytes(&self, key: &str) -> AppResult<Bytes> {
        self.get_count.fetch_add(1, Ordering::SeqCst);
        self.objects
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::not_found(format!("Object not found: {key}")))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.delete_count.fetch_add(1, Ordering::SeqCst);
        if self.failing_deletes.contains_key(key) {
            return Err(AppError::store_unavailable(format!(
                "Injected delete failure: {key}"
            )));
        }
        self.objects.remove(key);
        Ok(())
    }
}
