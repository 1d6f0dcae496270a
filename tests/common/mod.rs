//! Shared harness for engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use bytes::Bytes;

use stratus::{Caller, StorageCoordinator, UploadRequest};
use stratus_core::config::engine::EngineConfig;
use stratus_database::MemoryMetadataStore;
use stratus_database::store::MetadataStore;
use stratus_entity::user::{CreateUser, User};
use stratus_service::digest::Hasher;
use stratus_storage::MemoryObjectStore;

/// Engine wired to in-memory stores, with both stores kept reachable
/// for inspection and failure injection.
pub struct TestEngine {
    pub coordinator: StorageCoordinator,
    pub store: Arc<MemoryMetadataStore>,
    pub objects: Arc<MemoryObjectStore>,
    pub alice: User,
}

impl TestEngine {
    pub async fn new() -> Self {
        Self::with_config(EngineConfig::default()).await
    }

    pub async fn with_config(config: EngineConfig) -> Self {
        let store = Arc::new(MemoryMetadataStore::new());
        let objects = Arc::new(MemoryObjectStore::new());

        let alice = store
            .create_user(CreateUser {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                confirmation_code: "483921".to_string(),
            })
            .await
            .expect("Failed to seed test user");

        let coordinator =
            StorageCoordinator::new(Arc::clone(&store), Arc::clone(&objects), config);

        Self {
            coordinator,
            store,
            objects,
            alice,
        }
    }

    /// Register an additional user.
    pub async fn create_user(&self, username: &str, email: &str) -> User {
        self.store
            .create_user(CreateUser {
                username: username.to_string(),
                email: email.to_string(),
                confirmation_code: "271828".to_string(),
            })
            .await
            .expect("Failed to create user")
    }

    pub fn caller(&self) -> Caller {
        Caller::new("alice")
    }
}

/// A plain (non-archive) upload request with a matching checksum.
pub fn plain_upload(name: &str, content: &[u8]) -> UploadRequest {
    let data = Bytes::copy_from_slice(content);
    UploadRequest {
        file_name: name.to_string(),
        content_type: "text/plain".to_string(),
        data: data.clone(),
        checksums: vec![Hasher::digest(&data)],
    }
}
