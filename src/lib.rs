//! # Stratus
//!
//! Multi-tenant file revision and quota engine. Files live in two
//! places at once: their metadata and revision history in a relational
//! store, their content in an object store. This facade wires the
//! configured providers together and hands back the
//! [`StorageCoordinator`], which is the public surface of the engine.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use stratus_core::config::logging::LoggingConfig;
use stratus_core::config::object_store::ObjectStoreConfig;
use stratus_core::config::DatabaseConfig;
use stratus_core::error::AppError;
use stratus_core::result::AppResult;
use stratus_core::traits::object_store::ObjectStore;
use stratus_database::store::MetadataStore;
use stratus_database::{DatabasePool, MemoryMetadataStore, PostgresMetadataStore, migration};
use stratus_storage::{LocalObjectStore, MemoryObjectStore, RetryingObjectStore};

pub use stratus_core::config::AppConfig;
pub use stratus_core::error::ErrorKind;
pub use stratus_service::{
    Caller, FileDownload, StorageCoordinator, UploadRequest, UploadedRevision,
};

/// Initialize tracing from configuration. Call once at process startup.
///
/// `RUST_LOG` takes precedence over the configured level when set.
pub fn init_tracing(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Build the engine from configuration: connect the metadata store,
/// run migrations where applicable, construct the object store behind
/// its retry wrapper, and assemble the coordinator.
pub async fn build_coordinator(config: &AppConfig) -> AppResult<StorageCoordinator> {
    let store = build_metadata_store(&config.database).await?;
    let objects = build_object_store(&config.object_store).await?;
    Ok(StorageCoordinator::new(store, objects, config.engine.clone()))
}

async fn build_metadata_store(config: &DatabaseConfig) -> AppResult<Arc<dyn MetadataStore>> {
    match config.provider.as_str() {
        "postgres" => {
            let pool = DatabasePool::connect(config).await?;
            migration::run_migrations(pool.pool()).await?;
            Ok(Arc::new(PostgresMetadataStore::new(pool.pool().clone())))
        }
        "memory" => Ok(Arc::new(MemoryMetadataStore::new())),
        other => Err(AppError::configuration(format!(
            "Unknown database provider '{other}'"
        ))),
    }
}

async fn build_object_store(config: &ObjectStoreConfig) -> AppResult<Arc<dyn ObjectStore>> {
    let inner: Arc<dyn ObjectStore> = match config.provider.as_str() {
        "local" => Arc::new(LocalObjectStore::new(&config.local.root_path).await?),
        "memory" => Arc::new(MemoryObjectStore::new()),
        #[cfg(feature = "s3")]
        "s3" => Arc::new(stratus_storage::S3ObjectStore::new(&config.s3).await?),
        #[cfg(not(feature = "s3"))]
        "s3" => {
            return Err(AppError::configuration(
                "Object store provider 's3' requires building with the 's3' feature",
            ));
        }
        other => {
            return Err(AppError::configuration(format!(
                "Unknown object store provider '{other}'"
            )));
        }
    };
    Ok(Arc::new(RetryingObjectStore::new(inner, &config.retry)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_config() -> AppConfig {
        AppConfig {
            database: DatabaseConfig {
                provider: "memory".to_string(),
                ..Default::default()
            },
            object_store: ObjectStoreConfig {
                provider: "memory".to_string(),
                ..Default::default()
            },
            engine: Default::default(),
            logging: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_build_coordinator_with_memory_providers() {
        let config = memory_config();
        assert!(build_coordinator(&config).await.is_ok());
    }

    #[tokio::test]
    async fn test_build_coordinator_rejects_unknown_providers() {
        let mut config = memory_config();
        config.database.provider = "oracle".to_string();
        let err = build_coordinator(&config).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);

        let mut config = memory_config();
        config.object_store.provider = "ftp".to_string();
        let err = build_coordinator(&config).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}
