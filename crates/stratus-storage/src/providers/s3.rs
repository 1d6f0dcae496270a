//! S3-compatible object store.

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::SdkError;
use bytes::Bytes;
use futures::stream;
use tracing::debug;

use stratus_core::config::object_store::S3StoreConfig;
use stratus_core::error::{AppError, ErrorKind};
use stratus_core::result::AppResult;
use stratus_core::traits::object_store::{ByteStream, ObjectStore};

/// Object store backed by an S3-compatible service.
///
/// The bucket and key prefix are fixed at construction; callers never
/// choose them per request.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    key_prefix: String,
}

impl S3ObjectStore {
    /// Create a new S3 object store from configuration.
    ///
    /// With explicit access keys the client uses static credentials;
    /// otherwise it falls back to the ambient AWS credential chain
    /// (environment, profile, instance metadata).
    pub async fn new(config: &S3StoreConfig) -> AppResult<Self> {
        if config.bucket.trim().is_empty() {
            return Err(AppError::configuration(
                "S3 object store requires a bucket name",
            ));
        }

        let client = if config.access_key.is_empty() {
            let mut loader = aws_config::defaults(BehaviorVersion::latest())
                .region(Region::new(config.region.clone()));
            if !config.endpoint.is_empty() {
                loader = loader.endpoint_url(config.endpoint.clone());
            }
            let sdk_config = loader.load().await;
            let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
                .force_path_style(config.force_path_style)
                .build();
            aws_sdk_s3::Client::from_conf(s3_config)
        } else {
            let creds = Credentials::new(
                config.access_key.clone(),
                config.secret_key.clone(),
                None,
                None,
                "stratus-config",
            );
            let mut builder = aws_sdk_s3::config::Builder::new()
                .behavior_version(BehaviorVersion::latest())
                .region(Region::new(config.region.clone()))
                .credentials_provider(creds)
                .force_path_style(config.force_path_style);
            if !config.endpoint.is_empty() {
                builder = builder.endpoint_url(config.endpoint.clone());
            }
            aws_sdk_s3::Client::from_conf(builder.build())
        };

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
            key_prefix: config.key_prefix.trim_matches('/').to_string(),
        })
    }

    /// Apply the configured key prefix, if any.
    fn object_key(&self, key: &str) -> String {
        if self.key_prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}/{key}", self.key_prefix)
        }
    }
}

/// Classify an SDK error: connection-level failures are transient, the
/// rest are permanent storage errors.
fn error_kind_for<E, R>(err: &SdkError<E, R>) -> ErrorKind {
    match err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => ErrorKind::StoreUnavailable,
        _ => ErrorKind::Storage,
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn provider_type(&self) -> &str {
        "s3"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(self
            .client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok())
    }

    async fn put(&self, key: &str, data: Bytes) -> AppResult<()> {
        let bytes = data.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(self.object_key(key))
            .body(data.into())
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(
                    error_kind_for(&e),
                    format!("Failed to write object: {key}"),
                    e,
                )
            })?;

        debug!(key, bytes, "Wrote object");
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<ByteStream> {
        // Buffered: the engine verifies checksums over full payloads, so
        // objects are small enough to hold in memory.
        let data = self.get_bytes(key).await?;
        Ok(Box::pin(stream::once(async move { Ok(data) })))
    }

    async fn get_bytes(&self, key: &str) -> AppResult<Bytes> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.object_key(key))
            .send()
            .await
            .map_err(|e| match &e {
                SdkError::ServiceError(service_err) if service_err.err().is_no_such_key() => {
                    AppError::not_found(format!("Object not found: {key}"))
                }
                _ => AppError::with_source(
                    error_kind_for(&e),
                    format!("Failed to read object: {key}"),
                    e,
                ),
            })?;

        let data = resp.body.collect().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to read object body: {key}"),
                e,
            )
        })?;
        Ok(data.into_bytes())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(self.object_key(key))
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(
                    error_kind_for(&e),
                    format!("Failed to delete object: {key}"),
                    e,
                )
            })?;
        Ok(())
    }
}
