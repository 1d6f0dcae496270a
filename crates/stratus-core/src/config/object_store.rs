//! Object store provider configuration.

use serde::{Deserialize, Serialize};

/// Top-level object store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStoreConfig {
    /// Object store provider to use: `"local"`, `"s3"`, or `"memory"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Local filesystem provider configuration.
    #[serde(default)]
    pub local: LocalStoreConfig,
    /// S3-compatible provider configuration.
    #[serde(default)]
    pub s3: S3StoreConfig,
    /// Retry policy for object store calls.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            local: LocalStoreConfig::default(),
            s3: S3StoreConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

/// Local filesystem object store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalStoreConfig {
    /// Root path under which objects are stored.
    #[serde(default = "default_local_root")]
    pub root_path: String,
}

impl Default for LocalStoreConfig {
    fn default() -> Self {
        Self {
            root_path: default_local_root(),
        }
    }
}

/// S3-compatible object store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3StoreConfig {
    /// S3 endpoint URL (for non-AWS services like MinIO).
    #[serde(default)]
    pub endpoint: String,
    /// AWS region.
    #[serde(default = "default_region")]
    pub region: String,
    /// S3 bucket name.
    #[serde(default)]
    pub bucket: String,
    /// Key prefix (namespace) applied to every object key. May be empty.
    #[serde(default)]
    pub key_prefix: String,
    /// Access key ID. When empty, the ambient credential chain is used.
    #[serde(default)]
    pub access_key: String,
    /// Secret access key.
    #[serde(default)]
    pub secret_key: String,
    /// Use path-style addressing (required by most S3-compatible servers).
    #[serde(default)]
    pub force_path_style: bool,
}

impl Default for S3StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            region: default_region(),
            bucket: String::new(),
            key_prefix: String::new(),
            access_key: String::new(),
            secret_key: String::new(),
            force_path_style: false,
        }
    }
}

/// Retry policy for transient object store failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per call (including the first).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Timeout applied to each individual attempt, in seconds.
    #[serde(default = "default_attempt_timeout")]
    pub attempt_timeout_seconds: u64,
    /// Base backoff between attempts, in milliseconds. Doubled per attempt.
    #[serde(default = "default_base_backoff")]
    pub base_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            attempt_timeout_seconds: default_attempt_timeout(),
            base_backoff_ms: default_base_backoff(),
        }
    }
}

fn default_provider() -> String {
    "local".to_string()
}

fn default_local_root() -> String {
    "./data/objects".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_attempt_timeout() -> u64 {
    30
}

fn default_base_backoff() -> u64 {
    100
}
