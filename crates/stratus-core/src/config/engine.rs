//! Revision and quota engine configuration.

use serde::{Deserialize, Serialize};

/// Settings governing revision retention and per-user storage quotas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of revisions retained per file.
    #[serde(default = "default_max_revisions")]
    pub max_revisions: u32,
    /// Per-user storage quota in bytes (default 2 GiB).
    #[serde(default = "default_quota_bytes")]
    pub quota_bytes: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_revisions: default_max_revisions(),
            quota_bytes: default_quota_bytes(),
        }
    }
}

fn default_max_revisions() -> u32 {
    5
}

fn default_quota_bytes() -> i64 {
    2_147_483_648 // 2 GiB
}
