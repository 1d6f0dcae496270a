//! User storage quota value object.

use serde::{Deserialize, Serialize};

/// Quota usage report for a single user.
///
/// Derived from the configured limit and the current revision sizes each
/// time it is needed; never persisted or cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserQuota {
    /// Total quota in bytes.
    pub limit_bytes: i64,
    /// Bytes consumed by every retained revision of every file.
    pub used_bytes: i64,
    /// Remaining bytes, clamped at zero.
    pub free_bytes: i64,
}

impl UserQuota {
    /// Create a quota report from the limit and used values.
    pub fn new(limit_bytes: i64, used_bytes: i64) -> Self {
        Self {
            limit_bytes,
            used_bytes,
            free_bytes: (limit_bytes - used_bytes).max(0),
        }
    }

    /// Check if adding the given number of bytes would exceed the quota.
    /// Landing exactly on the limit is allowed.
    pub fn would_exceed(&self, additional_bytes: i64) -> bool {
        self.used_bytes + additional_bytes > self.limit_bytes
    }

    /// Fraction of the quota in use (0.0 - 1.0, unclamped).
    pub fn used_ratio(&self) -> f64 {
        if self.limit_bytes == 0 {
            0.0
        } else {
            self.used_bytes as f64 / self.limit_bytes as f64
        }
    }
}
