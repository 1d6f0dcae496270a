//! Quota arithmetic over loaded state.

use stratus_core::error::AppError;
use stratus_core::result::AppResult;
use stratus_entity::file::FileWithRevisions;
use stratus_entity::storage::UserQuota;

/// Computes storage consumption from the current revision records.
/// Consumption is recomputed on every admission rather than kept as a
/// running counter, so partial failures cannot cause drift.
pub struct QuotaAccountant;

impl QuotaAccountant {
    /// Bytes consumed by every retained revision of every file.
    pub fn consumed_bytes(files: &[FileWithRevisions]) -> i64 {
        files.iter().map(|f| f.total_size_bytes()).sum()
    }

    /// Admit `incoming_bytes` against the limit. Landing exactly on the
    /// limit is accepted; one byte past it is rejected.
    pub fn admit(
        files: &[FileWithRevisions],
        incoming_bytes: i64,
        limit_bytes: i64,
    ) -> AppResult<()> {
        let quota = Self::quota(files, limit_bytes);
        if quota.would_exceed(incoming_bytes) {
            return Err(AppError::quota_exceeded(format!(
                "Upload of {incoming_bytes} bytes exceeds the remaining quota ({} of {} bytes free)",
                quota.free_bytes, quota.limit_bytes
            )));
        }
        Ok(())
    }

    /// The quota report for the loaded state.
    pub fn quota(files: &[FileWithRevisions], limit_bytes: i64) -> UserQuota {
        UserQuota::new(limit_bytes, Self::consumed_bytes(files))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stratus_core::error::ErrorKind;
    use stratus_core::types::{FileId, RevisionId, UserId};
    use stratus_entity::file::{File, FileRevision};

    fn files_with_sizes(sizes: &[&[i64]]) -> Vec<FileWithRevisions> {
        let owner = UserId::new();
        sizes
            .iter()
            .enumerate()
            .map(|(n, revision_sizes)| {
                let file = File {
                    id: FileId::new(),
                    owner_id: owner,
                    name: format!("file-{n}.bin"),
                    content_type: "application/octet-stream".to_string(),
                    created_at: Utc::now(),
                    modified_at: Utc::now(),
                };
                let revisions = revision_sizes
                    .iter()
                    .enumerate()
                    .map(|(i, size)| FileRevision {
                        id: RevisionId::new(),
                        file_id: file.id,
                        object_key: format!("alice@file-{n}.bin@{}", i + 1),
                        size_bytes: *size,
                        created_at: Utc::now(),
                    })
                    .collect();
                FileWithRevisions { file, revisions }
            })
            .collect()
    }

    #[test]
    fn test_consumed_sums_all_revisions_of_all_files() {
        let files = files_with_sizes(&[&[10, 20], &[5], &[]]);
        assert_eq!(QuotaAccountant::consumed_bytes(&files), 35);
    }

    #[test]
    fn test_admit_boundary() {
        let files = files_with_sizes(&[&[60]]);

        assert!(QuotaAccountant::admit(&files, 40, 100).is_ok());

        let err = QuotaAccountant::admit(&files, 41, 100).unwrap_err();
        assert_eq!(err.kind, ErrorKind::QuotaExceeded);
    }

    #[test]
    fn test_quota_report() {
        let files = files_with_sizes(&[&[30]]);
        let quota = QuotaAccountant::quota(&files, 100);

        assert_eq!(quota.limit_bytes, 100);
        assert_eq!(quota.used_bytes, 30);
        assert_eq!(quota.free_bytes, 70);
    }
}
