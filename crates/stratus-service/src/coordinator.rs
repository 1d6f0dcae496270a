//! Dual-store orchestration.
//!
//! [`StorageCoordinator`] is the only component that writes to both the
//! metadata store and the object store. Every mutating flow keeps the
//! same ordering: blobs are written before metadata commits, so a
//! committed revision always references an existing blob. The reverse
//! gap (a blob written whose metadata commit then fails) leaves an
//! orphan that no record references; reclaiming those is an operator
//! concern, not handled here.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use stratus_core::config::engine::EngineConfig;
use stratus_core::error::{AppError, ErrorKind};
use stratus_core::result::AppResult;
use stratus_core::traits::object_store::ObjectStore;
use stratus_core::types::{FileId, RevisionId, UserId};
use stratus_database::store::{MetadataStore, MetadataTxn};
use stratus_entity::audit::{LogKind, NewLogEntry};
use stratus_entity::file::{File, FileRevision, FileWithRevisions, ObjectKey};
use stratus_entity::storage::UserQuota;
use stratus_entity::user::User;

use crate::archive::{self, ArchiveExpander, ExpandedEntry};
use crate::bundle::BundleBuilder;
use crate::context::Caller;
use crate::digest::Hasher;
use crate::ledger::RevisionLedger;
use crate::locks::UserLocks;
use crate::quota::QuotaAccountant;

/// An upload submission: one plain file, or one ZIP container whose
/// entries each become a file.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Name the file is stored under (ignored for archives, where each
    /// entry supplies its own name).
    pub file_name: String,
    /// Declared content type. ZIP container types trigger expansion.
    pub content_type: String,
    /// The full upload payload.
    pub data: Bytes,
    /// Expected checksums: exactly one for a plain upload, one per
    /// contained entry for an archive.
    pub checksums: Vec<String>,
}

/// One revision created by an upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadedRevision {
    /// The file the revision was appended to (created if new).
    pub file: File,
    /// The newly stored revision.
    pub revision: FileRevision,
}

/// A downloaded payload with its display metadata.
#[derive(Debug, Clone)]
pub struct FileDownload {
    /// Display name for the payload.
    pub file_name: String,
    /// Content type recorded for the file.
    pub content_type: String,
    /// The payload bytes.
    pub data: Bytes,
}

/// Orchestrates uploads, downloads, and deletions across the metadata
/// store and the object store, enforcing revision retention and quota.
#[derive(Debug, Clone)]
pub struct StorageCoordinator {
    store: Arc<dyn MetadataStore>,
    objects: Arc<dyn ObjectStore>,
    locks: UserLocks,
    config: EngineConfig,
}

impl StorageCoordinator {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        objects: Arc<dyn ObjectStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            objects,
            locks: UserLocks::new(),
            config,
        }
    }

    /// Store an upload as one new revision per contained entry.
    ///
    /// Archives are expanded and verified first; plain uploads are
    /// verified against their single declared checksum. Quota admission
    /// covers the total incoming bytes and happens before any write.
    /// The whole flow runs under the caller's user lock, so concurrent
    /// uploads cannot double-spend quota or reuse revision numbers.
    pub async fn upload(
        &self,
        caller: &Caller,
        request: UploadRequest,
    ) -> AppResult<Vec<UploadedRevision>> {
        let user = self.require_user(caller, LogKind::FileUploadAttempt).await?;

        let lock = self.locks.for_user(user.id);
        let _guard = lock.lock().await;

        match self.upload_locked(&user, request).await {
            Ok(outcomes) => Ok(outcomes),
            Err(err) => {
                self.audit(
                    Some(user.id),
                    failure_kind(LogKind::FileUploadAttempt, &err),
                    format!("Upload by '{}' rejected: {err}", user.username),
                )
                .await;
                Err(err)
            }
        }
    }

    async fn upload_locked(
        &self,
        user: &User,
        request: UploadRequest,
    ) -> AppResult<Vec<UploadedRevision>> {
        let entries = expand_request(&request)?;

        let incoming: i64 = entries.iter().map(|e| e.size_bytes).sum();
        let files = self.store.list_files(user.id).await?;
        QuotaAccountant::admit(&files, incoming, self.config.quota_bytes)?;

        let mut outcomes = Vec::with_capacity(entries.len());
        for entry in entries {
            let outcome = self.store_entry(user, entry).await?;
            self.audit(
                Some(user.id),
                LogKind::FileUpload,
                format!(
                    "User {} uploaded '{}' ({} bytes)",
                    user.username, outcome.file.name, outcome.revision.size_bytes
                ),
            )
            .await;
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Store a single verified entry: write the blob, evict on overflow,
    /// then commit the metadata changes as one transaction.
    async fn store_entry(&self, user: &User, entry: ExpandedEntry) -> AppResult<UploadedRevision> {
        let state = match self.store.find_file_by_name(user.id, &entry.name).await? {
            Some(state) => state,
            None => {
                let now = Utc::now();
                FileWithRevisions {
                    file: File {
                        id: FileId::new(),
                        owner_id: user.id,
                        name: entry.name.clone(),
                        content_type: entry.content_type.clone(),
                        created_at: now,
                        modified_at: now,
                    },
                    revisions: Vec::new(),
                }
            }
        };

        let revision = RevisionLedger::next_revision(&state, &user.username, entry.size_bytes)?;
        let victim = RevisionLedger::evict_if_overflow(&state, self.config.max_revisions);

        self.objects.put(&revision.object_key, entry.data).await?;

        if let Some(victim) = &victim {
            self.objects.delete(&victim.object_key).await?;
        }

        let mut file = state.file;
        file.modified_at = revision.created_at;

        let mut txn = MetadataTxn::new();
        txn.upsert_file(file.clone());
        if let Some(victim) = &victim {
            txn.delete_revision(victim.id);
        }
        txn.insert_revision(revision.clone());
        self.store.commit(txn).await?;

        info!(
            user = %user.username,
            file = %file.name,
            key = %revision.object_key,
            size_bytes = revision.size_bytes,
            evicted = victim.is_some(),
            "Stored revision"
        );

        Ok(UploadedRevision { file, revision })
    }

    /// The caller's files with their revision histories.
    pub async fn list_files(&self, caller: &Caller) -> AppResult<Vec<FileWithRevisions>> {
        let user = self.require_user(caller, LogKind::Failure).await?;
        let files = self.store.list_files(user.id).await?;
        self.audit(
            Some(user.id),
            LogKind::ViewListOfFiles,
            format!("User {} listed {} files", user.username, files.len()),
        )
        .await;
        Ok(files)
    }

    /// Download the most recent revision of a file.
    pub async fn download_latest(&self, caller: &Caller, file_id: FileId) -> AppResult<FileDownload> {
        let user = self
            .require_user(caller, LogKind::FileDownloadAttempt)
            .await?;

        match self.download_latest_inner(&user, file_id).await {
            Ok(download) => {
                self.audit(
                    Some(user.id),
                    LogKind::FileDownload,
                    format!("User {} downloaded '{}'", user.username, download.file_name),
                )
                .await;
                Ok(download)
            }
            Err(err) => {
                self.audit(
                    Some(user.id),
                    failure_kind(LogKind::FileDownloadAttempt, &err),
                    format!("Download of file {file_id} failed: {err}"),
                )
                .await;
                Err(err)
            }
        }
    }

    async fn download_latest_inner(
        &self,
        user: &User,
        file_id: FileId,
    ) -> AppResult<FileDownload> {
        let state = self
            .store
            .find_file(user.id, file_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("File {file_id} not found")))?;
        let revision = state
            .latest_revision()
            .ok_or_else(|| {
                AppError::not_found(format!("File '{}' has no revisions", state.file.name))
            })?;

        let data = self.fetch_blob(user, revision, &state.file.name).await?;
        Ok(FileDownload {
            file_name: state.file.name.clone(),
            content_type: state.file.content_type.clone(),
            data,
        })
    }

    /// Download one specific revision of a file.
    ///
    /// The returned name carries the revision number as a suffix so
    /// several revisions of one file stay distinguishable side by side.
    pub async fn download_revision(
        &self,
        caller: &Caller,
        revision_id: RevisionId,
    ) -> AppResult<FileDownload> {
        let user = self
            .require_user(caller, LogKind::FileDownloadAttempt)
            .await?;

        match self.download_revision_inner(&user, revision_id).await {
            Ok(download) => {
                self.audit(
                    Some(user.id),
                    LogKind::FileDownload,
                    format!("User {} downloaded '{}'", user.username, download.file_name),
                )
                .await;
                Ok(download)
            }
            Err(err) => {
                self.audit(
                    Some(user.id),
                    failure_kind(LogKind::FileDownloadAttempt, &err),
                    format!("Download of revision {revision_id} failed: {err}"),
                )
                .await;
                Err(err)
            }
        }
    }

    async fn download_revision_inner(
        &self,
        user: &User,
        revision_id: RevisionId,
    ) -> AppResult<FileDownload> {
        let (file, revision) = self
            .store
            .find_revision(user.id, revision_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Revision {revision_id} not found")))?;

        let number = revision.revision_number()?;
        let data = self.fetch_blob(user, &revision, &file.name).await?;
        Ok(FileDownload {
            file_name: format!("{}.rev{number}", file.name),
            content_type: file.content_type.clone(),
            data,
        })
    }

    /// Bundle the latest revisions of several files into one ZIP.
    ///
    /// Every id must belong to the caller; a single foreign or unknown
    /// id fails the whole batch before any blob is fetched. Repeated
    /// ids collapse to one bundle entry.
    pub async fn download_many(&self, caller: &Caller, file_ids: &[FileId]) -> AppResult<Bytes> {
        let user = self
            .require_user(caller, LogKind::FileDownloadAttempt)
            .await?;

        let mut unique_ids = Vec::with_capacity(file_ids.len());
        for &file_id in file_ids {
            if !unique_ids.contains(&file_id) {
                unique_ids.push(file_id);
            }
        }

        match self.download_many_inner(&user, &unique_ids).await {
            Ok(bundle) => {
                self.audit(
                    Some(user.id),
                    LogKind::FileDownload,
                    format!(
                        "User {} downloaded a bundle of {} files",
                        user.username,
                        unique_ids.len()
                    ),
                )
                .await;
                Ok(bundle)
            }
            Err(err) => {
                self.audit(
                    Some(user.id),
                    failure_kind(LogKind::FileDownloadAttempt, &err),
                    format!("Bundle download failed: {err}"),
                )
                .await;
                Err(err)
            }
        }
    }

    async fn download_many_inner(&self, user: &User, file_ids: &[FileId]) -> AppResult<Bytes> {
        // Validate ownership of every id before fetching anything.
        let mut targets = Vec::with_capacity(file_ids.len());
        for &file_id in file_ids {
            let state = self
                .store
                .find_file(user.id, file_id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("File {file_id} not found")))?;
            let revision = state.latest_revision().cloned().ok_or_else(|| {
                AppError::not_found(format!("File '{}' has no revisions", state.file.name))
            })?;
            targets.push((state.file.name.clone(), revision));
        }

        let mut entries = Vec::with_capacity(targets.len());
        for (name, revision) in targets {
            let data = self.fetch_blob(user, &revision, &name).await?;
            entries.push((name, data));
        }

        BundleBuilder::build(entries)
    }

    /// Delete a file: every revision's blob, then the metadata.
    ///
    /// A mid-loop blob-delete failure commits the removal of exactly the
    /// revision records whose blobs are already gone, keeps the file and
    /// surviving revisions, and surfaces the error.
    pub async fn delete_file(&self, caller: &Caller, file_id: FileId) -> AppResult<()> {
        let user = self.require_user(caller, LogKind::FileDeleteAttempt).await?;

        let lock = self.locks.for_user(user.id);
        let _guard = lock.lock().await;

        match self.delete_file_locked(&user, file_id).await {
            Ok(name) => {
                self.audit(
                    Some(user.id),
                    LogKind::FileDelete,
                    format!("User {} deleted '{name}'", user.username),
                )
                .await;
                Ok(())
            }
            Err(err) => {
                self.audit(
                    Some(user.id),
                    failure_kind(LogKind::FileDeleteAttempt, &err),
                    format!("Deletion of file {file_id} failed: {err}"),
                )
                .await;
                Err(err)
            }
        }
    }

    async fn delete_file_locked(&self, user: &User, file_id: FileId) -> AppResult<String> {
        let state = self
            .store
            .find_file(user.id, file_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("File {file_id} not found")))?;

        let mut removed = MetadataTxn::new();
        for revision in &state.revisions {
            if let Err(err) = self.objects.delete(&revision.object_key).await {
                warn!(
                    key = %revision.object_key,
                    error = %err,
                    "Blob delete failed, aborting file deletion"
                );
                // Keep metadata in step with the blobs that are already
                // gone; the file and surviving revisions stay.
                if !removed.is_empty() {
                    self.store.commit(removed).await?;
                }
                return Err(err);
            }
            removed.delete_revision(revision.id);
        }

        let mut txn = removed;
        txn.delete_file(state.file.id);
        self.store.commit(txn).await?;

        info!(
            user = %user.username,
            file = %state.file.name,
            revisions = state.revisions.len(),
            "Deleted file"
        );
        Ok(state.file.name)
    }

    /// Delete a single revision; the file record remains, even when it
    /// is left with no revisions.
    pub async fn delete_revision(&self, caller: &Caller, revision_id: RevisionId) -> AppResult<()> {
        let user = self.require_user(caller, LogKind::FileDeleteAttempt).await?;

        let lock = self.locks.for_user(user.id);
        let _guard = lock.lock().await;

        match self.delete_revision_locked(&user, revision_id).await {
            Ok(key) => {
                self.audit(
                    Some(user.id),
                    LogKind::FileDelete,
                    format!("User {} deleted revision {key}", user.username),
                )
                .await;
                Ok(())
            }
            Err(err) => {
                self.audit(
                    Some(user.id),
                    failure_kind(LogKind::FileDeleteAttempt, &err),
                    format!("Deletion of revision {revision_id} failed: {err}"),
                )
                .await;
                Err(err)
            }
        }
    }

    async fn delete_revision_locked(
        &self,
        user: &User,
        revision_id: RevisionId,
    ) -> AppResult<String> {
        let (file, revision) = self
            .store
            .find_revision(user.id, revision_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Revision {revision_id} not found")))?;

        self.objects.delete(&revision.object_key).await?;

        let mut txn = MetadataTxn::new();
        txn.delete_revision(revision.id);
        self.store.commit(txn).await?;

        info!(
            user = %user.username,
            file = %file.name,
            key = %revision.object_key,
            "Deleted revision"
        );
        Ok(revision.object_key)
    }

    /// The caller's quota report, recomputed from current state.
    pub async fn quota(&self, caller: &Caller) -> AppResult<UserQuota> {
        let user = self.require_user(caller, LogKind::Failure).await?;
        let files = self.store.list_files(user.id).await?;
        Ok(QuotaAccountant::quota(&files, self.config.quota_bytes))
    }

    /// Resolve the caller to a stored user; unknown callers are audited
    /// and reported as not found.
    async fn require_user(&self, caller: &Caller, attempt: LogKind) -> AppResult<User> {
        match self.store.find_user_by_username(&caller.username).await? {
            Some(user) => Ok(user),
            None => {
                self.audit(
                    None,
                    attempt,
                    format!("Request from unknown user '{}'", caller.username),
                )
                .await;
                Err(AppError::not_found(format!(
                    "User '{}' not found",
                    caller.username
                )))
            }
        }
    }

    /// Fetch a revision's blob. Metadata pointing at a missing blob is
    /// audited as an inconsistency and reported to the caller as a plain
    /// not-found.
    async fn fetch_blob(
        &self,
        user: &User,
        revision: &FileRevision,
        display_name: &str,
    ) -> AppResult<Bytes> {
        match self.objects.get_bytes(&revision.object_key).await {
            Ok(data) => Ok(data),
            Err(err) if err.kind == ErrorKind::NotFound => {
                warn!(
                    key = %revision.object_key,
                    "Revision record references a missing blob"
                );
                self.audit(
                    Some(user.id),
                    LogKind::Failure,
                    format!(
                        "Blob missing for revision key {} of '{display_name}'",
                        revision.object_key
                    ),
                )
                .await;
                Err(AppError::not_found(format!(
                    "Content for '{display_name}' is unavailable"
                )))
            }
            Err(err) => Err(err),
        }
    }

    /// Append an audit record. Audit failures are logged and never mask
    /// the operation's own outcome.
    async fn audit(&self, user_id: Option<UserId>, kind: LogKind, message: String) {
        let entry = NewLogEntry {
            user_id,
            kind,
            message,
        };
        if let Err(err) = self.store.append_log(entry).await {
            warn!(error = %err, "Failed to append audit log entry");
        }
    }
}

/// Turn an upload request into verified entries.
///
/// ZIP containers expand to one entry per contained file; anything else
/// is a single entry checked against exactly one declared checksum.
/// Entry names are validated before quota admission so an invalid name
/// fails the whole request before any write.
fn expand_request(request: &UploadRequest) -> AppResult<Vec<ExpandedEntry>> {
    let entries = if archive::is_archive(&request.content_type) {
        ArchiveExpander::expand(request.data.clone(), &request.checksums)?
    } else {
        if request.data.is_empty() {
            return Err(AppError::empty_entry("Uploaded file is empty"));
        }
        let [checksum] = request.checksums.as_slice() else {
            return Err(AppError::archive_mismatch(format!(
                "Expected exactly one checksum for a plain upload, got {}",
                request.checksums.len()
            )));
        };
        if checksum.trim().is_empty() {
            return Err(AppError::archive_mismatch(
                "Upload declared a blank checksum",
            ));
        }
        Hasher::verify(&request.data, checksum)?;
        vec![ExpandedEntry {
            name: request.file_name.clone(),
            content_type: request.content_type.clone(),
            size_bytes: request.data.len() as i64,
            data: request.data.clone(),
        }]
    };

    for entry in &entries {
        ObjectKey::validate_component(&entry.name)?;
    }
    Ok(entries)
}

/// Audit kind for a failed operation: caller-correctable rejections keep
/// the operation's attempt kind, infrastructure errors are failures.
fn failure_kind(attempt: LogKind, err: &AppError) -> LogKind {
    match err.kind {
        ErrorKind::NotFound
        | ErrorKind::Validation
        | ErrorKind::QuotaExceeded
        | ErrorKind::ChecksumMismatch
        | ErrorKind::ArchiveMismatch
        | ErrorKind::EmptyEntry
        | ErrorKind::Conflict => attempt,
        _ => LogKind::Failure,
    }
}
