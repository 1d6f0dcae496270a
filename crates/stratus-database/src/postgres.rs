//! PostgreSQL metadata store implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;

use stratus_core::error::{AppError, ErrorKind};
use stratus_core::result::AppResult;
use stratus_core::types::{FileId, LogEntryId, RevisionId, UserId};
use stratus_entity::audit::{LogEntry, NewLogEntry};
use stratus_entity::file::{File, FileRevision, FileWithRevisions};
use stratus_entity::user::{CreateUser, User};

use crate::store::{MetadataStore, MetadataTxn, TxnOp};

/// Metadata store backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PostgresMetadataStore {
    pool: PgPool,
}

impl PostgresMetadataStore {
    /// Create a new store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load a file's revisions, oldest first.
    async fn load_revisions(&self, file_id: FileId) -> AppResult<Vec<FileRevision>> {
        sqlx::query_as::<_, FileRevision>(
            "SELECT * FROM file_revisions WHERE file_id = $1 ORDER BY created_at ASC",
        )
        .bind(file_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load revisions", e))
    }
}

#[async_trait]
impl MetadataStore for PostgresMetadataStore {
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user", e))
    }

    async fn find_user_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user", e))
    }

    async fn create_user(&self, user: CreateUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, username, email, confirmation_code, email_confirmed, created_at) \
             VALUES ($1, $2, $3, $4, FALSE, NOW()) RETURNING *",
        )
        .bind(UserId::new())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.confirmation_code)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error().is_some_and(|d| d.is_unique_violation()) {
                AppError::conflict(format!("Username '{}' is already taken", user.username))
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to create user", e)
            }
        })
    }

    async fn mark_email_confirmed(&self, id: UserId) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET email_confirmed = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to confirm email", e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("User {id} not found")));
        }
        Ok(())
    }

    async fn list_files(&self, owner_id: UserId) -> AppResult<Vec<FileWithRevisions>> {
        let files = sqlx::query_as::<_, File>(
            "SELECT * FROM files WHERE owner_id = $1 ORDER BY name ASC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list files", e))?;

        let revisions = sqlx::query_as::<_, FileRevision>(
            "SELECT r.* FROM file_revisions r \
             JOIN files f ON f.id = r.file_id \
             WHERE f.owner_id = $1 ORDER BY r.created_at ASC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load revisions", e))?;

        let mut by_file: HashMap<FileId, Vec<FileRevision>> = HashMap::new();
        for revision in revisions {
            by_file.entry(revision.file_id).or_default().push(revision);
        }

        Ok(files
            .into_iter()
            .map(|file| {
                let revisions = by_file.remove(&file.id).unwrap_or_default();
                FileWithRevisions { file, revisions }
            })
            .collect())
    }

    async fn find_file(
        &self,
        owner_id: UserId,
        file_id: FileId,
    ) -> AppResult<Option<FileWithRevisions>> {
        let file = sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = $1 AND owner_id = $2")
            .bind(file_id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file", e))?;

        match file {
            Some(file) => {
                let revisions = self.load_revisions(file.id).await?;
                Ok(Some(FileWithRevisions { file, revisions }))
            }
            None => Ok(None),
        }
    }

    async fn find_file_by_name(
        &self,
        owner_id: UserId,
        name: &str,
    ) -> AppResult<Option<FileWithRevisions>> {
        let file =
            sqlx::query_as::<_, File>("SELECT * FROM files WHERE owner_id = $1 AND name = $2")
                .bind(owner_id)
                .bind(name)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to find file by name", e)
                })?;

        match file {
            Some(file) => {
                let revisions = self.load_revisions(file.id).await?;
                Ok(Some(FileWithRevisions { file, revisions }))
            }
            None => Ok(None),
        }
    }

    async fn find_revision(
        &self,
        owner_id: UserId,
        revision_id: RevisionId,
    ) -> AppResult<Option<(File, FileRevision)>> {
        let revision = sqlx::query_as::<_, FileRevision>(
            "SELECT r.* FROM file_revisions r \
             JOIN files f ON f.id = r.file_id \
             WHERE r.id = $1 AND f.owner_id = $2",
        )
        .bind(revision_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find revision", e))?;

        let Some(revision) = revision else {
            return Ok(None);
        };

        let file = sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = $1")
            .bind(revision.file_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file", e))?
            .ok_or_else(|| {
                AppError::inconsistent(format!(
                    "Revision {revision_id} references a missing file row"
                ))
            })?;

        Ok(Some((file, revision)))
    }

    async fn commit(&self, txn: MetadataTxn) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        for op in txn.into_ops() {
            match op {
                TxnOp::UpsertFile(file) => {
                    sqlx::query(
                        "INSERT INTO files (id, owner_id, name, content_type, created_at, modified_at) \
                         VALUES ($1, $2, $3, $4, $5, $6) \
                         ON CONFLICT (id) DO UPDATE SET \
                             content_type = EXCLUDED.content_type, \
                             modified_at = EXCLUDED.modified_at",
                    )
                    .bind(file.id)
                    .bind(file.owner_id)
                    .bind(&file.name)
                    .bind(&file.content_type)
                    .bind(file.created_at)
                    .bind(file.modified_at)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| {
                        AppError::with_source(ErrorKind::Database, "Failed to upsert file", e)
                    })?;
                }
                TxnOp::InsertRevision(revision) => {
                    sqlx::query(
                        "INSERT INTO file_revisions (id, file_id, object_key, size_bytes, created_at) \
                         VALUES ($1, $2, $3, $4, $5)",
                    )
                    .bind(revision.id)
                    .bind(revision.file_id)
                    .bind(&revision.object_key)
                    .bind(revision.size_bytes)
                    .bind(revision.created_at)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| {
                        AppError::with_source(ErrorKind::Database, "Failed to insert revision", e)
                    })?;
                }
                TxnOp::DeleteRevision(id) => {
                    sqlx::query("DELETE FROM file_revisions WHERE id = $1")
                        .bind(id)
                        .execute(&mut *tx)
                        .await
                        .map_err(|e| {
                            AppError::with_source(
                                ErrorKind::Database,
                                "Failed to delete revision",
                                e,
                            )
                        })?;
                }
                TxnOp::DeleteFile(id) => {
                    sqlx::query("DELETE FROM files WHERE id = $1")
                        .bind(id)
                        .execute(&mut *tx)
                        .await
                        .map_err(|e| {
                            AppError::with_source(ErrorKind::Database, "Failed to delete file", e)
                        })?;
                }
            }
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit transaction", e)
        })
    }

    async fn append_log(&self, entry: NewLogEntry) -> AppResult<LogEntry> {
        sqlx::query_as::<_, LogEntry>(
            "INSERT INTO logs (id, user_id, kind, message, created_at) \
             VALUES ($1, $2, $3, $4, NOW()) RETURNING *",
        )
        .bind(LogEntryId::new())
        .bind(entry.user_id)
        .bind(entry.kind)
        .bind(&entry.message)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to append log entry", e))
    }
}
