//! Schema migration runner.

use sqlx::PgPool;
use tracing::info;

use stratus_core::error::{AppError, ErrorKind};

/// Apply any migrations from `migrations/` that the database has not
/// seen yet. Runs at startup, before the store takes traffic.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    let migrator = sqlx::migrate!("../../migrations");
    migrator.run(pool).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Database,
            format!("Failed to run migrations: {e}"),
            e,
        )
    })?;

    info!("Database schema is up to date");
    Ok(())
}
