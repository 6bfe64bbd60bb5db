//! Database migration runner.

use sqlx::PgPool;
use tracing::info;

use notihub_core::error::{AppError, ErrorKind};

/// Apply all pending migrations from the workspace `migrations/` directory.
///
/// Runs at startup before the broker is connected, so a schema failure
/// stops the process before any envelope can be consumed against a stale
/// schema.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, format!("Migration failed: {e}"), e)
        })?;

    info!("Database migrations applied");
    Ok(())
}
