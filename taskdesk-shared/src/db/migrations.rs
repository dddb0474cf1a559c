/// Schema migrations
///
/// SQL files live in `taskdesk-shared/migrations/` and are embedded at
/// compile time by `sqlx::migrate!`. Applied versions are tracked in
/// `_sqlx_migrations`, so running this on every start-up is safe.

use sqlx::postgres::PgPool;
use tracing::{error, info};

/// Applies every pending migration
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    let migrator = sqlx::migrate!("./migrations");
    info!(
        available = migrator.iter().count(),
        "Running database migrations"
    );

    migrator.run(pool).await.map_err(|e| {
        error!(error = %e, "Migration failed");
        e
    })?;

    info!("Database schema is up to date");
    Ok(())
}
