use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, SqlErr};
use std::future::Future;

pub type DbPool = DatabaseConnection;

pub async fn create_pool(config: &DatabaseConfig) -> AppResult<DbPool> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .sqlx_logging(false);

    let pool = Database::connect(options).await?;

    Ok(pool)
}

pub async fn run_migrations(pool: &DbPool) -> AppResult<()> {
    Migrator::up(pool, None).await?;
    Ok(())
}

/// True when the store rejected a write because of a unique key (email, or the
/// (user, event) vote key). Callers turn this into a read-then-update retry.
pub fn is_unique_violation(err: &DbErr) -> bool {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return true;
    }
    // drivers that do not expose an error code
    let msg = err.to_string();
    msg.contains("duplicate key") || msg.contains("UNIQUE constraint failed")
}

/// Attempts per upsert: the first write plus one retry after losing a race.
pub const UPSERT_ATTEMPTS: u32 = 2;

/// Runs `attempt` again when it loses a unique-key race. The retry re-reads
/// the row the winner wrote and takes the update path; a second loss is
/// reported as a conflict.
pub async fn retry_on_unique_violation<T, F, Fut>(what: &str, mut attempt: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    for n in 1..=UPSERT_ATTEMPTS {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) if is_unique_violation(&e) => {
                log::warn!("Concurrent write on {what} (attempt {n}/{UPSERT_ATTEMPTS}): {e}");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(AppError::Conflict(format!(
        "{what} is being modified concurrently, please retry"
    )))
}
