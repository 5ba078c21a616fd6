use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use crate::config::DatabaseConfig;
use crate::errors::AppError;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Connect to Postgres, retrying while the database is still coming up.
pub async fn init_pool(config: &DatabaseConfig) -> Result<PgPool, AppError> {
    let attempts = config.connect_attempts.max(1);
    let mut attempt = 1;
    loop {
        let result = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await;
        match result {
            Ok(pool) => {
                log::info!("Connected to database (pool size {})", config.max_connections);
                return Ok(pool);
            }
            Err(e) if attempt < attempts => {
                log::warn!(
                    "Database connection attempt {}/{} failed: {}; retrying in {}s",
                    attempt,
                    attempts,
                    e,
                    config.connect_retry.as_secs()
                );
                attempt += 1;
                tokio::time::sleep(config.connect_retry).await;
            }
            Err(e) => {
                log::error!("Giving up on the database after {} attempts", attempts);
                return Err(AppError::Db(e));
            }
        }
    }
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    MIGRATOR.run(pool).await?;
    log::info!("Database migrations complete");
    Ok(())
}
