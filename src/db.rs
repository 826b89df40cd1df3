use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::config::Config;

pub type DbPool = SqlitePool;

/// Application state holding the database connection pool
pub struct AppState {
  pub db: DbPool,
}

/// Open the connection pool and run migrations.
/// Defaults to ./studio-ops.db, see `STUDIO_DATABASE_URL`.
pub async fn initialize_db(config: &Config) -> Result<DbPool, Box<dyn std::error::Error>> {
  info!(url = %config.database_url, "Initializing database");

  let pool = SqlitePoolOptions::new()
    .max_connections(config.max_connections)
    .connect(&config.database_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  info!("Database initialized successfully");

  Ok(pool)
}
