pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod models;
pub mod phases;
pub mod programs;
pub mod routes;

#[cfg(test)]
mod test_utils;

use config::Config;
use db::AppState;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "studio_ops_lib=info,tower_http=info";

fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
  // A subscriber may already be installed when embedded
  if let Err(e) = tracing_subscriber::fmt().with_env_filter(filter).try_init() {
    eprintln!("Tracing subscriber already set: {}", e);
  }
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!("Failed to listen for shutdown signal: {}", e);
  }
  info!("Shutting down");
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();
  init_tracing();

  let config = Config::from_env()?;
  let pool = db::initialize_db(&config).await?;
  let state = Arc::new(AppState { db: pool.clone() });

  let app = routes::router(state);
  let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
  info!("Listening on http://{}", config.bind_addr);

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;

  pool.close().await;
  Ok(())
}
