use std::env;
use std::net::SocketAddr;

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

const DATABASE_URL_VAR: &str = "STUDIO_DATABASE_URL";
const BIND_ADDR_VAR: &str = "STUDIO_BIND_ADDR";
const MAX_CONNECTIONS_VAR: &str = "STUDIO_DB_MAX_CONNECTIONS";

const DEFAULT_DATABASE_URL: &str = "sqlite://studio-ops.db?mode=rwc";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("Invalid value for {key}: {value:?} ({reason})")]
  InvalidValue {
    key: &'static str,
    value: String,
    reason: String,
  },
}

#[derive(Debug, Clone)]
pub struct Config {
  pub database_url: String,
  pub bind_addr: SocketAddr,
  pub max_connections: u32,
}

impl Config {
  /// Read configuration from the process environment.
  /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
  pub fn from_env() -> Result<Self, ConfigError> {
    let database_url = env::var(DATABASE_URL_VAR)
      .ok()
      .filter(|v| !v.trim().is_empty())
      .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

    let bind_raw = env::var(BIND_ADDR_VAR).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let bind_addr = bind_raw
      .parse::<SocketAddr>()
      .map_err(|e| ConfigError::InvalidValue {
        key: BIND_ADDR_VAR,
        value: bind_raw.clone(),
        reason: e.to_string(),
      })?;

    let max_connections = match env::var(MAX_CONNECTIONS_VAR) {
      Ok(raw) => match raw.trim().parse::<u32>() {
        Ok(n) if n >= 1 => n,
        Ok(_) => {
          return Err(ConfigError::InvalidValue {
            key: MAX_CONNECTIONS_VAR,
            value: raw,
            reason: "must be at least 1".to_string(),
          })
        }
        Err(e) => {
          return Err(ConfigError::InvalidValue {
            key: MAX_CONNECTIONS_VAR,
            value: raw,
            reason: e.to_string(),
          })
        }
      },
      Err(_) => DEFAULT_MAX_CONNECTIONS,
    };

    Ok(Self {
      database_url,
      bind_addr,
      max_connections,
    })
  }
}
