//! Configuration loader for the `sensorflow-gateway` service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller), so no other module reads `env::var` directly.
//!
use std::env;
use std::net::SocketAddr;

use anyhow::{anyhow, bail, Result};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse an optional boolean environment variable with a default value.
macro_rules! parse_env_bool {
    ($var_name:expr, $default:expr) => {
        match env::var($var_name).ok().as_deref() {
            None => $default,
            Some("1") | Some("true") | Some("yes") => true,
            Some("0") | Some("false") | Some("no") => false,
            Some(other) => bail!("Invalid {}: {}", $var_name, other),
        }
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Which store backend sessions open handles on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// PostgreSQL at the given connection string.
    Postgres { db_url: String },
    /// Process-local table; data is lost on exit.
    Memory,
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Address the HTTP/WebSocket listener binds to.
    pub listen_addr: SocketAddr,

    /// Store backend.
    pub store: StoreBackend,

    /// Maximum number of database connections per session.
    pub db_pool_max: u32,

    /// Append the `X-Real-IP` header to peer labels.
    pub trust_real_ip: bool,
}

impl Default for Config {
    fn default() -> Self {
        // ---
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8910)),
            store: StoreBackend::Memory,
            db_pool_max: 4,
            trust_real_ip: true,
        }
    }
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string (postgres backend only)
///
/// Optional:
/// - `LISTEN_ADDR` – bind address (default: 127.0.0.1:8910)
/// - `STORE_BACKEND` – `postgres` or `memory` (default: postgres)
/// - `DB_POOL_MAX` – max DB connections per session (default: 4)
/// - `TRUST_REAL_IP` – honour `X-Real-IP` (default: true)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let listen_addr = match env::var("LISTEN_ADDR") {
        Ok(v) => v
            .parse::<SocketAddr>()
            .map_err(|e| anyhow!("Invalid LISTEN_ADDR: {}", e))?,
        Err(_) => Config::default().listen_addr,
    };

    let store = match env::var("STORE_BACKEND").as_deref() {
        Ok("postgres") | Err(_) => StoreBackend::Postgres {
            db_url: require_env!("DATABASE_URL"),
        },
        Ok("memory") => StoreBackend::Memory,
        Ok(other) => bail!("Invalid STORE_BACKEND: {}", other),
    };

    let db_pool_max = parse_env_u32!("DB_POOL_MAX", 4);
    let trust_real_ip = parse_env_bool!("TRUST_REAL_IP", true);

    Ok(Config {
        listen_addr,
        store,
        db_pool_max,
        trust_real_ip,
    })
}

/// Replace the password in a connection string with `****`.
fn mask_db_url(db_url: &str) -> String {
    // ---
    if let Some(at_pos) = db_url.rfind('@') {
        if let Some(colon_pos) = db_url[..at_pos].rfind(':') {
            // `scheme://host@...` has no password; the colon belongs to the scheme.
            if !db_url[colon_pos..].starts_with("://") {
                return format!("{}:****{}", &db_url[..colon_pos], &db_url[at_pos..]);
            }
        }
    }
    db_url.to_string()
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks the database password while showing all configuration values
    /// that were loaded.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  LISTEN_ADDR    : {}", self.listen_addr);
        match &self.store {
            StoreBackend::Postgres { db_url } => {
                tracing::info!("  STORE_BACKEND  : postgres");
                tracing::info!("  DATABASE_URL   : {}", mask_db_url(db_url));
            }
            StoreBackend::Memory => tracing::info!("  STORE_BACKEND  : memory"),
        }
        tracing::info!("  DB_POOL_MAX    : {}", self.db_pool_max);
        tracing::info!("  TRUST_REAL_IP  : {}", self.trust_real_ip);
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_mask_password() {
        // ---
        assert_eq!(
            mask_db_url("postgres://gw:s3cret@db:5432/sensors"),
            "postgres://gw:****@db:5432/sensors"
        );
    }

    #[test]
    fn test_mask_without_password() {
        // ---
        assert_eq!(
            mask_db_url("postgres://gw@db/sensors"),
            "postgres://gw@db/sensors"
        );
        assert_eq!(mask_db_url("postgres://db/sensors"), "postgres://db/sensors");
    }

    #[test]
    fn test_defaults() {
        // ---
        let cfg = Config::default();
        assert_eq!(cfg.listen_addr.port(), 8910);
        assert_eq!(cfg.db_pool_max, 4);
        assert!(cfg.trust_real_ip);
    }
}
