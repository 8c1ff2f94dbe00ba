//! Catalog store configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CATALOG_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional (connection pool)
//! - `CATALOG_DB_MAX_CONNECTIONS` - Upper bound on open connections (default: 10)
//! - `CATALOG_DB_MIN_CONNECTIONS` - Idle connections kept warm (default: 2)
//! - `CATALOG_DB_MAX_LIFETIME_SECS` - Recycle connections older than this (default: 1800)
//! - `CATALOG_DB_IDLE_TIMEOUT_SECS` - Close connections idle longer than this (default: 600)
//! - `CATALOG_DB_ACQUIRE_TIMEOUT_SECS` - Wait at most this long for a connection (default: 10)

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 2;
const DEFAULT_MAX_LIFETIME_SECS: u64 = 30 * 60;
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 10 * 60;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Catalog store configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// Connection pool tuning
    pub pool: PoolConfig,
}

/// Connection pool limits.
///
/// The pool is the only shared mutable resource of the store, so every
/// dimension of it is bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Maximum number of open connections
    pub max_connections: u32,
    /// Minimum number of idle connections kept open
    pub min_connections: u32,
    /// Connections are closed once they reach this age
    pub max_lifetime: Duration,
    /// Idle connections above the minimum are closed after this long
    pub idle_timeout: Duration,
    /// How long a caller waits for a free connection
    pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            max_lifetime: Duration::from_secs(DEFAULT_MAX_LIFETIME_SECS),
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
        }
    }
}

impl CatalogConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the database URL is missing or a pool setting
    /// is not a valid number.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::load(|key| std::env::var(key).ok())
    }

    fn load(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("CATALOG_DATABASE_URL")
            .or_else(|| lookup("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("CATALOG_DATABASE_URL".to_string()))?;

        let pool = PoolConfig::load(&lookup)?;

        Ok(Self { database_url, pool })
    }
}

impl PoolConfig {
    fn load(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let max_connections =
            parse_or_default(lookup, "CATALOG_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        let min_connections =
            parse_or_default(lookup, "CATALOG_DB_MIN_CONNECTIONS", DEFAULT_MIN_CONNECTIONS)?;

        if max_connections == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "CATALOG_DB_MAX_CONNECTIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        if min_connections > max_connections {
            return Err(ConfigError::InvalidEnvVar(
                "CATALOG_DB_MIN_CONNECTIONS".to_string(),
                format!("must not exceed CATALOG_DB_MAX_CONNECTIONS ({max_connections})"),
            ));
        }

        Ok(Self {
            max_connections,
            min_connections,
            max_lifetime: Duration::from_secs(parse_or_default(
                lookup,
                "CATALOG_DB_MAX_LIFETIME_SECS",
                DEFAULT_MAX_LIFETIME_SECS,
            )?),
            idle_timeout: Duration::from_secs(parse_or_default(
                lookup,
                "CATALOG_DB_IDLE_TIMEOUT_SECS",
                DEFAULT_IDLE_TIMEOUT_SECS,
            )?),
            acquire_timeout: Duration::from_secs(parse_or_default(
                lookup,
                "CATALOG_DB_ACQUIRE_TIMEOUT_SECS",
                DEFAULT_ACQUIRE_TIMEOUT_SECS,
            )?),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an optional numeric variable, falling back to `default` when unset.
fn parse_or_default<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}
