//! Alias database connection pool configuration.

use crate::error::Result;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Database pool configuration
#[derive(Debug, Clone)]
pub struct DbPoolConfig {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Timeout for acquiring a connection
    pub acquire_timeout: Duration,
    /// How long idle connections are kept alive
    pub idle_timeout: Duration,
    /// Maximum lifetime of a connection
    pub max_lifetime: Duration,
}

impl Default for DbPoolConfig {
    fn default() -> Self {
        // Alias reads happen once per cache TTL; a handful of connections is plenty
        Self {
            max_connections: 4,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(300),  // 5 minutes
            max_lifetime: Duration::from_secs(1800), // 30 minutes
        }
    }
}

fn env_secs(key: &str) -> Option<Duration> {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
}

impl DbPoolConfig {
    /// Create config from `ALIAS_DB_*` environment variables with fallback to provided defaults
    pub fn from_env_with_defaults(defaults: Self) -> Self {
        Self {
            max_connections: env::var("ALIAS_DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_connections),
            min_connections: env::var("ALIAS_DB_MIN_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.min_connections),
            acquire_timeout: env_secs("ALIAS_DB_ACQUIRE_TIMEOUT_SECS")
                .unwrap_or(defaults.acquire_timeout),
            idle_timeout: env_secs("ALIAS_DB_IDLE_TIMEOUT_SECS").unwrap_or(defaults.idle_timeout),
            max_lifetime: env_secs("ALIAS_DB_MAX_LIFETIME_SECS").unwrap_or(defaults.max_lifetime),
        }
    }
}

/// Create a PostgreSQL pool for the alias store.
///
/// # Example
/// ```ignore
/// let config = DbPoolConfig::from_env_with_defaults(DbPoolConfig::default());
/// let pool = create_pool(&database_url, &config).await?;
/// ```
pub async fn create_pool(database_url: &str, config: &DbPoolConfig) -> Result<PgPool> {
    let connect_opts = PgConnectOptions::from_str(database_url)?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections.min(config.max_connections))
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .max_lifetime(config.max_lifetime)
        .connect_with(connect_opts)
        .await?;

    info!(
        "Alias database pool created: max={}, min={}, acquire_timeout={}s",
        config.max_connections,
        config.min_connections,
        config.acquire_timeout.as_secs()
    );

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DbPoolConfig::default();
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.acquire_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_defaults_survive_missing_env() {
        let defaults = DbPoolConfig {
            max_connections: 7,
            ..Default::default()
        };
        // ALIAS_DB_* are not set in the test environment
        let config = DbPoolConfig::from_env_with_defaults(defaults);
        assert_eq!(config.max_connections, 7);
        assert!(config.min_connections <= config.max_connections);
    }
}
