//! Redis connection pool shared by the fast-path store and the relay.
//!
//! Every checkout is bounded by the wait timeout so a saturated pool surfaces
//! as a transient `CacheError` instead of stalling the caller.

use deadpool_redis::{Config, Pool, Runtime};
use orion_core::DomainError;
use std::time::Duration;

/// Redis pool configuration
#[derive(Debug, Clone)]
pub struct RedisPoolConfig {
    /// Redis connection URL (e.g., `redis://localhost:6379`)
    pub url: String,
    /// Upper bound on open connections, shared by store and relay traffic
    pub max_connections: usize,
    /// How long to wait for a free connection before failing
    pub wait_timeout: Option<Duration>,
}

impl Default for RedisPoolConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            max_connections: 16,
            wait_timeout: None,
        }
    }
}

impl RedisPoolConfig {
    /// Bound connection checkout by the pipeline's operation timeout
    #[must_use]
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = Some(timeout);
        self
    }
}

impl From<&orion_common::RedisConfig> for RedisPoolConfig {
    fn from(config: &orion_common::RedisConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections as usize,
            ..Self::default()
        }
    }
}

/// Error type for Redis pool operations
#[derive(Debug, thiserror::Error)]
pub enum RedisPoolError {
    #[error("Failed to create Redis pool: {0}")]
    CreatePool(String),

    #[error("No Redis connection available: {0}")]
    Checkout(#[from] deadpool_redis::PoolError),

    #[error("Redis command error: {0}")]
    Command(#[from] redis::RedisError),
}

impl From<RedisPoolError> for DomainError {
    fn from(e: RedisPoolError) -> Self {
        DomainError::CacheError(e.to_string())
    }
}

/// Result type for Redis pool operations
pub type RedisResult<T> = Result<T, RedisPoolError>;

/// Managed Redis connection pool; clones share the same connections
#[derive(Clone)]
pub struct RedisPool {
    pool: Pool,
}

impl std::fmt::Debug for RedisPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.pool.status();
        f.debug_struct("RedisPool")
            .field("size", &status.size)
            .field("available", &status.available)
            .finish()
    }
}

impl RedisPool {
    /// Build the pool. Connections are opened lazily; use [`Self::ping`] to
    /// verify the server is reachable.
    pub fn new(config: RedisPoolConfig) -> RedisResult<Self> {
        let pool = Config::from_url(&config.url)
            .builder()
            .map_err(|e| RedisPoolError::CreatePool(e.to_string()))?
            .max_size(config.max_connections)
            .wait_timeout(config.wait_timeout)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| RedisPoolError::CreatePool(e.to_string()))?;

        tracing::info!(
            url = %redacted_url(&config.url),
            max_connections = config.max_connections,
            wait_timeout = ?config.wait_timeout,
            "Redis pool created"
        );

        Ok(Self { pool })
    }

    /// Check out a connection
    pub async fn get(&self) -> RedisResult<deadpool_redis::Connection> {
        Ok(self.pool.get().await?)
    }

    /// Round-trip a PING through a pooled connection
    pub async fn ping(&self) -> RedisResult<()> {
        let mut conn = self.get().await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}

/// Host part of a Redis URL, without credentials
fn redacted_url(url: &str) -> &str {
    url.rsplit_once('@').map_or(url, |(_, host)| host)
}
