//! Redis implementation of FastPathStore
//!
//! One command per operation (INCR, DECR, SADD, SREM, SISMEMBER, GET,
//! SET EX), each bounded by the operation timeout.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::instrument;

use orion_common::with_timeout;
use orion_core::error::DomainError;
use orion_core::traits::{FastPathStore, RepoResult};

use crate::pool::RedisPool;

fn map_redis_error(e: redis::RedisError) -> DomainError {
    DomainError::CacheError(e.to_string())
}

/// Redis-backed counters, sets and TTL cache entries
#[derive(Clone)]
pub struct RedisFastPathStore {
    pool: RedisPool,
    timeout: Duration,
}

impl RedisFastPathStore {
    /// Create a new store; every call is abandoned after `timeout`
    #[must_use]
    pub fn new(pool: RedisPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl FastPathStore for RedisFastPathStore {
    #[instrument(skip(self))]
    async fn incr(&self, key: &str) -> RepoResult<i64> {
        with_timeout(self.timeout, async {
            let mut conn = self.pool.get().await?;
            let value: i64 = conn.incr(key, 1_i64).await.map_err(map_redis_error)?;
            Ok(value)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn decr(&self, key: &str) -> RepoResult<i64> {
        with_timeout(self.timeout, async {
            let mut conn = self.pool.get().await?;
            let value: i64 = conn.decr(key, 1_i64).await.map_err(map_redis_error)?;
            Ok(value)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn set_counter(&self, key: &str, value: i64) -> RepoResult<()> {
        with_timeout(self.timeout, async {
            let mut conn = self.pool.get().await?;
            conn.set::<_, _, ()>(key, value)
                .await
                .map_err(map_redis_error)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn set_add(&self, key: &str, member: &str) -> RepoResult<bool> {
        with_timeout(self.timeout, async {
            let mut conn = self.pool.get().await?;
            let added: i64 = conn.sadd(key, member).await.map_err(map_redis_error)?;
            Ok(added > 0)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn set_remove(&self, key: &str, member: &str) -> RepoResult<bool> {
        with_timeout(self.timeout, async {
            let mut conn = self.pool.get().await?;
            let removed: i64 = conn.srem(key, member).await.map_err(map_redis_error)?;
            Ok(removed > 0)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn set_contains(&self, key: &str, member: &str) -> RepoResult<bool> {
        with_timeout(self.timeout, async {
            let mut conn = self.pool.get().await?;
            let present: bool = conn.sismember(key, member).await.map_err(map_redis_error)?;
            Ok(present)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> RepoResult<Option<String>> {
        with_timeout(self.timeout, async {
            let mut conn = self.pool.get().await?;
            let value: Option<String> = conn.get(key).await.map_err(map_redis_error)?;
            Ok(value)
        })
        .await
    }

    #[instrument(skip(self, value), fields(ttl_secs = ttl.as_secs()))]
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> RepoResult<()> {
        // SET EX takes whole seconds; never let a sub-second TTL become 0
        let seconds = ttl.as_secs().max(1);
        with_timeout(self.timeout, async {
            let mut conn = self.pool.get().await?;
            conn.set_ex::<_, _, ()>(key, value, seconds)
                .await
                .map_err(map_redis_error)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::RedisPoolConfig;

    #[test]
    fn test_store_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RedisFastPathStore>();
    }

    #[tokio::test]
    async fn test_unreachable_redis_surfaces_cache_error() {
        // Nothing listens on port 1; the pool is created lazily so only the
        // command fails.
        let pool = RedisPool::new(RedisPoolConfig {
            url: "redis://127.0.0.1:1".to_string(),
            max_connections: 1,
            wait_timeout: None,
        })
        .unwrap();
        let store = RedisFastPathStore::new(pool, Duration::from_secs(2));

        let err = store.incr("golden:seats:1").await.unwrap_err();
        assert!(err.is_transient(), "unexpected error: {err:?}");
    }
}
