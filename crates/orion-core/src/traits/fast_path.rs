//! Fast-path store port - atomic counters, sets and TTL cache entries
//!
//! Every operation maps onto a single atomic primitive of the backing store;
//! callers never read-modify-write.

use std::time::Duration;

use async_trait::async_trait;

use super::RepoResult;

#[async_trait]
pub trait FastPathStore: Send + Sync {
    /// Atomically increment, returning the new value
    async fn incr(&self, key: &str) -> RepoResult<i64>;

    /// Atomically decrement, returning the new value
    async fn decr(&self, key: &str) -> RepoResult<i64>;

    /// Overwrite a counter (reconciliation only)
    async fn set_counter(&self, key: &str, value: i64) -> RepoResult<()>;

    /// Add a set member; `true` if it was not already present
    async fn set_add(&self, key: &str, member: &str) -> RepoResult<bool>;

    /// Remove a set member; `true` if it was present
    async fn set_remove(&self, key: &str, member: &str) -> RepoResult<bool>;

    async fn set_contains(&self, key: &str, member: &str) -> RepoResult<bool>;

    /// Get a cached value; a miss is `None`
    async fn get(&self, key: &str) -> RepoResult<Option<String>>;

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> RepoResult<()>;
}
