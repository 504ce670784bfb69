//! # orion-cache
//!
//! Redis layer: the fast-path store (counters, sets, TTL cache entries)
//! and the Redis Streams relay used between producers and consumers.
//!
//! ## Features
//!
//! - **Connection Pool**: Managed Redis connection pool with deadpool
//! - **Fast Path**: Atomic single-command primitives behind `FastPathStore`
//! - **Relay**: Stream publisher and consumer-group consumer with
//!   redelivery and dead-lettering
//!
//! ## Example
//!
//! ```ignore
//! use orion_cache::{RedisFastPathStore, RedisPool, RedisPoolConfig, RedisStreamPublisher, StreamNames};
//!
//! let pool = RedisPool::new(RedisPoolConfig::default())?;
//! let store = RedisFastPathStore::new(pool.clone(), timeout);
//! let publisher = RedisStreamPublisher::new(pool, StreamNames::default(), timeout);
//! ```

pub mod keys;
pub mod pool;
pub mod relay;
pub mod store;

// Re-export pool types
pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};

// Re-export store and relay types
pub use relay::{ConsumerSettings, RedisStreamConsumer, RedisStreamPublisher, StreamNames};
pub use store::RedisFastPathStore;
