//! Consumer error types

use orion_core::DomainError;
use thiserror::Error;

/// Errors that stop the consumer. Per-message failures never surface here.
#[derive(Debug, Error)]
pub enum ConsumerError {
    /// Fetching or settling failed; the relay connection is gone
    #[error("Relay connection lost: {0}")]
    RelayLost(DomainError),

    /// Database pool could not be created
    #[error("Database error: {0}")]
    Database(String),

    /// Redis pool could not be created
    #[error("Cache error: {0}")]
    Cache(#[from] orion_cache::RedisPoolError),

    /// A worker task panicked or was aborted
    #[error("Worker task failed: {0}")]
    Worker(String),
}

/// Consumer result type
pub type ConsumerResult<T> = Result<T, ConsumerError>;
