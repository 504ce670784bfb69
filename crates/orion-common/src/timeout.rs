//! Bounded network calls
//!
//! Every call to Redis, PostgreSQL or the relay goes through
//! [`with_timeout`]; an expired call is abandoned and surfaces as
//! `DomainError::Timeout`.

use std::future::Future;
use std::time::Duration;

use orion_core::DomainError;

/// Await `fut` for at most `limit`
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, DomainError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(DomainError::Timeout(limit)),
    }
}
