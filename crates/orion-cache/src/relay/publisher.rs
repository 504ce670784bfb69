//! Redis Streams publisher

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::{debug, instrument};

use orion_common::with_timeout;
use orion_core::error::DomainError;
use orion_core::events::RelayEvent;
use orion_core::traits::{RelayPublisher, RepoResult};

use super::{relay_error, StreamNames, PAYLOAD_FIELD};
use crate::pool::RedisPool;

/// Publishes relay events with `XADD <stream> * payload <json>`
#[derive(Clone)]
pub struct RedisStreamPublisher {
    pool: RedisPool,
    streams: StreamNames,
    timeout: Duration,
}

impl RedisStreamPublisher {
    /// Create a new publisher
    #[must_use]
    pub fn new(pool: RedisPool, streams: StreamNames, timeout: Duration) -> Self {
        Self {
            pool,
            streams,
            timeout,
        }
    }
}

#[async_trait]
impl RelayPublisher for RedisStreamPublisher {
    #[instrument(skip(self, event), fields(kind = %event.kind(), subject_id = %event.subject_id()))]
    async fn publish(&self, event: &RelayEvent) -> RepoResult<()> {
        let stream = self.streams.stream_for(event.kind());
        let payload = event.encode()?;

        let entry_id = with_timeout(self.timeout, async {
            let mut conn = self.pool.get().await.map_err(relay_error)?;
            let id: String = conn
                .xadd(stream, "*", &[(PAYLOAD_FIELD, payload.as_slice())])
                .await
                .map_err(relay_error)?;
            Ok(id)
        })
        .await
        .map_err(|e| match e {
            DomainError::Timeout(_) => relay_error(e),
            other => other,
        })?;

        debug!(stream = %stream, entry_id = %entry_id, "Published event");

        Ok(())
    }
}
