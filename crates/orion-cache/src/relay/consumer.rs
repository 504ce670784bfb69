//! Redis Streams consumer-group consumer
//!
//! Fetch order per poll:
//! 1. reclaim entries pending longer than the redelivery idle time
//!    (`XPENDING` + `XCLAIM`), which covers requeued entries and entries
//!    held by crashed consumers;
//! 2. otherwise read new entries (`XREADGROUP ... BLOCK`).

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::streams::{
    StreamClaimReply, StreamId, StreamPendingCountReply, StreamReadOptions, StreamReadReply,
};
use redis::AsyncCommands;
use tracing::{debug, error, info, instrument};

use orion_common::{with_timeout, RelayConfig};
use orion_core::error::DomainError;
use orion_core::events::EventKind;
use orion_core::traits::{Delivery, RelayConsumer, RepoResult};

use super::{relay_error, StreamNames, PAYLOAD_FIELD};
use crate::pool::RedisPool;

/// Per-consumer relay settings
#[derive(Debug, Clone)]
pub struct ConsumerSettings {
    pub kind: EventKind,
    pub stream: String,
    pub group: String,
    /// Unique within the group
    pub consumer: String,
    pub dead_letter_stream: String,
    pub batch_size: usize,
    pub block: Duration,
    pub redelivery_idle: Duration,
    /// Upper bound for every non-blocking call
    pub timeout: Duration,
}

impl ConsumerSettings {
    /// Settings for the stream of `kind` using the relay configuration
    pub fn from_config(
        config: &RelayConfig,
        kind: EventKind,
        consumer: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let streams = StreamNames::from(config);
        Self {
            kind,
            stream: streams.stream_for(kind).to_string(),
            group: config.consumer_group.clone(),
            consumer: consumer.into(),
            dead_letter_stream: streams.dead_letter,
            batch_size: config.batch_size,
            block: config.block(),
            redelivery_idle: config.redelivery_idle(),
            timeout,
        }
    }
}

/// Consumer bound to one stream within the shared consumer group
pub struct RedisStreamConsumer {
    pool: RedisPool,
    settings: ConsumerSettings,
}

impl RedisStreamConsumer {
    /// Create the consumer, creating the stream and consumer group if
    /// they do not exist yet
    pub async fn connect(pool: RedisPool, settings: ConsumerSettings) -> RepoResult<Self> {
        let consumer = Self { pool, settings };
        consumer.ensure_group().await?;
        Ok(consumer)
    }

    #[must_use]
    pub fn settings(&self) -> &ConsumerSettings {
        &self.settings
    }

    async fn ensure_group(&self) -> RepoResult<()> {
        let s = &self.settings;
        let created = self
            .bounded(async {
                let mut conn = self.pool.get().await.map_err(relay_error)?;
                let result: redis::RedisResult<()> =
                    conn.xgroup_create_mkstream(&s.stream, &s.group, "0").await;
                match result {
                    Ok(()) => Ok(true),
                    Err(e) if e.code() == Some("BUSYGROUP") => Ok(false),
                    Err(e) => Err(relay_error(e)),
                }
            })
            .await?;

        if created {
            info!(stream = %s.stream, group = %s.group, "Consumer group created");
        }
        Ok(())
    }

    async fn bounded<T, F>(&self, fut: F) -> RepoResult<T>
    where
        F: std::future::Future<Output = RepoResult<T>>,
    {
        with_timeout(self.settings.timeout, fut)
            .await
            .map_err(|e| match e {
                DomainError::Timeout(_) => relay_error(e),
                other => other,
            })
    }

    async fn reclaim(&self) -> RepoResult<Vec<Delivery>> {
        let s = &self.settings;
        let idle_ms = u64::try_from(s.redelivery_idle.as_millis()).unwrap_or(u64::MAX);

        self.bounded(async {
            let mut conn = self.pool.get().await.map_err(relay_error)?;

            let pending: StreamPendingCountReply = conn
                .xpending_count(&s.stream, &s.group, "-", "+", s.batch_size)
                .await
                .map_err(relay_error)?;

            let due: HashMap<String, u64> = pending
                .ids
                .into_iter()
                .filter(|p| p.last_delivered_ms as u64 >= idle_ms)
                .map(|p| (p.id, p.times_delivered as u64))
                .collect();

            if due.is_empty() {
                return Ok(Vec::new());
            }

            let ids: Vec<&String> = due.keys().collect();
            let claimed: StreamClaimReply = conn
                .xclaim(&s.stream, &s.group, &s.consumer, idle_ms, &ids)
                .await
                .map_err(relay_error)?;

            // XCLAIM bumps the delivery counter of every claimed entry
            Ok(claimed
                .ids
                .into_iter()
                .map(|entry| {
                    let previous = due.get(&entry.id).copied().unwrap_or(0);
                    to_delivery(s.kind, entry, previous + 1)
                })
                .collect())
        })
        .await
    }

    async fn read_new(&self) -> RepoResult<Vec<Delivery>> {
        let s = &self.settings;
        let block_ms = usize::try_from(s.block.as_millis()).unwrap_or(usize::MAX);
        let options = StreamReadOptions::default()
            .group(&s.group, &s.consumer)
            .count(s.batch_size)
            .block(block_ms);

        // The blocking read may legitimately take the whole block time
        let limit = s.block + s.timeout;
        with_timeout(limit, async {
            let mut conn = self.pool.get().await.map_err(relay_error)?;
            let reply: Option<StreamReadReply> = conn
                .xread_options(&[&s.stream], &[">"], &options)
                .await
                .map_err(relay_error)?;

            Ok(reply
                .map(|r| r.keys)
                .unwrap_or_default()
                .into_iter()
                .flat_map(|key| key.ids)
                .map(|entry| to_delivery(s.kind, entry, 1))
                .collect())
        })
        .await
        .map_err(|e| match e {
            DomainError::Timeout(_) => relay_error(e),
            other => other,
        })
    }
}

fn to_delivery(kind: EventKind, entry: StreamId, delivery_count: u64) -> Delivery {
    // A missing field yields an empty payload, which fails to decode and is
    // discarded as poison by the worker.
    let payload: Vec<u8> = entry.get(PAYLOAD_FIELD).unwrap_or_default();
    Delivery {
        id: entry.id,
        kind,
        payload,
        delivery_count,
    }
}

#[async_trait]
impl RelayConsumer for RedisStreamConsumer {
    fn kind(&self) -> EventKind {
        self.settings.kind
    }

    #[instrument(skip(self), fields(stream = %self.settings.stream, consumer = %self.settings.consumer))]
    async fn fetch(&self) -> RepoResult<Vec<Delivery>> {
        let reclaimed = self.reclaim().await?;
        if !reclaimed.is_empty() {
            debug!(count = reclaimed.len(), "Reclaimed pending entries");
            return Ok(reclaimed);
        }
        self.read_new().await
    }

    #[instrument(skip(self, delivery), fields(entry_id = %delivery.id))]
    async fn ack(&self, delivery: &Delivery) -> RepoResult<()> {
        let s = &self.settings;
        self.bounded(async {
            let mut conn = self.pool.get().await.map_err(relay_error)?;
            let _: i64 = conn
                .xack(&s.stream, &s.group, &[&delivery.id])
                .await
                .map_err(relay_error)?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self, delivery), fields(entry_id = %delivery.id))]
    async fn nack(&self, delivery: &Delivery, requeue: bool) -> RepoResult<()> {
        if requeue {
            // Left in the pending list; reclaimed once idle long enough
            return Ok(());
        }

        let s = &self.settings;
        self.bounded(async {
            let mut conn = self.pool.get().await.map_err(relay_error)?;
            let _: i64 = conn
                .xack(&s.stream, &s.group, &[&delivery.id])
                .await
                .map_err(relay_error)?;
            let _: i64 = conn
                .xdel(&s.stream, &[&delivery.id])
                .await
                .map_err(relay_error)?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self, delivery), fields(entry_id = %delivery.id))]
    async fn dead_letter(&self, delivery: &Delivery) -> RepoResult<()> {
        let s = &self.settings;
        let dead_letter_id = self
            .bounded(async {
                let mut conn = self.pool.get().await.map_err(relay_error)?;
                let id: String = redis::cmd("XADD")
                    .arg(&s.dead_letter_stream)
                    .arg("*")
                    .arg("stream")
                    .arg(&s.stream)
                    .arg("id")
                    .arg(&delivery.id)
                    .arg(PAYLOAD_FIELD)
                    .arg(delivery.payload.as_slice())
                    .arg("deliveries")
                    .arg(delivery.delivery_count)
                    .query_async(&mut conn)
                    .await
                    .map_err(relay_error)?;
                let _: i64 = conn
                    .xack(&s.stream, &s.group, &[&delivery.id])
                    .await
                    .map_err(relay_error)?;
                Ok(id)
            })
            .await?;

        error!(
            stream = %s.stream,
            entry_id = %delivery.id,
            dead_letter_id = %dead_letter_id,
            deliveries = delivery.delivery_count,
            "Message moved to dead-letter stream"
        );
        Ok(())
    }
}
