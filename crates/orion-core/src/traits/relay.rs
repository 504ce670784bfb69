//! Relay ports - durable at-least-once message delivery with explicit ack

use async_trait::async_trait;

use super::RepoResult;
use crate::events::{EventKind, RelayEvent};

/// One message handed to a consumer, not yet settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Relay-assigned message id
    pub id: String,
    pub kind: EventKind,
    pub payload: Vec<u8>,
    /// How many times this message has been delivered, including this one
    pub delivery_count: u64,
}

#[async_trait]
pub trait RelayPublisher: Send + Sync {
    /// Publish durably; failure is `DomainError::RelayUnavailable`
    async fn publish(&self, event: &RelayEvent) -> RepoResult<()>;
}

/// Consumer bound to the stream of one event kind.
///
/// Errors from any method mean the relay connection is lost.
#[async_trait]
pub trait RelayConsumer: Send + Sync {
    fn kind(&self) -> EventKind;

    /// Next batch, including messages due for redelivery. May block for a
    /// bounded time and return an empty batch.
    async fn fetch(&self) -> RepoResult<Vec<Delivery>>;

    /// Settle as processed
    async fn ack(&self, delivery: &Delivery) -> RepoResult<()>;

    /// Settle as failed. `requeue = true` leaves the message for redelivery;
    /// `false` discards it.
    async fn nack(&self, delivery: &Delivery, requeue: bool) -> RepoResult<()>;

    /// Move the message to the dead-letter destination and settle it
    async fn dead_letter(&self, delivery: &Delivery) -> RepoResult<()>;
}
