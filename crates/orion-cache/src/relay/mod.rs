//! Relay over Redis Streams
//!
//! One stream per event kind, each entry carrying a single `payload` field
//! with the JSON body. Consumers share one consumer group; unacknowledged
//! entries stay in the group's pending list until acked, reclaimed after
//! the redelivery idle time, or moved to the dead-letter stream.

mod consumer;
mod publisher;

pub use consumer::{ConsumerSettings, RedisStreamConsumer};
pub use publisher::RedisStreamPublisher;

use orion_common::RelayConfig;
use orion_core::error::DomainError;
use orion_core::events::EventKind;

/// Field holding the JSON body in every stream entry
pub const PAYLOAD_FIELD: &str = "payload";

/// Stream names for each event kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamNames {
    pub like: String,
    pub golden_comment: String,
    pub dead_letter: String,
}

impl StreamNames {
    #[must_use]
    pub fn stream_for(&self, kind: EventKind) -> &str {
        match kind {
            EventKind::Like => &self.like,
            EventKind::GoldenComment => &self.golden_comment,
        }
    }
}

impl From<&RelayConfig> for StreamNames {
    fn from(config: &RelayConfig) -> Self {
        Self {
            like: config.like_stream.clone(),
            golden_comment: config.golden_comment_stream.clone(),
            dead_letter: config.dead_letter_stream.clone(),
        }
    }
}

impl Default for StreamNames {
    fn default() -> Self {
        Self::from(&RelayConfig::default())
    }
}

pub(crate) fn relay_error(e: impl std::fmt::Display) -> DomainError {
    DomainError::RelayUnavailable(e.to_string())
}
