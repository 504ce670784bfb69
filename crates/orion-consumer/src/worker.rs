//! Consumer worker
//!
//! Pulls deliveries from one relay stream, applies them through the unit of
//! work and settles each one:
//!
//! | Outcome                                    | Settlement          |
//! |--------------------------------------------|---------------------|
//! | delivered more than `max_deliveries` times | dead letter         |
//! | undecodable payload                        | discard (ERROR log) |
//! | applied                                    | ack                 |
//! | uniqueness conflict (already applied)      | ack (WARN log)      |
//! | anything else                              | requeue             |
//!
//! Per-message failures never stop the loop. A failed fetch or settle means
//! the relay connection is lost and ends [`ConsumerWorker::run`].

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use orion_common::with_timeout;
use orion_core::events::RelayEvent;
use orion_core::traits::{Delivery, RelayConsumer, RepoResult, UnitOfWork};

use crate::error::{ConsumerError, ConsumerResult};
use crate::handlers::EventDispatcher;

/// How a delivery was settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Acked,
    /// Already applied earlier; acknowledged without changes
    AckedDuplicate,
    Requeued,
    Discarded,
    DeadLettered,
}

/// Worker limits
#[derive(Debug, Clone, Copy)]
pub struct WorkerSettings {
    /// Deliveries allowed before an entry is dead-lettered
    pub max_deliveries: u64,
    /// Upper bound for applying one event
    pub apply_timeout: Duration,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            max_deliveries: 10,
            apply_timeout: Duration::from_secs(5),
        }
    }
}

/// Drains one relay stream into the database
pub struct ConsumerWorker<C, U> {
    consumer: C,
    uow: Arc<U>,
    settings: WorkerSettings,
}

impl<C, U> ConsumerWorker<C, U>
where
    C: RelayConsumer,
    U: UnitOfWork,
{
    pub fn new(consumer: C, uow: Arc<U>, settings: WorkerSettings) -> Self {
        Self {
            consumer,
            uow,
            settings,
        }
    }

    /// Run until the relay connection is lost
    pub async fn run(&self) -> ConsumerResult<()> {
        info!(kind = %self.consumer.kind(), "Consumer worker started");
        loop {
            if let Err(e) = self.poll_once().await {
                error!(kind = %self.consumer.kind(), error = %e, "Consumer worker stopped");
                return Err(e);
            }
        }
    }

    /// Fetch one batch and settle every delivery in it
    pub async fn poll_once(&self) -> ConsumerResult<Vec<Settlement>> {
        let batch = self
            .consumer
            .fetch()
            .await
            .map_err(ConsumerError::RelayLost)?;

        let mut settled = Vec::with_capacity(batch.len());
        for delivery in &batch {
            let settlement = self.process(delivery).await;
            self.settle(delivery, settlement)
                .await
                .map_err(ConsumerError::RelayLost)?;
            settled.push(settlement);
        }
        Ok(settled)
    }

    /// Decide how to settle a delivery, applying it if it is valid
    #[instrument(skip(self, delivery), fields(kind = %delivery.kind, entry_id = %delivery.id, deliveries = delivery.delivery_count))]
    async fn process(&self, delivery: &Delivery) -> Settlement {
        if delivery.delivery_count > self.settings.max_deliveries {
            return Settlement::DeadLettered;
        }

        let event = match RelayEvent::decode(delivery.kind, &delivery.payload) {
            Ok(event) => event,
            Err(e) => {
                error!(
                    error = %e,
                    payload = %String::from_utf8_lossy(&delivery.payload),
                    "Discarding poison message"
                );
                return Settlement::Discarded;
            }
        };

        let subject_id = event.subject_id();
        let user_id = event.user_id();
        let applied = with_timeout(
            self.settings.apply_timeout,
            EventDispatcher::dispatch(self.uow.as_ref(), event),
        )
        .await;

        match applied {
            Ok(()) => {
                debug!(subject_id = %subject_id, user_id = %user_id, "Event applied");
                Settlement::Acked
            }
            Err(e) if e.is_conflict() => {
                warn!(
                    subject_id = %subject_id,
                    user_id = %user_id,
                    error = %e,
                    "Event already applied, acknowledging"
                );
                Settlement::AckedDuplicate
            }
            Err(e) => {
                warn!(
                    subject_id = %subject_id,
                    user_id = %user_id,
                    error = %e,
                    code = e.code(),
                    "Event not applied, requeueing"
                );
                Settlement::Requeued
            }
        }
    }

    async fn settle(&self, delivery: &Delivery, settlement: Settlement) -> RepoResult<()> {
        match settlement {
            Settlement::Acked | Settlement::AckedDuplicate => self.consumer.ack(delivery).await,
            Settlement::Requeued => self.consumer.nack(delivery, true).await,
            Settlement::Discarded => self.consumer.nack(delivery, false).await,
            Settlement::DeadLettered => self.consumer.dead_letter(delivery).await,
        }
    }
}
