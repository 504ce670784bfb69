//! Seat counter reconciliation
//!
//! Operator tool for subjects reported with `ReconciliationRequired`:
//! resets the seat counter to the durable golden comment count. Run it once
//! the golden comment stream has drained, otherwise admitted but not yet
//! persisted comments are not counted.

use tracing::{info, instrument, warn};

use orion_cache::keys;
use orion_common::with_timeout;
use orion_core::error::DomainError;
use orion_core::value_objects::SubjectId;

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Result of reconciling one subject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatReconciliation {
    pub subject_id: SubjectId,
    /// Counter value written
    pub seats: i64,
}

/// Seat counter reconciler
pub struct SeatReconciler<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> SeatReconciler<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Overwrite the seat counter of `subject_id` with its golden count
    #[instrument(skip(self))]
    pub async fn reconcile(&self, subject_id: SubjectId) -> ServiceResult<SeatReconciliation> {
        let subject = with_timeout(
            self.ctx.operation_timeout(),
            self.ctx.subject_repo().find_by_id(subject_id),
        )
        .await?
        .ok_or(DomainError::SubjectNotFound(subject_id))?;

        let cap = self.ctx.seat_reservation().cap();
        if subject.golden_count > cap {
            warn!(
                subject_id = %subject_id,
                golden_count = subject.golden_count,
                cap,
                "Subject holds more golden comments than the seat cap"
            );
        }

        let key = keys::golden_seats(subject_id);
        self.ctx
            .fast_path()
            .set_counter(&key, subject.golden_count)
            .await?;

        info!(subject_id = %subject_id, seats = subject.golden_count, "Seat counter reconciled");

        Ok(SeatReconciliation {
            subject_id,
            seats: subject.golden_count,
        })
    }
}
