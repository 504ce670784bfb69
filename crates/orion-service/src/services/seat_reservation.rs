//! Golden comment seat admission
//!
//! A reservation moves `Idle -> Reserved -> {Committed | RolledBack}`. The
//! `Reserved` state is the [`ReservedSeat`] value; publishing or releasing
//! consumes it, so a seat is settled at most once.
//!
//! Before a seat is taken the author is claimed with `SADD` on the subject's
//! golden author set. A second claim by the same author is rejected with
//! `DuplicateGoldenComment` and takes no seat, so every seat maps to at most
//! one persistable comment.
//!
//! The seat counter is only a soft cap: it is never read-modify-written,
//! only moved with `INCR`/`DECR`. Rolling back undoes both the seat and the
//! author claim. If either undo fails the caller gets
//! [`DomainError::ReconciliationRequired`].

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use orion_cache::keys;
use orion_core::error::DomainError;
use orion_core::events::{GoldenCommentEvent, RelayEvent};
use orion_core::traits::{FastPathStore, RelayPublisher, RepoResult};
use orion_core::value_objects::{SubjectId, UserId};

/// Seat reservation against a per-subject cap
#[derive(Clone)]
pub struct GoldenSeatReservation {
    store: Arc<dyn FastPathStore>,
    publisher: Arc<dyn RelayPublisher>,
    cap: i64,
}

impl GoldenSeatReservation {
    pub fn new(store: Arc<dyn FastPathStore>, publisher: Arc<dyn RelayPublisher>, cap: i64) -> Self {
        Self {
            store,
            publisher,
            cap,
        }
    }

    pub fn cap(&self) -> i64 {
        self.cap
    }

    /// Claim `author_id` on `subject_id` and take one seat.
    ///
    /// Fails with `DuplicateGoldenComment` if the author already holds a
    /// seat, and with `SeatFull` at the cap.
    #[instrument(skip(self))]
    pub async fn reserve(&self, subject_id: SubjectId, author_id: UserId) -> RepoResult<ReservedSeat> {
        let claim = Claim {
            subject_id,
            author_id,
            seats_key: keys::golden_seats(subject_id),
            authors_key: keys::golden_authors(subject_id),
        };

        if !self
            .store
            .set_add(&claim.authors_key, &author_id.to_string())
            .await?
        {
            debug!(subject_id = %subject_id, author_id = %author_id, "Golden comment already admitted for author");
            return Err(DomainError::DuplicateGoldenComment {
                user: author_id,
                subject: subject_id,
            });
        }

        let seat = match self.store.incr(&claim.seats_key).await {
            Ok(seat) => seat,
            Err(e) => {
                claim
                    .undo(self.store.as_ref(), false, "seat counter unavailable")
                    .await?;
                return Err(e);
            }
        };

        if seat > self.cap {
            claim
                .undo(self.store.as_ref(), true, "seat cap exceeded")
                .await?;
            debug!(subject_id = %subject_id, seat, cap = self.cap, "Golden seat rejected");
            return Err(DomainError::SeatFull {
                subject: subject_id,
                cap: self.cap,
            });
        }

        debug!(subject_id = %subject_id, author_id = %author_id, seat, "Golden seat reserved");
        Ok(ReservedSeat {
            store: Arc::clone(&self.store),
            publisher: Arc::clone(&self.publisher),
            claim,
            seat,
            settled: false,
        })
    }

    /// Reserve a seat and publish the event for it
    #[instrument(skip(self, event), fields(subject_id = %event.subject_id, user_id = %event.user_id))]
    pub async fn admit(&self, event: GoldenCommentEvent) -> RepoResult<()> {
        RelayEvent::GoldenComment(event.clone()).validate_for_publish()?;
        let seat = self.reserve(event.subject_id, event.user_id).await?;
        seat.publish(event).await
    }
}

/// Keys touched by one admission
struct Claim {
    subject_id: SubjectId,
    author_id: UserId,
    seats_key: String,
    authors_key: String,
}

impl Claim {
    /// Drop the author claim and, if `seat_taken`, give the seat back.
    /// Both undos are attempted even when the first one fails.
    async fn undo(&self, store: &dyn FastPathStore, seat_taken: bool, cause: &str) -> RepoResult<()> {
        let mut failures = Vec::new();

        if seat_taken {
            if let Err(e) = store.decr(&self.seats_key).await {
                failures.push(format!("DECR {} failed: {e}", self.seats_key));
            }
        }
        if let Err(e) = store
            .set_remove(&self.authors_key, &self.author_id.to_string())
            .await
        {
            failures.push(format!("SREM {} failed: {e}", self.authors_key));
        }

        if failures.is_empty() {
            return Ok(());
        }

        let failures = failures.join("; ");
        error!(
            subject_id = %self.subject_id,
            author_id = %self.author_id,
            cause = %cause,
            failures = %failures,
            "Seat compensation failed; manual reconciliation required"
        );
        Err(DomainError::ReconciliationRequired {
            subject: self.subject_id,
            reason: format!("{cause}; {failures}"),
        })
    }
}

/// A seat taken but not yet settled
#[must_use = "a reserved seat must be published or released"]
pub struct ReservedSeat {
    store: Arc<dyn FastPathStore>,
    publisher: Arc<dyn RelayPublisher>,
    claim: Claim,
    seat: i64,
    settled: bool,
}

impl std::fmt::Debug for ReservedSeat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReservedSeat")
            .field("subject_id", &self.claim.subject_id)
            .field("author_id", &self.claim.author_id)
            .field("seat", &self.seat)
            .field("settled", &self.settled)
            .finish()
    }
}

impl ReservedSeat {
    pub fn subject_id(&self) -> SubjectId {
        self.claim.subject_id
    }

    pub fn author_id(&self) -> UserId {
        self.claim.author_id
    }

    /// Counter value observed when the seat was taken
    pub fn seat(&self) -> i64 {
        self.seat
    }

    /// Publish the golden comment for this seat. On relay failure the seat
    /// and the author claim are returned and the error is `RelayUnavailable`.
    pub async fn publish(mut self, event: GoldenCommentEvent) -> RepoResult<()> {
        self.settled = true;
        let (subject_id, author_id) = (self.claim.subject_id, self.claim.author_id);

        if event.subject_id != subject_id || event.user_id != author_id {
            self.claim
                .undo(self.store.as_ref(), true, "event does not match reservation")
                .await?;
            return Err(DomainError::InternalError(format!(
                "seat for user {author_id} on subject {subject_id} used by user {} on subject {}",
                event.user_id, event.subject_id
            )));
        }

        let event = RelayEvent::GoldenComment(event);
        if let Err(e) = self.publisher.publish(&event).await {
            let cause = format!("golden comment publish failed: {e}");
            self.claim.undo(self.store.as_ref(), true, &cause).await?;
            error!(
                subject_id = %subject_id,
                user_id = %author_id,
                error = %e,
                "Golden comment publish failed after seat reservation, seat returned"
            );
            return Err(match e {
                DomainError::RelayUnavailable(_) => e,
                other => DomainError::RelayUnavailable(other.to_string()),
            });
        }

        info!(subject_id = %subject_id, user_id = %author_id, seat = self.seat, "Golden comment admitted");
        Ok(())
    }

    /// Give the seat and the author claim back without publishing
    pub async fn release(mut self) -> RepoResult<()> {
        self.settled = true;
        self.claim
            .undo(self.store.as_ref(), true, "seat released")
            .await
    }
}

impl Drop for ReservedSeat {
    fn drop(&mut self) {
        if !self.settled {
            warn!(
                subject_id = %self.claim.subject_id,
                author_id = %self.claim.author_id,
                key = %self.claim.seats_key,
                "Reserved golden seat dropped without publish or release; counter needs reconciliation"
            );
        }
    }
}
