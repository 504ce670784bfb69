//! Service context - dependency container for services
//!
//! Holds the repositories, the fast-path store, the relay publisher and the
//! shared read path needed by services.

use std::sync::Arc;
use std::time::Duration;

use orion_common::PipelineConfig;
use orion_core::traits::{CommentRepository, FastPathStore, RelayPublisher, SubjectRepository};
use orion_core::value_objects::TtlPolicy;

use super::error::{ServiceError, ServiceResult};
use super::seat_reservation::GoldenSeatReservation;
use super::subject_reader::CacheAsideReader;

/// Service context containing all dependencies
///
/// Cloning is cheap and clones share the subject reader, so concurrent
/// reads are coalesced across every clone.
#[derive(Clone)]
pub struct ServiceContext {
    // Repositories
    subject_repo: Arc<dyn SubjectRepository>,
    comment_repo: Arc<dyn CommentRepository>,

    // Fast path and relay
    fast_path: Arc<dyn FastPathStore>,
    publisher: Arc<dyn RelayPublisher>,

    // Components
    subject_reader: CacheAsideReader,
    seat_reservation: GoldenSeatReservation,

    operation_timeout: Duration,
}

impl ServiceContext {
    /// Create a new service context with all dependencies
    pub fn new(
        subject_repo: Arc<dyn SubjectRepository>,
        comment_repo: Arc<dyn CommentRepository>,
        fast_path: Arc<dyn FastPathStore>,
        publisher: Arc<dyn RelayPublisher>,
        pipeline: &PipelineConfig,
    ) -> Self {
        let ttl = TtlPolicy::new(pipeline.cache_ttl_base(), pipeline.cache_ttl_jitter());
        let subject_reader = CacheAsideReader::new(
            Arc::clone(&fast_path),
            Arc::clone(&subject_repo),
            ttl,
            pipeline.operation_timeout(),
        );
        let seat_reservation = GoldenSeatReservation::new(
            Arc::clone(&fast_path),
            Arc::clone(&publisher),
            pipeline.golden_seat_cap,
        );

        Self {
            subject_repo,
            comment_repo,
            fast_path,
            publisher,
            subject_reader,
            seat_reservation,
            operation_timeout: pipeline.operation_timeout(),
        }
    }

    // === Repositories ===

    /// Get the subject repository
    pub fn subject_repo(&self) -> &dyn SubjectRepository {
        self.subject_repo.as_ref()
    }

    /// Get the comment repository
    pub fn comment_repo(&self) -> &dyn CommentRepository {
        self.comment_repo.as_ref()
    }

    // === Fast path and relay ===

    pub fn fast_path(&self) -> &dyn FastPathStore {
        self.fast_path.as_ref()
    }

    pub fn publisher(&self) -> &dyn RelayPublisher {
        self.publisher.as_ref()
    }

    // === Components ===

    /// Cached, coalesced subject reads
    pub fn subject_reader(&self) -> &CacheAsideReader {
        &self.subject_reader
    }

    /// Golden comment seat admission
    pub fn seat_reservation(&self) -> &GoldenSeatReservation {
        &self.seat_reservation
    }

    /// Upper bound for a single repository call
    pub fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("repositories", &"...")
            .field("fast_path", &"dyn FastPathStore")
            .field("publisher", &"dyn RelayPublisher")
            .field("golden_seat_cap", &self.seat_reservation.cap())
            .field("operation_timeout", &self.operation_timeout)
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
#[derive(Default)]
pub struct ServiceContextBuilder {
    subject_repo: Option<Arc<dyn SubjectRepository>>,
    comment_repo: Option<Arc<dyn CommentRepository>>,
    fast_path: Option<Arc<dyn FastPathStore>>,
    publisher: Option<Arc<dyn RelayPublisher>>,
    pipeline: PipelineConfig,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subject_repo(mut self, repo: Arc<dyn SubjectRepository>) -> Self {
        self.subject_repo = Some(repo);
        self
    }

    pub fn comment_repo(mut self, repo: Arc<dyn CommentRepository>) -> Self {
        self.comment_repo = Some(repo);
        self
    }

    pub fn fast_path(mut self, store: Arc<dyn FastPathStore>) -> Self {
        self.fast_path = Some(store);
        self
    }

    pub fn publisher(mut self, publisher: Arc<dyn RelayPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Seat cap, TTL policy and timeouts; defaults apply otherwise
    pub fn pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        Ok(ServiceContext::new(
            self.subject_repo
                .ok_or_else(|| ServiceError::validation("subject_repo is required"))?,
            self.comment_repo
                .ok_or_else(|| ServiceError::validation("comment_repo is required"))?,
            self.fast_path
                .ok_or_else(|| ServiceError::validation("fast_path is required"))?,
            self.publisher
                .ok_or_else(|| ServiceError::validation("publisher is required"))?,
            &self.pipeline,
        ))
    }
}
