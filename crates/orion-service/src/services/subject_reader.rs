//! Cache-aside subject reads with request coalescing
//!
//! A miss triggers at most one durable fetch per subject no matter how many
//! callers are waiting; every waiter receives the same `Arc<Subject>` or the
//! same error. Successful fetches are written back with a jittered TTL.
//! Not-found results are never cached.
//!
//! The fetch runs in its own task, so it finishes and leaves the in-flight
//! map even when every waiter has been cancelled.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, instrument, warn};

use orion_cache::keys;
use orion_common::with_timeout;
use orion_core::entities::Subject;
use orion_core::error::DomainError;
use orion_core::traits::{FastPathStore, RepoResult, SubjectRepository};
use orion_core::value_objects::{SubjectId, TtlPolicy};

type SharedFetch = Shared<BoxFuture<'static, RepoResult<Arc<Subject>>>>;

/// Deduplicated read path for subjects
#[derive(Clone)]
pub struct CacheAsideReader {
    store: Arc<dyn FastPathStore>,
    repo: Arc<dyn SubjectRepository>,
    ttl: TtlPolicy,
    timeout: Duration,
    in_flight: Arc<DashMap<SubjectId, (u64, SharedFetch)>>,
    generation: Arc<AtomicU64>,
}

impl CacheAsideReader {
    pub fn new(
        store: Arc<dyn FastPathStore>,
        repo: Arc<dyn SubjectRepository>,
        ttl: TtlPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            repo,
            ttl,
            timeout,
            in_flight: Arc::new(DashMap::new()),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Read a subject, from cache when possible
    #[instrument(skip(self))]
    pub async fn read(&self, id: SubjectId) -> RepoResult<Arc<Subject>> {
        let key = keys::subject_info(id);

        match self.store.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Subject>(&raw) {
                Ok(subject) => {
                    debug!(subject_id = %id, "Subject cache hit");
                    return Ok(Arc::new(subject));
                }
                Err(e) => warn!(subject_id = %id, error = %e, "Undecodable cache entry, treating as miss"),
            },
            Ok(None) => debug!(subject_id = %id, "Subject cache miss"),
            Err(e) => warn!(subject_id = %id, error = %e, "Cache read failed, falling back to database"),
        }

        self.load(id).await
    }

    /// Write `subject` to the cache, replacing any entry for its id.
    /// Failures are logged and otherwise ignored.
    pub async fn prime(&self, subject: &Subject) {
        write_back(self.store.as_ref(), self.ttl, subject).await;
    }

    /// Number of subjects currently being fetched
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    async fn load(&self, id: SubjectId) -> RepoResult<Arc<Subject>> {
        let fetch = match self.in_flight.entry(id) {
            Entry::Occupied(entry) => entry.get().1.clone(),
            Entry::Vacant(entry) => {
                let generation = self.generation.fetch_add(1, Ordering::Relaxed);
                let in_flight = Arc::clone(&self.in_flight);
                let task = tokio::spawn({
                    let store = Arc::clone(&self.store);
                    let repo = Arc::clone(&self.repo);
                    let (ttl, timeout) = (self.ttl, self.timeout);
                    async move {
                        let result = fetch_and_populate(store, repo, ttl, timeout, id).await;
                        // Only this fetch is removed; a newer one stays
                        in_flight.remove_if(&id, |_, (current, _)| *current == generation);
                        result
                    }
                });

                let fetch = async move {
                    task.await.map_err(|e| {
                        DomainError::InternalError(format!("subject fetch task failed: {e}"))
                    })?
                }
                .boxed()
                .shared();
                entry.insert((generation, fetch.clone()));
                fetch
            }
        };

        fetch.await
    }
}

async fn fetch_and_populate(
    store: Arc<dyn FastPathStore>,
    repo: Arc<dyn SubjectRepository>,
    ttl: TtlPolicy,
    timeout: Duration,
    id: SubjectId,
) -> RepoResult<Arc<Subject>> {
    let subject = with_timeout(timeout, repo.find_by_id(id))
        .await?
        .ok_or(DomainError::SubjectNotFound(id))?;

    write_back(store.as_ref(), ttl, &subject).await;

    Ok(Arc::new(subject))
}

async fn write_back(store: &dyn FastPathStore, ttl: TtlPolicy, subject: &Subject) {
    let key = keys::subject_info(subject.id);
    match serde_json::to_string(subject) {
        Ok(json) => {
            if let Err(e) = store.set_with_ttl(&key, &json, ttl.sample()).await {
                warn!(subject_id = %subject.id, error = %e, "Cache write-back failed");
            }
        }
        Err(e) => warn!(subject_id = %subject.id, error = %e, "Subject serialization failed, not cached"),
    }
}
