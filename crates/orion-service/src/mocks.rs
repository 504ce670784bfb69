//! In-memory doubles for the pipeline ports
//!
//! Used by the unit tests of this crate and of `orion-consumer`. Each double
//! keeps the semantics the real adapters guarantee (atomic counters, set
//! membership, uniqueness constraints, commit/rollback) and supports failure
//! injection.

use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use orion_core::entities::{Comment, LikeRelation, NewComment, NewSubject, Subject};
use orion_core::error::DomainError;
use orion_core::events::{EventKind, RelayEvent};
use orion_core::traits::{
    CommentRepository, CommentTxRepository, Delivery, FastPathStore, LikeTxRepository,
    RelayConsumer, RelayPublisher, RepoResult, SubjectRepository, SubjectTxRepository, TxFuture,
    TxRepositories, UnitOfWork,
};
use orion_core::value_objects::{CommentId, SubjectId, UserId};

// ============================================================================
// Fast path
// ============================================================================

#[derive(Default)]
struct FastPathState {
    counters: HashMap<String, i64>,
    sets: HashMap<String, HashSet<String>>,
    values: HashMap<String, (String, Duration)>,
}

/// In-memory [`FastPathStore`]
#[derive(Default)]
pub struct MemoryFastPathStore {
    state: Mutex<FastPathState>,
    fail_all: AtomicBool,
    failing_ops: Mutex<HashSet<&'static str>>,
}

impl MemoryFastPathStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every operation with `CacheError`
    pub fn fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    /// Fail one operation by name (`"incr"`, `"decr"`, `"set_remove"`, ...)
    pub fn fail_op(&self, op: &'static str) {
        self.failing_ops.lock().insert(op);
    }

    pub fn counter(&self, key: &str) -> i64 {
        self.state.lock().counters.get(key).copied().unwrap_or(0)
    }

    pub fn is_member(&self, key: &str, member: &str) -> bool {
        self.state
            .lock()
            .sets
            .get(key)
            .is_some_and(|set| set.contains(member))
    }

    pub fn value_of(&self, key: &str) -> Option<String> {
        self.state.lock().values.get(key).map(|(v, _)| v.clone())
    }

    pub fn ttl_of(&self, key: &str) -> Option<Duration> {
        self.state.lock().values.get(key).map(|(_, ttl)| *ttl)
    }

    fn check(&self, op: &'static str) -> RepoResult<()> {
        if self.fail_all.load(Ordering::SeqCst) || self.failing_ops.lock().contains(op) {
            return Err(DomainError::CacheError(format!("injected {op} failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl FastPathStore for MemoryFastPathStore {
    async fn incr(&self, key: &str) -> RepoResult<i64> {
        self.check("incr")?;
        let mut state = self.state.lock();
        let value = state.counters.entry(key.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }

    async fn decr(&self, key: &str) -> RepoResult<i64> {
        self.check("decr")?;
        let mut state = self.state.lock();
        let value = state.counters.entry(key.to_string()).or_insert(0);
        *value -= 1;
        Ok(*value)
    }

    async fn set_counter(&self, key: &str, value: i64) -> RepoResult<()> {
        self.check("set_counter")?;
        self.state.lock().counters.insert(key.to_string(), value);
        Ok(())
    }

    async fn set_add(&self, key: &str, member: &str) -> RepoResult<bool> {
        self.check("set_add")?;
        Ok(self
            .state
            .lock()
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string()))
    }

    async fn set_remove(&self, key: &str, member: &str) -> RepoResult<bool> {
        self.check("set_remove")?;
        Ok(self
            .state
            .lock()
            .sets
            .get_mut(key)
            .is_some_and(|set| set.remove(member)))
    }

    async fn set_contains(&self, key: &str, member: &str) -> RepoResult<bool> {
        self.check("set_contains")?;
        Ok(self.is_member(key, member))
    }

    async fn get(&self, key: &str) -> RepoResult<Option<String>> {
        self.check("get")?;
        Ok(self.value_of(key))
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> RepoResult<()> {
        self.check("set_with_ttl")?;
        self.state
            .lock()
            .values
            .insert(key.to_string(), (value.to_string(), ttl));
        Ok(())
    }
}

// ============================================================================
// Relay
// ============================================================================

#[derive(Default)]
struct RelayState {
    next_id: u64,
    ready: HashMap<EventKind, VecDeque<Delivery>>,
    pending: Vec<Delivery>,
    published: Vec<RelayEvent>,
    acked: Vec<String>,
    discarded: Vec<String>,
    dead_lettered: Vec<Delivery>,
}

impl RelayState {
    fn enqueue(&mut self, kind: EventKind, payload: Vec<u8>) -> String {
        self.next_id += 1;
        let id = format!("{}-0", self.next_id);
        self.ready.entry(kind).or_default().push_back(Delivery {
            id: id.clone(),
            kind,
            payload,
            delivery_count: 0,
        });
        id
    }

    fn take_pending(&mut self, id: &str) -> RepoResult<Delivery> {
        let index = self
            .pending
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| DomainError::RelayUnavailable(format!("unknown delivery {id}")))?;
        Ok(self.pending.remove(index))
    }
}

/// In-memory relay. Requeued messages are redelivered on the next fetch.
#[derive(Clone, Default)]
pub struct MemoryRelay {
    state: Arc<Mutex<RelayState>>,
    fail_publish: Arc<AtomicBool>,
    fail_consumer: Arc<AtomicBool>,
}

impl MemoryRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// A consumer for the stream of `kind`
    pub fn consumer(&self, kind: EventKind) -> MemoryRelayConsumer {
        MemoryRelayConsumer {
            relay: self.clone(),
            kind,
            batch_size: 16,
        }
    }

    pub fn fail_publish(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::SeqCst);
    }

    /// Make fetch and settle calls fail, as if the connection were lost
    pub fn fail_consumer(&self, fail: bool) {
        self.fail_consumer.store(fail, Ordering::SeqCst);
    }

    /// Enqueue a raw payload, bypassing encoding
    pub fn inject_raw(&self, kind: EventKind, payload: &[u8]) -> String {
        self.state.lock().enqueue(kind, payload.to_vec())
    }

    pub fn published(&self) -> Vec<RelayEvent> {
        self.state.lock().published.clone()
    }

    pub fn acked(&self) -> Vec<String> {
        self.state.lock().acked.clone()
    }

    pub fn discarded(&self) -> Vec<String> {
        self.state.lock().discarded.clone()
    }

    pub fn dead_lettered(&self) -> Vec<Delivery> {
        self.state.lock().dead_lettered.clone()
    }

    /// Messages waiting for delivery or delivered but unsettled
    pub fn outstanding(&self) -> usize {
        let state = self.state.lock();
        state.pending.len() + state.ready.values().map(VecDeque::len).sum::<usize>()
    }
}

#[async_trait]
impl RelayPublisher for MemoryRelay {
    async fn publish(&self, event: &RelayEvent) -> RepoResult<()> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(DomainError::RelayUnavailable("injected publish failure".into()));
        }
        let payload = event.encode()?;
        let mut state = self.state.lock();
        state.enqueue(event.kind(), payload);
        state.published.push(event.clone());
        Ok(())
    }
}

/// Consumer side of [`MemoryRelay`]
pub struct MemoryRelayConsumer {
    relay: MemoryRelay,
    kind: EventKind,
    batch_size: usize,
}

impl MemoryRelayConsumer {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    fn check(&self) -> RepoResult<()> {
        if self.relay.fail_consumer.load(Ordering::SeqCst) {
            return Err(DomainError::RelayUnavailable("injected connection loss".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RelayConsumer for MemoryRelayConsumer {
    fn kind(&self) -> EventKind {
        self.kind
    }

    async fn fetch(&self) -> RepoResult<Vec<Delivery>> {
        self.check()?;
        let batch: Vec<Delivery> = {
            let mut state = self.relay.state.lock();
            let queue = state.ready.entry(self.kind).or_default();
            let take = queue.len().min(self.batch_size);
            let mut batch: Vec<Delivery> = queue.drain(..take).collect();
            for delivery in &mut batch {
                delivery.delivery_count += 1;
            }
            state.pending.extend(batch.iter().cloned());
            batch
        };
        if batch.is_empty() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        Ok(batch)
    }

    async fn ack(&self, delivery: &Delivery) -> RepoResult<()> {
        self.check()?;
        let mut state = self.relay.state.lock();
        state.take_pending(&delivery.id)?;
        state.acked.push(delivery.id.clone());
        Ok(())
    }

    async fn nack(&self, delivery: &Delivery, requeue: bool) -> RepoResult<()> {
        self.check()?;
        let mut state = self.relay.state.lock();
        let taken = state.take_pending(&delivery.id)?;
        if requeue {
            state.ready.entry(self.kind).or_default().push_back(taken);
        } else {
            state.discarded.push(taken.id);
        }
        Ok(())
    }

    async fn dead_letter(&self, delivery: &Delivery) -> RepoResult<()> {
        self.check()?;
        let mut state = self.relay.state.lock();
        let taken = state.take_pending(&delivery.id)?;
        state.dead_lettered.push(taken);
        Ok(())
    }
}

// ============================================================================
// Unit of work
// ============================================================================

#[derive(Debug, Clone, Default)]
struct Tables {
    subjects: HashMap<SubjectId, Subject>,
    likes: HashSet<(UserId, SubjectId)>,
    comments: Vec<Comment>,
    next_comment_id: u64,
}

/// Transaction-scoped view over a private copy of the tables
pub struct MemoryTx {
    tables: Tables,
}

impl TxRepositories for MemoryTx {
    fn likes(&mut self) -> &mut dyn LikeTxRepository {
        self
    }

    fn subjects(&mut self) -> &mut dyn SubjectTxRepository {
        self
    }

    fn comments(&mut self) -> &mut dyn CommentTxRepository {
        self
    }
}

impl MemoryTx {
    fn subject_mut(&mut self, id: SubjectId) -> RepoResult<&mut Subject> {
        self.tables
            .subjects
            .get_mut(&id)
            .ok_or(DomainError::SubjectNotFound(id))
    }
}

#[async_trait]
impl LikeTxRepository for MemoryTx {
    async fn insert(&mut self, relation: &LikeRelation) -> RepoResult<()> {
        let (user, subject) = (relation.user_id, relation.subject_id);
        if !self.tables.subjects.contains_key(&subject) {
            return Err(DomainError::SubjectNotFound(subject));
        }
        if !self.tables.likes.insert((user, subject)) {
            return Err(DomainError::DuplicateLike { user, subject });
        }
        Ok(())
    }

    async fn delete(&mut self, user_id: UserId, subject_id: SubjectId) -> RepoResult<bool> {
        Ok(self.tables.likes.remove(&(user_id, subject_id)))
    }
}

#[async_trait]
impl SubjectTxRepository for MemoryTx {
    async fn find_for_update(&mut self, id: SubjectId) -> RepoResult<Option<Subject>> {
        Ok(self.tables.subjects.get(&id).cloned())
    }

    async fn increment_like_count(&mut self, id: SubjectId) -> RepoResult<()> {
        self.subject_mut(id)?.like_count += 1;
        Ok(())
    }

    async fn decrement_like_count(&mut self, id: SubjectId) -> RepoResult<()> {
        let subject = self.subject_mut(id)?;
        subject.like_count = (subject.like_count - 1).max(0);
        Ok(())
    }

    async fn set_golden_count(&mut self, id: SubjectId, count: i64) -> RepoResult<()> {
        self.subject_mut(id)?.golden_count = count;
        Ok(())
    }
}

#[async_trait]
impl CommentTxRepository for MemoryTx {
    async fn insert(&mut self, comment: &NewComment) -> RepoResult<Comment> {
        let (user, subject) = (comment.author_id, comment.subject_id);
        if !self.tables.subjects.contains_key(&subject) {
            return Err(DomainError::SubjectNotFound(subject));
        }
        let duplicate = comment.is_golden
            && self
                .tables
                .comments
                .iter()
                .any(|c| c.is_golden && c.subject_id == subject && c.author_id == user);
        if duplicate {
            return Err(DomainError::DuplicateGoldenComment { user, subject });
        }

        self.tables.next_comment_id += 1;
        let created = Comment {
            id: CommentId::new(self.tables.next_comment_id),
            author_id: user,
            subject_id: subject,
            content: comment.content.clone(),
            is_golden: comment.is_golden,
            like_count: 0,
            thread: comment.thread,
            created_at: Utc::now(),
        };
        self.tables.comments.push(created.clone());
        Ok(created)
    }
}

/// In-memory [`UnitOfWork`]. Transactions are serialized; each one works on
/// a copy of the tables that replaces them only on commit.
#[derive(Default)]
pub struct MemoryUnitOfWork {
    tables: tokio::sync::Mutex<Tables>,
    injected: Mutex<VecDeque<DomainError>>,
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
}

impl MemoryUnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subjects(subjects: impl IntoIterator<Item = Subject>) -> Self {
        let tables = Tables {
            subjects: subjects.into_iter().map(|s| (s.id, s)).collect(),
            ..Tables::default()
        };
        Self {
            tables: tokio::sync::Mutex::new(tables),
            ..Self::default()
        }
    }

    /// The next `execute` calls fail with these errors, in order, before
    /// running their work
    pub fn fail_next(&self, errors: impl IntoIterator<Item = DomainError>) {
        self.injected.lock().extend(errors);
    }

    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks.load(Ordering::SeqCst)
    }

    pub async fn subject(&self, id: SubjectId) -> Option<Subject> {
        self.tables.lock().await.subjects.get(&id).cloned()
    }

    pub async fn has_like(&self, user_id: UserId, subject_id: SubjectId) -> bool {
        self.tables.lock().await.likes.contains(&(user_id, subject_id))
    }

    pub async fn like_relations(&self, subject_id: SubjectId) -> i64 {
        self.tables
            .lock()
            .await
            .likes
            .iter()
            .filter(|(_, s)| *s == subject_id)
            .count() as i64
    }

    pub async fn golden_comments(&self, subject_id: SubjectId) -> Vec<Comment> {
        self.tables
            .lock()
            .await
            .comments
            .iter()
            .filter(|c| c.is_golden && c.subject_id == subject_id)
            .cloned()
            .collect()
    }
}

impl UnitOfWork for MemoryUnitOfWork {
    fn execute<T, F>(&self, work: F) -> impl Future<Output = RepoResult<T>> + Send
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut dyn TxRepositories) -> TxFuture<'t, T> + Send,
    {
        async move {
            let injected = self.injected.lock().pop_front();
            if let Some(err) = injected {
                self.rollbacks.fetch_add(1, Ordering::SeqCst);
                return Err(err);
            }

            let mut tables = self.tables.lock().await;
            let mut tx = MemoryTx {
                tables: tables.clone(),
            };
            let result = work(&mut tx).await;

            if result.is_ok() {
                *tables = tx.tables;
                self.commits.fetch_add(1, Ordering::SeqCst);
            } else {
                self.rollbacks.fetch_add(1, Ordering::SeqCst);
            }
            result
        }
    }
}

// ============================================================================
// Read-side repositories
// ============================================================================

/// In-memory [`SubjectRepository`] that counts fetches
#[derive(Default)]
pub struct MemorySubjectRepository {
    subjects: Mutex<HashMap<SubjectId, Subject>>,
    fetches: AtomicUsize,
    delay: Option<Duration>,
}

impl MemorySubjectRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subjects(subjects: impl IntoIterator<Item = Subject>) -> Self {
        Self {
            subjects: Mutex::new(subjects.into_iter().map(|s| (s.id, s)).collect()),
            ..Self::default()
        }
    }

    /// Delay every fetch, so concurrent readers overlap
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Overwrite a stored subject
    pub fn put(&self, subject: Subject) {
        self.subjects.lock().insert(subject.id, subject);
    }
}

#[async_trait]
impl SubjectRepository for MemorySubjectRepository {
    async fn find_by_id(&self, id: SubjectId) -> RepoResult<Option<Subject>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.subjects.lock().get(&id).cloned())
    }

    async fn create(&self, subject: &NewSubject) -> RepoResult<Subject> {
        let mut subjects = self.subjects.lock();
        let next = subjects.keys().map(|id| id.into_inner()).max().unwrap_or(0) + 1;
        let mut created = Subject::new(SubjectId::new(next), subject.author_id, subject.title.clone());
        created.description = subject.description.clone();
        subjects.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_latest(&self, limit: i64) -> RepoResult<Vec<Subject>> {
        let limit = usize::try_from(limit.max(0)).unwrap_or(0);
        let mut latest: Vec<Subject> = self.subjects.lock().values().cloned().collect();
        latest.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        latest.truncate(limit);
        Ok(latest)
    }
}

/// In-memory [`CommentRepository`]
#[derive(Default)]
pub struct MemoryCommentRepository {
    comments: Mutex<Vec<Comment>>,
    next_id: AtomicU64,
}

impl MemoryCommentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.comments.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CommentRepository for MemoryCommentRepository {
    async fn find_by_id(&self, id: CommentId) -> RepoResult<Option<Comment>> {
        Ok(self.comments.lock().iter().find(|c| c.id == id).cloned())
    }

    async fn create(&self, comment: &NewComment) -> RepoResult<Comment> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let created = Comment {
            id: CommentId::new(id),
            author_id: comment.author_id,
            subject_id: comment.subject_id,
            content: comment.content.clone(),
            is_golden: comment.is_golden,
            like_count: 0,
            thread: comment.thread,
            created_at: Utc::now(),
        };
        self.comments.lock().push(created.clone());
        Ok(created)
    }

    async fn find_top_level(
        &self,
        subject_id: SubjectId,
        offset: i64,
        limit: i64,
    ) -> RepoResult<Vec<Comment>> {
        let offset = usize::try_from(offset.max(0)).unwrap_or(0);
        let limit = usize::try_from(limit.clamp(1, 100)).unwrap_or(1);

        let mut top: Vec<Comment> = self
            .comments
            .lock()
            .iter()
            .filter(|c| c.subject_id == subject_id && c.is_top_level())
            .cloned()
            .collect();
        top.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(top.into_iter().skip(offset).take(limit).collect())
    }

    async fn find_replies(&self, parent_ids: &[CommentId]) -> RepoResult<Vec<Comment>> {
        let mut replies: Vec<Comment> = self
            .comments
            .lock()
            .iter()
            .filter(|c| c.thread.parent_id().is_some_and(|p| parent_ids.contains(&p)))
            .cloned()
            .collect();
        replies.sort_by_key(|c| (c.created_at, c.id));
        Ok(replies)
    }
}
