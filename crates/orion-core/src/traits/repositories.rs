//! Repository traits (ports) - define the interface for data access
//!
//! Pool-level repositories serve reads and non-pipelined writes. The `*Tx`
//! repositories are only reachable through [`UnitOfWork::execute`] and act on
//! the transaction the unit of work owns.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::entities::{Comment, LikeRelation, NewComment, NewSubject, Subject};
use crate::error::DomainError;
use crate::value_objects::{CommentId, SubjectId, UserId};

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Subject Repository
// ============================================================================

#[async_trait]
pub trait SubjectRepository: Send + Sync {
    /// Find subject by ID
    async fn find_by_id(&self, id: SubjectId) -> RepoResult<Option<Subject>>;

    /// Insert a subject and return it with its assigned id
    async fn create(&self, subject: &NewSubject) -> RepoResult<Subject>;

    /// Most recent subjects, newest first
    async fn find_latest(&self, limit: i64) -> RepoResult<Vec<Subject>>;
}

// ============================================================================
// Comment Repository
// ============================================================================

#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Find comment by ID
    async fn find_by_id(&self, id: CommentId) -> RepoResult<Option<Comment>>;

    /// Insert a non-golden comment and return it with its assigned id
    async fn create(&self, comment: &NewComment) -> RepoResult<Comment>;

    /// Top-level comments of a subject, newest first
    async fn find_top_level(
        &self,
        subject_id: SubjectId,
        offset: i64,
        limit: i64,
    ) -> RepoResult<Vec<Comment>>;

    /// Replies to any of the given parents, oldest first
    async fn find_replies(&self, parent_ids: &[CommentId]) -> RepoResult<Vec<Comment>>;
}

// ============================================================================
// Transaction-scoped repositories
// ============================================================================

#[async_trait]
pub trait LikeTxRepository: Send {
    /// Insert a relation. A second insert for the same pair fails with
    /// `DomainError::DuplicateLike`.
    async fn insert(&mut self, relation: &LikeRelation) -> RepoResult<()>;

    /// Delete a relation; returns whether a row was removed
    async fn delete(&mut self, user_id: UserId, subject_id: SubjectId) -> RepoResult<bool>;
}

#[async_trait]
pub trait SubjectTxRepository: Send {
    /// Lock the subject row for the rest of the transaction
    async fn find_for_update(&mut self, id: SubjectId) -> RepoResult<Option<Subject>>;

    /// `like_count = like_count + 1`
    async fn increment_like_count(&mut self, id: SubjectId) -> RepoResult<()>;

    /// `like_count = like_count - 1`, never below zero
    async fn decrement_like_count(&mut self, id: SubjectId) -> RepoResult<()>;

    /// Write the golden count computed from the locked row
    async fn set_golden_count(&mut self, id: SubjectId, count: i64) -> RepoResult<()>;
}

#[async_trait]
pub trait CommentTxRepository: Send {
    /// Insert a comment. A second golden comment by the same author on the
    /// same subject fails with `DomainError::DuplicateGoldenComment`.
    async fn insert(&mut self, comment: &NewComment) -> RepoResult<Comment>;
}

/// Repositories bound to one open transaction
pub trait TxRepositories: Send {
    fn likes(&mut self) -> &mut dyn LikeTxRepository;
    fn subjects(&mut self) -> &mut dyn SubjectTxRepository;
    fn comments(&mut self) -> &mut dyn CommentTxRepository;
}

/// Future returned by a unit of work body; borrows the transaction for `'t`
pub type TxFuture<'t, T> = Pin<Box<dyn Future<Output = RepoResult<T>> + Send + 't>>;

// ============================================================================
// Unit of Work
// ============================================================================

/// Runs a mutation inside one atomic transaction.
///
/// Commits when `work` returns `Ok`, rolls back and returns the error
/// unchanged when it returns `Err`. A dropped or panicking body drops the
/// transaction, which rolls it back.
pub trait UnitOfWork: Send + Sync {
    fn execute<T, F>(&self, work: F) -> impl Future<Output = RepoResult<T>> + Send
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut dyn TxRepositories) -> TxFuture<'t, T> + Send;
}
