//! Domain errors - error types for the domain layer

use std::time::Duration;

use thiserror::Error;

use crate::value_objects::{CommentId, SubjectId, UserId};

/// Domain layer errors
///
/// `Clone` so a single failed fetch can be handed to every waiter of a
/// deduplicated read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Subject not found: {0}")]
    SubjectNotFound(SubjectId),

    #[error("Comment not found: {0}")]
    CommentNotFound(CommentId),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Cannot reply to a reply")]
    ReplyToReply,

    // =========================================================================
    // Idempotent Conflicts (duplicate application of an event)
    // =========================================================================
    #[error("User {user} already likes subject {subject}")]
    DuplicateLike { user: UserId, subject: SubjectId },

    #[error("User {user} already has a golden comment on subject {subject}")]
    DuplicateGoldenComment { user: UserId, subject: SubjectId },

    // =========================================================================
    // Admission Rejections (fast-path checks, surfaced to the caller)
    // =========================================================================
    #[error("Subject already liked")]
    AlreadyLiked,

    #[error("Subject not liked")]
    NotLiked,

    #[error("No golden comment seats left on subject {subject} (cap {cap})")]
    SeatFull { subject: SubjectId, cap: i64 },

    // =========================================================================
    // Pipeline Errors
    // =========================================================================
    #[error("Poison message: {0}")]
    PoisonMessage(String),

    #[error("Relay unavailable: {0}")]
    RelayUnavailable(String),

    #[error("Manual reconciliation required for subject {subject}: {reason}")]
    ReconciliationRequired { subject: SubjectId, reason: String },

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get a stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::SubjectNotFound(_) => "UNKNOWN_SUBJECT",
            Self::CommentNotFound(_) => "UNKNOWN_COMMENT",

            // Validation
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::ReplyToReply => "REPLY_TO_REPLY",

            // Conflict
            Self::DuplicateLike { .. } => "DUPLICATE_LIKE",
            Self::DuplicateGoldenComment { .. } => "DUPLICATE_GOLDEN_COMMENT",

            // Admission
            Self::AlreadyLiked => "ALREADY_LIKED",
            Self::NotLiked => "NOT_LIKED",
            Self::SeatFull { .. } => "SEAT_FULL",

            // Pipeline
            Self::PoisonMessage(_) => "POISON_MESSAGE",
            Self::RelayUnavailable(_) => "RELAY_UNAVAILABLE",
            Self::ReconciliationRequired { .. } => "RECONCILIATION_REQUIRED",

            // Infrastructure
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::CacheError(_) => "CACHE_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SubjectNotFound(_) | Self::CommentNotFound(_))
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationError(_) | Self::ReplyToReply)
    }

    /// Check if this is a uniqueness conflict, i.e. the change was already applied
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::DuplicateLike { .. } | Self::DuplicateGoldenComment { .. }
        )
    }

    /// Check if this is a fast-path admission rejection
    pub fn is_admission_rejection(&self) -> bool {
        matches!(
            self,
            Self::AlreadyLiked | Self::NotLiked | Self::SeatFull { .. }
        )
    }

    /// Check if retrying the same operation later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::DatabaseError(_)
                | Self::CacheError(_)
                | Self::Timeout(_)
                | Self::RelayUnavailable(_)
        )
    }
}
