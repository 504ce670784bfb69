//! Error handling utilities for repositories

use orion_core::error::DomainError;
use orion_core::value_objects::{CommentId, SubjectId};
use sqlx::Error as SqlxError;

/// Convert SQLx error to DomainError
pub fn map_db_error(e: SqlxError) -> DomainError {
    DomainError::DatabaseError(e.to_string())
}

/// Check for unique violation and return appropriate error or fallback
pub fn map_unique_violation<F>(e: SqlxError, on_unique: F) -> DomainError
where
    F: FnOnce() -> DomainError,
{
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return on_unique();
        }
    }
    DomainError::DatabaseError(e.to_string())
}

/// Map a foreign key violation (e.g. a like on a missing subject) to a
/// not-found error, anything else to a database error
pub fn map_foreign_key_violation<F>(e: SqlxError, on_fk: F) -> DomainError
where
    F: FnOnce() -> DomainError,
{
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_foreign_key_violation() {
            return on_fk();
        }
    }
    DomainError::DatabaseError(e.to_string())
}

/// Create a "subject not found" error
pub fn subject_not_found(id: SubjectId) -> DomainError {
    DomainError::SubjectNotFound(id)
}

/// Create a "comment not found" error
pub fn comment_not_found(id: CommentId) -> DomainError {
    DomainError::CommentNotFound(id)
}
