//! Test fixtures and data generators
//!
//! Provides unique ids and request bodies for integration tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use orion_core::entities::NewSubject;
use orion_core::value_objects::{SubjectId, UserId};
use orion_service::dto::{CreateCommentRequest, CreateGoldenCommentRequest};

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Id unlikely to collide with previous runs against the same database
pub fn unique_id() -> u64 {
    let micros = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or_default();
    micros * 1000 + unique_suffix() % 1000
}

pub fn unique_user() -> UserId {
    UserId::new(unique_id())
}

/// Subject id that no stored subject has
pub fn missing_subject() -> SubjectId {
    SubjectId::new(unique_id())
}

/// Fresh subject by a fresh author
pub fn new_subject() -> NewSubject {
    NewSubject {
        author_id: unique_user(),
        title: format!("Integration subject {}", unique_suffix()),
        description: None,
    }
}

pub fn comment_request(content: &str) -> CreateCommentRequest {
    CreateCommentRequest {
        content: content.to_string(),
    }
}

pub fn golden_request(content: &str) -> CreateGoldenCommentRequest {
    CreateGoldenCommentRequest {
        content: content.to_string(),
    }
}
