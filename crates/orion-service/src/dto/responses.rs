//! Response DTOs
//!
//! All response DTOs implement `Serialize` for JSON output.
//! IDs are serialized as strings for JavaScript compatibility.

use chrono::{DateTime, Utc};
use serde::Serialize;

// ============================================================================
// Subject Responses
// ============================================================================

/// Subject with its denormalized counters
#[derive(Debug, Clone, Serialize)]
pub struct SubjectResponse {
    pub id: String,
    pub author_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub like_count: i64,
    pub golden_count: i64,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Comment Responses
// ============================================================================

/// Comment; top-level comments carry their replies
#[derive(Debug, Clone, Serialize)]
pub struct CommentResponse {
    pub id: String,
    pub subject_id: String,
    pub author_id: String,
    pub content: String,
    pub is_golden: bool,
    pub like_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<CommentResponse>,
}

/// One page of threaded comments
#[derive(Debug, Clone, Serialize)]
pub struct CommentPage {
    pub comments: Vec<CommentResponse>,
    pub page: i64,
    pub page_size: i64,
}

/// Golden comment accepted for asynchronous persistence; it has no id yet
#[derive(Debug, Clone, Serialize)]
pub struct PendingGoldenCommentResponse {
    pub subject_id: String,
    pub author_id: String,
    pub content: String,
    pub is_golden: bool,
    /// Seat counter value observed at admission
    pub seat: i64,
}
