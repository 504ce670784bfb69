//! Comment database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for comments table
#[derive(Debug, Clone, FromRow)]
pub struct CommentModel {
    pub id: i64,
    pub subject_id: i64,
    pub author_id: i64,
    pub content: String,
    pub is_golden: bool,
    pub like_count: i64,
    pub parent_id: Option<i64>,
    pub reply_to_user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl CommentModel {
    /// Check if comment is a reply
    #[inline]
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }
}
