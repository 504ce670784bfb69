//! Subject database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for subjects table
#[derive(Debug, Clone, FromRow)]
pub struct SubjectModel {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub like_count: i64,
    pub golden_count: i64,
    pub created_at: DateTime<Utc>,
}
