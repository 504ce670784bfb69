//! Like relation - a persisted fact that a user likes a subject

use chrono::{DateTime, Utc};

use crate::value_objects::{SubjectId, UserId};

/// At most one row exists per (user, subject) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeRelation {
    pub user_id: UserId,
    pub subject_id: SubjectId,
    pub created_at: DateTime<Utc>,
}

impl LikeRelation {
    pub fn new(user_id: UserId, subject_id: SubjectId) -> Self {
        Self {
            user_id,
            subject_id,
            created_at: Utc::now(),
        }
    }
}
