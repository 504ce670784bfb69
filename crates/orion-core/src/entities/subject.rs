//! Subject entity - the content being liked and commented on

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::{SubjectId, UserId};

/// Maximum subject title length in characters
pub const MAX_TITLE_LENGTH: usize = 200;

/// Subject aggregate
///
/// `like_count` and `golden_count` are denormalized; once the relay drains
/// they equal the number of persisted like relations and golden comments.
/// Serializable because the read path caches it as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub author_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub like_count: i64,
    pub golden_count: i64,
    pub created_at: DateTime<Utc>,
}

impl Subject {
    /// Create a new Subject with zeroed counters
    pub fn new(id: SubjectId, author_id: UserId, title: String) -> Self {
        Self {
            id,
            author_id,
            title,
            description: None,
            like_count: 0,
            golden_count: 0,
            created_at: Utc::now(),
        }
    }

    /// Set the description (builder style)
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[inline]
    pub fn is_author(&self, user_id: UserId) -> bool {
        self.author_id == user_id
    }
}

/// Subject to be inserted; the id and the counters are assigned by storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubject {
    pub author_id: UserId,
    pub title: String,
    pub description: Option<String>,
}

impl NewSubject {
    /// Validate and build. The title is trimmed; a blank description is
    /// stored as none.
    pub fn new(
        author_id: UserId,
        title: impl Into<String>,
        description: Option<String>,
    ) -> Result<Self, DomainError> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(DomainError::ValidationError("Title cannot be blank".to_string()));
        }
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(DomainError::ValidationError(format!(
                "Title exceeds {MAX_TITLE_LENGTH} characters"
            )));
        }

        Ok(Self {
            author_id,
            title,
            description: description.filter(|d| !d.trim().is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_creation() {
        let subject = Subject::new(SubjectId::new(42), UserId::new(1), "Launch".to_string());
        assert_eq!(subject.id, SubjectId::new(42));
        assert_eq!(subject.like_count, 0);
        assert_eq!(subject.golden_count, 0);
        assert!(subject.description.is_none());
        assert!(subject.is_author(UserId::new(1)));
    }

    #[test]
    fn test_json_round_trip_preserves_counters() {
        let mut subject = Subject::new(SubjectId::new(5), UserId::new(2), "Clip".to_string())
            .with_description("a short clip");
        subject.like_count = 12;
        subject.golden_count = 3;

        let json = serde_json::to_string(&subject).unwrap();
        let decoded: Subject = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, subject);
    }

    #[test]
    fn test_new_subject_trims_title() {
        let subject = NewSubject::new(UserId::new(3), "  Launch day ", Some("  ".to_string())).unwrap();
        assert_eq!(subject.title, "Launch day");
        assert!(subject.description.is_none());
    }

    #[test]
    fn test_new_subject_title_bounds() {
        assert!(NewSubject::new(UserId::new(3), "   ", None).is_err());
        assert!(NewSubject::new(UserId::new(3), "x".repeat(MAX_TITLE_LENGTH), None).is_ok());
        let err = NewSubject::new(UserId::new(3), "x".repeat(MAX_TITLE_LENGTH + 1), None).unwrap_err();
        assert!(err.is_validation());
    }
}
