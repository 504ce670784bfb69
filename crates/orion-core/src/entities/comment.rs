//! Comment entity - two-level threaded comments on a subject

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::{CommentId, SubjectId, UserId};

/// Maximum comment length in characters
pub const MAX_COMMENT_LENGTH: usize = 2000;

/// Position of a comment in its thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommentThread {
    TopLevel,
    Reply {
        parent_id: CommentId,
        reply_to_user_id: UserId,
    },
}

impl CommentThread {
    /// Build from the nullable column pair; a half-set pair is rejected
    pub fn from_columns(
        parent_id: Option<CommentId>,
        reply_to_user_id: Option<UserId>,
    ) -> Result<Self, DomainError> {
        match (parent_id, reply_to_user_id) {
            (None, None) => Ok(Self::TopLevel),
            (Some(parent_id), Some(reply_to_user_id)) => Ok(Self::Reply {
                parent_id,
                reply_to_user_id,
            }),
            _ => Err(DomainError::InternalError(
                "comment row has parent_id and reply_to_user_id out of sync".to_string(),
            )),
        }
    }

    pub fn parent_id(&self) -> Option<CommentId> {
        match self {
            Self::TopLevel => None,
            Self::Reply { parent_id, .. } => Some(*parent_id),
        }
    }

    pub fn reply_to_user_id(&self) -> Option<UserId> {
        match self {
            Self::TopLevel => None,
            Self::Reply {
                reply_to_user_id, ..
            } => Some(*reply_to_user_id),
        }
    }

    #[inline]
    pub fn is_reply(&self) -> bool {
        matches!(self, Self::Reply { .. })
    }
}

/// Persisted comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub author_id: UserId,
    pub subject_id: SubjectId,
    pub content: String,
    pub is_golden: bool,
    pub like_count: i64,
    pub thread: CommentThread,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    #[inline]
    pub fn is_top_level(&self) -> bool {
        !self.thread.is_reply()
    }
}

/// A comment about to be inserted; the store assigns id and timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub author_id: UserId,
    pub subject_id: SubjectId,
    pub content: String,
    pub is_golden: bool,
    pub thread: CommentThread,
}

impl NewComment {
    /// Top-level, non-golden comment
    pub fn top_level(
        author_id: UserId,
        subject_id: SubjectId,
        content: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let content = content.into();
        validate_content(&content)?;
        Ok(Self {
            author_id,
            subject_id,
            content,
            is_golden: false,
            thread: CommentThread::TopLevel,
        })
    }

    /// Top-level golden comment, admitted through the seat reservation
    pub fn golden(
        author_id: UserId,
        subject_id: SubjectId,
        content: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let mut comment = Self::top_level(author_id, subject_id, content)?;
        comment.is_golden = true;
        Ok(comment)
    }

    /// Reply to a top-level comment. Threads are two levels deep, so
    /// replying to a reply is rejected.
    pub fn reply_to(
        author_id: UserId,
        parent: &Comment,
        content: impl Into<String>,
    ) -> Result<Self, DomainError> {
        if parent.thread.is_reply() {
            return Err(DomainError::ReplyToReply);
        }
        let content = content.into();
        validate_content(&content)?;
        Ok(Self {
            author_id,
            subject_id: parent.subject_id,
            content,
            is_golden: false,
            thread: CommentThread::Reply {
                parent_id: parent.id,
                reply_to_user_id: parent.author_id,
            },
        })
    }
}

/// Reject blank or oversized comment content
pub fn validate_content(content: &str) -> Result<(), DomainError> {
    if content.trim().is_empty() {
        return Err(DomainError::ValidationError(
            "comment content must not be blank".to_string(),
        ));
    }
    if content.chars().count() > MAX_COMMENT_LENGTH {
        return Err(DomainError::ValidationError(format!(
            "comment content exceeds {MAX_COMMENT_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persisted(id: u64, author: u64, thread: CommentThread) -> Comment {
        Comment {
            id: CommentId::new(id),
            author_id: UserId::new(author),
            subject_id: SubjectId::new(42),
            content: "first".to_string(),
            is_golden: false,
            like_count: 0,
            thread,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_top_level_comment() {
        let comment = NewComment::top_level(UserId::new(1), SubjectId::new(42), "hello").unwrap();
        assert_eq!(comment.thread, CommentThread::TopLevel);
        assert!(!comment.is_golden);
    }

    #[test]
    fn test_golden_comment() {
        let comment = NewComment::golden(UserId::new(1), SubjectId::new(42), "gold").unwrap();
        assert!(comment.is_golden);
        assert_eq!(comment.thread, CommentThread::TopLevel);
    }

    #[test]
    fn test_reply_targets_parent_author() {
        let parent = persisted(10, 3, CommentThread::TopLevel);
        let reply = NewComment::reply_to(UserId::new(8), &parent, "agreed").unwrap();

        assert_eq!(reply.subject_id, parent.subject_id);
        assert_eq!(reply.thread.parent_id(), Some(CommentId::new(10)));
        assert_eq!(reply.thread.reply_to_user_id(), Some(UserId::new(3)));
    }

    #[test]
    fn test_reply_to_reply_rejected() {
        let reply = persisted(
            11,
            8,
            CommentThread::Reply {
                parent_id: CommentId::new(10),
                reply_to_user_id: UserId::new(3),
            },
        );
        let err = NewComment::reply_to(UserId::new(9), &reply, "nested").unwrap_err();
        assert_eq!(err, DomainError::ReplyToReply);
    }

    #[test]
    fn test_content_validation() {
        assert!(validate_content("ok").is_ok());
        assert!(validate_content("   ").is_err());
        assert!(validate_content(&"x".repeat(MAX_COMMENT_LENGTH)).is_ok());
        assert!(validate_content(&"x".repeat(MAX_COMMENT_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_thread_from_columns() {
        assert_eq!(
            CommentThread::from_columns(None, None).unwrap(),
            CommentThread::TopLevel
        );
        assert!(CommentThread::from_columns(Some(CommentId::new(1)), None).is_err());
        let thread =
            CommentThread::from_columns(Some(CommentId::new(1)), Some(UserId::new(2))).unwrap();
        assert!(thread.is_reply());
    }
}
