//! Comment entity <-> model mapper

use orion_core::entities::{Comment, CommentThread, NewComment};
use orion_core::error::DomainError;
use orion_core::value_objects::{CommentId, SubjectId, UserId};

use crate::models::CommentModel;

/// Convert CommentModel to Comment entity
///
/// Fails when the thread columns are half set, which the table's CHECK
/// constraint rules out.
impl TryFrom<CommentModel> for Comment {
    type Error = DomainError;

    fn try_from(model: CommentModel) -> Result<Self, Self::Error> {
        let thread = CommentThread::from_columns(
            model.parent_id.map(CommentId::from_db),
            model.reply_to_user_id.map(UserId::from_db),
        )?;

        Ok(Comment {
            id: CommentId::from_db(model.id),
            author_id: UserId::from_db(model.author_id),
            subject_id: SubjectId::from_db(model.subject_id),
            content: model.content,
            is_golden: model.is_golden,
            like_count: model.like_count,
            thread,
            created_at: model.created_at,
        })
    }
}

/// Map a batch of rows, failing on the first malformed one
pub fn comments_from_models(models: Vec<CommentModel>) -> Result<Vec<Comment>, DomainError> {
    models.into_iter().map(Comment::try_from).collect()
}

/// NewComment values for database insertion
pub struct CommentInsert<'a> {
    pub subject_id: i64,
    pub author_id: i64,
    pub content: &'a str,
    pub is_golden: bool,
    pub parent_id: Option<i64>,
    pub reply_to_user_id: Option<i64>,
}

impl<'a> CommentInsert<'a> {
    pub fn new(comment: &'a NewComment) -> Self {
        Self {
            subject_id: comment.subject_id.to_db(),
            author_id: comment.author_id.to_db(),
            content: &comment.content,
            is_golden: comment.is_golden,
            parent_id: comment.thread.parent_id().map(CommentId::to_db),
            reply_to_user_id: comment.thread.reply_to_user_id().map(UserId::to_db),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn model(parent_id: Option<i64>, reply_to_user_id: Option<i64>) -> CommentModel {
        CommentModel {
            id: 11,
            subject_id: 42,
            author_id: 8,
            content: "hi".to_string(),
            is_golden: false,
            like_count: 0,
            parent_id,
            reply_to_user_id,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_top_level_row() {
        let comment = Comment::try_from(model(None, None)).unwrap();
        assert_eq!(comment.thread, CommentThread::TopLevel);
        assert_eq!(comment.subject_id, SubjectId::new(42));
    }

    #[test]
    fn test_reply_row() {
        let comment = Comment::try_from(model(Some(10), Some(3))).unwrap();
        assert_eq!(comment.thread.parent_id(), Some(CommentId::new(10)));
        assert_eq!(comment.thread.reply_to_user_id(), Some(UserId::new(3)));
    }

    #[test]
    fn test_half_set_row_rejected() {
        assert!(Comment::try_from(model(Some(10), None)).is_err());
    }

    #[test]
    fn test_insert_values_for_reply() {
        let parent = Comment::try_from(model(None, None)).unwrap();
        let reply = NewComment::reply_to(UserId::new(9), &parent, "yes").unwrap();
        let insert = CommentInsert::new(&reply);
        assert_eq!(insert.parent_id, Some(11));
        assert_eq!(insert.reply_to_user_id, Some(8));
        assert!(!insert.is_golden);
    }
}
