//! Entity to DTO mappers
//!
//! Implements `From` conversions from domain entities to response DTOs.

use std::collections::HashMap;

use orion_core::entities::{Comment, Subject};
use orion_core::value_objects::CommentId;

use super::responses::{CommentResponse, SubjectResponse};

// ============================================================================
// Subject Mappers
// ============================================================================

impl From<&Subject> for SubjectResponse {
    fn from(subject: &Subject) -> Self {
        Self {
            id: subject.id.to_string(),
            author_id: subject.author_id.to_string(),
            title: subject.title.clone(),
            description: subject.description.clone(),
            like_count: subject.like_count,
            golden_count: subject.golden_count,
            created_at: subject.created_at,
        }
    }
}

// ============================================================================
// Comment Mappers
// ============================================================================

impl From<&Comment> for CommentResponse {
    fn from(comment: &Comment) -> Self {
        Self {
            id: comment.id.to_string(),
            subject_id: comment.subject_id.to_string(),
            author_id: comment.author_id.to_string(),
            content: comment.content.clone(),
            is_golden: comment.is_golden,
            like_count: comment.like_count,
            parent_id: comment.thread.parent_id().map(|id| id.to_string()),
            reply_to_user_id: comment.thread.reply_to_user_id().map(|id| id.to_string()),
            created_at: comment.created_at,
            replies: Vec::new(),
        }
    }
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self::from(&comment)
    }
}

/// Attach replies to their parents, keeping the order of both lists.
/// Replies whose parent is not in `top_level` are dropped.
pub fn thread_comments(top_level: &[Comment], replies: &[Comment]) -> Vec<CommentResponse> {
    let mut by_parent: HashMap<CommentId, Vec<CommentResponse>> = HashMap::new();
    for reply in replies {
        if let Some(parent_id) = reply.thread.parent_id() {
            by_parent
                .entry(parent_id)
                .or_default()
                .push(CommentResponse::from(reply));
        }
    }

    top_level
        .iter()
        .map(|comment| {
            let mut response = CommentResponse::from(comment);
            response.replies = by_parent.remove(&comment.id).unwrap_or_default();
            response
        })
        .collect()
}
