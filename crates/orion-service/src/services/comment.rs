//! Comment service
//!
//! Handles regular comments (top-level and replies), threaded listing, and
//! the golden comment entry point. Regular comments are written directly;
//! golden comments go through seat admission and are persisted by the
//! consumer.

use tracing::{info, instrument};
use validator::Validate;

use orion_common::with_timeout;
use orion_core::entities::NewComment;
use orion_core::error::DomainError;
use orion_core::events::{GoldenCommentEvent, RelayEvent};
use orion_core::value_objects::{CommentId, SubjectId, UserId};

use crate::dto::{
    thread_comments, CommentPage, CommentResponse, CreateCommentRequest,
    CreateGoldenCommentRequest, ListCommentsQuery, PendingGoldenCommentResponse,
};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Comment service
pub struct CommentService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> CommentService<'a> {
    /// Create a new CommentService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create a top-level comment
    #[instrument(skip(self, request))]
    pub async fn create_comment(
        &self,
        author_id: UserId,
        subject_id: SubjectId,
        request: CreateCommentRequest,
    ) -> ServiceResult<CommentResponse> {
        request
            .validate()
            .map_err(|e| ServiceError::validation(e.to_string()))?;

        // Verify subject exists
        self.ctx.subject_reader().read(subject_id).await?;

        let comment = NewComment::top_level(author_id, subject_id, request.content)?;
        let created = with_timeout(
            self.ctx.operation_timeout(),
            self.ctx.comment_repo().create(&comment),
        )
        .await?;

        info!(
            comment_id = %created.id,
            subject_id = %subject_id,
            author_id = %author_id,
            "Comment created"
        );

        Ok(CommentResponse::from(created))
    }

    /// Reply to a top-level comment
    #[instrument(skip(self, request))]
    pub async fn create_reply(
        &self,
        author_id: UserId,
        parent_id: CommentId,
        request: CreateCommentRequest,
    ) -> ServiceResult<CommentResponse> {
        request
            .validate()
            .map_err(|e| ServiceError::validation(e.to_string()))?;

        let parent = with_timeout(
            self.ctx.operation_timeout(),
            self.ctx.comment_repo().find_by_id(parent_id),
        )
        .await?
        .ok_or(DomainError::CommentNotFound(parent_id))?;

        let reply = NewComment::reply_to(author_id, &parent, request.content)?;
        let created = with_timeout(
            self.ctx.operation_timeout(),
            self.ctx.comment_repo().create(&reply),
        )
        .await?;

        info!(
            comment_id = %created.id,
            parent_id = %parent_id,
            author_id = %author_id,
            "Reply created"
        );

        Ok(CommentResponse::from(created))
    }

    /// One page of top-level comments, newest first, each with its replies
    #[instrument(skip(self))]
    pub async fn list_comments(
        &self,
        subject_id: SubjectId,
        query: ListCommentsQuery,
    ) -> ServiceResult<CommentPage> {
        query
            .validate()
            .map_err(|e| ServiceError::validation(e.to_string()))?;

        let repo = self.ctx.comment_repo();
        let timeout = self.ctx.operation_timeout();

        let top_level = with_timeout(
            timeout,
            repo.find_top_level(subject_id, query.offset(), query.page_size),
        )
        .await?;

        let comments = if top_level.is_empty() {
            Vec::new()
        } else {
            let parent_ids: Vec<CommentId> = top_level.iter().map(|c| c.id).collect();
            let replies = with_timeout(timeout, repo.find_replies(&parent_ids)).await?;
            thread_comments(&top_level, &replies)
        };

        Ok(CommentPage {
            comments,
            page: query.page,
            page_size: query.page_size,
        })
    }

    /// Admit a golden comment. The comment is persisted asynchronously, so
    /// the response carries no id.
    #[instrument(skip(self, request))]
    pub async fn create_golden_comment(
        &self,
        author_id: UserId,
        subject_id: SubjectId,
        request: CreateGoldenCommentRequest,
    ) -> ServiceResult<PendingGoldenCommentResponse> {
        request
            .validate()
            .map_err(|e| ServiceError::validation(e.to_string()))?;

        // Verify subject exists
        self.ctx.subject_reader().read(subject_id).await?;

        let event = GoldenCommentEvent::new(author_id, subject_id, request.content);
        RelayEvent::GoldenComment(event.clone()).validate_for_publish()?;

        let reservation = self.ctx.seat_reservation();
        let seat = reservation.reserve(subject_id, author_id).await?;
        let seat_number = seat.seat();
        seat.publish(event.clone()).await?;

        Ok(PendingGoldenCommentResponse {
            subject_id: subject_id.to_string(),
            author_id: author_id.to_string(),
            content: event.content,
            is_golden: true,
            seat: seat_number,
        })
    }
}
