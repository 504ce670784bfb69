//! Golden comment persistence

use tracing::{debug, instrument};

use orion_core::entities::NewComment;
use orion_core::error::DomainError;
use orion_core::events::GoldenCommentEvent;
use orion_core::traits::{RepoResult, UnitOfWork};

pub struct GoldenCommentHandler;

impl GoldenCommentHandler {
    /// Lock the subject row, insert the golden comment and write
    /// `golden_count = locked + 1`. A redelivered event fails on the golden
    /// comment uniqueness constraint and changes nothing.
    #[instrument(skip(uow, event), fields(user_id = %event.user_id, subject_id = %event.subject_id))]
    pub async fn handle<U: UnitOfWork>(uow: &U, event: GoldenCommentEvent) -> RepoResult<()> {
        let GoldenCommentEvent {
            user_id,
            subject_id,
            content,
        } = event;

        let comment = uow
            .execute(move |repos| {
                Box::pin(async move {
                    let locked = repos
                        .subjects()
                        .find_for_update(subject_id)
                        .await?
                        .ok_or(DomainError::SubjectNotFound(subject_id))?;

                    let comment = NewComment::golden(user_id, subject_id, content)?;
                    let created = repos.comments().insert(&comment).await?;

                    repos
                        .subjects()
                        .set_golden_count(subject_id, locked.golden_count + 1)
                        .await?;
                    Ok(created)
                })
            })
            .await?;

        debug!(comment_id = %comment.id, "Golden comment persisted");
        Ok(())
    }
}
