//! Like service
//!
//! Producer side of likes. Duplicate detection happens against the cached
//! liker set only; the relational store is updated later by the consumer.

use tracing::{error, info, instrument};

use orion_cache::keys;
use orion_core::error::DomainError;
use orion_core::events::{LikeAction, LikeEvent, RelayEvent};
use orion_core::value_objects::{SubjectId, UserId};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Like service
pub struct LikeService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> LikeService<'a> {
    /// Create a new LikeService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Like a subject
    #[instrument(skip(self))]
    pub async fn like(&self, user_id: UserId, subject_id: SubjectId) -> ServiceResult<()> {
        let event = RelayEvent::Like(LikeEvent::like(user_id, subject_id));
        event.validate_for_publish()?;

        // Verify subject exists
        self.ctx.subject_reader().read(subject_id).await?;

        let key = keys::subject_likers(subject_id);
        let member = user_id.to_string();

        if !self.ctx.fast_path().set_add(&key, &member).await? {
            return Err(DomainError::AlreadyLiked.into());
        }

        if let Err(e) = self.ctx.publisher().publish(&event).await {
            self.undo(subject_id, &key, &member, LikeAction::Like, &e)
                .await?;
            return Err(e.into());
        }

        info!(user_id = %user_id, subject_id = %subject_id, "Like accepted");
        Ok(())
    }

    /// Remove a like from a subject
    #[instrument(skip(self))]
    pub async fn unlike(&self, user_id: UserId, subject_id: SubjectId) -> ServiceResult<()> {
        let event = RelayEvent::Like(LikeEvent::unlike(user_id, subject_id));
        event.validate_for_publish()?;

        // Verify subject exists
        self.ctx.subject_reader().read(subject_id).await?;

        let key = keys::subject_likers(subject_id);
        let member = user_id.to_string();

        if !self.ctx.fast_path().set_remove(&key, &member).await? {
            return Err(DomainError::NotLiked.into());
        }

        if let Err(e) = self.ctx.publisher().publish(&event).await {
            self.undo(subject_id, &key, &member, LikeAction::Unlike, &e)
                .await?;
            return Err(e.into());
        }

        info!(user_id = %user_id, subject_id = %subject_id, "Unlike accepted");
        Ok(())
    }

    /// Whether the liker set currently contains the user
    #[instrument(skip(self))]
    pub async fn has_liked(&self, user_id: UserId, subject_id: SubjectId) -> ServiceResult<bool> {
        let key = keys::subject_likers(subject_id);
        Ok(self
            .ctx
            .fast_path()
            .set_contains(&key, &user_id.to_string())
            .await?)
    }

    /// Revert the liker set after a failed publish
    async fn undo(
        &self,
        subject_id: SubjectId,
        key: &str,
        member: &str,
        action: LikeAction,
        cause: &DomainError,
    ) -> ServiceResult<()> {
        let store = self.ctx.fast_path();
        let reverted = match action {
            LikeAction::Like => store.set_remove(key, member).await,
            LikeAction::Unlike => store.set_add(key, member).await,
        };

        match reverted {
            Ok(_) => {
                error!(
                    subject_id = %subject_id,
                    user_id = %member,
                    action = ?action,
                    error = %cause,
                    "Like event publish failed, liker set reverted"
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    subject_id = %subject_id,
                    user_id = %member,
                    key = %key,
                    action = ?action,
                    error = %e,
                    "Liker set compensation failed; manual reconciliation required"
                );
                Err(DomainError::ReconciliationRequired {
                    subject: subject_id,
                    reason: format!("{action:?} publish failed ({cause}); reverting {key} failed: {e}"),
                }
                .into())
            }
        }
    }
}
