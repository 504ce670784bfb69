//! Like / unlike application

use tracing::{debug, instrument};

use orion_core::entities::LikeRelation;
use orion_core::events::{LikeAction, LikeEvent};
use orion_core::traits::{RepoResult, UnitOfWork};

pub struct LikeHandler;

impl LikeHandler {
    /// Like: insert the relation and bump the counter. Unlike: delete the
    /// relation and decrement only if a row was removed, so the counter
    /// keeps matching the relation count under redelivery.
    #[instrument(skip(uow), fields(user_id = %event.user_id, subject_id = %event.subject_id, action = ?event.action))]
    pub async fn handle<U: UnitOfWork>(uow: &U, event: LikeEvent) -> RepoResult<()> {
        let LikeEvent {
            user_id,
            subject_id,
            action,
        } = event;

        match action {
            LikeAction::Like => {
                uow.execute(move |repos| {
                    Box::pin(async move {
                        repos
                            .likes()
                            .insert(&LikeRelation::new(user_id, subject_id))
                            .await?;
                        repos.subjects().increment_like_count(subject_id).await
                    })
                })
                .await?;
                debug!("Like applied");
            }
            LikeAction::Unlike => {
                let removed = uow
                    .execute(move |repos| {
                        Box::pin(async move {
                            let removed = repos.likes().delete(user_id, subject_id).await?;
                            if removed {
                                repos.subjects().decrement_like_count(subject_id).await?;
                            }
                            Ok(removed)
                        })
                    })
                    .await?;
                debug!(removed, "Unlike applied");
            }
        }

        Ok(())
    }
}
