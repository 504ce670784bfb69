//! PostgreSQL implementation of LikeTxRepository

use async_trait::async_trait;
use tracing::instrument;

use orion_core::entities::LikeRelation;
use orion_core::error::DomainError;
use orion_core::traits::{LikeTxRepository, RepoResult};
use orion_core::value_objects::{SubjectId, UserId};

use super::error::{map_db_error, map_foreign_key_violation, map_unique_violation, subject_not_found};
use super::unit_of_work::PgTxRepositories;

#[async_trait]
impl LikeTxRepository for PgTxRepositories {
    #[instrument(skip(self, relation), fields(user_id = %relation.user_id, subject_id = %relation.subject_id))]
    async fn insert(&mut self, relation: &LikeRelation) -> RepoResult<()> {
        let user = relation.user_id;
        let subject = relation.subject_id;

        sqlx::query(
            r#"
            INSERT INTO likes (user_id, subject_id, created_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user.to_db())
        .bind(subject.to_db())
        .bind(relation.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            let is_fk = e
                .as_database_error()
                .is_some_and(|db| db.is_foreign_key_violation());
            if is_fk {
                map_foreign_key_violation(e, || subject_not_found(subject))
            } else {
                map_unique_violation(e, || DomainError::DuplicateLike { user, subject })
            }
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&mut self, user_id: UserId, subject_id: SubjectId) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM likes WHERE user_id = $1 AND subject_id = $2
            "#,
        )
        .bind(user_id.to_db())
        .bind(subject_id.to_db())
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }
}
