//! PostgreSQL implementation of SubjectRepository and SubjectTxRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use orion_core::entities::{NewSubject, Subject};
use orion_core::traits::{RepoResult, SubjectRepository, SubjectTxRepository};
use orion_core::value_objects::SubjectId;

use crate::mappers::SubjectInsert;
use crate::models::SubjectModel;

use super::error::{map_db_error, subject_not_found};
use super::unit_of_work::PgTxRepositories;

/// PostgreSQL implementation of SubjectRepository
#[derive(Clone)]
pub struct PgSubjectRepository {
    pool: PgPool,
}

impl PgSubjectRepository {
    /// Create a new PgSubjectRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubjectRepository for PgSubjectRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: SubjectId) -> RepoResult<Option<Subject>> {
        let result = sqlx::query_as::<_, SubjectModel>(
            r#"
            SELECT id, author_id, title, description, like_count, golden_count, created_at
            FROM subjects
            WHERE id = $1
            "#,
        )
        .bind(id.to_db())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Subject::from))
    }

    #[instrument(skip(self, subject), fields(author_id = %subject.author_id))]
    async fn create(&self, subject: &NewSubject) -> RepoResult<Subject> {
        let insert = SubjectInsert::new(subject);

        let created = sqlx::query_as::<_, SubjectModel>(
            r#"
            INSERT INTO subjects (author_id, title, description)
            VALUES ($1, $2, $3)
            RETURNING id, author_id, title, description, like_count, golden_count, created_at
            "#,
        )
        .bind(insert.author_id)
        .bind(insert.title)
        .bind(insert.description)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(Subject::from(created))
    }

    #[instrument(skip(self))]
    async fn find_latest(&self, limit: i64) -> RepoResult<Vec<Subject>> {
        let rows = sqlx::query_as::<_, SubjectModel>(
            r#"
            SELECT id, author_id, title, description, like_count, golden_count, created_at
            FROM subjects
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(Subject::from).collect())
    }
}

#[async_trait]
impl SubjectTxRepository for PgTxRepositories {
    #[instrument(skip(self))]
    async fn find_for_update(&mut self, id: SubjectId) -> RepoResult<Option<Subject>> {
        let result = sqlx::query_as::<_, SubjectModel>(
            r#"
            SELECT id, author_id, title, description, like_count, golden_count, created_at
            FROM subjects
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.to_db())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Subject::from))
    }

    #[instrument(skip(self))]
    async fn increment_like_count(&mut self, id: SubjectId) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE subjects SET like_count = like_count + 1 WHERE id = $1
            "#,
        )
        .bind(id.to_db())
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(subject_not_found(id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn decrement_like_count(&mut self, id: SubjectId) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE subjects SET like_count = GREATEST(like_count - 1, 0) WHERE id = $1
            "#,
        )
        .bind(id.to_db())
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(subject_not_found(id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_golden_count(&mut self, id: SubjectId, count: i64) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE subjects SET golden_count = $2 WHERE id = $1
            "#,
        )
        .bind(id.to_db())
        .bind(count)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(subject_not_found(id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PgSubjectRepository>();
    }
}
