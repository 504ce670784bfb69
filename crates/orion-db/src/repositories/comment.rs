//! PostgreSQL implementation of CommentRepository and CommentTxRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use orion_core::entities::{Comment, NewComment};
use orion_core::error::DomainError;
use orion_core::traits::{CommentRepository, CommentTxRepository, RepoResult};
use orion_core::value_objects::{CommentId, SubjectId};

use crate::mappers::{comments_from_models, CommentInsert};
use crate::models::CommentModel;

use super::error::{map_db_error, map_foreign_key_violation, map_unique_violation, subject_not_found};
use super::unit_of_work::PgTxRepositories;

const INSERT_COMMENT: &str = r#"
    INSERT INTO comments (subject_id, author_id, content, is_golden, parent_id, reply_to_user_id)
    VALUES ($1, $2, $3, $4, $5, $6)
    RETURNING id, subject_id, author_id, content, is_golden, like_count,
              parent_id, reply_to_user_id, created_at
"#;

fn insert_comment_query<'q>(
    insert: &'q CommentInsert<'q>,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, CommentModel, sqlx::postgres::PgArguments> {
    sqlx::query_as::<_, CommentModel>(INSERT_COMMENT)
        .bind(insert.subject_id)
        .bind(insert.author_id)
        .bind(insert.content)
        .bind(insert.is_golden)
        .bind(insert.parent_id)
        .bind(insert.reply_to_user_id)
}

fn map_insert_error(e: sqlx::Error, comment: &NewComment) -> DomainError {
    let user = comment.author_id;
    let subject = comment.subject_id;
    let is_fk = e
        .as_database_error()
        .is_some_and(|db| db.is_foreign_key_violation());
    if is_fk {
        map_foreign_key_violation(e, || subject_not_found(subject))
    } else {
        map_unique_violation(e, || DomainError::DuplicateGoldenComment { user, subject })
    }
}

/// PostgreSQL implementation of CommentRepository
#[derive(Clone)]
pub struct PgCommentRepository {
    pool: PgPool,
}

impl PgCommentRepository {
    /// Create a new PgCommentRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PgCommentRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: CommentId) -> RepoResult<Option<Comment>> {
        let result = sqlx::query_as::<_, CommentModel>(
            r#"
            SELECT id, subject_id, author_id, content, is_golden, like_count,
                   parent_id, reply_to_user_id, created_at
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(id.to_db())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(Comment::try_from).transpose()
    }

    #[instrument(skip(self, comment), fields(subject_id = %comment.subject_id, author_id = %comment.author_id))]
    async fn create(&self, comment: &NewComment) -> RepoResult<Comment> {
        let insert = CommentInsert::new(comment);

        let model = insert_comment_query(&insert)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_insert_error(e, comment))?;

        Comment::try_from(model)
    }

    #[instrument(skip(self))]
    async fn find_top_level(
        &self,
        subject_id: SubjectId,
        offset: i64,
        limit: i64,
    ) -> RepoResult<Vec<Comment>> {
        let limit = limit.clamp(1, 100);
        let offset = offset.max(0);

        let results = sqlx::query_as::<_, CommentModel>(
            r#"
            SELECT id, subject_id, author_id, content, is_golden, like_count,
                   parent_id, reply_to_user_id, created_at
            FROM comments
            WHERE subject_id = $1 AND parent_id IS NULL
            ORDER BY created_at DESC, id DESC
            OFFSET $2
            LIMIT $3
            "#,
        )
        .bind(subject_id.to_db())
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        comments_from_models(results)
    }

    #[instrument(skip(self, parent_ids), fields(parents = parent_ids.len()))]
    async fn find_replies(&self, parent_ids: &[CommentId]) -> RepoResult<Vec<Comment>> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = parent_ids.iter().map(|id| id.to_db()).collect();

        let results = sqlx::query_as::<_, CommentModel>(
            r#"
            SELECT id, subject_id, author_id, content, is_golden, like_count,
                   parent_id, reply_to_user_id, created_at
            FROM comments
            WHERE parent_id = ANY($1)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        comments_from_models(results)
    }
}

#[async_trait]
impl CommentTxRepository for PgTxRepositories {
    #[instrument(skip(self, comment), fields(subject_id = %comment.subject_id, author_id = %comment.author_id, is_golden = comment.is_golden))]
    async fn insert(&mut self, comment: &NewComment) -> RepoResult<Comment> {
        let insert = CommentInsert::new(comment);

        let model = insert_comment_query(&insert)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| map_insert_error(e, comment))?;

        Comment::try_from(model)
    }
}
