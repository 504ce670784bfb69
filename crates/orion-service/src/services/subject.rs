//! Subject service
//!
//! Subject authoring, the latest-first feed, and single reads through the
//! cache-aside reader.

use tracing::{info, instrument};
use validator::Validate;

use orion_common::with_timeout;
use orion_core::entities::NewSubject;
use orion_core::value_objects::{SubjectId, UserId};

use crate::dto::{CreateSubjectRequest, SubjectResponse};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Feed size when the caller gives none
pub const DEFAULT_FEED_LIMIT: i64 = 20;

/// Largest feed page
pub const MAX_FEED_LIMIT: i64 = 100;

/// Subject service
pub struct SubjectService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> SubjectService<'a> {
    /// Create a new SubjectService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create a subject authored by `author_id`
    #[instrument(skip(self, request))]
    pub async fn create_subject(
        &self,
        author_id: UserId,
        request: CreateSubjectRequest,
    ) -> ServiceResult<SubjectResponse> {
        request
            .validate()
            .map_err(|e| ServiceError::validation(e.to_string()))?;

        let subject = NewSubject::new(author_id, request.title, request.description)?;
        let created = with_timeout(
            self.ctx.operation_timeout(),
            self.ctx.subject_repo().create(&subject),
        )
        .await?;
        self.ctx.subject_reader().prime(&created).await;

        info!(subject_id = %created.id, author_id = %author_id, "Subject created");

        Ok(SubjectResponse::from(&created))
    }

    /// Most recent subjects, newest first. The limit defaults to
    /// [`DEFAULT_FEED_LIMIT`] and is clamped to `1..=MAX_FEED_LIMIT`.
    #[instrument(skip(self))]
    pub async fn list_latest(&self, limit: Option<i64>) -> ServiceResult<Vec<SubjectResponse>> {
        let limit = feed_limit(limit);
        let subjects = with_timeout(
            self.ctx.operation_timeout(),
            self.ctx.subject_repo().find_latest(limit),
        )
        .await?;

        Ok(subjects.iter().map(SubjectResponse::from).collect())
    }

    /// Get a subject. Counters may lag behind by up to one cache TTL.
    #[instrument(skip(self))]
    pub async fn get_subject(&self, subject_id: SubjectId) -> ServiceResult<SubjectResponse> {
        let subject = self.ctx.subject_reader().read(subject_id).await?;
        Ok(SubjectResponse::from(subject.as_ref()))
    }
}

fn feed_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_FEED_LIMIT).clamp(1, MAX_FEED_LIMIT)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use orion_common::PipelineConfig;
    use orion_core::entities::Subject;
    use orion_core::traits::SubjectRepository;
    use orion_core::value_objects::UserId;

    use super::*;
    use crate::mocks::{MemoryCommentRepository, MemoryFastPathStore, MemoryRelay, MemorySubjectRepository};

    fn context(subjects: &Arc<MemorySubjectRepository>) -> ServiceContext {
        ServiceContext::new(
            subjects.clone(),
            Arc::new(MemoryCommentRepository::new()),
            Arc::new(MemoryFastPathStore::new()),
            Arc::new(MemoryRelay::new()),
            &PipelineConfig::default(),
        )
    }

    fn request(title: &str) -> CreateSubjectRequest {
        CreateSubjectRequest {
            title: title.to_string(),
            description: None,
        }
    }

    #[test]
    fn test_feed_limit() {
        assert_eq!(feed_limit(None), 20);
        assert_eq!(feed_limit(Some(0)), 1);
        assert_eq!(feed_limit(Some(-5)), 1);
        assert_eq!(feed_limit(Some(50)), 50);
        assert_eq!(feed_limit(Some(500)), 100);
    }

    #[tokio::test]
    async fn test_create_subject_then_read() {
        let subjects = Arc::new(MemorySubjectRepository::new());
        let ctx = context(&subjects);
        let service = SubjectService::new(&ctx);

        let created = service
            .create_subject(
                UserId::new(4),
                CreateSubjectRequest {
                    title: " Launch ".to_string(),
                    description: Some("first clip".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(created.author_id, "4");
        assert_eq!(created.title, "Launch");
        assert_eq!(created.like_count, 0);

        let read = service.get_subject(created.id.parse().unwrap()).await.unwrap();
        assert_eq!(read.title, "Launch");
        assert_eq!(read.description.as_deref(), Some("first clip"));
        // Served from the entry written on creation
        assert_eq!(subjects.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_title_rejected() {
        let subjects = Arc::new(MemorySubjectRepository::new());
        let ctx = context(&subjects);

        let err = SubjectService::new(&ctx)
            .create_subject(UserId::new(4), request("   "))
            .await
            .unwrap_err();

        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(subjects.find_latest(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_latest_newest_first() {
        let subjects = Arc::new(MemorySubjectRepository::new());
        let ctx = context(&subjects);
        let service = SubjectService::new(&ctx);

        for title in ["one", "two", "three"] {
            service.create_subject(UserId::new(1), request(title)).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let feed = service.list_latest(None).await.unwrap();
        let titles: Vec<&str> = feed.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["three", "two", "one"]);

        let feed = service.list_latest(Some(2)).await.unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].title, "three");

        assert_eq!(service.list_latest(Some(0)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_subject_serves_stale_counters_from_cache() {
        let subjects = Arc::new(MemorySubjectRepository::with_subjects([Subject::new(
            SubjectId::new(5),
            UserId::new(1),
            "five".to_string(),
        )]));
        let ctx = context(&subjects);
        let service = SubjectService::new(&ctx);

        let first = service.get_subject(SubjectId::new(5)).await.unwrap();
        assert_eq!(first.id, "5");
        assert_eq!(first.like_count, 0);

        let mut updated = Subject::new(SubjectId::new(5), UserId::new(1), "five".to_string());
        updated.like_count = 3;
        subjects.put(updated);

        let second = service.get_subject(SubjectId::new(5)).await.unwrap();
        assert_eq!(second.like_count, 0);
        assert_eq!(subjects.fetch_count(), 1);
    }
}
