//! Test helpers for integration tests
//!
//! [`TestStack`] wires the producer services and consumer workers to real
//! PostgreSQL and Redis instances. Every stack uses its own stream names and
//! consumer group, so tests can run in parallel against the same servers.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use redis::AsyncCommands;
use uuid::Uuid;

use orion_cache::keys;
use orion_cache::relay::PAYLOAD_FIELD;
use orion_cache::{
    ConsumerSettings, RedisFastPathStore, RedisPool, RedisPoolConfig, RedisStreamConsumer,
    RedisStreamPublisher, StreamNames,
};
use orion_common::AppConfig;
use orion_consumer::{ConsumerWorker, Settlement, WorkerSettings};
use orion_core::entities::{NewSubject, Subject};
use orion_core::events::EventKind;
use orion_core::traits::SubjectRepository;
use orion_core::value_objects::SubjectId;
use orion_db::{PgCommentRepository, PgPool, PgSubjectRepository, PgUnitOfWork, PoolConfig};
use orion_service::ServiceContext;

/// Worker type used by the tests
pub type TestWorker = ConsumerWorker<RedisStreamConsumer, PgUnitOfWork>;

/// Producer and consumer sides of the pipeline against live servers
pub struct TestStack {
    pub config: AppConfig,
    pub pool: PgPool,
    pub redis: RedisPool,
    pub ctx: ServiceContext,
    pub uow: Arc<PgUnitOfWork>,
}

impl TestStack {
    /// Start a stack with isolated streams
    pub async fn start() -> Result<Self> {
        Self::start_with_config(test_config()?).await
    }

    /// Start a stack with a custom config; stream names are still isolated
    pub async fn start_with_config(mut config: AppConfig) -> Result<Self> {
        let run = Uuid::new_v4().simple().to_string();
        config.relay.like_stream = format!("test:{run}:likes");
        config.relay.golden_comment_stream = format!("test:{run}:golden_comments");
        config.relay.dead_letter_stream = format!("test:{run}:dead_letter");
        config.relay.consumer_group = format!("test-{run}");

        let timeout = config.pipeline.operation_timeout();

        let pool = orion_db::create_pool(&PoolConfig::from_settings(&config.database, timeout)).await?;
        orion_db::run_migrations(&pool).await?;

        let redis = RedisPool::new(RedisPoolConfig::from(&config.redis).with_wait_timeout(timeout))?;
        redis.ping().await?;

        let ctx = ServiceContext::new(
            Arc::new(PgSubjectRepository::new(pool.clone())),
            Arc::new(PgCommentRepository::new(pool.clone())),
            Arc::new(RedisFastPathStore::new(redis.clone(), timeout)),
            Arc::new(RedisStreamPublisher::new(
                redis.clone(),
                StreamNames::from(&config.relay),
                timeout,
            )),
            &config.pipeline,
        );
        let uow = Arc::new(PgUnitOfWork::new(pool.clone()));

        Ok(Self {
            config,
            pool,
            redis,
            ctx,
            uow,
        })
    }

    /// A worker for the stream of `kind`, joining this stack's group
    pub async fn worker(&self, kind: EventKind) -> Result<TestWorker> {
        let name = format!("test-worker-{}", Uuid::new_v4());
        let settings = ConsumerSettings::from_config(
            &self.config.relay,
            kind,
            name,
            self.config.pipeline.operation_timeout(),
        );
        let consumer = RedisStreamConsumer::connect(self.redis.clone(), settings).await?;
        Ok(ConsumerWorker::new(
            consumer,
            Arc::clone(&self.uow),
            WorkerSettings {
                max_deliveries: self.config.relay.max_deliveries,
                apply_timeout: self.config.pipeline.operation_timeout(),
            },
        ))
    }

    /// Insert a subject directly into PostgreSQL.
    ///
    /// Ids restart when the test database is recreated, so Redis keys left
    /// by an earlier run for the same id are removed.
    pub async fn create_subject(&self, subject: NewSubject) -> Result<Subject> {
        let created = PgSubjectRepository::new(self.pool.clone())
            .create(&subject)
            .await?;

        let mut conn = self.redis.get().await?;
        let stale = [
            keys::golden_seats(created.id),
            keys::golden_authors(created.id),
            keys::subject_likers(created.id),
            keys::subject_info(created.id),
        ];
        let _: i64 = conn.del(&stale[..]).await?;

        Ok(created)
    }

    /// Read a subject straight from PostgreSQL, bypassing the cache
    pub async fn db_subject(&self, id: SubjectId) -> Result<Subject> {
        PgSubjectRepository::new(self.pool.clone())
            .find_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("subject {id} not found"))
    }

    /// Append a raw payload to the stream of `kind`
    pub async fn inject_raw(&self, kind: EventKind, payload: &[u8]) -> Result<String> {
        let streams = StreamNames::from(&self.config.relay);
        let mut conn = self.redis.get().await?;
        let id: String = conn
            .xadd(streams.stream_for(kind), "*", &[(PAYLOAD_FIELD, payload)])
            .await?;
        Ok(id)
    }

    /// Entries in this stack's dead-letter stream
    pub async fn dead_letter_len(&self) -> Result<usize> {
        let mut conn = self.redis.get().await?;
        let len: usize = conn.xlen(&self.config.relay.dead_letter_stream).await?;
        Ok(len)
    }
}

/// Poll `worker` until it has settled `expected` deliveries
pub async fn drain(worker: &TestWorker, expected: usize) -> Result<Vec<Settlement>> {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    let mut settled = Vec::new();
    while settled.len() < expected {
        if tokio::time::Instant::now() > deadline {
            anyhow::bail!(
                "Timed out after {} of {expected} settlements: {settled:?}",
                settled.len()
            );
        }
        settled.extend(worker.poll_once().await?);
    }
    Ok(settled)
}

/// Create a test configuration with short relay timings
pub fn test_config() -> Result<AppConfig> {
    // Load from environment or use defaults
    dotenvy::dotenv().ok();

    let mut config = AppConfig::from_env().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;
    config.relay.block_ms = 100;
    config.relay.redelivery_idle_ms = 50;

    Ok(config)
}

/// Helper to check if test environment is available
pub async fn check_test_env() -> bool {
    dotenvy::dotenv().ok();

    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("Skipping test: DATABASE_URL not set");
        return false;
    }

    if std::env::var("REDIS_URL").is_err() {
        eprintln!("Skipping test: REDIS_URL not set");
        return false;
    }

    true
}
