//! # orion-consumer
//!
//! Relay consumer process. Runs a pool of workers per event stream, each
//! applying like and golden comment events to PostgreSQL.

pub mod error;
pub mod handlers;
pub mod worker;

pub use error::{ConsumerError, ConsumerResult};
pub use handlers::{EventDispatcher, GoldenCommentHandler, LikeHandler};
pub use worker::{ConsumerWorker, Settlement, WorkerSettings};

use std::sync::Arc;

use tokio::task::JoinSet;
use uuid::Uuid;

use orion_cache::{ConsumerSettings, RedisPool, RedisPoolConfig, RedisStreamConsumer};
use orion_common::AppConfig;
use orion_core::events::EventKind;
use orion_db::{PgUnitOfWork, PoolConfig};

/// Connect to PostgreSQL and Redis, then run the workers until one of them
/// loses its relay connection or the process receives Ctrl-C
pub async fn run(config: AppConfig) -> ConsumerResult<()> {
    let timeout = config.pipeline.operation_timeout();

    // Create database pool
    tracing::info!("Connecting to PostgreSQL...");
    let pool = orion_db::create_pool(&PoolConfig::from_settings(&config.database, timeout))
        .await
        .map_err(|e| ConsumerError::Database(e.to_string()))?;
    orion_db::run_migrations(&pool)
        .await
        .map_err(|e| ConsumerError::Database(e.to_string()))?;
    tracing::info!("PostgreSQL connection established");

    // Create Redis pool
    tracing::info!("Connecting to Redis...");
    let redis_pool =
        RedisPool::new(RedisPoolConfig::from(&config.redis).with_wait_timeout(timeout))?;
    redis_pool.ping().await?;
    tracing::info!("Redis connection established");

    let uow = Arc::new(PgUnitOfWork::new(pool));
    let settings = WorkerSettings {
        max_deliveries: config.relay.max_deliveries,
        apply_timeout: timeout,
    };

    let mut workers = JoinSet::new();
    for kind in EventKind::ALL {
        for _ in 0..config.relay.consumers_per_stream.max(1) {
            let name = format!("{}-{}-{}", config.app.name, kind, Uuid::new_v4());
            let consumer_settings =
                ConsumerSettings::from_config(&config.relay, kind, name, timeout);
            let consumer = RedisStreamConsumer::connect(redis_pool.clone(), consumer_settings)
                .await
                .map_err(ConsumerError::RelayLost)?;

            let worker = ConsumerWorker::new(consumer, Arc::clone(&uow), settings);
            workers.spawn(async move { worker.run().await });
        }
    }

    tracing::info!(
        workers = workers.len(),
        group = %config.relay.consumer_group,
        "Consumer running"
    );

    let outcome = tokio::select! {
        joined = workers.join_next() => match joined {
            Some(Ok(Ok(()))) | None => Ok(()),
            Some(Ok(Err(e))) => Err(e),
            Some(Err(e)) => Err(ConsumerError::Worker(e.to_string())),
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
            Ok(())
        }
    };

    // Unsettled entries stay pending and are reclaimed by the next consumer
    workers.shutdown().await;
    tracing::info!("Consumer stopped");

    outcome
}
