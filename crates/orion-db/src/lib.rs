//! # orion-db
//!
//! Database layer implementing repository traits with PostgreSQL via SQLx.
//!
//! ## Overview
//!
//! - Connection pool management and the reference schema migrations
//! - Database models with SQLx `FromRow` derives
//! - Entity ↔ Model mappers
//! - Repository and unit-of-work implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use orion_db::{create_pool, PgUnitOfWork, PoolConfig};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&PoolConfig::default()).await?;
//!     let uow = PgUnitOfWork::new(pool);
//!
//!     // Hand `uow` to the consumer worker...
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use pool::{create_pool, run_migrations, PgPool, PoolConfig};
pub use repositories::{PgCommentRepository, PgSubjectRepository, PgTxRepositories, PgUnitOfWork};
