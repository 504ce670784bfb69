//! Repository implementations
//!
//! PostgreSQL implementations of the repository traits defined in orion-core.
//! Transaction-scoped traits are implemented on [`PgTxRepositories`], which
//! only [`PgUnitOfWork`] can construct.

mod comment;
mod error;
mod like;
mod subject;
mod unit_of_work;

pub use comment::PgCommentRepository;
pub use subject::PgSubjectRepository;
pub use unit_of_work::{PgTxRepositories, PgUnitOfWork};
