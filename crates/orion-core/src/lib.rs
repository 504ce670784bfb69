//! # orion-core
//!
//! Domain layer containing entities, relay events, error taxonomy, and the
//! traits (ports) implemented by the PostgreSQL and Redis adapters.
//! This crate has zero dependencies on infrastructure (database, cache, relay).

pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{Comment, CommentThread, LikeRelation, NewComment, NewSubject, Subject};
pub use error::DomainError;
pub use events::{EventKind, GoldenCommentEvent, LikeAction, LikeEvent, RelayEvent};
pub use traits::{
    CommentRepository, CommentTxRepository, Delivery, FastPathStore, LikeTxRepository,
    RelayConsumer, RelayPublisher, RepoResult, SubjectRepository, SubjectTxRepository,
    TxFuture, TxRepositories, UnitOfWork,
};
pub use value_objects::{CommentId, IdParseError, SubjectId, TtlPolicy, UserId};
