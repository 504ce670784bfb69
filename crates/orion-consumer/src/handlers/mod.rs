//! Event handlers
//!
//! Each handler applies one validated relay event inside a single unit of
//! work. Handlers are idempotent against redelivery: a repeated event either
//! changes nothing or fails with a uniqueness conflict.

mod golden_comment;
mod like;

pub use golden_comment::GoldenCommentHandler;
pub use like::LikeHandler;

use orion_core::events::RelayEvent;
use orion_core::traits::{RepoResult, UnitOfWork};

/// Route a decoded event to its handler
pub struct EventDispatcher;

impl EventDispatcher {
    pub async fn dispatch<U: UnitOfWork>(uow: &U, event: RelayEvent) -> RepoResult<()> {
        match event {
            RelayEvent::Like(event) => LikeHandler::handle(uow, event).await,
            RelayEvent::GoldenComment(event) => GoldenCommentHandler::handle(uow, event).await,
        }
    }
}
