//! Value objects - immutable types that represent domain concepts

mod ids;
mod ttl;

pub use ids::{CommentId, IdParseError, SubjectId, UserId};
pub use ttl::TtlPolicy;
