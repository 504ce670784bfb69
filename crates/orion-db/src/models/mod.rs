//! Database models - SQLx-compatible structs for PostgreSQL tables

mod comment;
mod subject;

pub use comment::CommentModel;
pub use subject::SubjectModel;
