//! Entity to model mappers
//!
//! Conversions between domain entities (orion-core) and database models.
//! - `From<Model> for Entity` / `TryFrom`: Convert database rows to domain objects
//! - `*Insert` structs: Prepare entity data for database operations

mod comment;
mod subject;

pub use comment::{comments_from_models, CommentInsert};
pub use subject::SubjectInsert;
