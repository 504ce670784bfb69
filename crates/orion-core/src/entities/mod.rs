//! Domain entities - core business objects

mod comment;
mod like;
mod subject;

pub use comment::{validate_content, Comment, CommentThread, NewComment, MAX_COMMENT_LENGTH};
pub use like::LikeRelation;
pub use subject::{NewSubject, Subject, MAX_TITLE_LENGTH};
