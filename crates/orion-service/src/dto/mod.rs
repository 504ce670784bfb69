//! Data transfer objects for service inputs and outputs
//!
//! This module provides:
//! - Request DTOs with validation for inputs
//! - Response DTOs for serializing outputs
//! - Mappers for converting domain entities to DTOs

pub mod mappers;
pub mod requests;
pub mod responses;

pub use mappers::thread_comments;
pub use requests::{
    CreateCommentRequest, CreateGoldenCommentRequest, CreateSubjectRequest, ListCommentsQuery,
};
pub use responses::{CommentPage, CommentResponse, PendingGoldenCommentResponse, SubjectResponse};
