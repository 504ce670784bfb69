//! # orion-service
//!
//! Application layer: producer-side use cases (likes, comments, golden
//! comment admission), the cache-aside subject reader, and DTOs.
//!
//! The `mocks` module provides in-memory implementations of every port for
//! tests in this and downstream crates; enable the `test-util` feature to
//! use it outside this crate.

pub mod dto;
#[cfg(any(test, feature = "test-util"))]
pub mod mocks;
pub mod services;

pub use services::{
    CacheAsideReader, CommentService, GoldenSeatReservation, LikeService, ReservedSeat,
    SeatReconciler, SeatReconciliation, ServiceContext, ServiceContextBuilder, ServiceError,
    ServiceResult, SubjectService,
};
