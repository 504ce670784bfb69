//! Producer-side services and pipeline components
//!
//! This module contains the use cases that run ahead of the relay: like
//! admission, comment writes and reads, golden seat admission, cached
//! subject reads and seat reconciliation.

pub mod comment;
pub mod context;
pub mod error;
pub mod like;
pub mod seat_reconciler;
pub mod seat_reservation;
pub mod subject;
pub mod subject_reader;

// Re-export all services for convenience
pub use comment::CommentService;
pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use like::LikeService;
pub use seat_reconciler::{SeatReconciler, SeatReconciliation};
pub use seat_reservation::{GoldenSeatReservation, ReservedSeat};
pub use subject::SubjectService;
pub use subject_reader::CacheAsideReader;
