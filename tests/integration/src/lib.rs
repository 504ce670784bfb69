//! Integration test utilities for the engagement pipeline
//!
//! This crate provides helpers for running end-to-end tests against real
//! PostgreSQL and Redis instances: producer services on one side, consumer
//! workers on the other, connected by Redis Streams.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
