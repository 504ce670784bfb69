//! Fast-path store backed by Redis

mod fast_path;

pub use fast_path::RedisFastPathStore;
