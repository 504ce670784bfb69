//! # orion-common
//!
//! Shared utilities including configuration, telemetry, and bounded network calls.

pub mod config;
pub mod telemetry;
pub mod timeout;

// Re-export commonly used types at crate root
pub use config::{
    AppConfig, AppSettings, ConfigError, DatabaseConfig, Environment, PipelineConfig,
    RedisConfig, RelayConfig,
};
pub use telemetry::{try_init_tracing, try_init_tracing_with_config, TracingConfig, TracingError};
pub use timeout::with_timeout;
