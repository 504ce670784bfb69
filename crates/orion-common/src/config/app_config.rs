//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when present).

use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub relay: RelayConfig,
    pub pipeline: PipelineConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    #[serde(default = "default_redis_max_connections")]
    pub max_connections: u32,
}

/// Relay (Redis Streams) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_like_stream")]
    pub like_stream: String,
    #[serde(default = "default_golden_comment_stream")]
    pub golden_comment_stream: String,
    #[serde(default = "default_consumer_group")]
    pub consumer_group: String,
    #[serde(default = "default_dead_letter_stream")]
    pub dead_letter_stream: String,
    /// Maximum entries per fetch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// How long a fetch blocks waiting for new entries
    #[serde(default = "default_block_ms")]
    pub block_ms: u64,
    /// Idle time after which an unacknowledged entry is redelivered
    #[serde(default = "default_redelivery_idle_ms")]
    pub redelivery_idle_ms: u64,
    /// Deliveries after which an entry is dead-lettered
    #[serde(default = "default_max_deliveries")]
    pub max_deliveries: u64,
    #[serde(default = "default_consumers_per_stream")]
    pub consumers_per_stream: usize,
}

impl RelayConfig {
    #[must_use]
    pub fn block(&self) -> Duration {
        Duration::from_millis(self.block_ms)
    }

    #[must_use]
    pub fn redelivery_idle(&self) -> Duration {
        Duration::from_millis(self.redelivery_idle_ms)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            like_stream: default_like_stream(),
            golden_comment_stream: default_golden_comment_stream(),
            consumer_group: default_consumer_group(),
            dead_letter_stream: default_dead_letter_stream(),
            batch_size: default_batch_size(),
            block_ms: default_block_ms(),
            redelivery_idle_ms: default_redelivery_idle_ms(),
            max_deliveries: default_max_deliveries(),
            consumers_per_stream: default_consumers_per_stream(),
        }
    }
}

/// Admission, cache and timeout tuning for the write and read paths
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_golden_seat_cap")]
    pub golden_seat_cap: i64,
    #[serde(default = "default_cache_ttl_base_secs")]
    pub cache_ttl_base_secs: u64,
    #[serde(default = "default_cache_ttl_jitter_secs")]
    pub cache_ttl_jitter_secs: u64,
    /// Upper bound for every network call
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
}

impl PipelineConfig {
    #[must_use]
    pub fn cache_ttl_base(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_base_secs)
    }

    #[must_use]
    pub fn cache_ttl_jitter(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_jitter_secs)
    }

    #[must_use]
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            golden_seat_cap: default_golden_seat_cap(),
            cache_ttl_base_secs: default_cache_ttl_base_secs(),
            cache_ttl_jitter_secs: default_cache_ttl_jitter_secs(),
            operation_timeout_ms: default_operation_timeout_ms(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "orion-consumer".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_redis_max_connections() -> u32 {
    10
}

fn default_like_stream() -> String {
    "orion:likes".to_string()
}

fn default_golden_comment_stream() -> String {
    "orion:golden_comments".to_string()
}

fn default_consumer_group() -> String {
    "orion-consumers".to_string()
}

fn default_dead_letter_stream() -> String {
    "orion:dead_letter".to_string()
}

fn default_batch_size() -> usize {
    16
}

fn default_block_ms() -> u64 {
    2000
}

fn default_redelivery_idle_ms() -> u64 {
    30_000
}

fn default_max_deliveries() -> u64 {
    10
}

fn default_consumers_per_stream() -> usize {
    2
}

fn default_golden_seat_cap() -> i64 {
    100
}

fn default_cache_ttl_base_secs() -> u64 {
    300 // 5 minutes
}

fn default_cache_ttl_jitter_secs() -> u64 {
    60
}

fn default_operation_timeout_ms() -> u64 {
    5000
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or
    /// a numeric variable does not parse
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(&lookup);

        let config = Self {
            app: AppSettings {
                name: vars.string("APP_NAME").unwrap_or_else(default_app_name),
                env: vars
                    .string("APP_ENV")
                    .and_then(|s| match s.to_lowercase().as_str() {
                        "production" => Some(Environment::Production),
                        "staging" => Some(Environment::Staging),
                        "development" => Some(Environment::Development),
                        _ => None,
                    })
                    .unwrap_or_default(),
            },
            database: DatabaseConfig {
                url: vars.required("DATABASE_URL")?,
                max_connections: vars
                    .parse("DATABASE_MAX_CONNECTIONS")?
                    .unwrap_or_else(default_max_connections),
                min_connections: vars
                    .parse("DATABASE_MIN_CONNECTIONS")?
                    .unwrap_or_else(default_min_connections),
            },
            redis: RedisConfig {
                url: vars.required("REDIS_URL")?,
                max_connections: vars
                    .parse("REDIS_MAX_CONNECTIONS")?
                    .unwrap_or_else(default_redis_max_connections),
            },
            relay: RelayConfig {
                like_stream: vars
                    .string("RELAY_LIKE_STREAM")
                    .unwrap_or_else(default_like_stream),
                golden_comment_stream: vars
                    .string("RELAY_GOLDEN_COMMENT_STREAM")
                    .unwrap_or_else(default_golden_comment_stream),
                consumer_group: vars
                    .string("RELAY_CONSUMER_GROUP")
                    .unwrap_or_else(default_consumer_group),
                dead_letter_stream: vars
                    .string("RELAY_DEAD_LETTER_STREAM")
                    .unwrap_or_else(default_dead_letter_stream),
                batch_size: vars
                    .parse("RELAY_BATCH_SIZE")?
                    .unwrap_or_else(default_batch_size),
                block_ms: vars.parse("RELAY_BLOCK_MS")?.unwrap_or_else(default_block_ms),
                redelivery_idle_ms: vars
                    .parse("RELAY_REDELIVERY_IDLE_MS")?
                    .unwrap_or_else(default_redelivery_idle_ms),
                max_deliveries: vars
                    .parse("RELAY_MAX_DELIVERIES")?
                    .unwrap_or_else(default_max_deliveries),
                consumers_per_stream: vars
                    .parse("RELAY_CONSUMERS_PER_STREAM")?
                    .unwrap_or_else(default_consumers_per_stream),
            },
            pipeline: PipelineConfig {
                golden_seat_cap: vars
                    .parse("GOLDEN_SEAT_CAP")?
                    .unwrap_or_else(default_golden_seat_cap),
                cache_ttl_base_secs: vars
                    .parse("CACHE_TTL_BASE_SECS")?
                    .unwrap_or_else(default_cache_ttl_base_secs),
                cache_ttl_jitter_secs: vars
                    .parse("CACHE_TTL_JITTER_SECS")?
                    .unwrap_or_else(default_cache_ttl_jitter_secs),
                operation_timeout_ms: vars
                    .parse("OPERATION_TIMEOUT_MS")?
                    .unwrap_or_else(default_operation_timeout_ms),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.golden_seat_cap < 1 {
            return Err(ConfigError::InvalidValue(
                "GOLDEN_SEAT_CAP",
                "must be at least 1".to_string(),
            ));
        }
        if self.relay.batch_size == 0 {
            return Err(ConfigError::InvalidValue(
                "RELAY_BATCH_SIZE",
                "must be at least 1".to_string(),
            ));
        }
        if self.relay.max_deliveries == 0 {
            return Err(ConfigError::InvalidValue(
                "RELAY_MAX_DELIVERIES",
                "must be at least 1".to_string(),
            ));
        }
        if self.pipeline.operation_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "OPERATION_TIMEOUT_MS",
                "must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

struct Vars<'a, F>(&'a F);

impl<F> Vars<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.string(key).ok_or(ConfigError::MissingVar(key))
    }

    fn parse<T: FromStr>(&self, key: &'static str) -> Result<Option<T>, ConfigError> {
        self.string(key)
            .map(|raw| {
                raw.trim()
                    .parse::<T>()
                    .map_err(|_| ConfigError::InvalidValue(key, raw.clone()))
            })
            .transpose()
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
