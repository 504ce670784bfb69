//! Relay consumer entry point
//!
//! Run with:
//! ```bash
//! cargo run -p orion-consumer
//! ```
//!
//! Configuration is loaded from environment variables.

use orion_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Load configuration before tracing so the log format follows APP_ENV
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize tracing
    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run(config).await {
        error!(error = %e, "Consumer failed");
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    info!(
        env = ?config.app.env,
        stream_workers = config.relay.consumers_per_stream,
        max_deliveries = config.relay.max_deliveries,
        "Starting relay consumer"
    );

    orion_consumer::run(config).await?;

    Ok(())
}
