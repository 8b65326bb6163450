//! Mockline - mock API server
//!
//! # Usage
//!
//! ```bash
//! # Serve the endpoints defined in a config file
//! mockline --config mockline.yaml
//!
//! # Override the port and log as JSON
//! mockline --config mockline.yaml --port 9000 --log-format json
//! ```

use anyhow::Context;
use clap::Parser;
use mockline_server::config::{LogFormat, ServerConfig};
use mockline_server::server::{self, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mockline")]
#[command(author, version, about = "Rule-driven mock API server")]
struct Args {
    /// Path to the YAML or JSON config file
    #[arg(short, long, env = "MOCKLINE_CONFIG")]
    config: Option<String>,

    /// Listen host (overrides the config file)
    #[arg(long, env = "MOCKLINE_HOST")]
    host: Option<String>,

    /// Listen port (overrides the config file)
    #[arg(short, long, env = "MOCKLINE_PORT")]
    port: Option<u16>,

    /// Maximum number of cached endpoints (0 = unlimited)
    #[arg(long, env = "MOCKLINE_MAX_ENDPOINTS")]
    max_endpoints: Option<i64>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info", env = "MOCKLINE_LOG_LEVEL")]
    log_level: String,

    #[arg(long, value_enum, env = "MOCKLINE_LOG_FORMAT")]
    log_format: Option<LogFormat>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("Failed to load config {path}"))?,
        None => ServerConfig::default(),
    };
    if let Some(host) = args.host {
        config.listen.host = host;
    }
    if let Some(port) = args.port {
        config.listen.port = port;
    }
    if args.max_endpoints.is_some() {
        config.max_endpoints = args.max_endpoints;
    }
    if let Some(format) = args.log_format {
        config.logging.format = format;
    }

    init_logging(&args.log_level, config.logging.format);

    let state = AppState::from_config(&config)?;
    let handle = server::start(&config.listen.address(), state).await?;

    tokio::signal::ctrl_c().await.ok();
    info!("Shutdown signal received");
    handle.shutdown().await;
    Ok(())
}

fn init_logging(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}
