//! Gatehouse Daemon - membership escalation service
//!
//! The gatehouse daemon provides:
//! - Lifecycle tracking for unverified community members
//! - Periodic warn/remove escalation past configured deadlines
//! - Sliding-window raid detection on join bursts
//! - An action stream for the platform-integration layer to enforce

use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod actuator;
mod config;
mod daemon;
mod error;
mod ingest;
mod sweep;

use actuator::TracingActuator;
use config::DaemonConfig;
use daemon::Daemon;
use error::DaemonResult;

/// Gatehouse Daemon CLI
#[derive(Parser)]
#[command(name = "gatehoused")]
#[command(about = "Gatehouse Daemon - membership escalation service", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "GATEHOUSE_CONFIG")]
    config: Option<String>,

    /// Log level
    #[arg(long, env = "GATEHOUSE_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "GATEHOUSE_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_level.clone().into());

    if cli.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Load configuration
    let config = DaemonConfig::load(cli.config.as_deref())
        .map_err(|e| error::DaemonError::Config(e.to_string()))?;

    // Print startup banner
    println!(
        r#"
   ____       _       _
  / ___| __ _| |_ ___| |__   ___  _   _ ___  ___
 | |  _ / _` | __/ _ \ '_ \ / _ \| | | / __|/ _ \
 | |_| | (_| | ||  __/ | | | (_) | |_| \__ \  __/
  \____|\__,_|\__\___|_| |_|\___/ \__,_|___/\___|

  Membership escalation daemon
  Version: {}
  Warn/remove offsets: {}s / {}s
  Sweep period: {}s
"#,
        env!("CARGO_PKG_VERSION"),
        config.tracking.warn_offset_secs,
        config.tracking.remove_offset_secs,
        config.sweep.period_secs
    );

    // Create and run daemon. The platform-integration layer is expected to
    // feed Daemon::ingestor and consume the action stream; stand-alone the
    // daemon sweeps an empty registry and logs its intents.
    let daemon = Daemon::new(config);
    daemon.run(Arc::new(TracingActuator)).await
}
