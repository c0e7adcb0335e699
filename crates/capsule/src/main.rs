//! Capsule: time-locked letter delivery service.
//!
//! Main binary with subcommands:
//! - `serve`: JSON API server with an optional built-in sweep ticker
//! - `sweep`: cron adapter that triggers a sweep on a running server

use clap::{Parser, Subcommand, ValueEnum};
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod serve;
mod trigger;

#[derive(Parser)]
#[command(name = "capsule")]
#[command(about = "Time-locked letter delivery service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Which sweep a trigger invocation runs.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SweepKind {
    /// Deliver due scheduled letters
    Scheduled,
    /// Re-notify recurring letters due today
    Recurring,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API server (letter status/open + cron trigger endpoints)
    Serve {
        /// Bind address
        #[arg(long, env = "CAPSULE_BIND", default_value = "127.0.0.1:8080")]
        bind: String,

        /// Built-in sweep tick interval in seconds. 0 disables the ticker;
        /// an external scheduler then drives the cron endpoints.
        #[arg(long, env = "CAPSULE_TICK_SECS", default_value = "60")]
        tick_secs: u64,
    },

    /// Trigger a sweep on a running server (external cron adapter)
    Sweep {
        /// Which sweep to run
        kind: SweepKind,

        /// Base URL of the running server
        #[arg(long, env = "CAPSULE_URL", default_value = "http://127.0.0.1:8080")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve { bind, tick_secs } => serve::run(bind, tick_secs).await,
        Commands::Sweep { kind, url } => trigger::run(kind, url).await,
    }
}
