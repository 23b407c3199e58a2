//! labdelay CLI - laboratory delay predictor
//!
//! # Commands
//!
//! - `serve` - Serve the form page and JSON API
//! - `predict` - Predict once from the command line
//! - `schema` - Print widgets and record schemas
//! - `demo-model` - Write the demo model artifact
//! - `info` - Show version info

use clap::Parser;
use labdelay::cli::{entrypoint, Cli};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "labdelay=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = entrypoint(cli).await {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
