//! Binary crate for the `skypanel` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive search and unit toggling
//! - Logging setup

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod interactive;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    init_tracing(cmd.verbose);
    cmd.run().await
}

/// `RUST_LOG` wins; otherwise `-v` / `-vv` raise the default `warn` level.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
