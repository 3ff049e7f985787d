//! md - operator CLI for maitred
//!
//! Books, reschedules and cancels reservations directly against the
//! reservation database, through the same admission controller the service
//! uses, and prints the staff schedule for a day.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod error;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = maitred_booking::Config::from_env();

    // Prefer RUST_LOG, fall back to MAITRED_LOG_LEVEL with --verbose and to
    // warnings only otherwise. Logs go to stderr so JSON on stdout stays
    // parseable.
    let fallback = if cli.verbose {
        settings.log_level.clone()
    } else {
        "warn".to_string()
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = cli.run(settings).await {
        error::print_error(&e);
        std::process::exit(1);
    }

    Ok(())
}
