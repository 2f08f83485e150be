//! cli
//!
//! Command-line interface layer for gitweave.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the log subscriber
//! - Delegate to command handlers, which print JSON on stdout
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and calls the
//! [`crate::engine`] or the pure [`crate::diff`] functions. It exposes only
//! read-side operations.

pub mod args;
pub mod commands;

pub use args::Cli;

use anyhow::{Context as _, Result};
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;
use crate::engine::Engine;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_tracing(cli.debug);

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    let engine = Engine::new(config);

    commands::dispatch(cli.command, &cli.repo, &engine)
}

/// Log to stderr. `RUST_LOG` wins over `--debug`.
fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
