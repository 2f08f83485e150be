//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Builds the engine parameters from its arguments and configuration
//! 2. Calls the engine, or the diff functions for stdin input
//! 3. Prints the result as JSON on stdout

mod diff;
mod hash;
mod listing;

pub use diff::{cut, hunks};
pub use hash::hash;
pub use listing::{branches, tags};

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::cli::args::Command;
use crate::engine::Engine;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, repo: &Path, engine: &Engine) -> Result<()> {
    match command {
        Command::Hash {
            hash_type,
            aggregation,
        } => hash::hash(engine, repo, hash_type, aggregation),
        Command::Branches(args) => listing::branches(engine, repo, &args),
        Command::Tags(args) => listing::tags(engine, repo, &args),
        Command::Hunks => diff::hunks(),
        Command::Cut(args) => diff::cut(engine, &args),
    }
}

/// Print `value` as pretty JSON.
fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
