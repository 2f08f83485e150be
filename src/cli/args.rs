//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--repo <path>`: Repository to read (default: current directory)
//! - `--config <path>`: Configuration file to load
//! - `--debug`: Enable debug logging

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::hash::{AggregationType, HashType};
use crate::refs::{SortField, SortOrder};

/// gitweave - git plumbing engine: repository hashes, reference listings, diff cuts
#[derive(Parser, Debug)]
#[command(name = "gitweave")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Repository to operate on
    #[arg(long, global = true, default_value = ".")]
    pub repo: PathBuf,

    /// Load configuration from this file instead of the default locations
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the order-independent hash of the repository's references
    Hash {
        /// Digest per reference (sha256, sha512)
        #[arg(long = "type")]
        hash_type: Option<HashType>,

        /// How digests are combined (xor)
        #[arg(long)]
        aggregation: Option<AggregationType>,
    },

    /// List one page of branches
    Branches(ListArgs),

    /// List one page of tags
    Tags(ListArgs),

    /// Read a unified diff on stdin and print its hunk headers per file
    Hunks,

    /// Read a whole-file diff on stdin and print a line range with context
    #[command(after_help = "\
The diff must carry the whole file in one hunk:
    git diff --unified=100000000 main feature -- src/lib.rs | gitweave cut --start 10 --end 12")]
    Cut(CutArgs),
}

/// Arguments shared by listing commands.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Free-text filter; anchor with ^ and $
    #[arg(long, default_value = "")]
    pub query: String,

    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Page size; 0 lists everything (default from config)
    #[arg(long)]
    pub limit: Option<usize>,

    /// Sort key (name, date)
    #[arg(long, default_value = "name")]
    pub sort: SortField,

    /// Sort direction (asc, desc); dates default to newest first
    #[arg(long, default_value = "default")]
    pub order: SortOrder,
}

/// Arguments of `cut`.
#[derive(Args, Debug)]
pub struct CutArgs {
    /// First line of the range
    #[arg(long)]
    pub start: usize,

    /// Count --start on the old side
    #[arg(long)]
    pub start_old: bool,

    /// Last line of the range, inclusive
    #[arg(long)]
    pub end: usize,

    /// Count --end on the old side
    #[arg(long)]
    pub end_old: bool,

    /// Context lines before the range (default from config)
    #[arg(long)]
    pub before: Option<usize>,

    /// Context lines after the range (default from config)
    #[arg(long)]
    pub after: Option<usize>,

    /// Cap on range plus trailing context (default from config)
    #[arg(long)]
    pub limit: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_cut() {
        let cli = Cli::try_parse_from([
            "gitweave", "cut", "--start", "7", "--end", "9", "--end-old", "--before", "0",
        ])
        .unwrap();
        match cli.command {
            Command::Cut(args) => {
                assert_eq!(args.start, 7);
                assert!(!args.start_old);
                assert!(args.end_old);
                assert_eq!(args.before, Some(0));
                assert_eq!(args.after, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_listing_with_globals() {
        let cli = Cli::try_parse_from([
            "gitweave", "tags", "--sort", "date", "--repo", "/srv/x.git", "--limit", "5",
        ])
        .unwrap();
        assert_eq!(cli.repo, PathBuf::from("/srv/x.git"));
        match cli.command {
            Command::Tags(args) => {
                assert_eq!(args.sort, SortField::CreatorDate);
                assert_eq!(args.order, SortOrder::Default);
                assert_eq!(args.limit, Some(5));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_hash_type() {
        assert!(Cli::try_parse_from(["gitweave", "hash", "--type", "md5"]).is_err());
    }
}
