//! hunks and cut commands - Analyze a diff read from stdin

use std::io::{self, BufRead};

use anyhow::{Context as _, Result};
use crate::cli::args::CutArgs;
use crate::diff::{self, get_hunk_headers_from_reader, DiffCutParams};
use crate::engine::Engine;

use super::print_json;

/// Print the hunk headers of every file in the diff on stdin.
pub fn hunks() -> Result<()> {
    let files = get_hunk_headers_from_reader(io::stdin().lock())
        .context("failed to parse diff from stdin")?;
    print_json(&files)
}

/// Print a line range, with context, of the whole-file diff on stdin.
pub fn cut(engine: &Engine, args: &CutArgs) -> Result<()> {
    let defaults = engine.default_cut_params();
    let params = DiffCutParams {
        line_start: args.start,
        line_start_new: !args.start_old,
        line_end: args.end,
        line_end_new: !args.end_old,
        before_lines: args.before.unwrap_or(defaults.before_lines),
        after_lines: args.after.unwrap_or(defaults.after_lines),
        line_limit: args.limit.unwrap_or(defaults.line_limit),
    };
    params.validate()?;

    let mut cut = diff::diff_cut(io::stdin().lock().lines(), &params)
        .context("failed to cut diff from stdin")?;
    diff::limit_line_len(&mut cut.hunk.lines, engine.config().max_line_length());
    print_json(&cut)
}
