//! CLI argument structures
//!
//! This module defines the command-line interface of b64filter.

use clap::Parser;

use crate::multiplex::{
    DEFAULT_CHANNEL_CAPACITY, DEFAULT_LEDGER_CAPACITY, DEFAULT_PROGRESS_INTERVAL,
};

const CONTRACT_HELP: &str = "\
Each input line is a base64-encoded document. Every document is decoded,
split into lines and written to a single long-running FILTER process. The
same number of lines is read back, joined and re-encoded as one output line.

The filter must write exactly one line for every line it reads and must flush
each line as it goes. Filters that buffer their output will stall once
--ledger-capacity documents are in flight.

Example:
  b64filter sed -u 's/foo/bar/' < documents.b64 > rewritten.b64";

/// Run line-oriented filters over base64-encoded documents
#[derive(Parser, Debug)]
#[command(name = "b64filter")]
#[command(about = "b64filter - Run a line-preserving filter over base64-encoded documents")]
#[command(after_long_help = CONTRACT_HELP)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log per-document bookkeeping (same as -v)
    #[arg(short, long)]
    pub debug: bool,

    /// Report progress every N documents written, 0 disables it
    #[arg(
        short,
        long,
        value_name = "N",
        env = "B64FILTER_PROGRESS",
        default_value_t = DEFAULT_PROGRESS_INTERVAL
    )]
    pub progress: u64,

    /// Maximum number of documents inside the filter at once
    #[arg(
        long,
        value_name = "N",
        env = "B64FILTER_LEDGER_CAPACITY",
        default_value_t = DEFAULT_LEDGER_CAPACITY
    )]
    pub ledger_capacity: usize,

    /// Decoded documents buffered ahead of the filter
    #[arg(
        long,
        value_name = "N",
        env = "B64FILTER_CHANNEL_CAPACITY",
        default_value_t = DEFAULT_CHANNEL_CAPACITY
    )]
    pub channel_capacity: usize,

    /// Filter program followed by its arguments
    #[arg(
        value_name = "FILTER",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub filter: Vec<String>,
}
