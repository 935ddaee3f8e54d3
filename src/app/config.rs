//! Application configuration
//!
//! This module turns parsed command-line arguments into the settings a run
//! needs.

use crate::cli::Cli;
use crate::multiplex::MultiplexConfig;
use crate::subprocess::{ProcessCommand, ProcessCommandBuilder};

/// Application configuration structure
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Verbosity level for logging
    pub verbose: u8,
    /// The filter program followed by its arguments
    pub filter: Vec<String>,
    /// Pipeline settings
    pub multiplex: MultiplexConfig,
}

impl AppConfig {
    /// Create a configuration that runs `filter` with default pipeline settings
    pub fn new(filter: Vec<String>) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    /// Build the configuration from parsed arguments
    ///
    /// `--debug` implies at least `-v`.
    pub fn from_cli(cli: &Cli) -> Self {
        let verbose = if cli.debug {
            cli.verbose.max(1)
        } else {
            cli.verbose
        };

        let multiplex = MultiplexConfig::default()
            .with_ledger_capacity(cli.ledger_capacity)
            .with_channel_capacity(cli.channel_capacity)
            .with_progress_interval(cli.progress);

        Self {
            verbose,
            filter: cli.filter.clone(),
            multiplex,
        }
    }

    /// The filter as a launchable command, `None` when no program was given
    pub fn filter_command(&self) -> Option<ProcessCommand> {
        let (program, args) = self.filter.split_first()?;
        Some(ProcessCommandBuilder::new(program).args(args).build())
    }

    /// Get the log level string based on verbosity
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
