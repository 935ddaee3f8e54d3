//! Core types for the document multiplexer

use std::fmt;
use std::time::Duration;

use crate::error::FilterError;

/// Default number of documents allowed in flight inside the filter
pub const DEFAULT_LEDGER_CAPACITY: usize = 32;

/// Default size of the decoded-document handoff buffer
pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;

/// Default progress interval, in documents written
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100;

/// Pipeline settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiplexConfig {
    /// Maximum number of documents fed to the filter but not yet reassembled
    pub ledger_capacity: usize,
    /// Decoded documents buffered between the decoder and the feeder
    pub channel_capacity: usize,
    /// Report progress every N documents written, `0` disables it
    pub progress_interval: u64,
    /// How long to keep copying the filter's error stream after it exits
    pub drain_grace: Duration,
}

impl Default for MultiplexConfig {
    fn default() -> Self {
        Self {
            ledger_capacity: DEFAULT_LEDGER_CAPACITY,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            drain_grace: Duration::from_secs(1),
        }
    }
}

impl MultiplexConfig {
    pub fn with_ledger_capacity(mut self, capacity: usize) -> Self {
        self.ledger_capacity = capacity;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<(), FilterError> {
        if self.ledger_capacity == 0 {
            return Err(FilterError::InvalidConfig(
                "ledger capacity must be at least 1".to_string(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(FilterError::InvalidConfig(
                "channel capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Progress interval, `None` when periodic progress is disabled
    pub fn progress_every(&self) -> Option<u64> {
        (self.progress_interval > 0).then_some(self.progress_interval)
    }
}

/// Lifecycle of the filter process as seen by the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterPhase {
    /// Process started, pipes obtained, drain and reassembly running
    Spawned,
    /// Documents are being decoded and fed to the filter
    Feeding,
    /// Filter input closed, waiting for the remaining output
    Draining,
    /// Filter exited and was reaped
    Reaped,
}

impl fmt::Display for FilterPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterPhase::Spawned => "spawned",
            FilterPhase::Feeding => "feeding",
            FilterPhase::Draining => "draining",
            FilterPhase::Reaped => "reaped",
        };
        f.write_str(name)
    }
}

/// Running totals reported as documents are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub documents: u64,
    pub lines: u64,
    pub elapsed: Duration,
}

/// Outcome of a complete filter run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSummary {
    /// Documents written to the output
    pub documents: u64,
    /// Physical lines read back from the filter
    pub lines: u64,
    pub elapsed: Duration,
}

/// Per-stage totals returned by the pipeline tasks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageReport {
    pub documents: u64,
    pub lines: u64,
}
