//! Mock implementations for testing
//!
//! In-process stand-ins for the filter program and the progress reporter.

pub mod filter;
pub mod reporter;

pub use filter::{FilterBehavior, InProcessLauncher, DEFAULT_PIPE_CAPACITY};
pub use reporter::{RecordingReporter, ReportEvent};
