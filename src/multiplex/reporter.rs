//! Progress reporting for a filter run
//!
//! Pipeline stages never log progress on their own; they call the
//! `ProgressReporter` they were given.

use super::types::{FilterPhase, FilterSummary, Progress};

/// Receives bookkeeping events from the pipeline stages
pub trait ProgressReporter: Send + Sync {
    /// The coordinator moved to a new lifecycle phase
    fn phase_changed(&self, _phase: FilterPhase) {}

    /// A document's lines were handed to the filter
    fn document_fed(&self, _document: u64, _lines: usize, _in_flight: usize) {}

    /// A reassembled document was written to the output
    fn document_written(&self, progress: &Progress);

    /// The run completed successfully
    fn finished(&self, summary: &FilterSummary);
}

/// Reporter backed by `tracing` events
pub struct TracingReporter {
    interval: Option<u64>,
}

impl TracingReporter {
    /// Report progress every `interval` documents, `None` for summary only
    pub fn new(interval: Option<u64>) -> Self {
        Self { interval }
    }

    /// Whether writing the `documents`-th document triggers a progress line
    fn progress_due(&self, documents: u64) -> bool {
        self.interval
            .is_some_and(|every| documents > 0 && documents % every == 0)
    }
}

impl ProgressReporter for TracingReporter {
    fn phase_changed(&self, phase: FilterPhase) {
        tracing::debug!("Filter {}", phase);
    }

    fn document_fed(&self, document: u64, lines: usize, in_flight: usize) {
        tracing::debug!(
            "Feeder: wrote {} line document {} to filter (in flight: {})",
            lines,
            document,
            in_flight
        );
    }

    fn document_written(&self, progress: &Progress) {
        if self.progress_due(progress.documents) {
            tracing::info!(
                "written {} docs, {} lines in {:?}",
                progress.documents,
                progress.lines,
                progress.elapsed
            );
        }
    }

    fn finished(&self, summary: &FilterSummary) {
        tracing::info!("processed {} documents", summary.documents);
        tracing::debug!(
            "{} lines read back from filter in {:?}",
            summary.lines,
            summary.elapsed
        );
    }
}
