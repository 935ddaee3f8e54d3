//! Recording progress reporter

use std::sync::Mutex;
use std::time::Duration;

use crate::multiplex::{FilterPhase, FilterSummary, Progress, ProgressReporter};

/// One reporter callback, as recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    Phase(FilterPhase),
    Fed {
        document: u64,
        lines: usize,
        in_flight: usize,
    },
    Written {
        documents: u64,
        lines: u64,
        elapsed: Duration,
    },
    Finished(FilterSummary),
}

/// Reporter that keeps every event for later assertions
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<ReportEvent>>,
}

impl RecordingReporter {
    fn record(&self, event: ReportEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    pub fn events(&self) -> Vec<ReportEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Phases in the order they were entered
    pub fn phases(&self) -> Vec<FilterPhase> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ReportEvent::Phase(phase) => Some(phase),
                _ => None,
            })
            .collect()
    }

    pub fn written_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, ReportEvent::Written { .. }))
            .count()
    }

    /// Highest ledger occupancy seen by the feeder
    pub fn max_in_flight(&self) -> usize {
        self.events()
            .iter()
            .filter_map(|event| match event {
                ReportEvent::Fed { in_flight, .. } => Some(*in_flight),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }

    pub fn summary(&self) -> Option<FilterSummary> {
        self.events().into_iter().find_map(|event| match event {
            ReportEvent::Finished(summary) => Some(summary),
            _ => None,
        })
    }
}

impl ProgressReporter for RecordingReporter {
    fn phase_changed(&self, phase: FilterPhase) {
        self.record(ReportEvent::Phase(phase));
    }

    fn document_fed(&self, document: u64, lines: usize, in_flight: usize) {
        self.record(ReportEvent::Fed {
            document,
            lines,
            in_flight,
        });
    }

    fn document_written(&self, progress: &Progress) {
        self.record(ReportEvent::Written {
            documents: progress.documents,
            lines: progress.lines,
            elapsed: progress.elapsed,
        });
    }

    fn finished(&self, summary: &FilterSummary) {
        self.record(ReportEvent::Finished(*summary));
    }
}
