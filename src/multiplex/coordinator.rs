//! Coordinator: filter process lifecycle and pipeline shutdown
//!
//! ```text
//! Spawned -> Feeding -> Draining -> Reaped
//! ```
//!
//! The filter is reaped only after the reassembler has drained the ledger,
//! otherwise output still buffered in the filter could be lost. Any stage
//! failing ends the run at once: the remaining tasks are aborted and the
//! child is killed when its handle drops.

use std::sync::Arc;
use std::time::Instant;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use super::decoder::run_decoder;
use super::error_drain::drain_errors;
use super::feeder::run_feeder;
use super::ledger::count_ledger;
use super::reassembler::run_reassembler;
use super::reporter::{ProgressReporter, TracingReporter};
use super::types::{FilterPhase, FilterSummary, MultiplexConfig, StageReport};
use crate::error::FilterError;
use crate::subprocess::{FilterPipes, FilterProcess, ProcessCommand, ProcessLauncher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Decoder,
    Feeder,
    Reassembler,
}

impl Stage {
    fn name(self) -> &'static str {
        match self {
            Stage::Decoder => "decoder",
            Stage::Feeder => "feeder",
            Stage::Reassembler => "reassembler",
        }
    }
}

/// Runs one filter program over a stream of documents
pub struct Multiplexer {
    config: MultiplexConfig,
    launcher: Arc<dyn ProcessLauncher>,
    reporter: Arc<dyn ProgressReporter>,
}

impl Multiplexer {
    pub fn new(config: MultiplexConfig, launcher: Arc<dyn ProcessLauncher>) -> Self {
        let reporter = Arc::new(TracingReporter::new(config.progress_every()));
        Self {
            config,
            launcher,
            reporter,
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    fn enter(&self, phase: FilterPhase) {
        self.reporter.phase_changed(phase);
    }

    /// Filter `input` through `command` into `output`, passing the filter's
    /// error stream to `errors`.
    pub async fn run<R, W, E>(
        &self,
        command: &ProcessCommand,
        input: R,
        output: W,
        errors: E,
    ) -> Result<FilterSummary, FilterError>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
        E: AsyncWrite + Send + Unpin + 'static,
    {
        self.config.validate()?;
        let start = Instant::now();

        let FilterProcess { pipes, mut handle } = self.launcher.launch(command).await?;
        let FilterPipes {
            stdin,
            stdout,
            stderr,
        } = pipes;

        let drain = tokio::spawn(drain_errors(stderr, errors));

        let (ledger_writer, ledger_reader) = count_ledger(self.config.ledger_capacity);
        let (doc_tx, doc_rx) = mpsc::channel(self.config.channel_capacity);

        let mut tasks = JoinSet::new();
        let reporter = Arc::clone(&self.reporter);
        tasks.spawn(async move {
            let result = run_reassembler(ledger_reader, stdout, output, reporter, start).await;
            (Stage::Reassembler, result)
        });
        self.enter(FilterPhase::Spawned);

        self.enter(FilterPhase::Feeding);
        tasks.spawn(async move { (Stage::Decoder, run_decoder(input, doc_tx).await) });
        let reporter = Arc::clone(&self.reporter);
        tasks.spawn(async move {
            let result = run_feeder(doc_rx, stdin, ledger_writer, reporter).await;
            (Stage::Feeder, result)
        });

        let reports = match self.join_stages(&mut tasks).await {
            Ok(reports) => reports,
            Err(e) => {
                drain.abort();
                return Err(e);
            }
        };
        let (fed, written) = (reports.fed, reports.written);
        tracing::debug!(
            "Decoded {} documents from {} input lines",
            reports.decoded.documents,
            reports.decoded.lines
        );
        debug_assert_eq!(fed.documents, written.documents);

        let status = handle.wait().await?;
        self.enter(FilterPhase::Reaped);
        tracing::debug!("Filter exited with {:?}", status);

        match tokio::time::timeout(self.config.drain_grace, drain).await {
            Ok(Ok(bytes)) => tracing::trace!("Error drain finished after {} bytes", bytes),
            Ok(Err(e)) => tracing::warn!("error drain task failed: {}", e),
            Err(_) => tracing::debug!("Error drain still open after filter exit, detaching"),
        }

        status.into_result(&command.display())?;

        let summary = FilterSummary {
            documents: written.documents,
            lines: written.lines,
            elapsed: start.elapsed(),
        };
        self.reporter.finished(&summary);
        Ok(summary)
    }

    /// Wait for every stage, returning the first failure.
    ///
    /// A feeder that finds the ledger closed is only a symptom; the
    /// reassembler's own error explains why, so it is preferred.
    async fn join_stages(
        &self,
        tasks: &mut JoinSet<(Stage, Result<StageReport, FilterError>)>,
    ) -> Result<StageReports, FilterError> {
        let mut reports = StageReports::default();
        let mut deferred = None;

        while let Some(joined) = tasks.join_next().await {
            let (stage, result) = joined.map_err(|e| FilterError::TaskFailed {
                task: "pipeline",
                message: e.to_string(),
            })?;

            match result {
                Ok(report) => {
                    tracing::debug!(
                        "{} finished: {} documents, {} lines",
                        stage.name(),
                        report.documents,
                        report.lines
                    );
                    match stage {
                        Stage::Decoder => reports.decoded = report,
                        Stage::Feeder => {
                            reports.fed = report;
                            self.enter(FilterPhase::Draining);
                        }
                        Stage::Reassembler => reports.written = report,
                    }
                }
                Err(e @ FilterError::LedgerClosed { .. }) => {
                    tracing::debug!("{} stopped: {}", stage.name(), e);
                    deferred = Some(e);
                }
                Err(e) => {
                    tracing::debug!("{} failed: {}", stage.name(), e);
                    return Err(e);
                }
            }
        }

        match deferred {
            Some(e) => Err(e),
            None => Ok(reports),
        }
    }
}

#[derive(Debug, Default)]
struct StageReports {
    decoded: StageReport,
    fed: StageReport,
    written: StageReport,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multiplex::Document;
    use crate::subprocess::ProcessCommandBuilder;
    use crate::testing::{
        decode_stream, encode_stream, FilterBehavior, InProcessLauncher, RecordingReporter,
        SharedBuffer,
    };
    use std::time::Duration;

    fn lorem() -> Vec<Document> {
        vec![
            Document::from(
                "Lorem ipsum dolor sit amet,\nconsectetur adipiscing elit,\nsed do eiusmod tempor\nincididunt ut labore",
            ),
            Document::from("Sed ut perspiciatis\nNemo enim ipsam\nNeque porro quisquam"),
        ]
    }

    struct Run {
        result: Result<FilterSummary, FilterError>,
        output: SharedBuffer,
        errors: SharedBuffer,
        reporter: Arc<RecordingReporter>,
    }

    async fn run_with(
        launcher: InProcessLauncher,
        config: MultiplexConfig,
        documents: Vec<Document>,
    ) -> Run {
        let reporter = Arc::new(RecordingReporter::default());
        let multiplexer =
            Multiplexer::new(config, Arc::new(launcher)).with_reporter(reporter.clone());
        let output = SharedBuffer::new();
        let errors = SharedBuffer::new();
        let input = std::io::Cursor::new(encode_stream(documents));
        let command = ProcessCommandBuilder::new("filter").build();

        let result = multiplexer
            .run(&command, input, output.clone(), errors.clone())
            .await;
        Run {
            result,
            output,
            errors,
            reporter,
        }
    }

    #[tokio::test]
    async fn test_identity_round_trip() {
        let docs = lorem();
        let run = run_with(
            InProcessLauncher::identity(),
            MultiplexConfig::default(),
            docs.clone(),
        )
        .await;

        let summary = run.result.unwrap();
        assert_eq!(summary.documents, 2);
        assert_eq!(summary.lines, 7);
        assert_eq!(run.output.contents(), encode_stream(docs));
        assert_eq!(run.reporter.summary(), Some(summary));
    }

    #[tokio::test]
    async fn test_phases_follow_lifecycle() {
        let run = run_with(
            InProcessLauncher::identity(),
            MultiplexConfig::default(),
            lorem(),
        )
        .await;
        run.result.unwrap();
        assert_eq!(
            run.reporter.phases(),
            vec![
                FilterPhase::Spawned,
                FilterPhase::Feeding,
                FilterPhase::Draining,
                FilterPhase::Reaped
            ]
        );
    }

    #[tokio::test]
    async fn test_edge_documents_round_trip() {
        let docs = vec![
            Document::default(),
            Document::from("\n"),
            Document::from("trailing\n"),
            Document::from("\n\nleading"),
            Document::new(vec![0, 159, 146, 150, b'\n', 255]),
            Document::default(),
        ];
        let run = run_with(
            InProcessLauncher::identity(),
            MultiplexConfig::default(),
            docs.clone(),
        )
        .await;
        run.result.unwrap();
        assert_eq!(decode_stream(&run.output.contents()).unwrap(), docs);
    }

    #[tokio::test]
    async fn test_empty_input_produces_empty_output() {
        let run = run_with(
            InProcessLauncher::identity(),
            MultiplexConfig::default(),
            vec![],
        )
        .await;
        assert_eq!(run.result.unwrap().documents, 0);
        assert!(run.output.contents().is_empty());
    }

    #[tokio::test]
    async fn test_filter_transform_is_applied_per_document() {
        let run = run_with(
            InProcessLauncher::new(FilterBehavior::Uppercase),
            MultiplexConfig::default(),
            lorem(),
        )
        .await;
        run.result.unwrap();

        let expected: Vec<Document> = lorem()
            .into_iter()
            .map(|d| Document::new(d.as_bytes().to_ascii_uppercase()))
            .collect();
        assert_eq!(decode_stream(&run.output.contents()).unwrap(), expected);
    }

    #[tokio::test]
    async fn test_many_documents_through_small_ledger_and_pipes() {
        let docs: Vec<Document> = (0..500)
            .map(|i| Document::from(format!("doc {i}\n").repeat(i % 7).as_str()))
            .collect();
        let launcher = InProcessLauncher::identity().with_pipe_capacity(64);
        let config = MultiplexConfig::default()
            .with_ledger_capacity(3)
            .with_channel_capacity(1);

        let run = run_with(launcher, config, docs.clone()).await;
        assert_eq!(run.result.unwrap().documents, 500);
        assert_eq!(decode_stream(&run.output.contents()).unwrap(), docs);
        assert!(run.reporter.max_in_flight() <= 3);
    }

    #[tokio::test]
    async fn test_document_larger_than_pipes_does_not_deadlock() {
        let line = "x".repeat(100);
        let big = Document::from(vec![line; 2_000].join("\n").as_str());
        let launcher = InProcessLauncher::identity().with_pipe_capacity(1024);
        let run = tokio::time::timeout(
            Duration::from_secs(10),
            run_with(launcher, MultiplexConfig::default(), vec![big.clone()]),
        )
        .await
        .expect("large document must not deadlock");
        run.result.unwrap();
        assert_eq!(decode_stream(&run.output.contents()).unwrap(), vec![big]);
    }

    #[tokio::test]
    async fn test_missing_output_lines_are_fatal() {
        let run = run_with(
            InProcessLauncher::new(FilterBehavior::SkipLines(1)),
            MultiplexConfig::default(),
            vec![Document::from("a"), Document::from("b"), Document::from("c")],
        )
        .await;
        match run.result.unwrap_err() {
            FilterError::LineCountMismatch {
                document,
                expected,
                received,
            } => {
                assert_eq!((document, expected, received), (3, 1, 0));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failing_filter_exit_is_fatal_after_drain() {
        let run = run_with(
            InProcessLauncher::new(FilterBehavior::Fail {
                code: 3,
                message: "filter complaint\n".to_string(),
            }),
            MultiplexConfig::default(),
            lorem(),
        )
        .await;
        let err = run.result.unwrap_err();
        assert!(matches!(
            err,
            FilterError::Process(crate::subprocess::ProcessError::ExitCode { code: 3, .. })
        ));
        // Output was fully drained before the exit status was checked
        assert_eq!(run.output.contents(), encode_stream(lorem()));
        assert_eq!(run.errors.contents_string(), "filter complaint\n");
    }

    #[tokio::test]
    async fn test_filter_closing_output_early_is_count_mismatch() {
        let docs: Vec<Document> = (0..200)
            .map(|i| Document::from(i.to_string().as_str()))
            .collect();
        let run = run_with(
            InProcessLauncher::new(FilterBehavior::TruncateOutput { after: 5 })
                .with_pipe_capacity(16),
            MultiplexConfig::default().with_ledger_capacity(4),
            docs,
        )
        .await;
        match run.result.unwrap_err() {
            FilterError::LineCountMismatch {
                document,
                expected,
                received,
            } => {
                assert_eq!((document, expected, received), (6, 1, 0));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            decode_stream(&run.output.contents()).unwrap(),
            (0..5)
                .map(|i| Document::from(i.to_string().as_str()))
                .collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn test_malformed_input_aborts_run() {
        let reporter = Arc::new(RecordingReporter::default());
        let multiplexer = Multiplexer::new(
            MultiplexConfig::default(),
            Arc::new(InProcessLauncher::identity()),
        )
        .with_reporter(reporter.clone());
        let input = std::io::Cursor::new(b"YQ==\n%%%\nYg==\n".to_vec());
        let command = ProcessCommandBuilder::new("filter").build();

        let err = multiplexer
            .run(&command, input, SharedBuffer::new(), SharedBuffer::new())
            .await
            .unwrap_err();
        assert!(matches!(err, FilterError::MalformedInput { line: 2, .. }));
        assert!(reporter.summary().is_none());
    }

    #[tokio::test]
    async fn test_block_buffered_filter_finishes_when_input_fits_ledger() {
        let run = run_with(
            InProcessLauncher::new(FilterBehavior::BlockBuffered { block: usize::MAX }),
            MultiplexConfig::default().with_ledger_capacity(8),
            lorem(),
        )
        .await;
        run.result.unwrap();
        assert_eq!(run.output.contents(), encode_stream(lorem()));
    }

    #[tokio::test]
    async fn test_block_buffered_filter_stalls_once_ledger_fills() {
        let docs: Vec<Document> = (0..10)
            .map(|i| Document::from(i.to_string().as_str()))
            .collect();
        let pending = tokio::time::timeout(
            Duration::from_millis(300),
            run_with(
                InProcessLauncher::new(FilterBehavior::BlockBuffered { block: usize::MAX }),
                MultiplexConfig::default().with_ledger_capacity(2),
                docs,
            ),
        )
        .await;
        assert!(
            pending.is_err(),
            "a filter that withholds output must stall the pipeline"
        );
    }

    #[tokio::test]
    async fn test_invalid_config_fails_before_launch() {
        let launcher = InProcessLauncher::identity();
        let multiplexer = Multiplexer::new(
            MultiplexConfig::default().with_ledger_capacity(0),
            Arc::new(launcher.clone()),
        );
        let command = ProcessCommandBuilder::new("filter").build();
        let err = multiplexer
            .run(
                &command,
                std::io::Cursor::new(Vec::new()),
                SharedBuffer::new(),
                SharedBuffer::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FilterError::InvalidConfig(_)));
        assert!(launcher.launched().is_empty());
    }
}
