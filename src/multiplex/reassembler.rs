//! Reassembler: demultiplexes the filter's output back into documents

use std::sync::Arc;
use std::time::Instant;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

use super::document::{Document, TERMINATOR};
use super::ledger::LedgerReader;
use super::reporter::ProgressReporter;
use super::types::{Progress, StageReport};
use crate::error::FilterError;

/// Reads exactly the announced number of lines per document from the filter
pub struct LineReassembler<R> {
    reader: BufReader<R>,
}

impl<R: AsyncRead + Unpin> LineReassembler<R> {
    pub fn new(filter_output: R) -> Self {
        Self {
            reader: BufReader::new(filter_output),
        }
    }

    /// Read `count` lines and join them into one document.
    ///
    /// A final fragment without terminator counts as a line. Running out of
    /// output before `count` lines is a `LineCountMismatch`.
    pub async fn read_document(
        &mut self,
        document: u64,
        count: usize,
    ) -> Result<Document, FilterError> {
        let mut bytes = Vec::new();

        for received in 0..count {
            if received > 0 {
                bytes.push(TERMINATOR);
            }
            let read = self
                .reader
                .read_until(TERMINATOR, &mut bytes)
                .await
                .map_err(|source| FilterError::FilterRead { document, source })?;
            if read == 0 {
                return Err(FilterError::LineCountMismatch {
                    document,
                    expected: count,
                    received,
                });
            }
            if bytes.last() == Some(&TERMINATOR) {
                bytes.pop();
            } else {
                tracing::trace!(
                    "Reassembler: unterminated final line in document {}",
                    document
                );
            }
        }

        Ok(Document::new(bytes))
    }
}

/// Pop counts off the ledger until it is complete, writing one framing line
/// per document to `output`.
pub async fn run_reassembler<R, W>(
    mut ledger: LedgerReader,
    filter_output: R,
    output: W,
    reporter: Arc<dyn ProgressReporter>,
    start: Instant,
) -> Result<StageReport, FilterError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = LineReassembler::new(filter_output);
    let mut output = BufWriter::new(output);
    let mut encoded = String::new();
    let mut report = StageReport::default();

    while let Some(count) = ledger.pop().await {
        let index = report.documents + 1;
        tracing::trace!(
            "Reassembler: reading {} lines for document {} (queued: {})",
            count,
            index,
            ledger.len()
        );

        let document = lines.read_document(index, count).await?;

        encoded.clear();
        document.encode_into(&mut encoded);
        encoded.push(TERMINATOR as char);
        write_line(&mut output, &encoded)
            .await
            .map_err(|source| FilterError::OutputWrite {
                document: index,
                source,
            })?;

        report.documents = index;
        report.lines += count as u64;
        reporter.document_written(&Progress {
            documents: report.documents,
            lines: report.lines,
            elapsed: start.elapsed(),
        });
    }

    output
        .shutdown()
        .await
        .map_err(|source| FilterError::OutputWrite {
            document: report.documents,
            source,
        })?;
    tracing::debug!(
        "Reassembler: ledger drained after {} documents",
        report.documents
    );
    Ok(report)
}

async fn write_line<W>(output: &mut BufWriter<W>, line: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    output.write_all(line.as_bytes()).await?;
    output.flush().await
}
