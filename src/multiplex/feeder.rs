//! Feeder: writes documents into the filter and records their line counts

use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;

use super::document::{Document, TERMINATOR};
use super::ledger::LedgerWriter;
use super::reporter::ProgressReporter;
use super::types::StageReport;
use crate::error::FilterError;

/// Feed every document to the filter's input, in arrival order.
///
/// Each document's count is pushed before its lines are written so the
/// reassembler can start consuming a large document while it is still being
/// written. Once the documents run out the filter's input is closed, then the
/// ledger.
pub async fn run_feeder<W>(
    mut documents: mpsc::Receiver<Document>,
    filter_input: W,
    ledger: LedgerWriter,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<StageReport, FilterError>
where
    W: AsyncWrite + Unpin,
{
    let mut input = BufWriter::new(filter_input);
    let mut report = StageReport::default();

    while let Some(document) = documents.recv().await {
        let index = report.documents + 1;
        let count = document.line_count();

        ledger
            .push(count)
            .await
            .map_err(|_| FilterError::LedgerClosed { document: index })?;
        reporter.document_fed(index, count, ledger.in_flight());

        write_document(&mut input, &document)
            .await
            .map_err(|source| FilterError::FilterWrite {
                document: index,
                source,
            })?;

        report.documents = index;
        report.lines += count as u64;
    }

    input
        .shutdown()
        .await
        .map_err(|source| FilterError::FilterWrite {
            document: report.documents,
            source,
        })?;
    drop(input);
    tracing::debug!(
        "Feeder: closed filter input after {} documents, {} lines",
        report.documents,
        report.lines
    );

    ledger.close();
    Ok(report)
}

/// Write the document's lines, each followed by a terminator, and flush
async fn write_document<W>(input: &mut BufWriter<W>, document: &Document) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    for line in document.lines() {
        input.write_all(line).await?;
        input.write_u8(TERMINATOR).await?;
    }
    input.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multiplex::ledger::count_ledger;
    use crate::testing::RecordingReporter;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;

    fn reporter() -> Arc<dyn ProgressReporter> {
        Arc::new(RecordingReporter::default())
    }

    #[tokio::test]
    async fn test_feeds_lines_and_counts() {
        let (doc_tx, doc_rx) = mpsc::channel(4);
        let (ledger, mut counts) = count_ledger(4);
        let (filter_in, mut filter_side) = tokio::io::duplex(1024);

        doc_tx.send(Document::from("a\nb")).await.unwrap();
        doc_tx.send(Document::default()).await.unwrap();
        doc_tx.send(Document::from("c\n")).await.unwrap();
        drop(doc_tx);

        let report = run_feeder(doc_rx, filter_in, ledger, reporter())
            .await
            .unwrap();
        assert_eq!(report.documents, 3);
        assert_eq!(report.lines, 5);

        let mut written = Vec::new();
        filter_side.read_to_end(&mut written).await.unwrap();
        assert_eq!(written, b"a\nb\n\nc\n\n");

        assert_eq!(counts.pop().await, Some(2));
        assert_eq!(counts.pop().await, Some(1));
        assert_eq!(counts.pop().await, Some(2));
        assert_eq!(counts.pop().await, None);
    }

    #[tokio::test]
    async fn test_full_ledger_stalls_feeder_without_loss() {
        let (doc_tx, doc_rx) = mpsc::channel(8);
        let (ledger, mut counts) = count_ledger(2);
        let (filter_in, mut filter_side) = tokio::io::duplex(64 * 1024);

        for text in ["one", "two\nlines", "three", "four", "five"] {
            doc_tx.send(Document::from(text)).await.unwrap();
        }
        drop(doc_tx);

        let feeder = tokio::spawn(run_feeder(doc_rx, filter_in, ledger, reporter()));

        // Nobody pops: the feeder must stop once two documents are in flight
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!feeder.is_finished());
        assert_eq!(counts.len(), 2);

        let mut popped = Vec::new();
        while let Some(count) = counts.pop().await {
            popped.push(count);
        }
        let report = feeder.await.unwrap().unwrap();

        assert_eq!(popped, vec![1, 2, 1, 1, 1]);
        assert_eq!(report.documents, 5);

        let mut written = Vec::new();
        filter_side.read_to_end(&mut written).await.unwrap();
        assert_eq!(written, b"one\ntwo\nlines\nthree\nfour\nfive\n");
    }

    #[tokio::test]
    async fn test_closed_ledger_is_reported() {
        let (doc_tx, doc_rx) = mpsc::channel(1);
        let (ledger, counts) = count_ledger(1);
        drop(counts);
        doc_tx.send(Document::from("x")).await.unwrap();
        drop(doc_tx);

        let err = run_feeder(doc_rx, tokio::io::sink(), ledger, reporter())
            .await
            .unwrap_err();
        assert!(matches!(err, FilterError::LedgerClosed { document: 1 }));
    }

    #[tokio::test]
    async fn test_broken_filter_input_is_fatal() {
        let (doc_tx, doc_rx) = mpsc::channel(1);
        let (ledger, _counts) = count_ledger(1);
        let (filter_in, filter_side) = tokio::io::duplex(16);
        drop(filter_side);
        doc_tx.send(Document::from("x")).await.unwrap();
        drop(doc_tx);

        let err = run_feeder(doc_rx, filter_in, ledger, reporter())
            .await
            .unwrap_err();
        assert!(matches!(err, FilterError::FilterWrite { document: 1, .. }));
    }
}
