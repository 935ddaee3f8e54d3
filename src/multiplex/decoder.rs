//! Streaming base64 line decoder

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;

use super::document::{Document, TERMINATOR};
use super::types::StageReport;
use crate::error::FilterError;

/// Reads framing lines from the input and decodes them one at a time
pub struct DocumentDecoder<R> {
    reader: BufReader<R>,
    line: Vec<u8>,
    line_number: u64,
    finished: bool,
}

impl<R: AsyncRead + Unpin> DocumentDecoder<R> {
    pub fn new(input: R) -> Self {
        Self {
            reader: BufReader::new(input),
            line: Vec::with_capacity(1024),
            line_number: 0,
            finished: false,
        }
    }

    /// Input lines consumed so far
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    /// Decode the next document, `None` at end of input.
    ///
    /// An empty terminated line is the empty document. A final line without a
    /// terminator is decoded only if it holds something besides whitespace,
    /// and is framed exactly like a terminated one.
    pub async fn next_document(&mut self) -> Result<Option<Document>, FilterError> {
        if self.finished {
            return Ok(None);
        }

        self.line.clear();
        let read = self
            .reader
            .read_until(TERMINATOR, &mut self.line)
            .await
            .map_err(FilterError::InputRead)?;
        if read == 0 {
            self.finished = true;
            return Ok(None);
        }
        self.line_number += 1;

        let mut encoded: &[u8] = &self.line;
        if let Some(line) = encoded.strip_suffix(&[TERMINATOR]) {
            encoded = line;
        } else {
            self.finished = true;
            if encoded.trim_ascii().is_empty() {
                tracing::trace!(
                    "Ignoring blank trailing fragment after line {}",
                    self.line_number - 1
                );
                return Ok(None);
            }
        }
        let encoded = encoded.strip_suffix(b"\r").unwrap_or(encoded);

        Document::decode(encoded)
            .map(Some)
            .map_err(|source| FilterError::MalformedInput {
                line: self.line_number,
                source,
            })
    }
}

/// Decode the whole input, handing documents to the feeder in order.
///
/// Returns early without error if the feeder has gone away; its own failure
/// is what gets reported.
pub async fn run_decoder<R>(
    input: R,
    documents: mpsc::Sender<Document>,
) -> Result<StageReport, FilterError>
where
    R: AsyncRead + Unpin,
{
    let mut decoder = DocumentDecoder::new(input);
    let mut report = StageReport::default();

    while let Some(document) = decoder.next_document().await? {
        report.documents += 1;
        if documents.send(document).await.is_err() {
            report.lines = decoder.line_number();
            tracing::debug!(
                "Decoder: feeder stopped after {} documents",
                report.documents - 1
            );
            return Ok(report);
        }
    }

    report.lines = decoder.line_number();
    tracing::debug!(
        "Decoder: finished after {} input lines, {} documents",
        decoder.line_number(),
        report.documents
    );
    Ok(report)
}
