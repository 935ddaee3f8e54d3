//! Testing utilities
//!
//! Helpers shared by unit tests, integration tests and benchmarks: in-process
//! filters, a recording reporter and a shared output buffer.

pub mod buffer;
pub mod mocks;

pub use buffer::SharedBuffer;
pub use mocks::{FilterBehavior, InProcessLauncher, RecordingReporter, ReportEvent};

use crate::multiplex::Document;

/// Encode documents as the multiplexer's input stream, one line each
pub fn encode_stream<I, D>(documents: I) -> Vec<u8>
where
    I: IntoIterator<Item = D>,
    D: Into<Document>,
{
    let mut stream = String::new();
    for document in documents {
        document.into().encode_into(&mut stream);
        stream.push('\n');
    }
    stream.into_bytes()
}

/// Decode a multiplexer output stream back into documents
pub fn decode_stream(stream: &[u8]) -> Result<Vec<Document>, base64::DecodeError> {
    if stream.is_empty() {
        return Ok(Vec::new());
    }
    let text = stream.strip_suffix(b"\n").unwrap_or(stream);
    text.split(|&b| b == b'\n').map(Document::decode).collect()
}
