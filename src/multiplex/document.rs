//! Documents and their base64 line framing
//!
//! A document travels through the filter as `line_count()` physical lines:
//! every segment between terminators is written followed by a terminator, so
//! the last segment (possibly empty) is always terminated. Reading the same
//! number of lines back and joining them with the terminator restores the
//! original bytes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Line terminator used on every stream
pub const TERMINATOR: u8 = b'\n';

/// One decoded record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    bytes: Vec<u8>,
}

impl Document {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Decode one framing line, without its terminator
    pub fn decode(encoded: &[u8]) -> Result<Self, base64::DecodeError> {
        STANDARD.decode(encoded).map(Self::new)
    }

    /// Append the base64 framing line for this document to `out`, without a terminator
    pub fn encode_into(&self, out: &mut String) {
        STANDARD.encode_string(&self.bytes, out);
    }

    pub fn encode(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Embedded terminators in the document
    pub fn terminators(&self) -> usize {
        self.bytes.iter().filter(|&&b| b == TERMINATOR).count()
    }

    /// Physical lines the document occupies in the filter's streams.
    ///
    /// Always `terminators() + 1`: the empty document is one empty line.
    pub fn line_count(&self) -> usize {
        self.terminators() + 1
    }

    /// The physical lines, without terminators
    pub fn lines(&self) -> impl Iterator<Item = &[u8]> {
        self.bytes.split(|&b| b == TERMINATOR)
    }
}

impl From<Vec<u8>> for Document {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&str> for Document {
    fn from(text: &str) -> Self {
        Self::new(text.as_bytes().to_vec())
    }
}
