//! Streaming document multiplexer
//!
//! Turns a line-oriented filter program into a document-level filter. Four
//! concurrent stages share the filter's pipes:
//!
//! - the decoder reads base64 framing lines and decodes documents,
//! - the feeder writes each document's lines to the filter and pushes the
//!   line count onto the ledger,
//! - the reassembler pops counts, reads exactly that many lines back,
//!   re-encodes the document and writes it out,
//! - the error drain copies the filter's stderr through.
//!
//! The ledger position is the only link between a document fed and the
//! document written: the k-th count pushed is the k-th document read and the
//! k-th document written. This only holds for filters that emit exactly one
//! line per line read, without holding lines back.

pub mod coordinator;
pub mod decoder;
pub mod document;
pub mod error_drain;
pub mod feeder;
pub mod ledger;
pub mod reassembler;
pub mod reporter;
pub mod types;

pub use coordinator::Multiplexer;
pub use decoder::{run_decoder, DocumentDecoder};
pub use document::{Document, TERMINATOR};
pub use error_drain::drain_errors;
pub use feeder::run_feeder;
pub use ledger::{count_ledger, LedgerClosed, LedgerReader, LedgerWriter};
pub use reassembler::{run_reassembler, LineReassembler};
pub use reporter::{ProgressReporter, TracingReporter};
pub use types::{
    FilterPhase, FilterSummary, MultiplexConfig, Progress, StageReport, DEFAULT_CHANNEL_CAPACITY,
    DEFAULT_LEDGER_CAPACITY, DEFAULT_PROGRESS_INTERVAL,
};
