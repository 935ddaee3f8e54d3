//! # b64filter
//!
//! Run a line-oriented Unix filter over a stream of base64-encoded documents,
//! one document per line, using a single long-running filter process.
//!
//! ## Usage
//!
//! ```bash
//! b64filter [-v] [-p N] [--ledger-capacity N] sed -u 's/foo/bar/' < in.b64 > out.b64
//! ```
//!
//! ## Modules
//!
//! - `app` - Configuration, logging setup and the runtime entry point
//! - `cli` - Command-line argument structures
//! - `error` - Unified error type and error-code registry
//! - `multiplex` - Document codec, line-count ledger and the pipeline stages
//! - `subprocess` - Process launching abstraction for testability
//! - `testing` - In-process filters and recorders for tests and benchmarks
pub mod app;
pub mod cli;
pub mod error;
pub mod multiplex;
pub mod subprocess;

pub mod testing;

pub use error::FilterError;
pub use multiplex::{Document, FilterSummary, MultiplexConfig, Multiplexer};
