use thiserror::Error;

pub mod codes;

pub use codes::{describe_error_code, ErrorCode};

use crate::subprocess::ProcessError;

/// The unified error type for a filter run
///
/// Every variant is fatal to the run. The only tolerated failure, a broken
/// error drain, is logged where it happens and never becomes a `FilterError`.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read input: {0}")]
    InputRead(#[source] std::io::Error),

    #[error("Input line {line} is not valid base64: {source}")]
    MalformedInput {
        line: u64,
        #[source]
        source: base64::DecodeError,
    },

    #[error("Error writing document {document} to filter: {source}")]
    FilterWrite {
        document: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("Error reading document {document} from filter: {source}")]
    FilterRead {
        document: u64,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Document {document}: expected {expected} lines from filter, got {received} before its output ended"
    )]
    LineCountMismatch {
        document: u64,
        expected: usize,
        received: usize,
    },

    #[error("Error writing document {document} to output: {source}")]
    OutputWrite {
        document: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("Ledger closed while feeding document {document}")]
    LedgerClosed { document: u64 },

    #[error("{task} task failed: {message}")]
    TaskFailed { task: &'static str, message: String },

    #[error(transparent)]
    Process(#[from] ProcessError),
}

impl FilterError {
    /// Get the error code
    pub fn code(&self) -> u16 {
        match self {
            Self::InvalidConfig(_) => ErrorCode::CONFIG_INVALID_VALUE,
            Self::InputRead(_) => ErrorCode::INPUT_READ_FAILED,
            Self::MalformedInput { .. } => ErrorCode::INPUT_MALFORMED_BASE64,
            Self::FilterWrite { .. } => ErrorCode::PIPE_WRITE_FAILED,
            Self::FilterRead { .. } => ErrorCode::PIPE_READ_FAILED,
            Self::LineCountMismatch { .. } => ErrorCode::PIPE_LINE_COUNT_MISMATCH,
            Self::OutputWrite { .. } => ErrorCode::OUTPUT_WRITE_FAILED,
            Self::LedgerClosed { .. } => ErrorCode::PIPE_LEDGER_CLOSED,
            Self::TaskFailed { .. } => ErrorCode::INTERNAL_TASK_FAILED,
            Self::Process(err) => err.code(),
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidConfig(_) => 2,
            Self::InputRead(_) | Self::MalformedInput { .. } => 3,
            Self::FilterWrite { .. }
            | Self::FilterRead { .. }
            | Self::LineCountMismatch { .. }
            | Self::LedgerClosed { .. } => 4,
            Self::Process(_) => 5,
            Self::OutputWrite { .. } => 6,
            Self::TaskFailed { .. } => 1,
        }
    }

    /// Message shown to the user, prefixed with the error code
    pub fn user_message(&self) -> String {
        format!("[E{:04}] {}", self.code(), self)
    }

    /// Full message including the source chain, for verbose output
    pub fn developer_message(&self) -> String {
        let mut message = format!(
            "[E{:04}] {} ({})",
            self.code(),
            self,
            describe_error_code(self.code())
        );
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(&format!("\n  caused by: {}", cause));
            source = std::error::Error::source(cause);
        }
        message
    }
}
