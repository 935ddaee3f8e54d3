/// Error code registry for b64filter
///
/// Error codes are organized by category:
/// - 1000-1999: Configuration errors
/// - 2000-2999: Input stream errors
/// - 3000-3999: Filter pipe errors
/// - 4000-4999: Filter process errors
/// - 5000-5999: Output stream errors
/// - 9000-9999: Internal errors
pub struct ErrorCode;

impl ErrorCode {
    // Configuration errors (1000-1999)
    pub const CONFIG_INVALID_VALUE: u16 = 1001;

    // Input stream errors (2000-2999)
    pub const INPUT_READ_FAILED: u16 = 2001;
    pub const INPUT_MALFORMED_BASE64: u16 = 2002;

    // Filter pipe errors (3000-3999)
    pub const PIPE_WRITE_FAILED: u16 = 3001;
    pub const PIPE_READ_FAILED: u16 = 3002;
    pub const PIPE_LINE_COUNT_MISMATCH: u16 = 3003;
    pub const PIPE_LEDGER_CLOSED: u16 = 3004;

    // Filter process errors (4000-4999)
    pub const EXEC_COMMAND_NOT_FOUND: u16 = 4001;
    pub const EXEC_SPAWN_FAILED: u16 = 4002;
    pub const EXEC_SUBPROCESS_FAILED: u16 = 4003;
    pub const EXEC_SIGNAL_RECEIVED: u16 = 4004;
    pub const EXEC_MISSING_PIPE: u16 = 4005;
    pub const EXEC_WAIT_FAILED: u16 = 4006;

    // Output stream errors (5000-5999)
    pub const OUTPUT_WRITE_FAILED: u16 = 5001;

    // Internal errors (9000-9999)
    pub const INTERNAL_TASK_FAILED: u16 = 9001;
}

/// Get a human-readable description for an error code
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        ErrorCode::CONFIG_INVALID_VALUE => "Invalid configuration value",

        ErrorCode::INPUT_READ_FAILED => "Failed to read the input stream",
        ErrorCode::INPUT_MALFORMED_BASE64 => "Input line is not valid base64",

        ErrorCode::PIPE_WRITE_FAILED => "Failed to write to the filter's input",
        ErrorCode::PIPE_READ_FAILED => "Failed to read the filter's output",
        ErrorCode::PIPE_LINE_COUNT_MISMATCH => {
            "Filter produced fewer output lines than it was given"
        }
        ErrorCode::PIPE_LEDGER_CLOSED => "Reassembly stopped before all documents were fed",

        ErrorCode::EXEC_COMMAND_NOT_FOUND => "Filter program not found",
        ErrorCode::EXEC_SPAWN_FAILED => "Failed to start the filter program",
        ErrorCode::EXEC_SUBPROCESS_FAILED => "Filter program exited with a failure status",
        ErrorCode::EXEC_SIGNAL_RECEIVED => "Filter program was terminated by a signal",
        ErrorCode::EXEC_MISSING_PIPE => "Filter program pipe was not captured",
        ErrorCode::EXEC_WAIT_FAILED => "Failed to wait for the filter program",

        ErrorCode::OUTPUT_WRITE_FAILED => "Failed to write the output stream",

        ErrorCode::INTERNAL_TASK_FAILED => "Internal pipeline task failed",

        _ => "Unknown error",
    }
}
