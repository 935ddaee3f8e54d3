//! Error handling utilities
//!
//! This module provides centralized error handling for the application.

use tracing::error;

use crate::error::FilterError;

/// Exit code for errors that never became a `FilterError`
const GENERAL_ERROR: i32 = 1;

/// Handle fatal errors and exit with appropriate status code
///
/// A `FilterError` is shown with its `[E####]` code and mapped to its exit
/// code. Anything else exits with the general error code. With `verbose >= 1`
/// the full cause chain follows the message.
pub fn handle_fatal_error(error: anyhow::Error, verbose: u8) -> ! {
    error!("Fatal error: {}", error);
    eprintln!("{}", render_fatal_error(&error, verbose));
    std::process::exit(fatal_exit_code(&error))
}

/// Text printed for a fatal error
pub fn render_fatal_error(error: &anyhow::Error, verbose: u8) -> String {
    if let Some(filter_err) = error.downcast_ref::<FilterError>() {
        let mut message = format!("Error: {}", filter_err.user_message());
        if verbose >= 1 {
            message.push_str("\n\nContext Chain:\n");
            message.push_str(&filter_err.developer_message());
        }
        return message;
    }

    let mut message = format!("Error: {error}");
    if verbose >= 1 {
        message.push_str("\n\nError chain:");
        for (i, cause) in error.chain().enumerate() {
            message.push_str(&format!("\n  {}: {}", i, cause));
        }
    }
    message
}

/// Process exit code for a fatal error
pub fn fatal_exit_code(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<FilterError>()
        .map(FilterError::exit_code)
        .unwrap_or(GENERAL_ERROR)
}
