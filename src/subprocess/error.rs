use crate::error::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Failed to spawn '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to capture {0} of the filter process")]
    MissingPipe(&'static str),

    #[error("Failed to wait for '{command}': {source}")]
    WaitFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Process '{command}' exited with code {code}")]
    ExitCode { command: String, code: i32 },

    #[error("Process '{command}' terminated by signal {signal}")]
    Signal { command: String, signal: i32 },
}

impl ProcessError {
    /// Stable error code for this failure
    pub fn code(&self) -> u16 {
        match self {
            Self::CommandNotFound(_) => ErrorCode::EXEC_COMMAND_NOT_FOUND,
            Self::SpawnFailed { .. } => ErrorCode::EXEC_SPAWN_FAILED,
            Self::MissingPipe(_) => ErrorCode::EXEC_MISSING_PIPE,
            Self::WaitFailed { .. } => ErrorCode::EXEC_WAIT_FAILED,
            Self::ExitCode { .. } => ErrorCode::EXEC_SUBPROCESS_FAILED,
            Self::Signal { .. } => ErrorCode::EXEC_SIGNAL_RECEIVED,
        }
    }

    /// Build a spawn error, distinguishing a missing program from other failures
    pub fn spawn(command: impl Into<String>, source: std::io::Error) -> Self {
        let command = command.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::CommandNotFound(command)
        } else {
            Self::SpawnFailed { command, source }
        }
    }
}
