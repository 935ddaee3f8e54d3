use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use super::error::ProcessError;

/// Description of the filter program to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ProcessCommand {
    /// Command line as a single string, for logs and error messages
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Error(i32),
    Signal(i32),
}

impl ExitStatus {
    pub fn success(&self) -> bool {
        matches!(self, ExitStatus::Success)
    }

    /// Turn an abnormal exit into the matching process error
    pub fn into_result(self, command: &str) -> Result<(), ProcessError> {
        match self {
            ExitStatus::Success => Ok(()),
            ExitStatus::Error(code) => Err(ProcessError::ExitCode {
                command: command.to_string(),
                code,
            }),
            ExitStatus::Signal(signal) => Err(ProcessError::Signal {
                command: command.to_string(),
                signal,
            }),
        }
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        if status.success() {
            return ExitStatus::Success;
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ExitStatus::Signal(signal);
            }
        }
        ExitStatus::Error(status.code().unwrap_or(-1))
    }
}

pub type FilterInput = Box<dyn AsyncWrite + Send + Unpin>;
pub type FilterOutput = Box<dyn AsyncRead + Send + Unpin>;

/// The three byte streams of a running filter
pub struct FilterPipes {
    pub stdin: FilterInput,
    pub stdout: FilterOutput,
    pub stderr: FilterOutput,
}

/// Handle used to reap a running filter
#[async_trait]
pub trait FilterHandle: Send {
    /// Wait for the filter to exit
    async fn wait(&mut self) -> Result<ExitStatus, ProcessError>;
}

/// A started filter: its pipes plus the handle to reap it
pub struct FilterProcess {
    pub pipes: FilterPipes,
    pub handle: Box<dyn FilterHandle>,
}

#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    async fn launch(&self, command: &ProcessCommand) -> Result<FilterProcess, ProcessError>;
}

/// Launches filters as real child processes through `tokio::process`
pub struct TokioProcessLauncher;

impl TokioProcessLauncher {
    /// Configure the command with all three pipes
    fn configure_command(command: &ProcessCommand) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args);

        cmd.stdin(std::process::Stdio::piped());
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());

        // A fatal error drops the child; take the filter down with us.
        cmd.kill_on_drop(true);
        cmd
    }

}

#[async_trait]
impl ProcessLauncher for TokioProcessLauncher {
    async fn launch(&self, command: &ProcessCommand) -> Result<FilterProcess, ProcessError> {
        tracing::debug!("Starting filter: {}", command.display());

        let mut child = Self::configure_command(command)
            .spawn()
            .map_err(|e| ProcessError::spawn(&command.program, e))?;

        let stdin = child.stdin.take().ok_or(ProcessError::MissingPipe("stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or(ProcessError::MissingPipe("stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or(ProcessError::MissingPipe("stderr"))?;

        tracing::debug!("Filter started with pid {:?}", child.id());

        Ok(FilterProcess {
            pipes: FilterPipes {
                stdin: Box::new(stdin),
                stdout: Box::new(stdout),
                stderr: Box::new(stderr),
            },
            handle: Box::new(TokioFilterHandle {
                child,
                command: command.display(),
            }),
        })
    }
}

struct TokioFilterHandle {
    child: tokio::process::Child,
    command: String,
}

#[async_trait]
impl FilterHandle for TokioFilterHandle {
    async fn wait(&mut self) -> Result<ExitStatus, ProcessError> {
        let status = self
            .child
            .wait()
            .await
            .map_err(|source| ProcessError::WaitFailed {
                command: self.command.clone(),
                source,
            })?;
        Ok(status.into())
    }
}
