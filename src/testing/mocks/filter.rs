//! In-process filter programs
//!
//! `InProcessLauncher` hands the multiplexer three `tokio::io::duplex` pipes
//! whose far ends are driven by a task playing one of a few well-known
//! filter behaviours, including ones that break the line contract.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::task::JoinHandle;

use crate::subprocess::{
    ExitStatus, FilterHandle, FilterPipes, FilterProcess, ProcessCommand, ProcessError,
    ProcessLauncher,
};

/// Default duplex buffer size, roughly an OS pipe
pub const DEFAULT_PIPE_CAPACITY: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterBehavior {
    /// Echo every line as soon as it is read
    Identity,
    /// Echo every line in ASCII upper case
    Uppercase,
    /// Swallow the first `n` lines, echo the rest
    SkipLines(usize),
    /// Echo lines but only flush once `block` bytes are pending or input ends
    BlockBuffered { block: usize },
    /// Echo `after` lines, close the output, then swallow the rest of the input
    TruncateOutput { after: usize },
    /// Echo everything, print `message` on stderr, exit with `code`
    Fail { code: i32, message: String },
}

/// Launcher that runs a `FilterBehavior` on a tokio task
#[derive(Clone)]
pub struct InProcessLauncher {
    behavior: FilterBehavior,
    pipe_capacity: usize,
    launched: Arc<Mutex<Vec<ProcessCommand>>>,
}

impl InProcessLauncher {
    pub fn new(behavior: FilterBehavior) -> Self {
        Self {
            behavior,
            pipe_capacity: DEFAULT_PIPE_CAPACITY,
            launched: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn identity() -> Self {
        Self::new(FilterBehavior::Identity)
    }

    /// Use smaller pipes to make backpressure show up sooner
    pub fn with_pipe_capacity(mut self, capacity: usize) -> Self {
        self.pipe_capacity = capacity;
        self
    }

    /// Commands this launcher was asked to start
    pub fn launched(&self) -> Vec<ProcessCommand> {
        self.launched
            .lock()
            .map(|launched| launched.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ProcessLauncher for InProcessLauncher {
    async fn launch(&self, command: &ProcessCommand) -> Result<FilterProcess, ProcessError> {
        if let Ok(mut launched) = self.launched.lock() {
            launched.push(command.clone());
        }

        let (stdin, filter_stdin) = tokio::io::duplex(self.pipe_capacity);
        let (filter_stdout, stdout) = tokio::io::duplex(self.pipe_capacity);
        let (filter_stderr, stderr) = tokio::io::duplex(self.pipe_capacity);

        let task = tokio::spawn(run_behavior(
            self.behavior.clone(),
            filter_stdin,
            filter_stdout,
            filter_stderr,
        ));

        Ok(FilterProcess {
            pipes: FilterPipes {
                stdin: Box::new(stdin),
                stdout: Box::new(stdout),
                stderr: Box::new(stderr),
            },
            handle: Box::new(InProcessHandle {
                task: Some(task),
                command: command.display(),
            }),
        })
    }
}

struct InProcessHandle {
    task: Option<JoinHandle<ExitStatus>>,
    command: String,
}

impl Drop for InProcessHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[async_trait]
impl FilterHandle for InProcessHandle {
    async fn wait(&mut self) -> Result<ExitStatus, ProcessError> {
        let Some(task) = self.task.take() else {
            return Err(ProcessError::WaitFailed {
                command: self.command.clone(),
                source: std::io::Error::other("already reaped"),
            });
        };
        task.await.map_err(|e| ProcessError::WaitFailed {
            command: self.command.clone(),
            source: std::io::Error::other(e.to_string()),
        })
    }
}

async fn run_behavior(
    behavior: FilterBehavior,
    stdin: DuplexStream,
    mut stdout: DuplexStream,
    mut stderr: DuplexStream,
) -> ExitStatus {
    let mut lines = BufReader::new(stdin);
    let mut line = Vec::new();
    let mut pending = Vec::new();
    let mut seen = 0usize;

    loop {
        line.clear();
        match lines.read_until(b'\n', &mut line).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        seen += 1;

        match &behavior {
            FilterBehavior::SkipLines(n) if seen <= *n => continue,
            FilterBehavior::Uppercase => line.make_ascii_uppercase(),
            _ => {}
        }

        if let FilterBehavior::BlockBuffered { block } = behavior {
            pending.extend_from_slice(&line);
            if pending.len() >= block && flush_pending(&mut stdout, &mut pending).await.is_err() {
                return ExitStatus::Signal(13);
            }
            continue;
        }

        if stdout.write_all(&line).await.is_err() {
            // The reader went away, like SIGPIPE
            return ExitStatus::Signal(13);
        }

        if let FilterBehavior::TruncateOutput { after } = behavior {
            if seen >= after {
                let _ = stdout.shutdown().await;
                drop(stdout);
                return swallow_input(lines).await;
            }
        }
    }

    if flush_pending(&mut stdout, &mut pending).await.is_err() {
        return ExitStatus::Signal(13);
    }
    let _ = stdout.shutdown().await;

    match behavior {
        FilterBehavior::Fail { code, message } => {
            let _ = stderr.write_all(message.as_bytes()).await;
            ExitStatus::Error(code)
        }
        _ => ExitStatus::Success,
    }
}

async fn swallow_input(mut lines: BufReader<DuplexStream>) -> ExitStatus {
    let mut line = Vec::new();
    loop {
        line.clear();
        match lines.read_until(b'\n', &mut line).await {
            Ok(0) | Err(_) => return ExitStatus::Success,
            Ok(_) => {}
        }
    }
}

async fn flush_pending(stdout: &mut DuplexStream, pending: &mut Vec<u8>) -> std::io::Result<()> {
    if !pending.is_empty() {
        stdout.write_all(pending).await?;
        pending.clear();
    }
    Ok(())
}
