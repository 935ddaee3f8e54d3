//! Filter process abstraction
//!
//! The multiplexer only needs three byte streams and a way to reap the
//! filter. `ProcessLauncher` hides how those are obtained so tests can swap
//! the real child process for an in-process filter.

pub mod builder;
pub mod error;
pub mod runner;

pub use builder::ProcessCommandBuilder;
pub use error::ProcessError;
pub use runner::{
    ExitStatus, FilterHandle, FilterInput, FilterOutput, FilterPipes, FilterProcess,
    ProcessCommand, ProcessLauncher, TokioProcessLauncher,
};

use std::sync::Arc;

#[derive(Clone)]
pub struct SubprocessManager {
    launcher: Arc<dyn ProcessLauncher>,
}

impl SubprocessManager {
    pub fn new(launcher: Arc<dyn ProcessLauncher>) -> Self {
        Self { launcher }
    }

    pub fn production() -> Self {
        Self::new(Arc::new(TokioProcessLauncher))
    }

    pub fn launcher(&self) -> Arc<dyn ProcessLauncher> {
        Arc::clone(&self.launcher)
    }
}
