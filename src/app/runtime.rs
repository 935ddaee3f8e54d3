//! Runtime entry point
//!
//! Wires the process standard streams to a `Multiplexer` running the
//! configured filter.

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use crate::app::config::AppConfig;
use crate::error::FilterError;
use crate::multiplex::{FilterSummary, Multiplexer};
use crate::subprocess::SubprocessManager;

/// Run the configured filter over standard input
pub async fn run_filter(config: &AppConfig) -> Result<FilterSummary> {
    run_filter_with(
        config,
        &SubprocessManager::production(),
        tokio::io::stdin(),
        tokio::io::stdout(),
        tokio::io::stderr(),
    )
    .await
}

/// Run the configured filter over the given streams
pub async fn run_filter_with<R, W, E>(
    config: &AppConfig,
    subprocess: &SubprocessManager,
    input: R,
    output: W,
    errors: E,
) -> Result<FilterSummary>
where
    R: AsyncRead + Send + Unpin + 'static,
    W: AsyncWrite + Send + Unpin + 'static,
    E: AsyncWrite + Send + Unpin + 'static,
{
    let command = config
        .filter_command()
        .ok_or_else(|| FilterError::InvalidConfig("no filter program given".to_string()))?;
    debug!("Filter command: {}", command.display());

    let multiplexer = Multiplexer::new(config.multiplex.clone(), subprocess.launcher());
    let summary = multiplexer
        .run(&command, input, output, errors)
        .await
        .with_context(|| format!("filter `{}` failed", command.display()))?;
    Ok(summary)
}
