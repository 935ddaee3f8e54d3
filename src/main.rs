use b64filter::app::{handle_fatal_error, init_logging, run_filter, AppConfig};
use b64filter::cli::Cli;
use clap::Parser;
use tracing::debug;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = AppConfig::from_cli(&cli);
    init_logging(&config);

    match run_filter(&config).await {
        Ok(summary) => debug!(
            "Filter finished: {} documents, {} lines in {:?}",
            summary.documents, summary.lines, summary.elapsed
        ),
        Err(e) => handle_fatal_error(e, config.verbose),
    }
}
