mod cli;
mod commands;
pub mod core;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

pub use crate::core::error::{FetcherError, FetcherResult};

/// Parse arguments, set up logging and run one fetch pass. Returns the
/// process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();

    // Initialize structured logging (stderr, so progress on stdout stays readable)
    let default_filter = if cli.debug {
        "debug"
    } else if cli.silent {
        "warn"
    } else {
        "warn,swt_release_fetcher_lib=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match commands::build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            return commands::EXIT_FAILURE;
        }
    };

    tracing::debug!("Run configuration: {:?}", config);
    commands::fetch_release(&config).await
}
