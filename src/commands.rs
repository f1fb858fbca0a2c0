use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{error, warn};

use crate::cli::Cli;
use crate::core::downloader::HttpTransport;
use crate::core::error::FetcherResult;
use crate::core::http::build_http_client;
use crate::core::maven::MavenCli;
use crate::core::mirror::HttpNavigator;
use crate::core::settings::{RunConfig, Settings};
use crate::core::sync::ReleaseSync;

/// Exit code for a run that completed without failed entries.
pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
/// Exit code after a second Ctrl-C (128 + SIGINT).
pub const EXIT_INTERRUPTED: i32 = 130;

pub fn build_config(cli: &Cli) -> FetcherResult<RunConfig> {
    let mut settings = Settings::load(&cli.config)?;
    if let Some(dir) = &cli.download_dir {
        settings.download_dir = dir.clone();
    }

    Ok(RunConfig {
        deploy: cli.deploy,
        silent: cli.silent,
        force: cli.force,
        settings,
    })
}

/// Run one fetch (and optional deploy) pass with the production network
/// and Maven collaborators. Returns the process exit code.
pub async fn fetch_release(config: &RunConfig) -> i32 {
    let client = match build_http_client(config.settings.request_timeout()) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return EXIT_FAILURE;
        }
    };
    let navigator = HttpNavigator::new(client.clone());
    let transport = HttpTransport::new(client);
    let deployer = MavenCli::new(config.settings.maven_command.clone());

    let cancelled = Arc::new(AtomicBool::new(false));
    let interrupt = {
        let cancelled = Arc::clone(&cancelled);
        tokio::spawn(async move {
            if watch_interrupts(tokio::signal::ctrl_c, cancelled).await {
                std::process::exit(EXIT_INTERRUPTED);
            }
        })
    };

    let outcome = ReleaseSync::new(config, &navigator, &transport, &deployer)
        .with_cancel_flag(cancelled)
        .run()
        .await;
    interrupt.abort();

    match outcome {
        Ok(report) => {
            for failure in report.failures() {
                if let Err(e) = &failure.result {
                    error!("{} failed: {}", failure.entry.archive_suffix, e);
                }
            }
            config.result_line(&report.to_string());
            if report.is_success() {
                EXIT_OK
            } else {
                EXIT_FAILURE
            }
        }
        Err(e) => {
            error!("Run aborted: {}", e);
            EXIT_FAILURE
        }
    }
}

/// The first signal sets `cancelled` so the run stops between archives.
/// Returns `true` once a second signal arrives and the caller should exit
/// without waiting for the current archive.
async fn watch_interrupts<F, Fut>(mut next_signal: F, cancelled: Arc<AtomicBool>) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if next_signal().await.is_err() {
        return false;
    }
    warn!("Interrupted, stopping after the current archive (Ctrl-C again to exit now)");
    cancelled.store(true, Ordering::SeqCst);

    if next_signal().await.is_err() {
        return false;
    }
    warn!("Interrupted again, exiting");
    true
}
