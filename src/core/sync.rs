use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::core::change::{ChangeDetector, PageSnapshot};
use crate::core::downloader::{ArtifactFetcher, Transport};
use crate::core::error::{FetcherError, FetcherResult};
use crate::core::maven::{ArtifactPublisher, DeployEngine};
use crate::core::mirror::{MirrorResolver, Navigator, ReleaseContext};
use crate::core::platform::PlatformEntry;
use crate::core::settings::RunConfig;

/// What happened to one platform entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    /// The local copy already matched the published checksum.
    Skipped,
    /// Downloaded and verified; deploy not requested.
    Downloaded,
    /// Downloaded, verified and deployed.
    Published,
}

#[derive(Debug)]
pub struct EntryReport {
    pub entry: PlatformEntry,
    pub result: FetcherResult<EntryOutcome>,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub release: Option<ReleaseContext>,
    /// Set when change detection short-circuited the run.
    pub unchanged: bool,
    pub entries: Vec<EntryReport>,
}

impl RunReport {
    fn count(&self, outcome: EntryOutcome) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.result, Ok(o) if o == outcome))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &EntryReport> {
        self.entries.iter().filter(|e| e.result.is_err())
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unchanged {
            return write!(f, "Nothing to do: release page unchanged since last run");
        }
        let published = self.count(EntryOutcome::Published);
        write!(
            f,
            "{} downloaded, {} skipped, {} published, {} failed",
            self.count(EntryOutcome::Downloaded) + published,
            self.count(EntryOutcome::Skipped),
            published,
            self.failures().count()
        )
    }
}

/// One run: resolve the release, check for changes, then fetch (and
/// optionally publish) every platform entry in order.
pub struct ReleaseSync<'a> {
    config: &'a RunConfig,
    navigator: &'a dyn Navigator,
    transport: &'a dyn Transport,
    publisher: ArtifactPublisher<'a>,
    cancelled: Arc<AtomicBool>,
}

impl<'a> ReleaseSync<'a> {
    pub fn new(
        config: &'a RunConfig,
        navigator: &'a dyn Navigator,
        transport: &'a dyn Transport,
        deployer: &'a dyn DeployEngine,
    ) -> Self {
        Self {
            config,
            navigator,
            transport,
            publisher: ArtifactPublisher::new(deployer, &config.settings),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share a flag that, once set, stops the run before the next entry.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancelled = flag;
        self
    }

    pub fn with_publisher(mut self, publisher: ArtifactPublisher<'a>) -> Self {
        self.publisher = publisher;
        self
    }

    pub async fn run(&self) -> FetcherResult<RunReport> {
        let settings = &self.config.settings;

        let release = MirrorResolver::new(self.navigator, settings)
            .resolve(&settings.homepage_url)
            .await?;
        self.config
            .progress_line(&format!("Current SWT version: {}", release.version_name));

        if !self.config.force && !self.page_changed().await? {
            info!("{} unchanged, stopping", settings.homepage_url);
            return Ok(RunReport {
                release: Some(release),
                unchanged: true,
                entries: Vec::new(),
            });
        }

        let download_dir = self.config.download_dir();
        tokio::fs::create_dir_all(download_dir)
            .await
            .map_err(FetcherError::io(download_dir))?;

        let mut entries = Vec::with_capacity(settings.platforms.len());
        for entry in &settings.platforms {
            let result = if self.cancelled.load(Ordering::SeqCst) {
                Err(FetcherError::Cancelled)
            } else {
                self.process_entry(entry, &release).await
            };

            if let Err(e) = &result {
                error!("{}: {}", entry, e);
            }
            entries.push(EntryReport {
                entry: entry.clone(),
                result,
            });
        }

        Ok(RunReport {
            release: Some(release),
            unchanged: false,
            entries,
        })
    }

    /// I/O trouble with the snapshot is not fatal: the run proceeds as if
    /// the page had changed.
    async fn page_changed(&self) -> FetcherResult<bool> {
        let settings = &self.config.settings;
        let detector = ChangeDetector::new(
            self.navigator,
            PageSnapshot::new(&settings.snapshot_path),
        );

        match detector.has_changed(&settings.homepage_url).await {
            Ok(changed) => Ok(changed),
            Err(e) if e.is_io() => {
                warn!("Change detection failed, assuming changed: {}", e);
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    async fn process_entry(
        &self,
        entry: &PlatformEntry,
        release: &ReleaseContext,
    ) -> FetcherResult<EntryOutcome> {
        self.config
            .progress(&format!("* Downloading {} ... ", entry.archive_suffix));

        let fetched = ArtifactFetcher::new(self.transport)
            .fetch_and_verify(entry, release, self.config.download_dir())
            .await;
        let artifact = match fetched {
            Ok(artifact) => artifact,
            Err(e) => {
                self.config.progress_line("FAILED");
                return Err(e);
            }
        };

        if !artifact.is_new_download {
            self.config.progress_line("SKIP");
            return Ok(EntryOutcome::Skipped);
        }
        self.config.progress_line("DONE");

        if !self.config.deploy {
            return Ok(EntryOutcome::Downloaded);
        }

        match self.publisher.publish(&artifact, entry, release).await {
            Ok(()) => {
                self.config.result_line("Maven deploy succeeded!");
                Ok(EntryOutcome::Published)
            }
            Err(e) => {
                self.config.result_line("Maven deploy failed!");
                Err(e)
            }
        }
    }
}
