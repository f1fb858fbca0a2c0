use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::core::error::{FetcherError, FetcherResult};
use crate::core::mirror::Navigator;

/// The last seen homepage source, persisted as a single file.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    path: PathBuf,
}

impl PageSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Previous content, or `None` when nothing was persisted yet.
    pub async fn read(&self) -> FetcherResult<Option<String>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(FetcherError::io(&self.path)(e)),
        }
    }

    pub async fn write(&self, content: &str) -> FetcherResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(FetcherError::io(parent))?;
        }
        tokio::fs::write(&self.path, content)
            .await
            .map_err(FetcherError::io(&self.path))
    }
}

/// Heuristic "did the release move" check: compares the whole page source
/// against the previous run's snapshot.
pub struct ChangeDetector<'a> {
    navigator: &'a dyn Navigator,
    snapshot: PageSnapshot,
}

impl<'a> ChangeDetector<'a> {
    pub fn new(navigator: &'a dyn Navigator, snapshot: PageSnapshot) -> Self {
        Self {
            navigator,
            snapshot,
        }
    }

    /// `true` on the first run, when the stored snapshot is empty, or when the
    /// page differs from the snapshot. In those cases the snapshot is
    /// replaced. An unchanged page leaves storage untouched.
    pub async fn has_changed(&self, url: &str) -> FetcherResult<bool> {
        let page = self.navigator.load_page(url).await?;
        let previous = self.snapshot.read().await?;

        let unchanged = matches!(
            previous.as_deref(),
            Some(prev) if !prev.is_empty() && prev == page.source
        );
        if unchanged {
            debug!("{} matches snapshot {:?}", url, self.snapshot.path());
            return Ok(false);
        }

        self.snapshot.write(&page.source).await?;
        info!(
            "{} changed since last run, snapshot updated at {:?}",
            url,
            self.snapshot.path()
        );
        Ok(true)
    }
}
