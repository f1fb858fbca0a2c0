use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::error::{FetcherError, FetcherResult};
use crate::core::platform::PlatformCatalog;

pub const DEFAULT_SETTINGS_FILE: &str = "fetcher.json";

/// File-backed settings. Every field falls back to the eclipse.org defaults,
/// so a partial (or missing) `fetcher.json` is fine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub homepage_url: String,
    /// Visible text of the link leading to the reference platform's download page.
    pub platform_link_text: String,
    /// Visible text of the direct download link on that page.
    pub direct_link_text: String,
    /// Archive suffix of the reference platform the resolved link points at.
    pub reference_suffix: String,
    pub download_dir: PathBuf,
    pub snapshot_path: PathBuf,
    pub repository_url: String,
    pub repository_id: String,
    pub group_id: String,
    pub binary_entry: String,
    pub sources_entry: String,
    pub maven_command: String,
    pub request_timeout_secs: u64,
    pub platforms: PlatformCatalog,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            homepage_url: "http://www.eclipse.org/swt/".into(),
            platform_link_text: "Linux".into(),
            direct_link_text: "Direct link to file".into(),
            reference_suffix: "gtk-linux-x86.zip".into(),
            download_dir: PathBuf::from("downloads"),
            snapshot_path: PathBuf::from("pageSource"),
            repository_url: "svn:https://swt-repo.googlecode.com/svn/repo".into(),
            repository_id: "googlecode".into(),
            group_id: "org.eclipse.swt".into(),
            binary_entry: "swt.jar".into(),
            sources_entry: "src.zip".into(),
            maven_command: "mvn".into(),
            request_timeout_secs: 300,
            platforms: PlatformCatalog::default(),
        }
    }
}

impl Settings {
    /// Load settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> FetcherResult<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings file at {:?}, using defaults", path);
                return Ok(Self::default());
            }
            Err(e) => return Err(FetcherError::io(path)(e)),
        };

        let settings: Settings = serde_json::from_str(&raw)?;
        settings.validate()?;
        info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    pub fn validate(&self) -> FetcherResult<()> {
        if self.request_timeout_secs == 0 {
            return Err(FetcherError::Settings(
                "request_timeout_secs must be positive".into(),
            ));
        }
        for (name, value) in [
            ("homepage_url", &self.homepage_url),
            ("reference_suffix", &self.reference_suffix),
            ("repository_url", &self.repository_url),
            ("binary_entry", &self.binary_entry),
            ("sources_entry", &self.sources_entry),
            ("maven_command", &self.maven_command),
        ] {
            if value.trim().is_empty() {
                return Err(FetcherError::Settings(format!("{} must not be empty", name)));
            }
        }
        self.platforms.validate()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Immutable per-run configuration, built once from the command line and
/// the settings file and handed to every component by reference.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub deploy: bool,
    pub silent: bool,
    pub force: bool,
    pub settings: Settings,
}

impl RunConfig {
    pub fn download_dir(&self) -> &Path {
        &self.settings.download_dir
    }

    /// Prints a progress fragment on stdout unless `--silent` was given.
    pub fn progress(&self, text: &str) {
        self.emit(text, false);
    }

    pub fn progress_line(&self, text: &str) {
        self.emit(&format!("{}\n", text), false);
    }

    /// Result lines (deploy outcome, run summary) are printed even with
    /// `--silent`.
    pub fn result_line(&self, text: &str) {
        self.emit(&format!("{}\n", text), true);
    }

    fn shows(&self, essential: bool) -> bool {
        essential || !self.silent
    }

    fn emit(&self, text: &str, essential: bool) {
        if self.shows(essential) {
            use std::io::Write;
            let mut out = std::io::stdout().lock();
            let _ = out.write_all(text.as_bytes());
            let _ = out.flush();
        }
    }
}
