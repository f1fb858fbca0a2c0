use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the fetcher.
/// Every module returns `Result<T, FetcherError>`.
#[derive(Debug, Error)]
pub enum FetcherError {
    // ── Resolution ──────────────────────────────────────
    #[error("Release resolution failed: {0}")]
    Resolution(String),

    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    // ── Integrity ───────────────────────────────────────
    #[error("MD5 mismatch for {path:?}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Checksum file at {url} does not start with a digest")]
    InvalidChecksumFile { url: String },

    // ── Archive ─────────────────────────────────────────
    #[error("Entry {entry} not found in archive {archive:?}")]
    MissingArchiveEntry { archive: PathBuf, entry: String },

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Publish ─────────────────────────────────────────
    #[error("POM error: {0}")]
    PomParse(String),

    #[error("Deploy of {artifact} failed: {message}")]
    Publish { artifact: String, message: String },

    // ── Settings ────────────────────────────────────────
    #[error("Invalid settings: {0}")]
    Settings(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Run cancelled")]
    Cancelled,
}

/// Convenience alias used throughout the crate.
pub type FetcherResult<T> = Result<T, FetcherError>;

impl FetcherError {
    /// Network and filesystem failures, as opposed to content or publish failures.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            FetcherError::Io { .. } | FetcherError::Http(_) | FetcherError::DownloadFailed { .. }
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| FetcherError::Io { path, source }
    }
}

impl From<std::io::Error> for FetcherError {
    fn from(source: std::io::Error) -> Self {
        FetcherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}
