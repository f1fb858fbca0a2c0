use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::checksum::{md5_file, parse_checksum};
use super::client::Transport;
use crate::core::error::{FetcherError, FetcherResult};
use crate::core::mirror::ReleaseContext;
use crate::core::platform::PlatformEntry;

/// A platform archive on local disk after verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub local_path: PathBuf,
    /// `true` when this run downloaded the file, `false` when an existing
    /// copy already matched the published digest.
    pub is_new_download: bool,
}

/// Downloads one platform archive and checks it against the mirror's MD5.
pub struct ArtifactFetcher<'a> {
    transport: &'a dyn Transport,
}

impl<'a> ArtifactFetcher<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    pub async fn fetch_and_verify(
        &self,
        entry: &PlatformEntry,
        release: &ReleaseContext,
        download_dir: &Path,
    ) -> FetcherResult<Artifact> {
        let archive_name = entry.archive_name(&release.release_prefix);
        let download_url = release.download_url(&archive_name);
        let checksum_url = release.checksum_url(&archive_name);
        let local_path = download_dir.join(&archive_name);

        let checksum_file = self.transport.fetch_text(&checksum_url).await?;
        let expected = parse_checksum(&checksum_file, &checksum_url)?;
        debug!("Published MD5 for {}: {}", archive_name, expected);

        if tokio::fs::try_exists(&local_path)
            .await
            .map_err(FetcherError::io(&local_path))?
        {
            let existing = md5_file(&local_path).await?;
            if existing == expected {
                debug!("{:?} already matches, skipping download", local_path);
                return Ok(Artifact {
                    local_path,
                    is_new_download: false,
                });
            }
            warn!(
                "{:?} is stale (MD5 {}), downloading again",
                local_path, existing
            );
        }

        let bytes = self.transport.download_to(&download_url, &local_path).await?;
        let actual = md5_file(&local_path).await?;
        if actual != expected {
            return Err(FetcherError::ChecksumMismatch {
                path: local_path,
                expected,
                actual,
            });
        }

        info!("Fetched {} ({} bytes)", archive_name, bytes);
        Ok(Artifact {
            local_path,
            is_new_download: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::downloader::md5_hex;
    use crate::core::testing::FakeTransport;

    const MIRROR: &str = "http://mirror.example/R-4.9/";

    fn release() -> ReleaseContext {
        ReleaseContext {
            mirror_base_url: MIRROR.into(),
            version_name: "4.9".into(),
            release_prefix: "swt-4.9".into(),
        }
    }

    fn entry() -> PlatformEntry {
        PlatformEntry::new("gtk-linux-x86_64.zip", "org.eclipse.swt.gtk.linux.x86_64")
    }

    fn archive_url() -> String {
        format!("{}swt-4.9-gtk-linux-x86_64.zip", MIRROR)
    }

    fn checksum_url() -> String {
        format!("{}checksum/swt-4.9-gtk-linux-x86_64.zip.md5", MIRROR)
    }

    #[tokio::test]
    async fn absent_file_is_downloaded_and_new() {
        let dir = tempfile::tempdir().unwrap();
        let payload = b"zip bytes for linux x86_64".to_vec();
        let transport = FakeTransport::default()
            .with_text(
                &checksum_url(),
                &format!("{}  swt-4.9-gtk-linux-x86_64.zip", md5_hex(&payload)),
            )
            .with_file(&archive_url(), payload.clone());

        let artifact = ArtifactFetcher::new(&transport)
            .fetch_and_verify(&entry(), &release(), dir.path())
            .await
            .unwrap();

        assert!(artifact.is_new_download);
        assert_eq!(
            artifact.local_path,
            dir.path().join("swt-4.9-gtk-linux-x86_64.zip")
        );
        assert_eq!(std::fs::read(&artifact.local_path).unwrap(), payload);
        assert_eq!(transport.download_count(), 1);
    }

    #[tokio::test]
    async fn matching_local_copy_is_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let payload = b"already here".to_vec();
        let local = dir.path().join("swt-4.9-gtk-linux-x86_64.zip");
        std::fs::write(&local, &payload).unwrap();
        let modified = std::fs::metadata(&local).unwrap().modified().unwrap();

        let transport = FakeTransport::default()
            .with_text(&checksum_url(), &format!("{}  x.zip", md5_hex(&payload)))
            .with_file(&archive_url(), b"different upstream bytes".to_vec());

        let artifact = ArtifactFetcher::new(&transport)
            .fetch_and_verify(&entry(), &release(), dir.path())
            .await
            .unwrap();

        assert!(!artifact.is_new_download);
        assert_eq!(transport.download_count(), 0);
        assert_eq!(std::fs::read(&local).unwrap(), payload);
        assert_eq!(std::fs::metadata(&local).unwrap().modified().unwrap(), modified);
    }

    #[tokio::test]
    async fn stale_local_copy_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("swt-4.9-gtk-linux-x86_64.zip");
        std::fs::write(&local, b"old release").unwrap();
        let payload = b"new release".to_vec();

        let transport = FakeTransport::default()
            .with_text(&checksum_url(), &md5_hex(&payload))
            .with_file(&archive_url(), payload.clone());

        let artifact = ArtifactFetcher::new(&transport)
            .fetch_and_verify(&entry(), &release(), dir.path())
            .await
            .unwrap();

        assert!(artifact.is_new_download);
        assert_eq!(std::fs::read(&local).unwrap(), payload);
    }

    #[tokio::test]
    async fn corrupted_download_is_a_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::default()
            .with_text(&checksum_url(), "abcd1234  swt-4.9-gtk-linux-x86_64.zip")
            .with_file(&archive_url(), b"bytes that do not hash to abcd1234".to_vec());

        let err = ArtifactFetcher::new(&transport)
            .fetch_and_verify(&entry(), &release(), dir.path())
            .await
            .unwrap_err();

        match err {
            FetcherError::ChecksumMismatch {
                expected, actual, ..
            } => {
                assert_eq!(expected, "abcd1234");
                assert_eq!(actual, md5_hex(b"bytes that do not hash to abcd1234"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_checksum_is_a_network_error() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::default();

        let err = ArtifactFetcher::new(&transport)
            .fetch_and_verify(&entry(), &release(), dir.path())
            .await
            .unwrap_err();
        assert!(err.is_io());
        assert!(!dir.path().join("swt-4.9-gtk-linux-x86_64.zip").exists());
    }
}
