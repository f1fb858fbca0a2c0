use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile, TempPath};
use tracing::{debug, info};
use zip::result::ZipError;
use zip::ZipArchive;

use super::artifact::MavenArtifact;
use super::deploy::{DeployEngine, DeployRequest};
use super::pom::{render_pom, PomDocument, PomValues};
use crate::core::downloader::Artifact;
use crate::core::error::{FetcherError, FetcherResult};
use crate::core::mirror::ReleaseContext;
use crate::core::platform::PlatformEntry;
use crate::core::settings::Settings;

/// Repackages a verified archive (binary jar, sources, generated POM) and
/// hands it to the deploy engine.
pub struct ArtifactPublisher<'a> {
    engine: &'a dyn DeployEngine,
    settings: &'a Settings,
    temp_dir: PathBuf,
}

impl<'a> ArtifactPublisher<'a> {
    pub fn new(engine: &'a dyn DeployEngine, settings: &'a Settings) -> Self {
        Self {
            engine,
            settings,
            temp_dir: std::env::temp_dir(),
        }
    }

    /// Place the scratch files in `dir` instead of the system temp directory.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    /// Temp files are removed when this returns, whatever the outcome.
    pub async fn publish(
        &self,
        artifact: &Artifact,
        entry: &PlatformEntry,
        release: &ReleaseContext,
    ) -> FetcherResult<()> {
        let coordinates = MavenArtifact::new(&self.settings.group_id, entry, release);
        let binary = self.scratch_file("deploy", ".jar")?;
        let sources = self.scratch_file("deploy", "-sources.jar")?;
        let pom = self.scratch_file("pom", ".xml")?;

        // The archive handle lives only inside this block.
        let (binary, sources) = {
            let file = File::open(&artifact.local_path)
                .map_err(FetcherError::io(&artifact.local_path))?;
            let mut archive = ZipArchive::new(file)?;
            let binary = extract_entry(
                &mut archive,
                &artifact.local_path,
                &self.settings.binary_entry,
                binary,
            )?;
            let sources = extract_entry(
                &mut archive,
                &artifact.local_path,
                &self.settings.sources_entry,
                sources,
            )?;
            (binary, sources)
        };

        let pom = self.write_pom(&coordinates, pom)?;

        let request = DeployRequest {
            artifact: coordinates,
            pom_file: pom.to_path_buf(),
            binary_file: binary.to_path_buf(),
            sources_file: sources.to_path_buf(),
            repository_id: self.settings.repository_id.clone(),
            repository_url: self.settings.repository_url.clone(),
        };
        info!("Deploying {}", request.artifact);
        self.engine.deploy_file(&request).await
    }

    fn scratch_file(&self, prefix: &str, suffix: &str) -> FetcherResult<NamedTempFile> {
        Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .tempfile_in(&self.temp_dir)
            .map_err(FetcherError::io(&self.temp_dir))
    }

    fn write_pom(
        &self,
        coordinates: &MavenArtifact,
        mut target: NamedTempFile,
    ) -> FetcherResult<TempPath> {
        let xml = render_pom(&PomValues {
            artifact: coordinates,
            repository_id: &self.settings.repository_id,
            repository_url: &self.settings.repository_url,
        })?;

        let parsed = PomDocument::parse(&xml)?;
        if !parsed.describes(coordinates)
            || !parsed.deploys_to(&self.settings.repository_id, &self.settings.repository_url)
        {
            return Err(FetcherError::PomParse(format!(
                "rendered POM does not describe {} in {}",
                coordinates, self.settings.repository_id
            )));
        }

        let path = target.path().to_path_buf();
        target
            .write_all(xml.as_bytes())
            .and_then(|_| target.flush())
            .map_err(FetcherError::io(&path))?;
        Ok(target.into_temp_path())
    }
}

/// Copy `name` out of the archive into `target`. The returned path keeps
/// the file alive until dropped, but its handle is closed.
fn extract_entry(
    archive: &mut ZipArchive<File>,
    archive_path: &Path,
    name: &str,
    mut target: NamedTempFile,
) -> FetcherResult<TempPath> {
    let mut zipped = archive.by_name(name).map_err(|e| match e {
        ZipError::FileNotFound => FetcherError::MissingArchiveEntry {
            archive: archive_path.to_path_buf(),
            entry: name.to_string(),
        },
        other => FetcherError::Zip(other),
    })?;

    let path = target.path().to_path_buf();
    let bytes = std::io::copy(&mut zipped, target.as_file_mut()).map_err(FetcherError::io(&path))?;
    target.flush().map_err(FetcherError::io(&path))?;
    debug!("Extracted {} ({} bytes) to {:?}", name, bytes, path);

    Ok(target.into_temp_path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::RecordingDeployer;
    use std::io::Write as _;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn release() -> ReleaseContext {
        ReleaseContext {
            mirror_base_url: "http://mirror.example/".into(),
            version_name: "4.9".into(),
            release_prefix: "swt-4.9".into(),
        }
    }

    fn entry() -> PlatformEntry {
        PlatformEntry::new("gtk-linux-x86_64.zip", "org.eclipse.swt.gtk.linux.x86_64")
    }

    fn write_archive(path: &Path, entries: &[(&str, &str)]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        for (name, data) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    fn listing(dir: &Path) -> Vec<PathBuf> {
        let mut entries: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        entries.sort();
        entries
    }

    #[tokio::test]
    async fn extracts_renders_and_deploys() {
        let work = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        let archive = work.path().join("swt-4.9-gtk-linux-x86_64.zip");
        write_archive(
            &archive,
            &[
                ("about.html", "<html/>"),
                ("swt.jar", "binary jar"),
                ("src.zip", "sources zip"),
            ],
        );

        let settings = Settings::default();
        let deployer = RecordingDeployer::default();
        let artifact = Artifact {
            local_path: archive,
            is_new_download: true,
        };

        ArtifactPublisher::new(&deployer, &settings)
            .with_temp_dir(scratch.path())
            .publish(&artifact, &entry(), &release())
            .await
            .unwrap();

        let calls = deployer.calls();
        assert_eq!(calls.len(), 1);
        let call = &calls[0];
        assert_eq!(
            call.request.artifact.to_string(),
            "org.eclipse.swt:org.eclipse.swt.gtk.linux.x86_64:4.9"
        );
        assert_eq!(call.binary, b"binary jar");
        assert_eq!(call.sources, b"sources zip");
        assert!(PomDocument::parse(&call.pom)
            .unwrap()
            .describes(&call.request.artifact));
        assert_eq!(call.request.repository_url, settings.repository_url);

        assert!(listing(scratch.path()).is_empty());
    }

    #[tokio::test]
    async fn missing_sources_entry_fails_and_cleans_up() {
        let work = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        let archive = work.path().join("swt-4.9-gtk-linux-x86_64.zip");
        write_archive(&archive, &[("swt.jar", "binary jar")]);
        let before = listing(scratch.path());

        let settings = Settings::default();
        let deployer = RecordingDeployer::default();
        let artifact = Artifact {
            local_path: archive.clone(),
            is_new_download: true,
        };

        let err = ArtifactPublisher::new(&deployer, &settings)
            .with_temp_dir(scratch.path())
            .publish(&artifact, &entry(), &release())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FetcherError::MissingArchiveEntry { ref entry, .. } if entry == "src.zip"
        ));
        assert!(deployer.calls().is_empty());
        assert_eq!(listing(scratch.path()), before);
    }

    #[tokio::test]
    async fn deploy_failure_still_removes_scratch_files() {
        let work = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        let archive = work.path().join("swt-4.9-gtk-linux-x86_64.zip");
        write_archive(&archive, &[("swt.jar", "jar"), ("src.zip", "src")]);

        let settings = Settings::default();
        let deployer = RecordingDeployer::failing("401 Unauthorized");
        let artifact = Artifact {
            local_path: archive,
            is_new_download: true,
        };

        let err = ArtifactPublisher::new(&deployer, &settings)
            .with_temp_dir(scratch.path())
            .publish(&artifact, &entry(), &release())
            .await
            .unwrap_err();

        assert!(matches!(err, FetcherError::Publish { ref message, .. } if message.contains("401")));
        assert_eq!(deployer.calls().len(), 1);
        assert!(listing(scratch.path()).is_empty());
    }

    #[tokio::test]
    async fn non_zip_archive_is_a_zip_error() {
        let work = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        let archive = work.path().join("broken.zip");
        std::fs::write(&archive, b"this is not a zip").unwrap();

        let settings = Settings::default();
        let deployer = RecordingDeployer::default();
        let artifact = Artifact {
            local_path: archive,
            is_new_download: true,
        };

        let err = ArtifactPublisher::new(&deployer, &settings)
            .with_temp_dir(scratch.path())
            .publish(&artifact, &entry(), &release())
            .await
            .unwrap_err();
        assert!(matches!(err, FetcherError::Zip(_)));
        assert!(listing(scratch.path()).is_empty());
    }
}
