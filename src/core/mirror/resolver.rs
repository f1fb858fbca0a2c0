use tracing::{info, instrument};

use super::navigator::Navigator;
use crate::core::error::{FetcherError, FetcherResult};
use crate::core::settings::Settings;

/// Where the current release lives, derived once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseContext {
    /// URL prefix shared by every platform archive, ending in `/`.
    pub mirror_base_url: String,
    /// Version token, e.g. `4.9`.
    pub version_name: String,
    /// Project name plus version as it appears in archive names, e.g. `swt-4.9`.
    pub release_prefix: String,
}

impl ReleaseContext {
    /// Derive the release from the URL a direct download link finally lands on.
    ///
    /// `https://mirror.example/path/to/swt-4.9-gtk-linux-x86.zip` with reference
    /// suffix `gtk-linux-x86.zip` gives mirror `https://mirror.example/path/to/`,
    /// prefix `swt-4.9` and version `4.9`.
    pub fn from_download_url(resolved_url: &str, reference_suffix: &str) -> FetcherResult<Self> {
        let without_query = resolved_url
            .split(['?', '#'])
            .next()
            .unwrap_or(resolved_url);

        let Some((dir, filename)) = without_query.rsplit_once('/') else {
            return Err(FetcherError::Resolution(format!(
                "download URL {} has no path",
                resolved_url
            )));
        };
        if filename.is_empty() || dir.ends_with(':') || dir.ends_with(":/") {
            return Err(FetcherError::Resolution(format!(
                "download URL {} does not end in a file name",
                resolved_url
            )));
        }

        let release_prefix = filename
            .strip_suffix(reference_suffix)
            .and_then(|rest| rest.strip_suffix('-'))
            .filter(|prefix| !prefix.is_empty())
            .ok_or_else(|| {
                FetcherError::Resolution(format!(
                    "file name {} does not end with -{}",
                    filename, reference_suffix
                ))
            })?;

        let version_name = release_prefix
            .split('-')
            .nth(1)
            .filter(|version| !version.is_empty())
            .ok_or_else(|| {
                FetcherError::Resolution(format!(
                    "release prefix {} carries no version token",
                    release_prefix
                ))
            })?;

        Ok(Self {
            mirror_base_url: format!("{}/", dir),
            version_name: version_name.to_string(),
            release_prefix: release_prefix.to_string(),
        })
    }

    pub fn download_url(&self, archive_name: &str) -> String {
        format!("{}{}", self.mirror_base_url, archive_name)
    }

    pub fn checksum_url(&self, archive_name: &str) -> String {
        format!("{}checksum/{}.md5", self.mirror_base_url, archive_name)
    }
}

/// Follows the project homepage to the reference platform's direct download
/// and derives the mirror every other archive is fetched from.
pub struct MirrorResolver<'a> {
    navigator: &'a dyn Navigator,
    platform_link_text: &'a str,
    direct_link_text: &'a str,
    reference_suffix: &'a str,
}

impl<'a> MirrorResolver<'a> {
    pub fn new(navigator: &'a dyn Navigator, settings: &'a Settings) -> Self {
        Self {
            navigator,
            platform_link_text: &settings.platform_link_text,
            direct_link_text: &settings.direct_link_text,
            reference_suffix: &settings.reference_suffix,
        }
    }

    #[instrument(skip(self))]
    pub async fn resolve(&self, homepage_url: &str) -> FetcherResult<ReleaseContext> {
        let homepage = self.navigator.load_page(homepage_url).await?;
        let platform_page_url = homepage.find_link(self.platform_link_text).ok_or_else(|| {
            FetcherError::Resolution(format!(
                "no link labelled '{}' on {}",
                self.platform_link_text, homepage.url
            ))
        })?;

        let platform_page = self.navigator.load_page(&platform_page_url).await?;
        let direct_link = platform_page
            .find_link(self.direct_link_text)
            .ok_or_else(|| {
                FetcherError::Resolution(format!(
                    "no link labelled '{}' on {}",
                    self.direct_link_text, platform_page.url
                ))
            })?;

        let download_url = self.navigator.final_url(&direct_link).await?;
        info!("Full download URL: {}", download_url);

        let release = ReleaseContext::from_download_url(&download_url, self.reference_suffix)?;
        info!(
            "Mirror URL: {} (release {})",
            release.mirror_base_url, release.version_name
        );
        Ok(release)
    }
}
