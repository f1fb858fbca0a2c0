use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::error::{FetcherError, FetcherResult};

/// One platform variant of a release: the archive suffix appended to the
/// release prefix, and the artifact id it is published under.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PlatformEntry {
    pub archive_suffix: String,
    pub publish_id: String,
}

impl PlatformEntry {
    pub fn new(archive_suffix: &str, publish_id: &str) -> Self {
        Self {
            archive_suffix: archive_suffix.to_string(),
            publish_id: publish_id.to_string(),
        }
    }

    /// `<release_prefix>-<archive_suffix>`, e.g. `swt-4.9-gtk-linux-x86.zip`.
    pub fn archive_name(&self, release_prefix: &str) -> String {
        format!("{}-{}", release_prefix, self.archive_suffix)
    }
}

impl fmt::Display for PlatformEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.archive_suffix, self.publish_id)
    }
}

/// The platform variants mirrored for every release.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct PlatformCatalog {
    entries: Vec<PlatformEntry>,
}

impl PlatformCatalog {
    /// Builds a catalog, rejecting empty lists and duplicate suffixes or ids.
    pub fn new(entries: Vec<PlatformEntry>) -> FetcherResult<Self> {
        let catalog = Self { entries };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> FetcherResult<()> {
        if self.entries.is_empty() {
            return Err(FetcherError::Settings("platform catalog is empty".into()));
        }

        for (i, entry) in self.entries.iter().enumerate() {
            if entry.archive_suffix.trim().is_empty() || entry.publish_id.trim().is_empty() {
                return Err(FetcherError::Settings(format!(
                    "platform entry #{} has an empty field",
                    i
                )));
            }
            let duplicate = self.entries[..i].iter().any(|prev| {
                prev.archive_suffix == entry.archive_suffix || prev.publish_id == entry.publish_id
            });
            if duplicate {
                return Err(FetcherError::Settings(format!(
                    "duplicate platform entry: {}",
                    entry
                )));
            }
        }

        Ok(())
    }

    pub fn entries(&self) -> &[PlatformEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlatformEntry> {
        self.entries.iter()
    }
}

impl Default for PlatformCatalog {
    fn default() -> Self {
        Self {
            entries: vec![
                PlatformEntry::new("win32-win32-x86.zip", "org.eclipse.swt.win32.win32.x86"),
                PlatformEntry::new(
                    "win32-win32-x86_64.zip",
                    "org.eclipse.swt.win32.win32.x86_64",
                ),
                PlatformEntry::new("gtk-linux-x86.zip", "org.eclipse.swt.gtk.linux.x86"),
                PlatformEntry::new("gtk-linux-x86_64.zip", "org.eclipse.swt.gtk.linux.x86_64"),
                PlatformEntry::new("cocoa-macosx.zip", "org.eclipse.swt.cocoa.macosx"),
                PlatformEntry::new(
                    "cocoa-macosx-x86_64.zip",
                    "org.eclipse.swt.cocoa.macosx.x86_64",
                ),
            ],
        }
    }
}

impl<'a> IntoIterator for &'a PlatformCatalog {
    type Item = &'a PlatformEntry;
    type IntoIter = std::slice::Iter<'a, PlatformEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
