use std::fmt;

use crate::core::mirror::ReleaseContext;
use crate::core::platform::PlatformEntry;

/// Coordinates a platform archive is deployed under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MavenArtifact {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

impl MavenArtifact {
    pub fn new(group_id: &str, entry: &PlatformEntry, release: &ReleaseContext) -> Self {
        Self {
            group_id: group_id.to_string(),
            artifact_id: entry.publish_id.clone(),
            version: release.version_name.clone(),
        }
    }
}

impl fmt::Display for MavenArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}
