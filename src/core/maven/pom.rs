use quick_xml::de::from_str;
use quick_xml::escape::escape;
use serde::Deserialize;

use super::artifact::MavenArtifact;
use crate::core::error::{FetcherError, FetcherResult};

const POM_TEMPLATE: &str = include_str!("../../../templates/pom.xml");

/// Values substituted into the descriptor template.
#[derive(Debug, Clone)]
pub struct PomValues<'a> {
    pub artifact: &'a MavenArtifact,
    pub repository_id: &'a str,
    pub repository_url: &'a str,
}

/// Render the bundled descriptor template. Values are XML-escaped.
pub fn render_pom(values: &PomValues<'_>) -> FetcherResult<String> {
    let rendered = POM_TEMPLATE
        .replace("${groupId}", &escape(values.artifact.group_id.as_str()))
        .replace("${artifactId}", &escape(values.artifact.artifact_id.as_str()))
        .replace("${version}", &escape(values.artifact.version.as_str()))
        .replace("${repositoryId}", &escape(values.repository_id))
        .replace("${repositoryUrl}", &escape(values.repository_url));

    if let Some(idx) = rendered.find("${") {
        let tail: String = rendered[idx..].chars().take(32).collect();
        return Err(FetcherError::PomParse(format!(
            "unresolved placeholder in POM template near {}",
            tail
        )));
    }

    Ok(rendered)
}

/// Minimal POM model – just what is needed to check a rendered descriptor.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PomDocument {
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub artifact_id: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub distribution_management: Option<DistributionManagement>,
}

#[derive(Debug, Deserialize, Default)]
pub struct DistributionManagement {
    #[serde(default)]
    pub repository: Option<PomRepository>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PomRepository {
    pub id: String,
    pub url: String,
}

impl PomDocument {
    /// Parse a POM XML string into a `PomDocument`.
    pub fn parse(xml: &str) -> FetcherResult<Self> {
        from_str(xml).map_err(|e| FetcherError::PomParse(e.to_string()))
    }

    /// Whether the document declares exactly these coordinates.
    pub fn describes(&self, artifact: &MavenArtifact) -> bool {
        self.group_id.as_deref() == Some(artifact.group_id.as_str())
            && self.artifact_id.as_deref() == Some(artifact.artifact_id.as_str())
            && self.version.as_deref() == Some(artifact.version.as_str())
    }

    /// Whether `distributionManagement` names this deploy repository.
    pub fn deploys_to(&self, repository_id: &str, repository_url: &str) -> bool {
        self.distribution_management
            .as_ref()
            .and_then(|dm| dm.repository.as_ref())
            .is_some_and(|r| r.id == repository_id && r.url == repository_url)
    }
}
