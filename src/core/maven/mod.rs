mod artifact;
mod deploy;
mod pom;
mod publisher;

pub use artifact::MavenArtifact;
pub use deploy::{DeployEngine, DeployRequest, MavenCli};
pub use pom::{render_pom, PomDocument, PomValues};
pub use publisher::ArtifactPublisher;
