use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use super::artifact::MavenArtifact;
use crate::core::error::{FetcherError, FetcherResult};

const OUTPUT_TAIL_LINES: usize = 20;

/// Everything a `deploy:deploy-file` invocation needs.
#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub artifact: MavenArtifact,
    pub pom_file: PathBuf,
    pub binary_file: PathBuf,
    pub sources_file: PathBuf,
    pub repository_id: String,
    pub repository_url: String,
}

/// The publish mechanism. Injected so runs can be tested without Maven.
#[async_trait]
pub trait DeployEngine: Send + Sync {
    async fn deploy_file(&self, request: &DeployRequest) -> FetcherResult<()>;
}

/// Deploys by running the Maven command line.
pub struct MavenCli {
    command: String,
}

impl MavenCli {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn build_command(&self, request: &DeployRequest) -> Command {
        let mut cmd = Command::new(&self.command);
        cmd.arg("--batch-mode")
            .arg("deploy:deploy-file")
            .arg(format!("-DpomFile={}", request.pom_file.display()))
            .arg(format!("-Dfile={}", request.binary_file.display()))
            .arg(format!("-Dsources={}", request.sources_file.display()))
            .arg(format!("-DrepositoryId={}", request.repository_id))
            .arg(format!("-Durl={}", request.repository_url))
            .stdin(Stdio::null());
        cmd
    }
}

#[async_trait]
impl DeployEngine for MavenCli {
    async fn deploy_file(&self, request: &DeployRequest) -> FetcherResult<()> {
        let mut cmd = self.build_command(request);
        debug!("Command: {}", describe_command(cmd.as_std()));

        let output = cmd.output().await.map_err(|e| FetcherError::Publish {
            artifact: request.artifact.to_string(),
            message: format!("could not run {}: {}", self.command, e),
        })?;

        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetcherError::Publish {
                artifact: request.artifact.to_string(),
                message: format!(
                    "{} exited with code {:?}\nSTDOUT (tail):\n{}\nSTDERR (tail):\n{}",
                    self.command,
                    output.status.code(),
                    tail_lines(&stdout, OUTPUT_TAIL_LINES),
                    tail_lines(&stderr, OUTPUT_TAIL_LINES)
                ),
            });
        }

        info!(
            "Deployed {} to {}",
            request.artifact, request.repository_url
        );
        Ok(())
    }
}

fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

/// One-line rendering of the invocation for debug logs. Arguments holding
/// whitespace are single-quoted.
fn describe_command(cmd: &std::process::Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|part| quote_arg(&part.to_string_lossy()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote_arg(raw: &str) -> String {
    if raw.is_empty() || raw.contains(char::is_whitespace) {
        format!("'{}'", raw.replace('\'', r"'\''"))
    } else {
        raw.to_string()
    }
}
