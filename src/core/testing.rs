//! In-memory doubles for the network and deploy seams.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::downloader::Transport;
use crate::core::error::{FetcherError, FetcherResult};
use crate::core::maven::{DeployEngine, DeployRequest};
use crate::core::mirror::{Navigator, WebPage};

fn not_found(url: &str) -> FetcherError {
    FetcherError::DownloadFailed {
        url: url.to_string(),
        status: 404,
    }
}

#[derive(Default)]
pub struct FakeNavigator {
    pages: HashMap<String, String>,
    redirects: HashMap<String, String>,
}

impl FakeNavigator {
    pub fn with_page(mut self, url: &str, source: &str) -> Self {
        self.pages.insert(url.to_string(), source.to_string());
        self
    }

    pub fn with_redirect(mut self, from: &str, to: &str) -> Self {
        self.redirects.insert(from.to_string(), to.to_string());
        self
    }

    fn follow(&self, url: &str) -> String {
        let mut current = url.to_string();
        while let Some(next) = self.redirects.get(&current) {
            current = next.clone();
        }
        current
    }
}

#[async_trait]
impl Navigator for FakeNavigator {
    async fn load_page(&self, url: &str) -> FetcherResult<WebPage> {
        let url = self.follow(url);
        let source = self.pages.get(&url).ok_or_else(|| not_found(&url))?;
        Ok(WebPage {
            url,
            source: source.clone(),
        })
    }

    async fn final_url(&self, url: &str) -> FetcherResult<String> {
        Ok(self.follow(url))
    }
}

#[derive(Default)]
pub struct FakeTransport {
    texts: HashMap<String, String>,
    files: HashMap<String, Vec<u8>>,
    downloads: AtomicUsize,
}

impl FakeTransport {
    pub fn with_text(mut self, url: &str, text: &str) -> Self {
        self.texts.insert(url.to_string(), text.to_string());
        self
    }

    pub fn with_file(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.files.insert(url.to_string(), bytes);
        self
    }

    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn fetch_text(&self, url: &str) -> FetcherResult<String> {
        self.texts.get(url).cloned().ok_or_else(|| not_found(url))
    }

    async fn download_to(&self, url: &str, dest: &Path) -> FetcherResult<u64> {
        let bytes = self.files.get(url).ok_or_else(|| not_found(url))?;
        self.downloads.fetch_add(1, Ordering::SeqCst);
        tokio::fs::write(dest, bytes)
            .await
            .map_err(FetcherError::io(dest))?;
        Ok(bytes.len() as u64)
    }
}

/// What a deploy call saw. File contents are captured because the scratch
/// files are gone once `publish` returns.
#[derive(Debug, Clone)]
pub struct DeployCall {
    pub request: DeployRequest,
    pub binary: Vec<u8>,
    pub sources: Vec<u8>,
    pub pom: String,
}

#[derive(Default)]
pub struct RecordingDeployer {
    calls: Mutex<Vec<DeployCall>>,
    failure: Option<String>,
}

impl RecordingDeployer {
    pub fn failing(message: &str) -> Self {
        Self {
            calls: Mutex::default(),
            failure: Some(message.to_string()),
        }
    }

    pub fn calls(&self) -> Vec<DeployCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeployEngine for RecordingDeployer {
    async fn deploy_file(&self, request: &DeployRequest) -> FetcherResult<()> {
        let call = DeployCall {
            request: request.clone(),
            binary: std::fs::read(&request.binary_file)?,
            sources: std::fs::read(&request.sources_file)?,
            pom: std::fs::read_to_string(&request.pom_file)?,
        };
        self.calls.lock().unwrap().push(call);

        match &self.failure {
            Some(message) => Err(FetcherError::Publish {
                artifact: request.artifact.to_string(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}
