use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, Url};
use tracing::debug;

use crate::core::error::{FetcherError, FetcherResult};

/// A loaded page: the URL the client ended up on and its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebPage {
    pub url: String,
    pub source: String,
}

impl WebPage {
    /// Find the first link whose visible text equals `text` and return its
    /// target resolved against this page's URL.
    pub fn find_link(&self, text: &str) -> Option<String> {
        find_link_by_text(&self.url, &self.source, text)
    }
}

/// The link-following capability the resolver and change detector need.
#[async_trait]
pub trait Navigator: Send + Sync {
    /// GET `url`, following redirects, and return the final URL and body.
    async fn load_page(&self, url: &str) -> FetcherResult<WebPage>;

    /// Follow redirects from `url` and report where they end. The body is
    /// not read.
    async fn final_url(&self, url: &str) -> FetcherResult<String>;
}

/// `Navigator` backed by a plain HTTP client.
pub struct HttpNavigator {
    client: Client,
}

impl HttpNavigator {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn get(&self, url: &str) -> FetcherResult<reqwest::Response> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetcherError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl Navigator for HttpNavigator {
    async fn load_page(&self, url: &str) -> FetcherResult<WebPage> {
        let response = self.get(url).await?;
        let final_url = response.url().to_string();
        let source = response.text().await?;
        debug!("Loaded {} ({} bytes) from {}", final_url, source.len(), url);
        Ok(WebPage {
            url: final_url,
            source,
        })
    }

    async fn final_url(&self, url: &str) -> FetcherResult<String> {
        let response = self.get(url).await?;
        let final_url = response.url().to_string();
        // Dropping the response closes the connection before the archive streams in.
        drop(response);
        debug!("{} redirects to {}", url, final_url);
        Ok(final_url)
    }
}

fn anchor_regex() -> &'static Regex {
    static ANCHOR: OnceLock<Regex> = OnceLock::new();
    ANCHOR.get_or_init(|| {
        Regex::new(r#"(?is)<a\s(?:[^>]*?\s)?href\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))[^>]*>(.*?)</a\s*>"#)
            .expect("anchor pattern is valid")
    })
}

fn tag_regex() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("tag pattern is valid"))
}

fn decode_entities(raw: &str) -> String {
    raw.replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Visible text of an anchor body: tags dropped, entities decoded,
/// whitespace collapsed.
fn visible_text(inner_html: &str) -> String {
    let stripped = tag_regex().replace_all(inner_html, " ");
    decode_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn find_link_by_text(base_url: &str, source: &str, text: &str) -> Option<String> {
    let wanted = text.split_whitespace().collect::<Vec<_>>().join(" ");

    for caps in anchor_regex().captures_iter(source) {
        let Some(href) = caps.get(1).or(caps.get(2)).or(caps.get(3)) else {
            continue;
        };
        let inner = caps.get(4).map(|m| m.as_str()).unwrap_or_default();
        if visible_text(inner) != wanted {
            continue;
        }

        let href = decode_entities(href.as_str().trim());
        let resolved = match Url::parse(base_url).and_then(|base| base.join(&href)) {
            Ok(url) => url.to_string(),
            Err(_) => href,
        };
        return Some(resolved);
    }

    None
}
