use super::{Attempt, FetchStrategy, PageContent};
use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::time::Duration;
use url::Url;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Fetches readable text for a page through a reader service
///
/// With `depth` 2 the reader URL itself is wrapped by the reader again,
/// which gets around geo blocks on the reader's own fetch.
pub struct ReaderFetcher {
    client: Client,
    base_url: String,
    depth: usize,
}

/// `<base>/http://<target without scheme>`
pub fn reader_url(base_url: &str, target: &str) -> String {
    let bare = target
        .strip_prefix("https://")
        .or_else(|| target.strip_prefix("http://"))
        .unwrap_or(target);
    format!("{}/http://{}", base_url.trim_end_matches('/'), bare)
}

impl ReaderFetcher {
    pub fn new(config: &ScraperConfig, depth: usize, timeout: Option<Duration>) -> Result<Self, ScrapeError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/plain, text/html;q=0.9, */*;q=0.8"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.reader.base_url.clone(),
            depth: depth.max(1),
        })
    }

    pub fn single(config: &ScraperConfig) -> Result<Self, ScrapeError> {
        Self::new(config, 1, None)
    }

    pub fn double(config: &ScraperConfig) -> Result<Self, ScrapeError> {
        Self::new(config, 2, None)
    }

    fn wrapped_url(&self, url: &Url) -> String {
        (0..self.depth).fold(url.to_string(), |target, _| reader_url(&self.base_url, &target))
    }
}

#[async_trait]
impl FetchStrategy for ReaderFetcher {
    fn name(&self) -> &'static str {
        if self.depth > 1 {
            "double-reader"
        } else {
            "reader"
        }
    }

    async fn fetch(&self, url: &Url) -> Result<Attempt, ScrapeError> {
        let target = self.wrapped_url(url);
        debug!("GET {}", target);

        let response = match self.client.get(&target).send().await {
            Ok(response) => response,
            Err(e) => return Ok(Attempt::Advance(format!("network error: {e}"))),
        };
        if !response.status().is_success() {
            return Ok(Attempt::Advance(format!(
                "reader returned status {}",
                response.status().as_u16()
            )));
        }

        match response.text().await {
            Ok(text) if !text.trim().is_empty() => Ok(Attempt::Fetched(PageContent::ReadableText(text))),
            Ok(_) => Ok(Attempt::Advance("empty body".to_string())),
            Err(e) => Ok(Attempt::Advance(format!("failed to read body: {e}"))),
        }
    }
}
