use super::{is_blocking_status, Attempt, FetchStrategy, PageContent};
use crate::config::{ProxyConfig, ScraperConfig};
use crate::error::ScrapeError;
use async_trait::async_trait;
use log::debug;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, DNT, PRAGMA, REFERER,
    UPGRADE_INSECURE_REQUESTS,
};
use reqwest::{Client, Response};
use std::time::Duration;
use url::Url;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Direct page fetch with desktop-browser headers
///
/// When a proxy is configured the request goes to
/// `<proxy>?api_key=<key>&url=<target>` instead of the page itself.
#[derive(Clone)]
pub struct RequestFetcher {
    client: Client,
    proxy: Option<ProxyConfig>,
}

fn desktop_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(DNT, HeaderValue::from_static("1"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert("Sec-Fetch-Site", HeaderValue::from_static("none"));
    headers.insert("Sec-Fetch-Mode", HeaderValue::from_static("navigate"));
    headers.insert("Sec-Fetch-User", HeaderValue::from_static("?1"));
    headers.insert("Sec-Fetch-Dest", HeaderValue::from_static("document"));
    headers
}

impl RequestFetcher {
    pub fn new(config: &ScraperConfig, timeout: Option<Duration>) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
            .user_agent(config.user_agent.as_str())
            .default_headers(desktop_headers())
            .build()?;

        Ok(Self {
            client,
            proxy: config.proxy.is_enabled().then(|| config.proxy.clone()),
        })
    }

    /// The URL actually requested for `url`, proxied when a proxy is enabled
    pub fn request_url(&self, url: &Url) -> Result<Url, ScrapeError> {
        let Some(proxy) = &self.proxy else {
            return Ok(url.clone());
        };
        let (Some(endpoint), Some(key)) = (&proxy.url, &proxy.api_key) else {
            return Ok(url.clone());
        };

        let mut proxied = Url::parse(endpoint.trim())?;
        proxied
            .query_pairs_mut()
            .append_pair("api_key", key.trim())
            .append_pair("url", url.as_str());
        Ok(proxied)
    }

    /// GET `url` (through the proxy if enabled) with the page origin as referer
    pub(crate) async fn get(&self, url: &Url) -> Result<Response, ScrapeError> {
        let target = self.request_url(url)?;
        let referer = HeaderValue::from_str(&target.origin().ascii_serialization())?;
        debug!("GET {}", target);
        let response = self
            .client
            .get(target)
            .header(REFERER, referer)
            .send()
            .await?;
        Ok(response)
    }
}

#[async_trait]
impl FetchStrategy for RequestFetcher {
    fn name(&self) -> &'static str {
        if self.proxy.is_some() {
            "proxy"
        } else {
            "direct"
        }
    }

    async fn fetch(&self, url: &Url) -> Result<Attempt, ScrapeError> {
        let response = match self.get(url).await {
            Ok(response) => response,
            Err(ScrapeError::Fetch(e)) => return Ok(Attempt::Advance(format!("network error: {e}"))),
            Err(e) => return Err(e),
        };

        let status = response.status();
        if is_blocking_status(status) {
            return Ok(Attempt::Advance(format!("blocked with status {}", status.as_u16())));
        }
        if !status.is_success() {
            return Err(ScrapeError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        match response.text().await {
            Ok(body) if !body.trim().is_empty() => Ok(Attempt::Fetched(PageContent::Html(body))),
            Ok(_) => Ok(Attempt::Advance("empty body".to_string())),
            Err(e) => Ok(Attempt::Advance(format!("failed to read body: {e}"))),
        }
    }
}
