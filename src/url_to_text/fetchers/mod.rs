//! Retrieval chain: each strategy is tried once, in order, until one
//! returns a non-empty body.

mod amp;
mod reader;
mod request;

pub use amp::{amp_variants, AmpFetcher};
pub use reader::{reader_url, ReaderFetcher};
pub use request::RequestFetcher;

use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use async_trait::async_trait;
use log::{info, warn};
use reqwest::StatusCode;
use url::Url;

/// Retrieved page content, tagged with the parsing mode it needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageContent {
    /// Markup from the page or one of its AMP variants
    Html(String),
    /// Plain text from the reader service
    ReadableText(String),
}

impl PageContent {
    pub fn as_str(&self) -> &str {
        match self {
            PageContent::Html(s) | PageContent::ReadableText(s) => s,
        }
    }

    pub fn is_html(&self) -> bool {
        matches!(self, PageContent::Html(_))
    }
}

/// Outcome of one strategy
#[derive(Debug)]
pub enum Attempt {
    Fetched(PageContent),
    /// Blocked, unreachable or empty; the reason is kept for the failure report
    Advance(String),
}

/// Statuses that mean "blocked" rather than "missing"
pub fn is_blocking_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 403 | 406 | 451)
}

#[async_trait]
pub trait FetchStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Err` stops the whole chain; `Ok(Attempt::Advance)` moves to the next strategy
    async fn fetch(&self, url: &Url) -> Result<Attempt, ScrapeError>;
}

/// Ordered list of fetch strategies evaluated by a single driver loop
pub struct FetchChain {
    strategies: Vec<Box<dyn FetchStrategy>>,
}

impl FetchChain {
    pub fn new(strategies: Vec<Box<dyn FetchStrategy>>) -> Self {
        Self { strategies }
    }

    /// Direct (or proxied) fetch, AMP variants, reader, double reader
    pub fn from_config(config: &ScraperConfig) -> Result<Self, ScrapeError> {
        let direct = RequestFetcher::new(config, None)?;
        Ok(Self::new(vec![
            Box::new(direct.clone()),
            Box::new(AmpFetcher::new(direct)),
            Box::new(ReaderFetcher::single(config)?),
            Box::new(ReaderFetcher::double(config)?),
        ]))
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub async fn fetch(&self, url: &str) -> Result<PageContent, ScrapeError> {
        let parsed = Url::parse(url)?;
        let mut attempts = Vec::with_capacity(self.strategies.len());

        for strategy in &self.strategies {
            info!("Fetching {} via {}", url, strategy.name());
            match strategy.fetch(&parsed).await? {
                Attempt::Fetched(content) => {
                    info!("Fetched {} via {}", url, strategy.name());
                    return Ok(content);
                }
                Attempt::Advance(reason) => {
                    warn!("{} failed for {}: {}", strategy.name(), url, reason);
                    attempts.push(format!("{} ({})", strategy.name(), reason));
                }
            }
        }

        Err(ScrapeError::RetrievalFailure {
            url: url.to_string(),
            attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Scripted {
        name: &'static str,
        outcome: fn() -> Result<Attempt, ScrapeError>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl FetchStrategy for Scripted {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn fetch(&self, _url: &Url) -> Result<Attempt, ScrapeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.outcome)()
        }
    }

    fn scripted(
        name: &'static str,
        outcome: fn() -> Result<Attempt, ScrapeError>,
    ) -> (Box<dyn FetchStrategy>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let strategy = Scripted {
            name,
            outcome,
            calls: calls.clone(),
        };
        (Box::new(strategy), calls)
    }

    #[tokio::test]
    async fn test_stops_at_first_success() {
        let (first, first_calls) = scripted("first", || Ok(Attempt::Advance("blocked".into())));
        let (second, second_calls) =
            scripted("second", || Ok(Attempt::Fetched(PageContent::Html("<p>ok</p>".into()))));
        let (third, third_calls) = scripted("third", || Ok(Attempt::Advance("unused".into())));

        let chain = FetchChain::new(vec![first, second, third]);
        let content = chain.fetch("https://example.com/").await.unwrap();

        assert_eq!(content, PageContent::Html("<p>ok</p>".to_string()));
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
        assert_eq!(third_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_exhausted_chain_reports_attempts() {
        let (first, _) = scripted("first", || Ok(Attempt::Advance("blocked".into())));
        let (second, _) = scripted("second", || Ok(Attempt::Advance("empty body".into())));

        let chain = FetchChain::new(vec![first, second]);
        match chain.fetch("https://example.com/").await {
            Err(ScrapeError::RetrievalFailure { attempts, .. }) => {
                assert_eq!(attempts, vec!["first (blocked)", "second (empty body)"]);
            }
            other => panic!("expected retrieval failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_terminal_error_stops_chain() {
        let (first, _) = scripted("first", || {
            Err(ScrapeError::HttpStatus {
                url: "https://example.com/".into(),
                status: 404,
            })
        });
        let (second, second_calls) = scripted("second", || Ok(Attempt::Advance("unused".into())));

        let chain = FetchChain::new(vec![first, second]);
        let err = chain.fetch("https://example.com/").await.unwrap_err();
        assert!(matches!(err, ScrapeError::HttpStatus { status: 404, .. }));
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_blocking_statuses() {
        assert!(is_blocking_status(StatusCode::FORBIDDEN));
        assert!(is_blocking_status(StatusCode::NOT_ACCEPTABLE));
        assert!(is_blocking_status(StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS));
        assert!(!is_blocking_status(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_default_chain_order() {
        let chain = FetchChain::from_config(&ScraperConfig::default()).unwrap();
        assert_eq!(chain.strategy_names(), vec!["direct", "amp", "reader", "double-reader"]);
    }
}
