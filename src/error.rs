use thiserror::Error;

/// Errors that can occur while scraping a recipe
///
/// Only retrieval problems abort a scrape. Malformed structured data, invalid
/// selectors and rejected text blocks are handled where they occur and never
/// surface here.
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// Every fetch strategy was tried and none produced a body
    #[error("Failed to load page content for {url} (tried: {})", attempts.join(", "))]
    RetrievalFailure { url: String, attempts: Vec<String> },

    /// The page answered with an error status that no fallback can work around
    #[error("HTTP error! status: {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    /// Failed to fetch from URL
    #[error("Failed to fetch URL: {0}")]
    Fetch(#[from] reqwest::Error),

    /// The URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Error building HTTP headers
    #[error("Header parse error: {0}")]
    HeaderError(#[from] reqwest::header::InvalidHeaderValue),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    /// The domain selector store failed
    #[error("Selector store error: {0}")]
    Store(String),

    /// Builder configuration error
    #[error("Builder error: {0}")]
    BuilderError(String),
}

impl ScrapeError {
    /// Whether the error is a total retrieval failure
    pub fn is_retrieval_failure(&self) -> bool {
        matches!(
            self,
            ScrapeError::RetrievalFailure { .. } | ScrapeError::HttpStatus { .. }
        )
    }
}
