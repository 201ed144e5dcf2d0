use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::ingredients::NormalizationOptions;
use crate::model::ScrapeOutput;
use crate::url_to_text::fetchers::{FetchChain, PageContent};
use crate::url_to_text::html::extractors::SelectorSet;
use log::debug;

/// Retrieve a page and scrape a recipe from it
///
/// This pipeline:
/// 1. Fetches the page through the strategy chain (direct or proxied, AMP, reader, double reader)
/// 2. Runs the HTML pipeline on HTML content
/// 3. Runs the readable-text pipeline on reader output
///
/// # Arguments
/// * `url` - The URL to fetch and process
/// * `selectors` - Selector lists replacing the defaults, e.g. learned for the domain
///
/// # Returns
/// * `Ok(ScrapeOutput)` - Best-effort recipe data, possibly with empty fields
/// * `Err(ScrapeError::RetrievalFailure)` - If no strategy produced a body
pub async fn process(
    url: &str,
    selectors: Option<&SelectorSet>,
    config: &ScraperConfig,
    options: &NormalizationOptions,
) -> Result<ScrapeOutput, ScrapeError> {
    let chain = FetchChain::from_config(config)?;
    process_with_chain(&chain, url, selectors, options).await
}

/// Same as [`process`] with a caller-assembled strategy chain
pub async fn process_with_chain(
    chain: &FetchChain,
    url: &str,
    selectors: Option<&SelectorSet>,
    options: &NormalizationOptions,
) -> Result<ScrapeOutput, ScrapeError> {
    match chain.fetch(url).await? {
        PageContent::Html(html) => {
            debug!("Scraping {} bytes of HTML from {}", html.len(), url);
            Ok(super::html::process(&html, url, selectors, options))
        }
        PageContent::ReadableText(text) => {
            debug!("Scraping {} bytes of reader text for {}", text.len(), url);
            Ok(super::text::process(&text, url, options))
        }
    }
}
