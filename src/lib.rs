pub mod builder;
pub mod config;
pub mod domain;
pub mod error;
pub mod ingredients;
pub mod model;
pub mod pipelines;
pub mod url_to_text;
pub mod validation;

use log::debug;

// Re-export builder API
pub use builder::{RecipeScraper, RecipeScraperBuilder};
pub use config::{load_config, ProxyConfig, ReaderConfig, ScraperConfig};
pub use domain::{
    extract_domain, learned_selectors, scrape_with_store, DomainSelectorSet, DomainSelectorStore,
    InMemorySelectorStore,
};
pub use error::ScrapeError;
pub use ingredients::{
    convert_unit, normalize_ingredient_line, normalize_ingredients, parse_amount, parse_ingredient,
    scale_ingredient, scale_servings, AmountFormat, CanonicalIngredient, NormalizationOptions,
    ParsedIngredient, UnitSystem,
};
pub use model::{
    ExtractionStats, FieldValue, Nutrition, RecipeField, ScrapeOutput, ScrapeReport, ScrapedRecipe,
    ScrapingResults, SelectorResult, Source,
};
pub use url_to_text::fetchers::PageContent;
pub use url_to_text::html::extractors::SelectorSet;

/// Fetch a recipe page and scrape it, with configuration from the environment
///
/// `overrides` replaces the default CSS selectors (for instance with a
/// domain's stored set). Ingredient lines come back normalized with the
/// default options: imperial units, fractions rounded to eighths.
///
/// # Example
/// ```no_run
/// # async fn run() -> Result<(), recipe_scraper::ScrapeError> {
/// let output = recipe_scraper::scrape_recipe("https://example.com/recipe", None).await?;
/// println!("{}", output.data.title);
/// # Ok(())
/// # }
/// ```
pub async fn scrape_recipe(url: &str, overrides: Option<&SelectorSet>) -> Result<ScrapeOutput, ScrapeError> {
    let config = ScraperConfig::load()?;
    scrape_recipe_with_config(url, overrides, &config).await
}

/// Same as [`scrape_recipe`] with an explicit configuration
pub async fn scrape_recipe_with_config(
    url: &str,
    overrides: Option<&SelectorSet>,
    config: &ScraperConfig,
) -> Result<ScrapeOutput, ScrapeError> {
    debug!("Scraping {} (proxy enabled: {})", url, config.proxy.is_enabled());
    pipelines::url::process(url, overrides, config, &NormalizationOptions::default()).await
}

/// Scrape already fetched HTML, skipping retrieval
///
/// Never fails; fields nothing could fill are left empty.
pub fn scrape_recipe_from_html(html: &str, url: &str, overrides: Option<&SelectorSet>) -> ScrapeOutput {
    pipelines::html::process(html, url, overrides, &NormalizationOptions::default())
}
