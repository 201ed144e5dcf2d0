use std::sync::Arc;

use crate::config::ScraperConfig;
use crate::domain::{scrape_with_store, DomainSelectorStore};
use crate::error::ScrapeError;
use crate::ingredients::{scale_ingredient, scale_servings, NormalizationOptions};
use crate::model::ScrapeReport;
use crate::pipelines;
use crate::url_to_text::html::extractors::SelectorSet;

/// Builder for configuring and executing recipe scrapes
#[derive(Default)]
pub struct RecipeScraperBuilder {
    url: Option<String>,
    html: Option<String>,
    config: Option<ScraperConfig>,
    store: Option<Arc<dyn DomainSelectorStore>>,
    selectors: Option<SelectorSet>,
    normalization: NormalizationOptions,
    scale: Option<f64>,
}

impl RecipeScraperBuilder {
    /// Set the recipe page URL
    ///
    /// # Example
    /// ```
    /// use recipe_scraper::RecipeScraper;
    ///
    /// let builder = RecipeScraper::builder()
    ///     .url("https://example.com/recipe");
    /// ```
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Scrape this HTML instead of fetching the URL
    ///
    /// The URL is still required: it becomes `sourceUrl` and decides the
    /// domain for stored selectors.
    ///
    /// # Example
    /// ```
    /// use recipe_scraper::RecipeScraper;
    ///
    /// let builder = RecipeScraper::builder()
    ///     .url("https://example.com/recipe")
    ///     .html("<h1>Tomato Soup</h1>");
    /// ```
    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Use this configuration instead of loading it from the environment
    pub fn config(mut self, config: ScraperConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Read and learn per-domain selectors from this store
    pub fn store(mut self, store: Arc<dyn DomainSelectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the default CSS selectors
    pub fn selectors(mut self, selectors: SelectorSet) -> Self {
        self.selectors = Some(selectors);
        self
    }

    pub fn normalization(mut self, options: NormalizationOptions) -> Self {
        self.normalization = options;
        self
    }

    /// Scale ingredient lines and servings by `factor` after normalization
    pub fn scale(mut self, factor: f64) -> Self {
        self.scale = Some(factor);
        self
    }

    /// Execute the scrape
    ///
    /// # Returns
    /// * `Ok(ScrapeReport)` - Best-effort recipe data with provenance and stats
    /// * `Err(ScrapeError)` - If the builder is incomplete or retrieval failed
    pub async fn build(self) -> Result<ScrapeReport, ScrapeError> {
        let url = self.url.ok_or_else(|| {
            ScrapeError::BuilderError("No URL specified. Use .url()".to_string())
        })?;

        if self.store.is_some() && self.selectors.is_some() {
            return Err(ScrapeError::BuilderError(
                "Cannot combine .store() with .selectors(). Stored selectors replace the defaults per domain."
                    .to_string(),
            ));
        }

        if let Some(factor) = self.scale {
            if !factor.is_finite() || factor <= 0.0 {
                return Err(ScrapeError::BuilderError(format!(
                    "Scale factor must be a positive number, got {}",
                    factor
                )));
            }
        }

        // Only retrieval needs the environment configuration
        let config = match (self.config, self.html.is_some()) {
            (Some(config), _) => config,
            (None, true) => ScraperConfig::default(),
            (None, false) => ScraperConfig::load()?,
        };

        let mut report = match (&self.store, &self.html) {
            (Some(store), html) => {
                scrape_with_store(&url, html.as_deref(), store.as_ref(), &config, &self.normalization).await?
            }
            (None, Some(html)) => {
                let output = pipelines::html::process(html, &url, self.selectors.as_ref(), &self.normalization);
                ScrapeReport::new(output, self.selectors.is_some())
            }
            (None, None) => {
                let output =
                    pipelines::url::process(&url, self.selectors.as_ref(), &config, &self.normalization).await?;
                ScrapeReport::new(output, self.selectors.is_some())
            }
        };

        if let Some(factor) = self.scale {
            report.data.ingredients = report
                .data
                .ingredients
                .iter()
                .map(|line| scale_ingredient(line, factor))
                .collect();
            report.data.servings = scale_servings(report.data.servings.as_deref(), factor);
        }

        Ok(report)
    }
}

/// Entry point for the builder API
pub struct RecipeScraper;

impl RecipeScraper {
    pub fn builder() -> RecipeScraperBuilder {
        RecipeScraperBuilder::default()
    }
}
