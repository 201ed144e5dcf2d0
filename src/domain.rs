//! Per-domain selector overrides and selector learning.
//!
//! The store is a best-effort cache: a read failure falls back to the default
//! selectors and a write failure is only logged. Writers are not coordinated;
//! the last upsert for a domain wins.

use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::ingredients::NormalizationOptions;
use crate::model::{RecipeField, ScrapeOutput, ScrapeReport, ScrapingResults, Source};
use crate::pipelines;
use crate::url_to_text::html::extractors::SelectorSet;
use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use url::Url;

/// One selector per field, replacing that field's default list for a domain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainSelectorSet {
    pub domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cook_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
}

impl DomainSelectorSet {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ..Default::default()
        }
    }

    fn slot(&mut self, field: RecipeField) -> Option<&mut Option<String>> {
        match field {
            RecipeField::Title => Some(&mut self.title),
            RecipeField::Description => Some(&mut self.description),
            RecipeField::Ingredients => Some(&mut self.ingredients),
            RecipeField::Instructions => Some(&mut self.instructions),
            RecipeField::PrepTime => Some(&mut self.prep_time),
            RecipeField::CookTime => Some(&mut self.cook_time),
            RecipeField::Servings => Some(&mut self.servings),
            RecipeField::Image => Some(&mut self.image),
            RecipeField::Cuisine => Some(&mut self.cuisine),
            // Nutrition is read from several nutrient selectors and never stored per domain
            RecipeField::Nutrition => None,
        }
    }

    pub fn get(&self, field: RecipeField) -> Option<&str> {
        match field {
            RecipeField::Title => self.title.as_deref(),
            RecipeField::Description => self.description.as_deref(),
            RecipeField::Ingredients => self.ingredients.as_deref(),
            RecipeField::Instructions => self.instructions.as_deref(),
            RecipeField::PrepTime => self.prep_time.as_deref(),
            RecipeField::CookTime => self.cook_time.as_deref(),
            RecipeField::Servings => self.servings.as_deref(),
            RecipeField::Image => self.image.as_deref(),
            RecipeField::Cuisine => self.cuisine.as_deref(),
            RecipeField::Nutrition => None,
        }
    }

    /// Returns false for fields that cannot be stored per domain
    pub fn set(&mut self, field: RecipeField, selector: impl Into<String>) -> bool {
        match self.slot(field) {
            Some(slot) => {
                *slot = Some(selector.into());
                true
            }
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        RecipeField::ALL.iter().all(|f| self.get(*f).is_none())
    }

    /// Overwrite fields that `other` sets, keeping the rest
    pub fn merge(&mut self, other: DomainSelectorSet) {
        for field in RecipeField::ALL {
            if let Some(selector) = other.get(field) {
                self.set(field, selector);
            }
        }
    }

    /// The stored selectors replace the matching default lists
    pub fn apply_to(&self, mut selectors: SelectorSet) -> SelectorSet {
        for field in RecipeField::ALL {
            if let Some(selector) = self.get(field).filter(|s| !s.trim().is_empty()) {
                selectors.set_field(field, vec![selector.to_string()]);
            }
        }
        selectors
    }
}

/// Repository for per-domain selector overrides
#[async_trait]
pub trait DomainSelectorStore: Send + Sync {
    async fn find(&self, domain: &str) -> Result<Option<DomainSelectorSet>, ScrapeError>;

    /// Create the set for its domain, or overwrite the fields it sets
    async fn upsert(&self, selectors: DomainSelectorSet) -> Result<(), ScrapeError>;
}

/// Process-local store
#[derive(Debug, Default)]
pub struct InMemorySelectorStore {
    sets: RwLock<HashMap<String, DomainSelectorSet>>,
}

impl InMemorySelectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sets(sets: impl IntoIterator<Item = DomainSelectorSet>) -> Self {
        Self {
            sets: RwLock::new(sets.into_iter().map(|s| (s.domain.clone(), s)).collect()),
        }
    }

    pub async fn len(&self) -> usize {
        self.sets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sets.read().await.is_empty()
    }
}

#[async_trait]
impl DomainSelectorStore for InMemorySelectorStore {
    async fn find(&self, domain: &str) -> Result<Option<DomainSelectorSet>, ScrapeError> {
        Ok(self.sets.read().await.get(domain).cloned())
    }

    async fn upsert(&self, selectors: DomainSelectorSet) -> Result<(), ScrapeError> {
        let mut sets = self.sets.write().await;
        sets.entry(selectors.domain.clone())
            .or_insert_with(|| DomainSelectorSet::new(selectors.domain.clone()))
            .merge(selectors);
        Ok(())
    }
}

/// Host name without a leading "www."
pub fn extract_domain(url: &str) -> Result<String, ScrapeError> {
    let parsed = Url::parse(url)?;
    let host = parsed.host_str().ok_or(url::ParseError::EmptyHost)?;
    Ok(host.strip_prefix("www.").unwrap_or(host).to_lowercase())
}

/// Selectors worth remembering: fields a selector actually filled
pub fn learned_selectors(domain: &str, results: &ScrapingResults) -> Option<DomainSelectorSet> {
    let mut learned = DomainSelectorSet::new(domain);
    for (field, result) in results.iter() {
        if result.source != Source::Selector || result.is_empty() {
            continue;
        }
        if let Some(selector) = result.selector.as_deref() {
            learned.set(field, selector);
        }
    }
    (!learned.is_empty()).then_some(learned)
}

async fn scrape(
    url: &str,
    html: Option<&str>,
    selectors: Option<&SelectorSet>,
    config: &ScraperConfig,
    options: &NormalizationOptions,
) -> Result<ScrapeOutput, ScrapeError> {
    match html {
        Some(html) => Ok(pipelines::html::process(html, url, selectors, options)),
        None => pipelines::url::process(url, selectors, config, options).await,
    }
}

/// Scrape with the domain's stored selectors, learning them on first success
///
/// Scrapes `html` when given, else retrieves `url`. When the domain had no
/// stored set, the selectors that filled fields are upserted for next time.
pub async fn scrape_with_store(
    url: &str,
    html: Option<&str>,
    store: &dyn DomainSelectorStore,
    config: &ScraperConfig,
    options: &NormalizationOptions,
) -> Result<ScrapeReport, ScrapeError> {
    let domain = extract_domain(url)?;

    let stored = match store.find(&domain).await {
        Ok(stored) => stored,
        Err(e) => {
            warn!("Failed to load selectors for {}: {}", domain, e);
            None
        }
    };
    let used_custom_selectors = stored.is_some();
    let selectors = stored.map(|s| {
        debug!("Using stored selectors for {}", domain);
        s.apply_to(SelectorSet::default())
    });

    let output = scrape(url, html, selectors.as_ref(), config, options).await?;

    if !used_custom_selectors {
        if let Some(learned) = learned_selectors(&domain, &output.results) {
            info!("Learned selectors for {}", domain);
            if let Err(e) = store.upsert(learned).await {
                warn!("Failed to save selectors for {}: {}", domain, e);
            }
        }
    }

    Ok(ScrapeReport::new(output, used_custom_selectors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldValue, SelectorResult};

    const PAGE: &str = r#"
        <h1 class="headline">Learned Soup</h1>
        <ul class="ingredients"><li>1 cup stock</li><li>2 carrots</li></ul>
    "#;

    struct BrokenStore;

    #[async_trait]
    impl DomainSelectorStore for BrokenStore {
        async fn find(&self, _domain: &str) -> Result<Option<DomainSelectorSet>, ScrapeError> {
            Err(ScrapeError::Store("connection refused".to_string()))
        }

        async fn upsert(&self, _selectors: DomainSelectorSet) -> Result<(), ScrapeError> {
            Err(ScrapeError::Store("connection refused".to_string()))
        }
    }

    async fn scrape_page(store: &dyn DomainSelectorStore, html: &str) -> ScrapeReport {
        scrape_with_store(
            "https://www.example.com/soup",
            Some(html),
            store,
            &ScraperConfig::default(),
            &NormalizationOptions::default(),
        )
        .await
        .unwrap()
    }

    #[test]
    fn test_extract_domain() {
        assert_eq!(extract_domain("https://www.Example.com/a?b=1").unwrap(), "example.com");
        assert_eq!(extract_domain("http://blog.example.org").unwrap(), "blog.example.org");
        assert!(extract_domain("not a url").is_err());
    }

    #[test]
    fn test_apply_to_replaces_only_stored_fields() {
        let mut stored = DomainSelectorSet::new("example.com");
        stored.set(RecipeField::Title, ".headline");

        let selectors = stored.apply_to(SelectorSet::default());
        assert_eq!(selectors.title, vec![".headline"]);
        assert_eq!(selectors.ingredients, SelectorSet::default().ingredients);
    }

    #[test]
    fn test_merge_overwrites_set_fields() {
        let mut stored = DomainSelectorSet::new("example.com");
        stored.set(RecipeField::Title, "h1");
        stored.set(RecipeField::Image, "img.hero");

        let mut update = DomainSelectorSet::new("example.com");
        update.set(RecipeField::Title, ".headline");
        stored.merge(update);

        assert_eq!(stored.title.as_deref(), Some(".headline"));
        assert_eq!(stored.image.as_deref(), Some("img.hero"));
        assert!(!stored.set(RecipeField::Nutrition, ".nutrition"));
    }

    #[test]
    fn test_learned_selectors_skip_structured_data_and_empty_fields() {
        let mut results = ScrapingResults::default();
        results.fill(
            RecipeField::Title,
            SelectorResult::from_ld_json(FieldValue::Text("Soup".to_string())),
        );
        results.fill(
            RecipeField::Ingredients,
            SelectorResult::from_selector(
                FieldValue::List(vec!["1 onion".to_string()]),
                Some(".ingredients li".to_string()),
            ),
        );
        results.fill(
            RecipeField::Instructions,
            SelectorResult::from_selector(FieldValue::List(vec!["Stir the pot well.".to_string()]), None),
        );

        let learned = learned_selectors("example.com", &results).unwrap();
        assert_eq!(learned.ingredients.as_deref(), Some(".ingredients li"));
        assert!(learned.title.is_none());
        assert!(learned.instructions.is_none());

        assert!(learned_selectors("example.com", &ScrapingResults::default()).is_none());
    }

    #[tokio::test]
    async fn test_first_scrape_learns_selectors() {
        let store = InMemorySelectorStore::new();

        let report = scrape_page(&store, PAGE).await;
        assert!(!report.used_custom_selectors);
        assert_eq!(report.data.title, "Learned Soup");

        let learned = store.find("example.com").await.unwrap().unwrap();
        assert_eq!(learned.title.as_deref(), Some("h1"));
        assert_eq!(learned.ingredients.as_deref(), Some(".ingredients li"));
        assert!(learned.description.is_none());

        let report = scrape_page(&store, PAGE).await;
        assert!(report.used_custom_selectors);
        assert_eq!(report.data.title, "Learned Soup");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_stored_selectors_are_used_and_not_rewritten() {
        let mut seeded = DomainSelectorSet::new("example.com");
        seeded.set(RecipeField::Title, ".custom");
        let store = InMemorySelectorStore::with_sets([seeded.clone()]);

        let html = r#"<div class="custom">Custom Title</div><h1>Heading Title</h1>"#;
        let report = scrape_page(&store, html).await;

        assert!(report.used_custom_selectors);
        assert_eq!(report.data.title, "Custom Title");
        assert_eq!(report.results.title.selector.as_deref(), Some(".custom"));
        assert_eq!(store.find("example.com").await.unwrap(), Some(seeded));
    }

    #[tokio::test]
    async fn test_store_failures_do_not_fail_the_scrape() {
        let report = scrape_page(&BrokenStore, PAGE).await;
        assert!(!report.used_custom_selectors);
        assert_eq!(report.data.title, "Learned Soup");
        assert_eq!(report.extraction_stats.successful, 2);
        assert_eq!(report.extraction_stats.from_selectors, 2);
    }
}
