//! End-to-end scrape pipelines, one per kind of input.

pub mod html;
pub mod text;
pub mod url;

use crate::ingredients::{normalize_ingredients, NormalizationOptions};
use crate::model::{Nutrition, ScrapeOutput, ScrapedRecipe, ScrapingResults};

/// Assemble the recipe from per-field results and canonicalize its ingredient lines
///
/// `results` keeps the raw scraped lines; `data.ingredients` holds the
/// normalized display strings.
pub(crate) fn finalize(
    results: ScrapingResults,
    url: &str,
    nutrition: Option<Nutrition>,
    options: &NormalizationOptions,
) -> ScrapeOutput {
    let mut data = ScrapedRecipe::from_results(&results, url, nutrition);
    data.ingredients = normalize_ingredients(&data.ingredients, options)
        .into_iter()
        .map(|ingredient| ingredient.display)
        .collect();
    ScrapeOutput { data, results }
}
