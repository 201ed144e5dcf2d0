use super::finalize;
use crate::ingredients::NormalizationOptions;
use crate::model::ScrapeOutput;
use crate::url_to_text::html::extractors::{
    Extraction, Extractor, JsonLdExtractor, ParsingContext, SelectorExtractor, SelectorSet,
};
use log::debug;

/// Scrape a recipe from already fetched HTML
///
/// This pipeline:
/// 1. Parses every LD+JSON block and fills what structured data provides
/// 2. Runs the CSS selectors (`selectors`, else the defaults) for the fields still empty
/// 3. Normalizes the ingredient lines with `options`
///
/// Never fails: fields that nothing could fill stay empty.
pub fn process(
    html: &str,
    url: &str,
    selectors: Option<&SelectorSet>,
    options: &NormalizationOptions,
) -> ScrapeOutput {
    let context = ParsingContext::new(url, html);

    let extractors: Vec<Box<dyn Extractor>> = vec![
        Box::new(JsonLdExtractor),
        Box::new(SelectorExtractor::new(selectors.cloned().unwrap_or_default())),
    ];

    let mut extraction = Extraction::default();
    for extractor in &extractors {
        let filled = extractor.parse(&context, &mut extraction);
        debug!("{} filled {} fields for {}", extractor.name(), filled, url);
    }

    finalize(extraction.results, url, Some(extraction.nutrition), options)
}
