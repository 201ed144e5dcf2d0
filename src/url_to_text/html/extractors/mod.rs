use crate::model::{Nutrition, ScrapingResults};
use regex::Regex;
use scraper::Html;
use std::sync::LazyLock;

mod json_ld;
mod selectors;

pub use json_ld::JsonLdExtractor;
pub use selectors::{SelectorExtractor, SelectorSet};

pub struct ParsingContext {
    pub url: String,
    pub document: Html,
}

impl ParsingContext {
    pub fn new(url: impl Into<String>, html: &str) -> Self {
        Self {
            url: url.into(),
            document: Html::parse_document(html),
        }
    }
}

/// Field results and nutrition facts accumulated across extractors
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub results: ScrapingResults,
    pub nutrition: Nutrition,
}

/// An extractor fills the fields that earlier extractors left empty
pub trait Extractor {
    fn name(&self) -> &'static str;

    /// Returns the number of fields this extractor filled
    fn parse(&self, context: &ParsingContext, extraction: &mut Extraction) -> usize;
}

static ISO_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?)?$").unwrap()
});
static HOURS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:hours?|hrs?|h)\b").unwrap());
static MINUTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*(?:minutes?|mins?|m)\b").unwrap());
static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// Convert a duration to whole minutes
///
/// Accepts ISO-8601 durations (`PT1H30M`, `PT5400S`, `P1DT2H`) and loose text
/// such as "1 hour 30 mins" or "45". Returns None when no number is present.
pub fn parse_time_to_minutes(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = ISO_DURATION.captures(text) {
        let part = |i: usize| caps.get(i).map(|m| m.as_str());
        if (1..=4).any(|i| part(i).is_some()) {
            // An out-of-range component makes the whole duration unusable
            let whole = |i: usize| part(i).map_or(Some(0), |s| s.parse::<u64>().ok());
            let seconds = part(4).and_then(|s| s.parse::<f64>().ok()).unwrap_or(0.0);
            let minutes = whole(1)?
                .checked_mul(24 * 60)?
                .checked_add(whole(2)?.checked_mul(60)?)?
                .checked_add(whole(3)?)?
                .checked_add((seconds / 60.0).round() as u64)?;
            return Some(minutes.to_string());
        }
    }

    let hours = HOURS
        .captures(text)
        .and_then(|c| c[1].parse::<f64>().ok());
    let minutes = MINUTES
        .captures(text)
        .and_then(|c| c[1].parse::<u64>().ok());
    if hours.is_some() || minutes.is_some() {
        let total = ((hours.unwrap_or(0.0) * 60.0).round() as u64).checked_add(minutes.unwrap_or(0))?;
        return Some(total.to_string());
    }

    NUMBER.find(text).map(|m| m.as_str().to_string())
}

/// First run of digits, e.g. "4" from "Serves 4 people"
pub(crate) fn first_number(text: &str) -> Option<String> {
    NUMBER.find(text).map(|m| m.as_str().to_string())
}
