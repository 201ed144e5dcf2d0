use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a field value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Source {
    #[serde(rename = "ld-json")]
    LdJson,
    #[default]
    #[serde(rename = "selector")]
    Selector,
}

/// A scraped value, either one text block or an ordered list of lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::List(v) => v.is_empty(),
        }
    }

    /// The text value, or an empty string for lists
    pub fn as_text(&self) -> &str {
        match self {
            FieldValue::Text(s) => s,
            FieldValue::List(_) => "",
        }
    }

    /// The list value; a non-empty text becomes a single line
    pub fn to_lines(&self) -> Vec<String> {
        match self {
            FieldValue::List(v) => v.clone(),
            FieldValue::Text(s) if s.is_empty() => Vec::new(),
            FieldValue::Text(s) => vec![s.clone()],
        }
    }
}

/// Per-field extraction outcome with provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorResult {
    pub value: FieldValue,
    pub selector: Option<String>,
    pub source: Source,
}

impl SelectorResult {
    pub fn empty_text() -> Self {
        Self {
            value: FieldValue::Text(String::new()),
            selector: None,
            source: Source::Selector,
        }
    }

    pub fn empty_list() -> Self {
        Self {
            value: FieldValue::List(Vec::new()),
            selector: None,
            source: Source::Selector,
        }
    }

    pub fn from_ld_json(value: FieldValue) -> Self {
        Self {
            value,
            selector: None,
            source: Source::LdJson,
        }
    }

    pub fn from_selector(value: FieldValue, selector: Option<String>) -> Self {
        Self {
            value,
            selector,
            source: Source::Selector,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// The recipe fields the scraper fills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecipeField {
    Title,
    Description,
    Ingredients,
    Instructions,
    PrepTime,
    CookTime,
    Servings,
    Image,
    Cuisine,
    Nutrition,
}

impl RecipeField {
    pub const ALL: [RecipeField; 10] = [
        RecipeField::Title,
        RecipeField::Description,
        RecipeField::Ingredients,
        RecipeField::Instructions,
        RecipeField::PrepTime,
        RecipeField::CookTime,
        RecipeField::Servings,
        RecipeField::Image,
        RecipeField::Cuisine,
        RecipeField::Nutrition,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecipeField::Title => "title",
            RecipeField::Description => "description",
            RecipeField::Ingredients => "ingredients",
            RecipeField::Instructions => "instructions",
            RecipeField::PrepTime => "prepTime",
            RecipeField::CookTime => "cookTime",
            RecipeField::Servings => "servings",
            RecipeField::Image => "image",
            RecipeField::Cuisine => "cuisine",
            RecipeField::Nutrition => "nutrition",
        }
    }

    /// Whether the field holds a list of lines rather than one text block
    pub fn is_list(&self) -> bool {
        matches!(self, RecipeField::Ingredients | RecipeField::Instructions)
    }
}

impl fmt::Display for RecipeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One [`SelectorResult`] per recipe field, created fresh for every scrape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapingResults {
    pub title: SelectorResult,
    pub description: SelectorResult,
    pub ingredients: SelectorResult,
    pub instructions: SelectorResult,
    pub prep_time: SelectorResult,
    pub cook_time: SelectorResult,
    pub servings: SelectorResult,
    pub image: SelectorResult,
    pub cuisine: SelectorResult,
    pub nutrition: SelectorResult,
}

impl Default for ScrapingResults {
    fn default() -> Self {
        Self {
            title: SelectorResult::empty_text(),
            description: SelectorResult::empty_text(),
            ingredients: SelectorResult::empty_list(),
            instructions: SelectorResult::empty_list(),
            prep_time: SelectorResult::empty_text(),
            cook_time: SelectorResult::empty_text(),
            servings: SelectorResult::empty_text(),
            image: SelectorResult::empty_text(),
            cuisine: SelectorResult::empty_text(),
            nutrition: SelectorResult::empty_text(),
        }
    }
}

impl ScrapingResults {
    pub fn get(&self, field: RecipeField) -> &SelectorResult {
        match field {
            RecipeField::Title => &self.title,
            RecipeField::Description => &self.description,
            RecipeField::Ingredients => &self.ingredients,
            RecipeField::Instructions => &self.instructions,
            RecipeField::PrepTime => &self.prep_time,
            RecipeField::CookTime => &self.cook_time,
            RecipeField::Servings => &self.servings,
            RecipeField::Image => &self.image,
            RecipeField::Cuisine => &self.cuisine,
            RecipeField::Nutrition => &self.nutrition,
        }
    }

    pub fn get_mut(&mut self, field: RecipeField) -> &mut SelectorResult {
        match field {
            RecipeField::Title => &mut self.title,
            RecipeField::Description => &mut self.description,
            RecipeField::Ingredients => &mut self.ingredients,
            RecipeField::Instructions => &mut self.instructions,
            RecipeField::PrepTime => &mut self.prep_time,
            RecipeField::CookTime => &mut self.cook_time,
            RecipeField::Servings => &mut self.servings,
            RecipeField::Image => &mut self.image,
            RecipeField::Cuisine => &mut self.cuisine,
            RecipeField::Nutrition => &mut self.nutrition,
        }
    }

    /// Whether an extractor already filled the field
    pub fn is_filled(&self, field: RecipeField) -> bool {
        !self.get(field).is_empty()
    }

    /// Store a result unless the field is already filled; returns whether it was stored
    pub fn fill(&mut self, field: RecipeField, result: SelectorResult) -> bool {
        if self.is_filled(field) || result.is_empty() {
            return false;
        }
        *self.get_mut(field) = result;
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (RecipeField, &SelectorResult)> {
        RecipeField::ALL.into_iter().map(move |f| (f, self.get(f)))
    }

    /// Counts by provenance
    pub fn stats(&self) -> ExtractionStats {
        let successful = self.iter().filter(|(_, r)| !r.is_empty()).count();
        let from_ld_json = self
            .iter()
            .filter(|(_, r)| r.source == Source::LdJson)
            .count();
        ExtractionStats {
            total: RecipeField::ALL.len(),
            successful,
            from_ld_json,
            from_selectors: successful.saturating_sub(from_ld_json),
        }
    }
}

/// Extraction statistics handed to callers so they can ask for missing fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionStats {
    pub total: usize,
    pub successful: usize,
    pub from_ld_json: usize,
    pub from_selectors: usize,
}

/// Nutrition facts as printed on the page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nutrition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_fat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saturated_fat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trans_fat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiber: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sugar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sodium: Option<String>,
}

impl Nutrition {
    pub fn is_empty(&self) -> bool {
        self.labelled().is_empty()
    }

    /// Fill fields that are still empty from `other`
    pub fn merge_missing(&mut self, other: Nutrition) {
        fn keep(slot: &mut Option<String>, value: Option<String>) {
            if slot.as_deref().map_or(true, str::is_empty) {
                if let Some(v) = value.filter(|v| !v.is_empty()) {
                    *slot = Some(v);
                }
            }
        }
        keep(&mut self.calories, other.calories);
        keep(&mut self.protein, other.protein);
        keep(&mut self.total_fat, other.total_fat);
        keep(&mut self.saturated_fat, other.saturated_fat);
        keep(&mut self.trans_fat, other.trans_fat);
        keep(&mut self.fiber, other.fiber);
        keep(&mut self.sugar, other.sugar);
        keep(&mut self.sodium, other.sodium);
    }

    fn labelled(&self) -> Vec<(&'static str, &str)> {
        [
            ("calories", &self.calories),
            ("protein", &self.protein),
            ("fat", &self.total_fat),
            ("saturated fat", &self.saturated_fat),
            ("trans fat", &self.trans_fat),
            ("fiber", &self.fiber),
            ("sugar", &self.sugar),
            ("sodium", &self.sodium),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.as_deref().map(|v| (label, v)))
        .filter(|(_, v)| !v.is_empty())
        .collect()
    }

    /// One-line summary, e.g. "calories: 250 kcal, protein: 10 g"
    pub fn summary(&self) -> String {
        self.labelled()
            .into_iter()
            .map(|(label, value)| format!("{label}: {value}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// The assembled recipe fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedRecipe {
    pub title: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub prep_time: Option<String>,
    pub cook_time: Option<String>,
    pub servings: Option<String>,
    pub image_url: String,
    pub cuisine: String,
    pub source_url: String,
    pub nutrition: Option<Nutrition>,
}

impl ScrapedRecipe {
    /// Assemble the recipe from per-field results
    pub fn from_results(results: &ScrapingResults, url: &str, nutrition: Option<Nutrition>) -> Self {
        let optional = |r: &SelectorResult| {
            let text = r.value.as_text();
            (!text.is_empty()).then(|| text.to_string())
        };

        ScrapedRecipe {
            title: results.title.value.as_text().to_string(),
            description: results.description.value.as_text().to_string(),
            ingredients: results.ingredients.value.to_lines(),
            instructions: results.instructions.value.to_lines(),
            prep_time: optional(&results.prep_time),
            cook_time: optional(&results.cook_time),
            servings: optional(&results.servings),
            image_url: results.image.value.as_text().to_string(),
            cuisine: results.cuisine.value.as_text().to_string(),
            source_url: url.to_string(),
            nutrition: nutrition.filter(|n| !n.is_empty()),
        }
    }
}

/// Output of one scrape: the recipe plus the per-field provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeOutput {
    pub data: ScrapedRecipe,
    pub results: ScrapingResults,
}

/// Output of a store-aware scrape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeReport {
    pub data: ScrapedRecipe,
    pub results: ScrapingResults,
    pub used_custom_selectors: bool,
    pub extraction_stats: ExtractionStats,
}

impl ScrapeReport {
    pub fn new(output: ScrapeOutput, used_custom_selectors: bool) -> Self {
        let extraction_stats = output.results.stats();
        Self {
            data: output.data,
            results: output.results,
            used_custom_selectors,
            extraction_stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_serializes_as_tag() {
        let result = SelectorResult::from_ld_json(FieldValue::Text("Soup".to_string()));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["source"], "ld-json");
        assert_eq!(json["value"], "Soup");
        assert!(json["selector"].is_null());
    }

    #[test]
    fn test_fill_keeps_first_value() {
        let mut results = ScrapingResults::default();
        assert!(results.fill(
            RecipeField::Title,
            SelectorResult::from_ld_json(FieldValue::Text("First".to_string()))
        ));
        assert!(!results.fill(
            RecipeField::Title,
            SelectorResult::from_selector(FieldValue::Text("Second".to_string()), Some("h1".to_string()))
        ));
        assert_eq!(results.title.value.as_text(), "First");
    }

    #[test]
    fn test_stats_count_by_provenance() {
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

        let stats = results.stats();
        assert_eq!(stats.total, 10);
        assert_eq!(stats.successful, 2);
        assert_eq!(stats.from_ld_json, 1);
        assert_eq!(stats.from_selectors, 1);
    }

    #[test]
    fn test_recipe_serializes_camel_case() {
        let recipe = ScrapedRecipe {
            image_url: "https://example.com/a.jpg".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&recipe).unwrap();
        assert_eq!(json["imageUrl"], "https://example.com/a.jpg");
        assert!(json["prepTime"].is_null());
        assert!(json.get("sourceUrl").is_some());
    }
}
