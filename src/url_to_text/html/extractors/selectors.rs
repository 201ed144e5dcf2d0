use super::{first_number, parse_time_to_minutes, Extraction, Extractor, ParsingContext};
use crate::model::{FieldValue, Nutrition, RecipeField, SelectorResult};
use crate::validation::{clean_text, is_valid_ingredient, is_valid_instruction, remove_duplicates};
use log::debug;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

const MAX_SCALAR_CHARS: usize = 5000;

static LEADING_BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*[•·▪▫◦●□▢■☐-]\s*").unwrap());

const TITLE: &[&str] = &[
    r#"[itemprop="name"]"#,
    r#"h1[class*="recipe"]"#,
    r#"h1[class*="title"]"#,
    ".recipe-title",
    ".entry-title",
    "h1",
];

const DESCRIPTION: &[&str] = &[
    r#"[itemprop="description"]"#,
    ".recipe-description",
    ".recipe-summary",
    ".entry-summary",
    r#"meta[name="description"]"#,
];

const INGREDIENTS: &[&str] = &[
    r#"[itemprop="recipeIngredient"]"#,
    ".recipe-ingredients li",
    ".ingredients li",
    ".recipe-ingredient",
    ".ingredient",
    r#"[class*="ingredient"]:not([class*="group"]):not([class*="section"])"#,
    ".ingredients p",
    ".ingredient-list li",
    ".wprm-recipe-ingredients li",
    ".wprm-recipe-ingredient",
    ".tasty-recipes-ingredients li",
    ".mv-ingredients li",
    ".sp-recipe-ingredients li",
    ".recipe-card-ingredient",
];

const INSTRUCTIONS: &[&str] = &[
    r#"[itemprop="recipeInstructions"]"#,
    ".recipe-instructions li",
    ".instructions li",
    ".recipe-instruction",
    ".instruction",
    ".directions li",
    ".recipe-directions li",
    r#"[class*="instruction"]:not([class*="group"]):not([class*="section"])"#,
    ".instructions p",
    ".directions p",
    ".method li",
    ".recipe-method li",
    ".wprm-recipe-instructions li",
    ".wprm-recipe-instruction",
    ".tasty-recipes-instructions li",
    ".mv-instructions li",
    ".sp-recipe-instructions li",
];

const PREP_TIME: &[&str] = &[r#"[itemprop="prepTime"]"#, ".prep-time", ".recipe-prep-time", r#"[class*="prep"]"#];
const COOK_TIME: &[&str] = &[r#"[itemprop="cookTime"]"#, ".cook-time", ".recipe-cook-time", r#"[class*="cook"]"#];
const SERVINGS: &[&str] = &[
    r#"[itemprop="recipeYield"]"#,
    ".servings",
    ".recipe-servings",
    ".yield",
    r#"[class*="serving"]"#,
];

const IMAGE: &[&str] = &[
    r#"[itemprop="image"]"#,
    ".recipe-image img",
    ".featured-image img",
    ".entry-image img",
    r#"img[class*="recipe"]"#,
    r#"meta[property="og:image"]"#,
    r#"meta[name="twitter:image"]"#,
];

const CUISINE: &[&str] = &[r#"[itemprop="recipeCuisine"]"#, ".cuisine", ".recipe-cuisine", r#"[class*="cuisine"]"#];

const NUTRITION: &[&str] = &[
    r#"[itemprop="nutrition"]"#,
    ".nutrition-facts",
    ".recipe-nutrition",
    ".nutritional-info",
    r#"[class*="nutrition"]"#,
    ".nutrition-table",
    ".nutrition-info",
];

const CALORIES: &[&str] = &[r#"[itemprop="calories"]"#, ".calories", r#"[class*="calorie"]"#, ".nutrition-calories"];
const PROTEIN: &[&str] = &[r#"[itemprop="proteinContent"]"#, ".protein", r#"[class*="protein"]"#];
const FAT: &[&str] = &[r#"[itemprop="fatContent"]"#, ".fat", r#"[class*="fat"]"#];
const FIBER: &[&str] = &[r#"[itemprop="fiberContent"]"#, ".fiber", r#"[class*="fiber"]"#];
const SUGAR: &[&str] = &[r#"[itemprop="sugarContent"]"#, ".sugar", r#"[class*="sugar"]"#];
const SODIUM: &[&str] = &[r#"[itemprop="sodiumContent"]"#, ".sodium", r#"[class*="sodium"]"#];

fn owned(selectors: &[&str]) -> Vec<String> {
    selectors.iter().map(|s| s.to_string()).collect()
}

/// Priority-ordered CSS selectors per field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectorSet {
    pub title: Vec<String>,
    pub description: Vec<String>,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub prep_time: Vec<String>,
    pub cook_time: Vec<String>,
    pub servings: Vec<String>,
    pub image: Vec<String>,
    pub cuisine: Vec<String>,
    pub nutrition: Vec<String>,
    pub calories: Vec<String>,
    pub protein: Vec<String>,
    pub fat: Vec<String>,
    pub fiber: Vec<String>,
    pub sugar: Vec<String>,
    pub sodium: Vec<String>,
}

impl Default for SelectorSet {
    fn default() -> Self {
        Self {
            title: owned(TITLE),
            description: owned(DESCRIPTION),
            ingredients: owned(INGREDIENTS),
            instructions: owned(INSTRUCTIONS),
            prep_time: owned(PREP_TIME),
            cook_time: owned(COOK_TIME),
            servings: owned(SERVINGS),
            image: owned(IMAGE),
            cuisine: owned(CUISINE),
            nutrition: owned(NUTRITION),
            calories: owned(CALORIES),
            protein: owned(PROTEIN),
            fat: owned(FAT),
            fiber: owned(FIBER),
            sugar: owned(SUGAR),
            sodium: owned(SODIUM),
        }
    }
}

impl SelectorSet {
    pub fn field(&self, field: RecipeField) -> &[String] {
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

    /// Replace the whole selector list of one field
    pub fn set_field(&mut self, field: RecipeField, selectors: Vec<String>) {
        let slot = match field {
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
        };
        *slot = selectors;
    }

    pub fn with_field<I, S>(mut self, field: RecipeField, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_field(field, selectors.into_iter().map(Into::into).collect());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScalarKind {
    Text,
    Time,
    Servings,
    Image,
}

impl ScalarKind {
    fn of(field: RecipeField) -> Self {
        match field {
            RecipeField::PrepTime | RecipeField::CookTime => ScalarKind::Time,
            RecipeField::Servings => ScalarKind::Servings,
            RecipeField::Image => ScalarKind::Image,
            _ => ScalarKind::Text,
        }
    }
}

/// CSS-selector extraction for the fields structured data left empty
#[derive(Debug, Clone, Default)]
pub struct SelectorExtractor {
    selectors: SelectorSet,
}

fn compile(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(compiled) => Some(compiled),
        Err(e) => {
            debug!("SelectorExtractor: skipping invalid selector {:?}: {:?}", selector, e);
            None
        }
    }
}

fn element_text(element: &ElementRef) -> String {
    clean_text(&element.text().collect::<String>())
}

fn attribute(element: &ElementRef, name: &str) -> Option<String> {
    element
        .value()
        .attr(name)
        .map(clean_text)
        .filter(|v| !v.is_empty())
}

fn scalar_value(element: &ElementRef, kind: ScalarKind) -> Option<String> {
    if kind == ScalarKind::Image {
        return ["src", "data-src", "content"]
            .iter()
            .find_map(|name| attribute(element, name));
    }

    let text = element_text(element);
    let raw = if text.is_empty() {
        attribute(element, "content").or_else(|| attribute(element, "src"))?
    } else {
        text
    };

    match kind {
        ScalarKind::Time => parse_time_to_minutes(&raw),
        ScalarKind::Servings => first_number(&raw),
        _ => (raw.chars().count() <= MAX_SCALAR_CHARS).then_some(raw),
    }
}

/// First element, across the selectors in order, with a usable value
fn first_scalar(document: &Html, selectors: &[String], kind: ScalarKind) -> Option<(String, String)> {
    selectors.iter().find_map(|selector| {
        let compiled = compile(selector)?;
        let value = document
            .select(&compiled)
            .find_map(|element| scalar_value(&element, kind))?;
        Some((value, selector.clone()))
    })
}

/// First selector whose matches survive validation and dedup
fn first_list(document: &Html, selectors: &[String], field: RecipeField) -> Option<(Vec<String>, String)> {
    selectors.iter().find_map(|selector| {
        let compiled = compile(selector)?;
        let blocks: Vec<String> = document
            .select(&compiled)
            .map(|element| element_text(&element))
            .filter(|text| !text.is_empty())
            .collect();
        if blocks.is_empty() {
            return None;
        }

        let accepted: Vec<String> = match field {
            RecipeField::Ingredients => blocks
                .iter()
                .map(|text| LEADING_BULLET.replace(text, "").trim().to_string())
                .filter(|text| is_valid_ingredient(text))
                .collect(),
            _ => blocks.into_iter().filter(|text| is_valid_instruction(text)).collect(),
        };
        let lines = remove_duplicates(&accepted);
        if lines.is_empty() {
            debug!("SelectorExtractor: {} matched only rejected blocks for {}", selector, field);
            return None;
        }
        Some((lines, selector.clone()))
    })
}

impl SelectorExtractor {
    pub fn new(selectors: SelectorSet) -> Self {
        Self { selectors }
    }

    pub fn selectors(&self) -> &SelectorSet {
        &self.selectors
    }

    fn nutrients(&self, document: &Html) -> Nutrition {
        let read = |selectors: &[String]| first_scalar(document, selectors, ScalarKind::Text).map(|(v, _)| v);
        Nutrition {
            calories: read(&self.selectors.calories),
            protein: read(&self.selectors.protein),
            total_fat: read(&self.selectors.fat),
            fiber: read(&self.selectors.fiber),
            sugar: read(&self.selectors.sugar),
            sodium: read(&self.selectors.sodium),
            ..Default::default()
        }
    }

    fn extract_field(&self, document: &Html, field: RecipeField) -> Option<SelectorResult> {
        let selectors = self.selectors.field(field);
        if field.is_list() {
            let (lines, selector) = first_list(document, selectors, field)?;
            Some(SelectorResult::from_selector(FieldValue::List(lines), Some(selector)))
        } else {
            let (value, selector) = first_scalar(document, selectors, ScalarKind::of(field))?;
            Some(SelectorResult::from_selector(FieldValue::Text(value), Some(selector)))
        }
    }
}

impl Extractor for SelectorExtractor {
    fn name(&self) -> &'static str {
        "selector"
    }

    fn parse(&self, context: &ParsingContext, extraction: &mut Extraction) -> usize {
        let document = &context.document;
        let mut filled = 0;

        for field in RecipeField::ALL {
            if extraction.results.is_filled(field) {
                continue;
            }
            let result = self.extract_field(document, field);

            if field == RecipeField::Nutrition {
                let nutrients = self.nutrients(document);
                let result = result.or_else(|| {
                    (!nutrients.is_empty())
                        .then(|| SelectorResult::from_selector(FieldValue::Text(nutrients.summary()), None))
                });
                extraction.nutrition.merge_missing(nutrients);
                if let Some(result) = result {
                    filled += usize::from(extraction.results.fill(field, result));
                }
                continue;
            }

            match result {
                Some(result) => {
                    debug!("SelectorExtractor: {} via {:?}", field, result.selector);
                    filled += usize::from(extraction.results.fill(field, result));
                }
                None => debug!("SelectorExtractor: no selector matched {}", field),
            }
        }

        filled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract_with(html: &str, selectors: SelectorSet) -> Extraction {
        let context = ParsingContext::new("https://example.com/soup", html);
        let mut extraction = Extraction::default();
        SelectorExtractor::new(selectors).parse(&context, &mut extraction);
        extraction
    }

    fn extract(html: &str) -> Extraction {
        extract_with(html, SelectorSet::default())
    }

    #[test]
    fn test_default_selectors() {
        let html = r#"
            <html><head>
                <meta name="description" content="A quick weeknight soup">
                <meta property="og:image" content="https://example.com/og.jpg">
            </head><body>
                <h1 class="entry-title">Weeknight Soup</h1>
                <ul class="recipe-ingredients">
                    <li>▢ 2 cups stock</li>
                    <li>1 onion</li>
                    <li>Advertisement</li>
                </ul>
                <ol class="recipe-instructions">
                    <li>Chop the onion finely.</li>
                    <li>Simmer in the stock for ten minutes.</li>
                </ol>
                <span class="prep-time">Prep: 10 mins</span>
                <span class="recipe-servings">Serves 4</span>
            </body></html>
        "#;

        let results = extract(html).results;
        assert_eq!(results.title.value.as_text(), "Weeknight Soup");
        assert_eq!(results.title.selector.as_deref(), Some(r#"h1[class*="title"]"#));
        assert_eq!(results.description.value.as_text(), "A quick weeknight soup");
        assert_eq!(results.ingredients.value.to_lines(), vec!["2 cups stock", "1 onion"]);
        assert_eq!(results.ingredients.selector.as_deref(), Some(".recipe-ingredients li"));
        assert_eq!(results.instructions.value.to_lines().len(), 2);
        assert_eq!(results.prep_time.value.as_text(), "10");
        assert_eq!(results.servings.value.as_text(), "4");
        assert_eq!(results.image.value.as_text(), "https://example.com/og.jpg");
        assert_eq!(results.ingredients.source, crate::model::Source::Selector);
    }

    #[test]
    fn test_rejected_matches_fall_through_to_next_selector() {
        let html = r#"
            <ul class="first"><li>Ingredients</li><li>Advertisement</li></ul>
            <ul class="second"><li>3 eggs</li><li>1 cup milk</li></ul>
        "#;
        let selectors = SelectorSet::default().with_field(RecipeField::Ingredients, [".first li", ".second li"]);

        let results = extract_with(html, selectors).results;
        assert_eq!(results.ingredients.value.to_lines(), vec!["3 eggs", "1 cup milk"]);
        assert_eq!(results.ingredients.selector.as_deref(), Some(".second li"));
    }

    #[test]
    fn test_inline_markup_keeps_punctuation_attached() {
        let html = r#"
            <ul class="ingredients">
                <li>2 cups <a href="/flour">flour</a>, sifted</li>
                <li><b>1</b> egg</li>
            </ul>
            <div class="directions">
                <p>Preheat the <b>oven</b>. Then wait a while.</p>
            </div>
        "#;
        let selectors = SelectorSet::default()
            .with_field(RecipeField::Ingredients, [".ingredients li"])
            .with_field(RecipeField::Instructions, [".directions p"]);

        let results = extract_with(html, selectors).results;
        assert_eq!(results.ingredients.value.to_lines(), vec!["2 cups flour, sifted", "1 egg"]);
        assert_eq!(
            results.instructions.value.to_lines(),
            vec!["Preheat the oven. Then wait a while."]
        );
    }

    #[test]
    fn test_first_matching_selector_wins() {
        let html = r#"
            <ul class="recipe-ingredients"><li>1 cup rice</li></ul>
            <ul class="wprm-recipe-ingredients"><li>2 cups water</li></ul>
        "#;
        let results = extract(html).results;
        assert_eq!(results.ingredients.value.to_lines(), vec!["1 cup rice"]);
    }

    #[test]
    fn test_override_replaces_default_list() {
        let html = r#"
            <ul class="recipe-ingredients"><li>1 cup rice</li></ul>
            <div class="shopping"><span>2 cups water</span></div>
        "#;
        let selectors = SelectorSet::default().with_field(RecipeField::Ingredients, [".shopping span"]);

        let results = extract_with(html, selectors).results;
        assert_eq!(results.ingredients.value.to_lines(), vec!["2 cups water"]);
        assert_eq!(results.ingredients.selector.as_deref(), Some(".shopping span"));
    }

    #[test]
    fn test_invalid_selector_is_skipped() {
        let html = r#"<h2 class="name">Fallback Title</h2>"#;
        let selectors = SelectorSet::default().with_field(RecipeField::Title, ["h1[[[", ".name"]);

        let results = extract_with(html, selectors).results;
        assert_eq!(results.title.value.as_text(), "Fallback Title");
        assert_eq!(results.title.selector.as_deref(), Some(".name"));
    }

    #[test]
    fn test_filled_fields_are_left_alone() {
        let context = ParsingContext::new("https://example.com", "<h1>Selector Title</h1>");
        let mut extraction = Extraction::default();
        extraction.results.fill(
            RecipeField::Title,
            SelectorResult::from_ld_json(FieldValue::Text("Structured Title".to_string())),
        );

        SelectorExtractor::default().parse(&context, &mut extraction);
        assert_eq!(extraction.results.title.value.as_text(), "Structured Title");
    }

    #[test]
    fn test_time_and_servings_must_parse() {
        let html = r#"
            <span class="prep-time">quick</span>
            <span class="recipe-prep-time">PT20M</span>
            <span class="servings">lots</span>
            <span class="yield">Makes 12 muffins</span>
        "#;
        let results = extract(html).results;
        assert_eq!(results.prep_time.value.as_text(), "20");
        assert_eq!(results.prep_time.selector.as_deref(), Some(".recipe-prep-time"));
        assert_eq!(results.servings.value.as_text(), "12");
    }

    #[test]
    fn test_image_attributes() {
        let html = r#"<div class="recipe-image"><img data-src="https://example.com/lazy.jpg"></div>"#;
        let results = extract(html).results;
        assert_eq!(results.image.value.as_text(), "https://example.com/lazy.jpg");
    }

    #[test]
    fn test_nutrients() {
        let html = r#"
            <div class="nutrition-facts">
                <span class="calories">320 kcal</span>
                <span class="protein">12 g</span>
            </div>
        "#;
        let extraction = extract(html);
        assert_eq!(extraction.nutrition.calories.as_deref(), Some("320 kcal"));
        assert_eq!(extraction.nutrition.protein.as_deref(), Some("12 g"));
        assert_eq!(extraction.results.nutrition.selector.as_deref(), Some(".nutrition-facts"));
    }
}
