use super::{first_number, parse_time_to_minutes, Extraction, Extractor, ParsingContext};
use crate::model::{FieldValue, Nutrition, RecipeField, SelectorResult};
use crate::validation::{clean_text, is_valid_ingredient, is_valid_instruction, remove_duplicates};
use html_escape::decode_html_entities;
use log::debug;
use regex::Regex;
use scraper::Selector;
use serde::de::IgnoredAny;
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;

static SCRIPT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());
static OBJECT_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\}\s*\{").unwrap());

/// Reads schema.org Recipe objects embedded as LD+JSON
pub struct JsonLdExtractor;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonLdRecipe {
    name: Option<Text>,
    description: Option<Text>,
    image: Option<ImageType>,
    recipe_ingredient: Option<RecipeIngredients>,
    recipe_instructions: Option<Value>,
    recipe_yield: Option<Text>,
    prep_time: Option<Text>,
    cook_time: Option<Text>,
    recipe_cuisine: Option<Text>,
    nutrition: Option<NutritionField>,
}

#[derive(Debug, Deserialize)]
struct TextObject {
    text: Option<String>,
    name: Option<String>,
}

/// A loosely typed text value; anything unexpected lands in `Other`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Text {
    String(String),
    Number(f64),
    Object(TextObject),
    Multiple(Vec<Text>),
    Other(IgnoredAny),
}

impl Text {
    fn first(&self) -> Option<String> {
        match self {
            Text::String(s) => Some(s.clone()),
            Text::Number(n) => Some(n.to_string()),
            Text::Object(o) => o.text.clone().or_else(|| o.name.clone()),
            Text::Multiple(items) => items.first().and_then(Text::first),
            Text::Other(_) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImageObject {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImageType {
    String(String),
    Object(ImageObject),
    Multiple(Vec<ImageType>),
    Other(IgnoredAny),
}

impl ImageType {
    fn first_url(&self) -> Option<String> {
        match self {
            ImageType::String(s) => Some(s.clone()),
            ImageType::Object(o) => o.url.clone(),
            ImageType::Multiple(items) => items.first().and_then(ImageType::first_url),
            ImageType::Other(_) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecipeIngredients {
    Single(String),
    Multiple(Vec<Text>),
    Other(IgnoredAny),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NutritionInformation {
    calories: Option<Text>,
    protein_content: Option<Text>,
    fat_content: Option<Text>,
    saturated_fat_content: Option<Text>,
    trans_fat_content: Option<Text>,
    fiber_content: Option<Text>,
    sugar_content: Option<Text>,
    sodium_content: Option<Text>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NutritionField {
    Object(NutritionInformation),
    Other(IgnoredAny),
}

impl NutritionInformation {
    fn to_nutrition(&self) -> Nutrition {
        let read = |v: &Option<Text>| {
            v.as_ref()
                .and_then(Text::first)
                .map(|s| clean_text(&decode_html_symbols(&s)))
                .filter(|s| !s.is_empty())
        };
        Nutrition {
            calories: read(&self.calories),
            protein: read(&self.protein_content),
            total_fat: read(&self.fat_content),
            saturated_fat: read(&self.saturated_fat_content),
            trans_fat: read(&self.trans_fat_content),
            fiber: read(&self.fiber_content),
            sugar: read(&self.sugar_content),
            sodium: read(&self.sodium_content),
        }
    }
}

fn decode_html_symbols(text: &str) -> String {
    // Some sites double-encode entities
    decode_html_entities(&decode_html_entities(text)).into_owned()
}

fn clean(text: &str) -> String {
    clean_text(&decode_html_symbols(text))
}

/// "Recipe", "recipe" or "http://schema.org/Recipe", alone or in an array
fn is_recipe_type(value: &Value) -> bool {
    let matches = |t: &str| t.rsplit('/').next().is_some_and(|t| t.eq_ignore_ascii_case("recipe"));
    match value.get("@type") {
        Some(Value::String(t)) => matches(t),
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).any(matches),
        _ => false,
    }
}

/// Parse one script block, repairing it when the strict parse fails
fn parse_block(raw: &str) -> Option<Value> {
    let raw = raw.trim();
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        return Some(value);
    }

    // Concatenated root objects: {..}{..}
    let bracketed = format!("[{}]", OBJECT_BOUNDARY.replace_all(raw, "},{"));
    if let Ok(value) = serde_json::from_str::<Value>(&bracketed) {
        debug!("JsonLdExtractor: recovered block by wrapping root objects");
        return Some(value);
    }

    match serde_json::from_str::<Value>(&repair_commas(&bracketed)) {
        Ok(value) => {
            debug!("JsonLdExtractor: recovered block by repairing commas");
            Some(value)
        }
        Err(e) => {
            debug!("JsonLdExtractor: giving up on block: {}", e);
            None
        }
    }
}

/// Insert missing commas between adjacent values and drop stray ones
fn repair_commas(json: &str) -> String {
    let mut out = String::with_capacity(json.len() + 16);
    let mut in_string = false;
    let mut escaped = false;
    // Last significant character outside a string (a closing quote counts)
    let mut last: Option<char> = None;

    for c in json.chars() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
                last = Some('"');
            }
            continue;
        }

        if c.is_whitespace() {
            out.push(c);
            continue;
        }

        let after_value = matches!(last, Some('"' | '}' | ']' | 'e' | 'l')) || last.is_some_and(|l| l.is_ascii_digit());
        match c {
            '"' | '{' | '[' if after_value => out.push(','),
            ',' if matches!(last, Some(',' | '{' | '[' | ':') | None) => continue,
            '}' | ']' | ':' if last == Some(',') => {
                let trimmed = out.trim_end().len();
                out.truncate(trimmed);
                out.pop();
            }
            _ => {}
        }

        out.push(c);
        if c == '"' {
            in_string = true;
        }
        last = Some(c);
    }

    out
}

/// Root objects, array items and `@graph` members, in document order
fn candidates(root: &Value) -> Vec<&Value> {
    let items: Vec<&Value> = match root {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    items
        .into_iter()
        .flat_map(|item| match item.get("@graph") {
            Some(Value::Array(graph)) => graph.iter().collect(),
            _ => vec![item],
        })
        .collect()
}

/// Flatten strings, step objects and sections into instruction lines
fn collect_steps(node: &Value, steps: &mut Vec<String>) {
    match node {
        Value::String(s) => steps.push(clean(s)),
        Value::Array(items) => items.iter().for_each(|item| collect_steps(item, steps)),
        Value::Object(map) => {
            if let Some(children) = map.get("itemListElement") {
                collect_steps(children, steps);
            } else if let Some(text) = map.get("text").and_then(Value::as_str) {
                steps.push(clean(text));
            } else if let Some(name) = map.get("name").and_then(Value::as_str) {
                steps.push(clean(name));
            }
        }
        _ => {}
    }
}

impl JsonLdExtractor {
    /// Fill still-empty fields from one Recipe object
    fn apply(&self, recipe: &JsonLdRecipe, extraction: &mut Extraction) -> usize {
        let results = &mut extraction.results;
        let mut filled = 0;
        let mut fill = |field: RecipeField, value: Option<FieldValue>| {
            if let Some(value) = value {
                if results.fill(field, SelectorResult::from_ld_json(value)) {
                    debug!("JsonLdExtractor: filled {}", field);
                    filled += 1;
                }
            }
        };

        let text = |t: &Option<Text>| t.as_ref().and_then(Text::first).map(|s| FieldValue::Text(clean(&s)));
        fill(RecipeField::Title, text(&recipe.name));
        fill(RecipeField::Description, text(&recipe.description));

        let ingredients = match &recipe.recipe_ingredient {
            Some(RecipeIngredients::Single(s)) => vec![clean(s)],
            Some(RecipeIngredients::Multiple(items)) => {
                items.iter().filter_map(Text::first).map(|s| clean(&s)).collect()
            }
            Some(RecipeIngredients::Other(_)) | None => Vec::new(),
        };
        let ingredients: Vec<String> = ingredients.into_iter().filter(|i| is_valid_ingredient(i)).collect();
        fill(RecipeField::Ingredients, Some(FieldValue::List(remove_duplicates(&ingredients))));

        let mut steps = Vec::new();
        if let Some(instructions) = &recipe.recipe_instructions {
            collect_steps(instructions, &mut steps);
        }
        let steps: Vec<String> = steps.into_iter().filter(|s| is_valid_instruction(s)).collect();
        fill(RecipeField::Instructions, Some(FieldValue::List(remove_duplicates(&steps))));

        let minutes = |t: &Option<Text>| {
            t.as_ref()
                .and_then(Text::first)
                .and_then(|s| parse_time_to_minutes(&s))
                .map(FieldValue::Text)
        };
        fill(RecipeField::PrepTime, minutes(&recipe.prep_time));
        fill(RecipeField::CookTime, minutes(&recipe.cook_time));

        let servings = recipe
            .recipe_yield
            .as_ref()
            .and_then(Text::first)
            .and_then(|s| first_number(&s))
            .map(FieldValue::Text);
        fill(RecipeField::Servings, servings);

        let image = recipe
            .image
            .as_ref()
            .and_then(ImageType::first_url)
            .map(|url| FieldValue::Text(decode_html_symbols(url.trim())));
        fill(RecipeField::Image, image);

        fill(RecipeField::Cuisine, text(&recipe.recipe_cuisine));

        if let Some(NutritionField::Object(info)) = &recipe.nutrition {
            let nutrition = info.to_nutrition();
            if !nutrition.is_empty() {
                fill(RecipeField::Nutrition, Some(FieldValue::Text(nutrition.summary())));
                extraction.nutrition.merge_missing(nutrition);
            }
        }

        filled
    }
}

impl Extractor for JsonLdExtractor {
    fn name(&self) -> &'static str {
        "ld-json"
    }

    fn parse(&self, context: &ParsingContext, extraction: &mut Extraction) -> usize {
        debug!("JsonLdExtractor: Starting parse for URL: {}", context.url);

        let mut filled = 0;
        for (index, script) in context.document.select(&SCRIPT).enumerate() {
            let raw: String = script.text().collect();
            let Some(root) = parse_block(&raw) else {
                continue;
            };

            for candidate in candidates(&root) {
                if !is_recipe_type(candidate) {
                    continue;
                }
                match JsonLdRecipe::deserialize(candidate) {
                    Ok(recipe) => filled += self.apply(&recipe, extraction),
                    Err(e) => debug!("JsonLdExtractor: script {} has an unreadable Recipe: {}", index, e),
                }
            }
        }

        debug!("JsonLdExtractor: filled {} fields", filled);
        filled
    }
}
