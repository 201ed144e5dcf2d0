use super::finalize;
use crate::ingredients::NormalizationOptions;
use crate::model::{FieldValue, RecipeField, ScrapeOutput, ScrapingResults, SelectorResult};
use crate::url_to_text::text::TextExtractor;

/// Scrape a recipe from reader-service plain text
///
/// Only title, ingredients and instructions can be recovered from plain text.
/// They are recorded as selector results without a selector, so nothing is
/// learned from them.
pub fn process(text: &str, url: &str, options: &NormalizationOptions) -> ScrapeOutput {
    let readable = TextExtractor::extract(text);

    let mut results = ScrapingResults::default();
    results.fill(
        RecipeField::Title,
        SelectorResult::from_selector(FieldValue::Text(readable.title), None),
    );
    results.fill(
        RecipeField::Ingredients,
        SelectorResult::from_selector(FieldValue::List(readable.ingredients), None),
    );
    results.fill(
        RecipeField::Instructions,
        SelectorResult::from_selector(FieldValue::List(readable.instructions), None),
    );

    finalize(results, url, None, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Source;

    #[test]
    fn test_reader_text() {
        let text = "Garlic Butter Rice\nIngredients\n- 1 cup rice\n- 2 tbsp butter\nInstructions\n1. Rinse the rice until clear.\n";
        let output = process(text, "https://example.com/rice", &NormalizationOptions::default());

        assert_eq!(output.data.title, "Garlic Butter Rice");
        assert_eq!(output.data.ingredients, vec!["48 tsp rice", "6 tsp butter"]);
        assert_eq!(output.data.instructions, vec!["Rinse the rice until clear."]);
        assert_eq!(output.results.ingredients.source, Source::Selector);
        assert!(output.results.ingredients.selector.is_none());
        assert!(output.data.nutrition.is_none());
    }
}
