use recipe_scraper::ingredients::to_fraction;
use recipe_scraper::validation::remove_duplicates;
use recipe_scraper::{
    normalize_ingredient_line, normalize_ingredients, parse_amount, scale_ingredient, scale_servings,
    AmountFormat, NormalizationOptions, UnitSystem,
};

fn imperial_decimal() -> NormalizationOptions {
    NormalizationOptions {
        unit_system: UnitSystem::Imperial,
        amount_format: AmountFormat::Decimal,
        round_to_fraction: None,
        decimals: Some(2),
    }
}

#[test]
fn test_amount_forms() {
    for (text, expected) in [("1/2", 0.5), ("1 1/2", 1.5), ("1-1/2", 1.5), ("½", 0.5), ("1½", 1.5)] {
        assert_eq!(parse_amount(text), expected, "{text}");
    }
    assert_eq!(parse_amount("a pinch"), 0.0);
}

#[test]
fn test_scaling_keeps_unit_below_threshold() {
    assert_eq!(scale_ingredient("2 tbsp butter", 3.0), "6 tbsp butter");
    assert_eq!(scale_ingredient("1 cup milk", 1.0), "1 cup milk");
    assert_eq!(scale_servings(Some("4"), 1.5).as_deref(), Some("6"));
    assert_eq!(scale_servings(Some("a crowd"), 2.0).as_deref(), Some("a crowd"));
    assert_eq!(scale_servings(None, 2.0), None);
}

#[test]
fn test_range_is_averaged() {
    let items = normalize_ingredients(&["1 to 2 tsp salt"], &imperial_decimal());
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].amount, Some(1.5));
    assert_eq!(items[0].amount_min, Some(1.0));
    assert_eq!(items[0].amount_max, Some(2.0));
    assert!(items[0].display.contains("tsp"));
}

#[test]
fn test_normalized_display_is_stable() {
    let options = NormalizationOptions::default();
    for line in ["1 1/2 cups flour", "2 lbs chicken thighs", "1 (14 oz) can tomatoes", "salt to taste"] {
        let first = normalize_ingredient_line(line, &options);
        let second = normalize_ingredient_line(&first.display, &options);
        assert_eq!(first.display.trim(), second.display.trim(), "{line}");
    }
}

#[test]
fn test_no_quantity_line() {
    let item = normalize_ingredient_line("salt to taste", &NormalizationOptions::default());
    assert_eq!(item.amount, None);
    assert_eq!(item.notes.as_deref(), Some("no-quantity"));
    assert!(!item.has_quantity());
}

#[test]
fn test_dedup_rules() {
    assert_eq!(remove_duplicates(&["2 cups flour", "2 cups flour"]).len(), 1);
    assert_eq!(remove_duplicates(&["2 cups flour", "flour"]).len(), 1);
}

#[test]
fn test_fraction_rendering() {
    assert_eq!(to_fraction(1.5), "1 1/2");
    assert_eq!(to_fraction(0.25), "1/4");
    assert_eq!(to_fraction(3.0), "3");
}
