//! Scaling of ingredient lines and serving counts.

use super::amount::parse_ingredient;
use super::units::{convert_unit, normalize_unit};
use regex::Regex;
use std::sync::LazyLock;

/// Largest denominator rendered as a fraction
const MAX_DENOMINATOR: i64 = 32;
const FRACTION_TOLERANCE: f64 = 1e-6;

static LEADING_INT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*([+-]?\d+)").unwrap());

/// Plain decimal rendering rounded to 15 significant digits
fn decimal_string(value: f64) -> String {
    format!("{value:.14e}")
        .parse::<f64>()
        .map(|v| v.to_string())
        .unwrap_or_else(|_| value.to_string())
}

/// Render a positive amount as a whole number, proper or mixed fraction
///
/// Uses continued fractions; when the best approximation needs a denominator
/// above 32, or the value is below 0.01 or above 100, a decimal is returned.
pub fn to_fraction(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() || !(0.01..=100.0).contains(&value) {
        return decimal_string(value);
    }

    let (mut h1, mut h2, mut k1, mut k2): (i64, i64, i64, i64) = (1, 0, 0, 1);
    let mut b = value;
    loop {
        let a = b.floor() as i64;
        (h1, h2) = (a * h1 + h2, h1);
        (k1, k2) = (a * k1 + k2, k1);
        if k1 > MAX_DENOMINATOR {
            return decimal_string(value);
        }
        if (value - h1 as f64 / k1 as f64).abs() <= FRACTION_TOLERANCE {
            break;
        }
        let rest = b - b.floor();
        if rest == 0.0 {
            break;
        }
        b = 1.0 / rest;
    }

    let whole = h1 / k1;
    let remainder = h1 % k1;
    match (whole, remainder) {
        (w, 0) => w.to_string(),
        (0, r) => format!("{r}/{k1}"),
        (w, r) => format!("{w} {r}/{k1}"),
    }
}

/// Pick a larger unit once a scaled amount crosses a threshold
///
/// A single lookup: the result is never promoted a second time.
fn best_unit(amount: f64, unit: &str) -> Option<&'static str> {
    match normalize_unit(unit).as_str() {
        "teaspoon" | "tsp" if amount >= 3.0 => {
            let tablespoons = amount / 3.0;
            if tablespoons >= 16.0 {
                Some("cup")
            } else {
                Some("tbsp")
            }
        }
        "tablespoon" | "tbsp" if amount >= 16.0 => Some("cup"),
        "cup" if amount >= 4.0 => Some("quart"),
        "cup" if amount >= 2.0 => Some("pint"),
        "ounce" | "oz" if amount >= 16.0 => Some("lb"),
        _ => None,
    }
}

/// Scale the leading quantity of an ingredient line by `factor`
///
/// Returns the input unchanged when the factor is 1 or the line has no
/// quantity. Otherwise the line is rebuilt as "<amount> [unit] <ingredient>".
pub fn scale_ingredient(text: &str, factor: f64) -> String {
    if factor == 1.0 {
        return text.to_string();
    }

    let parsed = parse_ingredient(text);
    if !parsed.has_amount() {
        return text.to_string();
    }

    let scaled = parsed.amount * factor;

    if parsed.unit.is_empty() {
        return format!("{} {}", to_fraction(scaled), parsed.ingredient)
            .trim()
            .to_string();
    }

    let (amount, unit) = match best_unit(scaled, &parsed.unit) {
        Some(better) => {
            let converted = convert_unit(scaled, &parsed.unit, better);
            (converted.amount, converted.unit)
        }
        None => (scaled, parsed.unit.clone()),
    };

    format!("{} {} {}", to_fraction(amount), unit, parsed.ingredient)
        .trim()
        .to_string()
}

/// Scale a serving count; non-numeric values come back unchanged
pub fn scale_servings(servings: Option<&str>, factor: f64) -> Option<String> {
    let servings = servings?;
    if servings.is_empty() || factor == 1.0 {
        return Some(servings.to_string());
    }

    match LEADING_INT
        .captures(servings)
        .and_then(|c| c[1].parse::<i64>().ok())
    {
        Some(count) => Some(decimal_string(count as f64 * factor)),
        None => Some(servings.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_fraction() {
        assert_eq!(to_fraction(0.5), "1/2");
        assert_eq!(to_fraction(1.5), "1 1/2");
        assert_eq!(to_fraction(3.0), "3");
        assert_eq!(to_fraction(0.125), "1/8");
        assert_eq!(to_fraction(1.0 / 3.0), "1/3");
        assert_eq!(to_fraction(2.0 / 3.0 * 2.0), "1 1/3");
    }

    #[test]
    fn test_to_fraction_falls_back_to_decimal() {
        assert_eq!(to_fraction(150.0), "150");
        assert_eq!(to_fraction(0.005), "0.005");
        // 1/37 needs a denominator above 32
        assert_eq!(to_fraction(1.0 / 37.0), decimal_string(1.0 / 37.0));
        assert_eq!(to_fraction(0.0), "0");
    }

    #[test]
    fn test_scale_by_one_is_identity() {
        assert_eq!(scale_ingredient("1 cup milk", 1.0), "1 cup milk");
        assert_eq!(scale_ingredient("  odd   spacing ", 1.0), "  odd   spacing ");
    }

    #[test]
    fn test_scale_without_promotion() {
        assert_eq!(scale_ingredient("2 tbsp butter", 3.0), "6 tbsp butter");
    }

    #[test]
    fn test_scale_with_promotion() {
        assert_eq!(scale_ingredient("1 tsp salt", 3.0), "1 tbsp salt");
        assert_eq!(scale_ingredient("4 tbsp sugar", 4.0), "1 cup sugar");
        assert_eq!(scale_ingredient("1 cup milk", 2.0), "1 pint milk");
        assert_eq!(scale_ingredient("1 cup stock", 4.0), "1 quart stock");
        assert_eq!(scale_ingredient("8 oz cheese", 2.0), "1 lb cheese");
    }

    #[test]
    fn test_promotion_is_single_step() {
        // 48 tbsp becomes 3 cups, not a larger unit
        assert_eq!(scale_ingredient("12 tbsp stock", 4.0), "3 cup stock");
    }

    #[test]
    fn test_scale_without_unit_or_amount() {
        assert_eq!(scale_ingredient("2 eggs", 1.5), "3 eggs");
        assert_eq!(scale_ingredient("1 large onion", 0.5), "1/2 large onion");
        assert_eq!(scale_ingredient("Salt to taste", 2.0), "Salt to taste");
    }

    #[test]
    fn test_scale_servings() {
        assert_eq!(scale_servings(Some("4"), 2.0), Some("8".to_string()));
        assert_eq!(scale_servings(Some("4 servings"), 1.5), Some("6".to_string()));
        assert_eq!(scale_servings(Some("3"), 1.5), Some("4.5".to_string()));
        assert_eq!(scale_servings(Some("a crowd"), 2.0), Some("a crowd".to_string()));
        assert_eq!(scale_servings(Some("4"), 1.0), Some("4".to_string()));
        assert_eq!(scale_servings(None, 2.0), None);
    }
}
