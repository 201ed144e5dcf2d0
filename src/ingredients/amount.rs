//! Leading quantity and unit parsing for free-text ingredient lines.

use super::units::is_known_unit;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Unicode vulgar fractions, halves through tenths
const UNICODE_FRACTIONS: [(char, f64); 18] = [
    ('½', 0.5),
    ('¼', 0.25),
    ('¾', 0.75),
    ('⅐', 1.0 / 7.0),
    ('⅑', 1.0 / 9.0),
    ('⅒', 0.1),
    ('⅓', 1.0 / 3.0),
    ('⅔', 2.0 / 3.0),
    ('⅕', 0.2),
    ('⅖', 0.4),
    ('⅗', 0.6),
    ('⅘', 0.8),
    ('⅙', 1.0 / 6.0),
    ('⅚', 5.0 / 6.0),
    ('⅛', 0.125),
    ('⅜', 0.375),
    ('⅝', 0.625),
    ('⅞', 0.875),
];

const FRACTION_CHARS: &str = "½¼¾⅐⅑⅒⅓⅔⅕⅖⅗⅘⅙⅚⅛⅜⅝⅞";

/// Leading amount token patterns in priority order
static AMOUNT_PATTERNS: LazyLock<Vec<(AmountForm, Regex)>> = LazyLock::new(|| {
    let frac = FRACTION_CHARS;
    vec![
        (AmountForm::MixedUnicode, Regex::new(&format!(r"^(\d+)\s*([{frac}])")).unwrap()),
        (AmountForm::Unicode, Regex::new(&format!(r"^([{frac}])")).unwrap()),
        (AmountForm::HyphenMixed, Regex::new(r"^(\d+)-(\d+)/(\d+)").unwrap()),
        (AmountForm::SpaceMixed, Regex::new(r"^(\d+)\s+(\d+)/(\d+)").unwrap()),
        (AmountForm::Fraction, Regex::new(r"^(\d+)/(\d+)").unwrap()),
        (AmountForm::Decimal, Regex::new(r"^(\d+(?:\.\d+)?|\.\d+)").unwrap()),
    ]
});

static FLOAT_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d+\.?\d*(?:[eE][+-]?\d+)?|\.\d+(?:[eE][+-]?\d+)?)").unwrap());

static UNIT_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z.]*").unwrap());

static TWO_WORD_UNIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(fl\.?\s*oz\.?|fluid\s+(?:ounces?|oz\.?))").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AmountForm {
    MixedUnicode,
    Unicode,
    HyphenMixed,
    SpaceMixed,
    Fraction,
    Decimal,
}

/// Result of splitting an ingredient line into amount, unit and name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedIngredient {
    /// 0 when the line has no leading quantity
    pub amount: f64,
    /// Unit token as written (lowercased), empty when none was recognized
    pub unit: String,
    pub ingredient: String,
    pub original_text: String,
}

impl ParsedIngredient {
    pub fn has_amount(&self) -> bool {
        self.amount != 0.0
    }
}

fn unicode_fraction(c: char) -> Option<f64> {
    UNICODE_FRACTIONS
        .iter()
        .find(|(f, _)| *f == c)
        .map(|(_, v)| *v)
}

fn ratio(numerator: &str, denominator: &str) -> f64 {
    let n: f64 = numerator.parse().unwrap_or(0.0);
    let d: f64 = denominator.parse().unwrap_or(0.0);
    if d == 0.0 {
        0.0
    } else {
        n / d
    }
}

fn number(s: &str) -> f64 {
    s.parse().unwrap_or(0.0)
}

fn value_of(form: AmountForm, caps: &regex::Captures<'_>) -> f64 {
    let group = |i: usize| caps.get(i).map_or("", |m| m.as_str());
    let first_char = |i: usize| group(i).chars().next().and_then(unicode_fraction).unwrap_or(0.0);
    match form {
        AmountForm::MixedUnicode => number(group(1)) + first_char(2),
        AmountForm::Unicode => first_char(1),
        AmountForm::HyphenMixed | AmountForm::SpaceMixed => number(group(1)) + ratio(group(2), group(3)),
        AmountForm::Fraction => ratio(group(1), group(2)),
        AmountForm::Decimal => number(group(1)),
    }
}

/// Leading float, like a lenient `parseFloat`
fn parse_float_prefix(text: &str) -> f64 {
    FLOAT_PREFIX
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Parse a quantity token: "1½", "½", "1-1/2", "1 1/2", "1/2" or a decimal
///
/// Returns 0 when nothing numeric can be read.
pub fn parse_amount(text: &str) -> f64 {
    let text = text.trim();
    for (form, pattern) in AMOUNT_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            if caps.get(0).map_or(0, |m| m.end()) == text.len() {
                return value_of(*form, &caps);
            }
        }
    }
    parse_float_prefix(text)
}

/// Match the leading amount token, returning its value and byte length
pub(crate) fn leading_amount(text: &str) -> Option<(f64, usize)> {
    AMOUNT_PATTERNS.iter().find_map(|(form, pattern)| {
        pattern
            .captures(text)
            .map(|caps| (value_of(*form, &caps), caps.get(0).map_or(0, |m| m.end())))
    })
}

/// Match a leading unit word in `text`, returning the unit and the remaining text
pub(crate) fn leading_unit(text: &str) -> Option<(String, &str)> {
    if let Some(m) = TWO_WORD_UNIT.find(text) {
        let unit = m.as_str().to_lowercase().replace('.', "");
        let unit = if unit.starts_with("fluid") { unit } else { "fl oz".to_string() };
        return Some((unit, text[m.end()..].trim_start()));
    }

    let word = UNIT_WORD.find(text)?;
    let token = word.as_str();
    let bare = token.trim_end_matches('.');
    if !is_known_unit(bare) {
        return None;
    }
    // Case-sensitive abbreviations keep their spelling
    let unit = if bare == "T" || bare == "t" {
        bare.to_string()
    } else {
        bare.to_lowercase()
    };
    Some((unit, text[word.end()..].trim_start()))
}

/// Split an ingredient line into amount, unit and ingredient name
///
/// The amount token is matched greedily first; only then is the following
/// word looked up in the unit tables, so ingredient words are never read as
/// units. An unrecognized word leaves the unit empty and the whole remainder
/// becomes the name.
pub fn parse_ingredient(text: &str) -> ParsedIngredient {
    let text = text.trim();

    let Some((amount, consumed)) = leading_amount(text) else {
        return ParsedIngredient {
            amount: 0.0,
            unit: String::new(),
            ingredient: text.to_string(),
            original_text: text.to_string(),
        };
    };

    let remaining = text[consumed..].trim();
    let (unit, ingredient) = match leading_unit(remaining) {
        Some((unit, rest)) => (unit, rest.to_string()),
        None => (String::new(), remaining.to_string()),
    };

    ParsedIngredient {
        amount,
        unit,
        ingredient,
        original_text: text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_parse_amount_forms() {
        assert!(close(parse_amount("1/2"), 0.5));
        assert!(close(parse_amount("1 1/2"), 1.5));
        assert!(close(parse_amount("1-1/2"), 1.5));
        assert!(close(parse_amount("½"), 0.5));
        assert!(close(parse_amount("1½"), 1.5));
        assert!(close(parse_amount("2 ¼"), 2.25));
        assert!(close(parse_amount("⅓"), 1.0 / 3.0));
        assert!(close(parse_amount("2.5"), 2.5));
        assert!(close(parse_amount(" 3 "), 3.0));
    }

    #[test]
    fn test_parse_amount_falls_back_to_float_prefix() {
        assert!(close(parse_amount("2.5 cups"), 2.5));
        assert_eq!(parse_amount("a pinch"), 0.0);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("1/0"), 0.0);
    }

    #[test]
    fn test_parse_ingredient_with_unit() {
        let parsed = parse_ingredient("2 cups all-purpose flour");
        assert!(close(parsed.amount, 2.0));
        assert_eq!(parsed.unit, "cups");
        assert_eq!(parsed.ingredient, "all-purpose flour");
        assert_eq!(parsed.original_text, "2 cups all-purpose flour");
    }

    #[test]
    fn test_parse_ingredient_mixed_forms() {
        let parsed = parse_ingredient("1-1/2 tsp baking soda");
        assert!(close(parsed.amount, 1.5));
        assert_eq!(parsed.unit, "tsp");
        assert_eq!(parsed.ingredient, "baking soda");

        let parsed = parse_ingredient("1½ Tbsp. olive oil");
        assert!(close(parsed.amount, 1.5));
        assert_eq!(parsed.unit, "tbsp");
        assert_eq!(parsed.ingredient, "olive oil");

        let parsed = parse_ingredient("1 T sugar");
        assert_eq!(parsed.unit, "T");
    }

    #[test]
    fn test_parse_ingredient_two_word_unit() {
        let parsed = parse_ingredient("8 fl oz cream");
        assert_eq!(parsed.unit, "fl oz");
        assert_eq!(parsed.ingredient, "cream");
    }

    #[test]
    fn test_parse_ingredient_unknown_unit() {
        let parsed = parse_ingredient("3 large eggs");
        assert!(close(parsed.amount, 3.0));
        assert_eq!(parsed.unit, "");
        assert_eq!(parsed.ingredient, "large eggs");
    }

    #[test]
    fn test_parse_ingredient_without_amount() {
        let parsed = parse_ingredient("Salt to taste");
        assert_eq!(parsed.amount, 0.0);
        assert!(!parsed.has_amount());
        assert_eq!(parsed.unit, "");
        assert_eq!(parsed.ingredient, "Salt to taste");
    }

    #[test]
    fn test_unit_word_must_stand_alone() {
        // "cupcake" is not the unit "cup"
        let parsed = parse_ingredient("12 cupcake liners");
        assert_eq!(parsed.unit, "");
        assert_eq!(parsed.ingredient, "cupcake liners");
    }
}
