//! Canonical ingredient lines: cleaned, unit-converted and display-ready.

use super::amount::{parse_amount, parse_ingredient};
use super::units::{classify, convert_unit, is_piece_unit, UnitClass};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

const NO_QUANTITY: &str = "no-quantity";
const DEFAULT_FRACTION_STEP: f64 = 0.125;
const DEFAULT_DECIMALS: usize = 2;
/// Imperial weights of a pound or more are shown in quarter pounds
const POUND_STEP: f64 = 0.25;

static DASHES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[–—−]").unwrap());
static HEDGES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:about|approximately|approx\.?|around|roughly)(?:\s+|$)").unwrap()
});
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static LEADING_BULLET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:\[[xX ]?\]|[-*•·▪▫◦●□▢■☐✓✔✗✘])\s+").unwrap()
});
static SPACE_BEFORE_COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+,").unwrap());
static SPACE_AFTER_COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s+").unwrap());

static LEADING_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?(?:\s+\d+/\d+)?)\s*(?:to|-)\s*(\d+(?:\.\d+)?(?:\s+\d+/\d+)?)").unwrap()
});
static ALTERNATE_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/\s*(\d+(?:\.\d+)?(?:\s+\d+/\d+)?)\s*(oz|lbs?|g|kg|ml|l)\b").unwrap()
});
static PACKAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\(\s*(\d+(?:\.\d+)?)(?:\s*-\s*\d+(?:\.\d+)?)?\s*(oz|g|ml|lb|kg)\s*(?:(can|package|pkg|jar)s?\s*\)|\)\s*(can|package|pkg|jar)s?)",
    )
    .unwrap()
});

static INLINE_ALTERNATE_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*/\s*\d+[\d/.\s-]*\s*(?:oz|lbs?|g|kg|ml|l)\b").unwrap()
});
static PARENTHETICAL_SIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\(\s*\d+[\d/.\s-]*\s*(?:oz|lbs?|g|kg|ml|l)(?:\s*(?:can|package|pkg|jar)s?)?\s*\)").unwrap()
});
static OR_PHRASE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\s+or\s+[^()]+").unwrap());
static STARTS_WITH_OR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^\s*or\b").unwrap());
static PARENTHETICAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(([^()]*)\)").unwrap());

static BULLET_SPLITTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\[[xX ]?\]\s*|\s*[•·▪▫◦●□▢■☐]\s*").unwrap());

/// Target measurement system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Imperial,
    Metric,
}

/// How amounts are rendered in `display`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountFormat {
    Decimal,
    #[default]
    Fraction,
}

/// Caller-supplied rendering policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizationOptions {
    pub unit_system: UnitSystem,
    pub amount_format: AmountFormat,
    /// Fraction step, e.g. 0.125 for eighths
    #[serde(default)]
    pub round_to_fraction: Option<f64>,
    /// Decimal places for decimal formatting
    #[serde(default)]
    pub decimals: Option<usize>,
}

impl Default for NormalizationOptions {
    fn default() -> Self {
        Self {
            unit_system: UnitSystem::Imperial,
            amount_format: AmountFormat::Fraction,
            round_to_fraction: Some(DEFAULT_FRACTION_STEP),
            decimals: None,
        }
    }
}

/// A normalized ingredient line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalIngredient {
    /// None when the line carries no quantity
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_max: Option<f64>,
    pub unit: String,
    pub name: String,
    /// "no-quantity" for qualitative or continuation lines
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub original_text: String,
    pub display: String,
}

impl CanonicalIngredient {
    pub fn has_quantity(&self) -> bool {
        self.notes.as_deref() != Some(NO_QUANTITY)
    }
}

/// Replace locale decimal commas between digits with periods
fn decimal_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    chars
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let between_digits = i > 0
                && chars[i - 1].is_ascii_digit()
                && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit());
            if c == ',' && between_digits {
                '.'
            } else {
                c
            }
        })
        .collect()
}

fn tidy_commas(text: &str) -> String {
    let text = SPACE_BEFORE_COMMA.replace_all(text, ", ");
    SPACE_AFTER_COMMA.replace_all(&text, ", ").into_owned()
}

fn preclean(line: &str) -> String {
    let text = decimal_commas(line);
    let text = DASHES.replace_all(&text, "-");
    let text = HEDGES.replace_all(&text, "");
    let text = WHITESPACE.replace_all(&text, " ");
    let text = LEADING_BULLET.replace(text.trim(), "");
    tidy_commas(&text)
}

/// A leading "a to b" / "a-b" range; hyphenated mixed numbers do not count
fn leading_range(text: &str) -> Option<(f64, f64, usize)> {
    let caps = LEADING_RANGE.captures(text)?;
    let end = caps.get(0)?.end();
    if text[end..].starts_with(|c: char| c.is_ascii_digit() || c == '/') {
        return None;
    }
    Some((parse_amount(&caps[1]), parse_amount(&caps[2]), caps.get(2)?.start()))
}

/// An alternate quantity after a slash, e.g. "500 g / 1 lb"
fn alternate_unit(text: &str) -> Option<(f64, String)> {
    ALTERNATE_UNIT
        .captures_iter(text)
        .find(|caps| {
            // "1/2 lb" is a fraction, not an alternate
            let start = caps.get(0).map_or(0, |m| m.start());
            !text[..start].ends_with(|c: char| c.is_ascii_digit())
        })
        .map(|caps| (parse_amount(&caps[1]), caps[2].to_lowercase()))
}

fn is_imperial_token(unit: &str) -> bool {
    matches!(unit, "oz" | "lb" | "lbs")
}

/// Remove the first " or ..." phrase that runs to the end or to a parenthesis
fn strip_or_phrase(text: &str) -> String {
    match OR_PHRASE.find(text) {
        Some(m) if m.end() == text.len() || text[m.end()..].starts_with('(') => {
            format!("{}{}", &text[..m.start()], &text[m.end()..])
        }
        _ => text.to_string(),
    }
}

fn clean_name(ingredient: &str) -> String {
    let name = INLINE_ALTERNATE_UNIT.replace_all(ingredient, "");
    let name = PARENTHETICAL_SIZE.replace_all(&name, "");
    let name = strip_or_phrase(&name);
    let name = tidy_commas(&name);
    WHITESPACE.replace_all(&name, " ").trim().to_string()
}

/// "(14 oz can)" style container note
fn package_note(text: &str, name: &str) -> Option<String> {
    let caps = PACKAGE.captures(text)?;
    let size: f64 = caps[1].parse().ok()?;
    let unit = caps[2].to_lowercase();
    let label = caps.get(3).or_else(|| caps.get(4))?.as_str().to_lowercase();
    let note = format!("{size} {unit} {label}");
    if name.to_lowercase().contains(&note.to_lowercase()) {
        None
    } else {
        Some(format!("({note})"))
    }
}

/// Collapse "(x) (x)" into "(x)"
fn dedupe_parentheticals(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_end = 0;
    let mut previous: Option<(usize, String)> = None;

    for caps in PARENTHETICAL.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let content = caps[1].trim().to_string();
        let repeated = previous.as_ref().is_some_and(|(prev_end, prev)| {
            *prev == content && text[*prev_end..whole.start()].trim().is_empty()
        });
        out.push_str(&text[last_end..whole.start()]);
        if repeated {
            out.truncate(out.trim_end().len());
        } else {
            out.push_str(whole.as_str());
        }
        last_end = whole.end();
        previous = Some((whole.end(), content));
    }
    out.push_str(&text[last_end..]);
    out
}

fn format_fraction(value: f64, step: f64) -> String {
    let step = if step > 0.0 && step <= 1.0 { step } else { DEFAULT_FRACTION_STEP };
    let denominator = (1.0 / step).round().max(1.0) as i64;
    let units = (value * denominator as f64).round() as i64;
    if units == 0 {
        return format_decimal(value, DEFAULT_DECIMALS);
    }
    let whole = units / denominator;
    let numerator = units % denominator;
    if numerator == 0 {
        return whole.to_string();
    }
    let divisor = gcd(numerator, denominator);
    let (n, d) = (numerator / divisor, denominator / divisor);
    if whole > 0 {
        format!("{whole} {n}/{d}")
    } else {
        format!("{n}/{d}")
    }
}

fn gcd(a: i64, b: i64) -> i64 {
    if b == 0 {
        a.abs().max(1)
    } else {
        gcd(b, a % b)
    }
}

fn format_decimal(value: f64, decimals: usize) -> String {
    let text = format!("{value:.decimals$}");
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

fn format_amount(amount: f64, options: &NormalizationOptions) -> String {
    if amount == 0.0 {
        return String::new();
    }
    match options.amount_format {
        AmountFormat::Fraction => {
            format_fraction(amount, options.round_to_fraction.unwrap_or(DEFAULT_FRACTION_STEP))
        }
        AmountFormat::Decimal => format_decimal(amount, options.decimals.unwrap_or(DEFAULT_DECIMALS)),
    }
}

/// Round to whole units, keeping tiny amounts that would round to nothing
fn round_whole(amount: f64) -> f64 {
    let rounded = amount.round();
    if rounded == 0.0 {
        amount
    } else {
        rounded
    }
}

/// Express the amount in the canonical unit for its class
fn canonicalize(amount: f64, unit: &str, system: UnitSystem) -> (f64, String) {
    if amount == 0.0 {
        return (amount, unit.to_string());
    }
    match (classify(unit), system) {
        (UnitClass::Volume, UnitSystem::Metric) => (convert_unit(amount, unit, "ml").amount, "ml".to_string()),
        (UnitClass::Volume, UnitSystem::Imperial) => (convert_unit(amount, unit, "tsp").amount, "tsp".to_string()),
        (UnitClass::Mass, UnitSystem::Metric) => {
            (round_whole(convert_unit(amount, unit, "g").amount), "g".to_string())
        }
        (UnitClass::Mass, UnitSystem::Imperial) => {
            let ounces = round_whole(convert_unit(amount, unit, "oz").amount);
            if ounces >= 16.0 {
                let pounds = convert_unit(ounces, "oz", "lb").amount;
                ((pounds / POUND_STEP).round() * POUND_STEP, "lb".to_string())
            } else {
                (ounces, "oz".to_string())
            }
        }
        (UnitClass::Count | UnitClass::Other, _) => (amount, unit.to_string()),
    }
}

/// Normalize one ingredient line
///
/// `display` depends only on the amount, unit, name and options, so feeding
/// a `display` back through this function leaves it unchanged.
pub fn normalize_ingredient_line(line: &str, options: &NormalizationOptions) -> CanonicalIngredient {
    let original_text = line.trim().to_string();
    let text = preclean(&original_text);

    let range = leading_range(&text);
    // Parse from the upper bound so the unit after the range is still found
    let parsed = match range {
        Some((_, _, upper_start)) => parse_ingredient(&text[upper_start..]),
        None => parse_ingredient(&text),
    };
    let no_quantity = !parsed.has_amount() && parsed.unit.is_empty();

    let (mut amount, amount_min, amount_max) = match range {
        Some((min, max, _)) => ((min + max) / 2.0, Some(min), Some(max)),
        None => (parsed.amount, None, None),
    };
    let mut unit = parsed.unit.clone();

    if let Some((alt_amount, alt_unit)) = alternate_unit(&text) {
        let prefer = match options.unit_system {
            UnitSystem::Imperial => is_imperial_token(&alt_unit),
            UnitSystem::Metric => !is_imperial_token(&alt_unit),
        };
        if prefer {
            amount = alt_amount;
            unit = alt_unit;
        }
    }

    let mut name = clean_name(&parsed.ingredient);

    // Container and pinch words directly after the amount act as the unit
    if unit.is_empty() && amount != 0.0 {
        if let Some((first, rest)) = name.split_once(' ') {
            if is_piece_unit(first) {
                unit = first.to_string();
                name = rest.trim().to_string();
            }
        }
    }

    let note = package_note(&text, &name);
    let (amount, unit) = canonicalize(amount, &unit, options.unit_system);

    let mut parts: Vec<String> = [format_amount(amount, options), unit.clone(), name.clone()]
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect();
    parts.extend(note);

    let display = WHITESPACE.replace_all(&parts.join(" "), " ").into_owned();
    let display = dedupe_parentheticals(&display).trim().to_string();

    CanonicalIngredient {
        amount: (amount != 0.0).then_some(amount),
        amount_min,
        amount_max,
        unit,
        name,
        notes: no_quantity.then(|| NO_QUANTITY.to_string()),
        original_text,
        display,
    }
}

/// Normalize a list of ingredient lines
///
/// Lines holding several inline bullets or checkboxes are split first (never
/// on hyphens, so ranges survive). Stray "or ..." continuations without an
/// amount and fragments without a name are dropped, then items are
/// deduplicated by case-insensitive `display`.
pub fn normalize_ingredients<S: AsRef<str>>(
    lines: &[S],
    options: &NormalizationOptions,
) -> Vec<CanonicalIngredient> {
    let mut seen = HashSet::new();

    lines
        .iter()
        .flat_map(|line| BULLET_SPLITTER.split(line.as_ref()).map(str::trim).collect::<Vec<_>>())
        .filter(|fragment| !fragment.is_empty())
        .map(|fragment| normalize_ingredient_line(fragment, options))
        .filter(|item| !(item.amount.is_none() && STARTS_WITH_OR.is_match(&item.original_text)))
        .filter(|item| !item.name.trim().is_empty())
        .filter(|item| seen.insert(item.display.to_lowercase()))
        .collect()
}
