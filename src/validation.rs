//! Acceptance filters and near-duplicate removal for scraped text blocks.

use regex::{Regex, RegexSet};
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static NUMERIC_ONLY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\d\s\-.,]+$").unwrap());

static INGREDIENT_SKIP: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)^ingredients?$",
        r"(?i)^directions?$",
        r"(?i)^instructions?$",
        r"(?i)^method$",
        r"(?i)^preparation$",
        r"(?i)^steps?$",
        r"(?i)^recipe$",
        r"(?i)^serves?\s*\d*",
        r"(?i)^yield",
        r"(?i)^prep time",
        r"(?i)^cook time",
        r"(?i)^total time",
        r"(?i)^difficulty",
        r"(?i)^cuisine",
        r"(?i)^category",
        r"(?i)^course",
        r"(?i)^diet",
        r"(?i)^for the",
        r"(?i)^advertisement$",
        r"(?i)^sponsored$",
        r"(?i)^print recipe$",
        r"(?i)^save recipe$",
        r"(?i)^share$",
        r"(?i)^rating",
        r"(?i)^reviews?$",
        r"(?i)^comments?$",
        r"(?i)^nutrition",
        r"(?i)^calories",
        r"(?i)^\d+\s*servings?$",
        r"(?i)^\d+\s*portions?$",
    ])
    .unwrap()
});

static INSTRUCTION_SKIP: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)^ingredients?$",
        r"(?i)^directions?$",
        r"(?i)^instructions?$",
        r"(?i)^method$",
        r"(?i)^preparation$",
        r"(?i)^steps?$",
        r"(?i)^recipe$",
        r"(?i)^notes?$",
        r"(?i)^tips?$",
        r"(?i)^advertisement$",
        r"(?i)^sponsored$",
        r"(?i)^print recipe$",
        r"(?i)^save recipe$",
        r"(?i)^share$",
        r"(?i)^rating",
        r"(?i)^reviews?$",
        r"(?i)^comments?$",
        r"(?i)^nutrition",
        r"(?i)^chef'?s? notes?$",
        r"(?i)^cook'?s? tips?$",
    ])
    .unwrap()
});

const INGREDIENT_MIN_CHARS: usize = 3;
const INGREDIENT_MAX_CHARS: usize = 150;
const INSTRUCTION_MIN_CHARS: usize = 10;
const INSTRUCTION_MAX_CHARS: usize = 500;

/// Collapse whitespace, drop recipe-card scaler artifacts and exotic spaces
pub fn clean_text(text: &str) -> String {
    let text = text
        .replace("1x2x3x", "")
        .replace(
            |c: char| matches!(c, '\u{00A0}' | '\u{2000}'..='\u{200B}' | '\u{2028}' | '\u{2029}'),
            " ",
        );
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

pub fn is_valid_ingredient(text: &str) -> bool {
    let cleaned = text.trim().to_lowercase();
    if cleaned.chars().count() < INGREDIENT_MIN_CHARS || NUMERIC_ONLY.is_match(&cleaned) {
        return false;
    }
    if text.chars().count() > INGREDIENT_MAX_CHARS {
        return false;
    }
    if cleaned.starts_with("ingredients") {
        return false;
    }
    !INGREDIENT_SKIP.is_match(&cleaned)
}

pub fn is_valid_instruction(text: &str) -> bool {
    let cleaned = text.trim().to_lowercase();
    if cleaned.chars().count() < INSTRUCTION_MIN_CHARS {
        return false;
    }
    if text.chars().count() > INSTRUCTION_MAX_CHARS {
        return false;
    }
    if cleaned.starts_with("instructions") || cleaned.starts_with("directions") {
        return false;
    }
    !INSTRUCTION_SKIP.is_match(&cleaned)
}

fn dedup_key(text: &str) -> String {
    WHITESPACE
        .replace_all(text.trim(), " ")
        .to_lowercase()
}

/// One string contains the other and is more than half again as long.
fn is_contained_duplicate(candidate: &str, seen: &str) -> bool {
    let (c_len, s_len) = (candidate.chars().count() as f64, seen.chars().count() as f64);
    (c_len > s_len * 1.5 && candidate.contains(seen))
        || (s_len > c_len * 1.5 && seen.contains(candidate))
}

/// Drop exact and containment duplicates, keeping first occurrences in order
pub fn remove_duplicates<S: AsRef<str>>(items: &[S]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut result = Vec::new();

    for item in items {
        let item = item.as_ref();
        let key = dedup_key(item);
        if seen.contains(&key) {
            continue;
        }
        if seen.iter().any(|s| is_contained_duplicate(&key, s)) {
            continue;
        }
        seen.push(key);
        result.push(item.trim().to_string());
    }

    result
}
