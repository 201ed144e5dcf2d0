use crate::validation::{is_valid_ingredient, is_valid_instruction, remove_duplicates};
use log::debug;
use regex::Regex;
use std::sync::LazyLock;

static INGREDIENTS_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(ingredients|for the ingredients)").unwrap());
static INSTRUCTIONS_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(instructions|directions|method|preparation|how to)").unwrap());
static SECTION_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(instructions|directions|method|notes|nutrition|video|tips|equipment)").unwrap()
});
static NAVIGATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(home|browse|videos|about|subscribe|search|jump to recipe|pin recipe|leave a review|sign up|get the latest|damn\s+delicious)$",
    )
    .unwrap()
});
static TWO_WORDS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b.*\b\w+\b").unwrap());
static TITLE_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^title:\s*").unwrap());
static ITEM_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d+[.)]\s*|[-*•‣◦⁃∙]\s+)").unwrap());
static STEP_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+[.)]?\s*|^[-*•]\s*").unwrap());
static DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d").unwrap());

/// Lines before the ingredients heading searched for a title
const TITLE_LOOKBACK: usize = 6;
/// Lines from the top searched when no title sits above the ingredients
const TITLE_SCAN: usize = 80;
/// Without an instructions heading, steps are read from this far past the ingredients heading
const STEP_OFFSET: usize = 20;
const STEP_WINDOW: usize = 60;
const MIN_TITLE_CHARS: usize = 4;
const MIN_STEP_CHARS: usize = 8;

/// Recipe fields recovered from reader-service plain text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadableRecipe {
    pub title: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
}

/// Line-oriented parser for readable text, where no markup survives
pub struct TextExtractor;

impl TextExtractor {
    pub fn extract(text: &str) -> ReadableRecipe {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        let ingredients_at = lines.iter().position(|l| INGREDIENTS_HEADING.is_match(l));
        let instructions_at = lines.iter().position(|l| INSTRUCTIONS_HEADING.is_match(l));
        debug!(
            "TextExtractor: {} lines, ingredients heading {:?}, instructions heading {:?}",
            lines.len(),
            ingredients_at,
            instructions_at
        );

        ReadableRecipe {
            title: title(&lines, ingredients_at),
            ingredients: ingredients(&lines, ingredients_at, instructions_at),
            instructions: instructions(&lines, ingredients_at, instructions_at),
        }
    }
}

fn is_title_candidate(line: &str) -> bool {
    line.chars().count() > MIN_TITLE_CHARS && !NAVIGATION.is_match(line)
}

fn title(lines: &[&str], ingredients_at: Option<usize>) -> String {
    let near_heading = ingredients_at.filter(|&at| at > 1).and_then(|at| {
        (at.saturating_sub(TITLE_LOOKBACK)..at)
            .rev()
            .map(|i| lines[i])
            .find(|l| is_title_candidate(l))
    });

    let title = near_heading.or_else(|| {
        lines
            .iter()
            .take(TITLE_SCAN)
            .copied()
            .find(|l| is_title_candidate(l) && TWO_WORDS.is_match(l))
    });

    title
        .map(|t| TITLE_PREFIX.replace(t, "").trim().to_string())
        .unwrap_or_default()
}

/// Index of the next section heading after `start`, or the end of the text
fn section_end(lines: &[&str], start: usize) -> usize {
    lines[start + 1..]
        .iter()
        .position(|l| SECTION_END.is_match(l))
        .map_or(lines.len(), |p| start + 1 + p)
}

fn section<'a>(lines: &'a [&'a str], start: usize, end: usize) -> &'a [&'a str] {
    lines.get(start..end).unwrap_or_default()
}

fn ingredients(lines: &[&str], ingredients_at: Option<usize>, instructions_at: Option<usize>) -> Vec<String> {
    let Some(at) = ingredients_at else {
        return Vec::new();
    };
    let end = section_end(lines, at).min(instructions_at.unwrap_or(lines.len()));

    let accepted: Vec<String> = section(lines, at + 1, end)
        .iter()
        .filter(|l| ITEM_PREFIX.is_match(l) || DIGIT.is_match(l))
        .map(|l| ITEM_PREFIX.replace(l, "").trim().to_string())
        .filter(|l| is_valid_ingredient(l))
        .collect();
    remove_duplicates(&accepted)
}

fn strip_step(line: &str) -> String {
    STEP_PREFIX.replace(line, "").trim().to_string()
}

fn instructions(lines: &[&str], ingredients_at: Option<usize>, instructions_at: Option<usize>) -> Vec<String> {
    let accepted: Vec<String> = match (instructions_at, ingredients_at) {
        (Some(at), _) => section(lines, at + 1, section_end(lines, at))
            .iter()
            .filter(|l| l.chars().count() > MIN_STEP_CHARS)
            .map(|l| strip_step(l))
            .filter(|l| is_valid_instruction(l))
            .collect(),
        (None, Some(at)) => {
            let start = (at + 1 + STEP_OFFSET).min(lines.len());
            let end = (start + STEP_WINDOW).min(lines.len());
            section(lines, start, end)
                .iter()
                .map(|l| strip_step(l))
                .filter(|l| l.chars().count() > MIN_STEP_CHARS)
                .filter(|l| is_valid_instruction(l))
                .collect()
        }
        (None, None) => Vec::new(),
    };
    remove_duplicates(&accepted)
}
