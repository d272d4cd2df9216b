//! Generic matching strategies: substring patterns and token overlap.

use std::collections::BTreeSet;

/// Words carrying no meaning when comparing fact keys with field names
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "at", "by", "for", "from", "in", "is", "of", "on", "or", "the", "to", "was", "with",
];

/// Minimum share of the smaller token set that must overlap
const FUZZY_THRESHOLD: f64 = 0.5;

/// Whether `identifier` contains any of `patterns`, ignoring case
pub fn pattern_matches(identifier: &str, patterns: &[String]) -> bool {
    let identifier = identifier.to_lowercase();
    patterns
        .iter()
        .map(|pattern| pattern.trim().to_lowercase())
        .any(|pattern| !pattern.is_empty() && identifier.contains(&pattern))
}

/// Meaningful lower-case tokens of a fact key or field identifier
pub fn tokenize(text: &str) -> BTreeSet<String> {
    text.split(|c: char| c == '_' || c == '/' || c.is_whitespace())
        .map(|raw| {
            let lowered = raw.to_lowercase();
            let stem = lowered
                .strip_suffix("'s")
                .or_else(|| lowered.strip_suffix("\u{2019}s"))
                .unwrap_or(&lowered);
            stem.chars().filter(|c| c.is_alphanumeric()).collect::<String>()
        })
        .filter(|token| !token.is_empty())
        .filter(|token| !token.chars().all(|c| c.is_ascii_digit()))
        .filter(|token| !STOP_WORDS.contains(&token.as_str()))
        .collect()
}

/// Token overlap of at least half the smaller set, and never less than one token
pub fn tokens_overlap(left: &BTreeSet<String>, right: &BTreeSet<String>) -> bool {
    let overlap = left.intersection(right).count();
    let smaller = left.len().min(right.len());
    let required = (FUZZY_THRESHOLD * smaller as f64).max(1.0);

    overlap as f64 >= required
}
