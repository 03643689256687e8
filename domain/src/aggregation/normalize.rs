//! Text normalization and token-set similarity

use std::collections::HashSet;

/// Case-fold, strip list markers at line starts and collapse whitespace.
///
/// Recognized markers: `-`, `*`, `•`, `+` and numbered items such as
/// `1.` or `12)`.
pub fn normalize(text: &str) -> String {
    let mut words: Vec<&str> = Vec::new();
    let lowered = text.to_lowercase();
    for line in lowered.lines() {
        words.extend(strip_marker(line.trim_start()).split_whitespace());
    }
    words.join(" ")
}

fn strip_marker(line: &str) -> &str {
    for bullet in ['-', '*', '•', '+'] {
        if let Some(rest) = line.strip_prefix(bullet) {
            return rest;
        }
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return rest;
        }
    }
    line
}

/// Whitespace tokens of the normalized text with edge punctuation removed.
pub fn token_set(text: &str) -> HashSet<String> {
    normalize(text)
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Jaccard similarity `|a ∩ b| / |a ∪ b|`; two empty sets are identical.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}
