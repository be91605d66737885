//! Explicit user tier directives
//!
//! Users can pin a tier from the prompt text itself: `/max analyze this`,
//! `deep mode: prove ...`, `[complex] refactor ...`. A directive bypasses
//! classification entirely; it is a user contract, not a hint.

use std::sync::OnceLock;

use freerouter_config::Tier;
use regex::Regex;

/// A recognized tier directive
#[derive(Debug, Clone, PartialEq)]
pub struct ModeOverride {
    /// Tier the user forced
    pub tier: Tier,
    /// Alias that matched, e.g. `max`
    pub alias: String,
    /// Input with the directive prefix stripped
    pub stripped: String,
}

fn patterns() -> &'static [Regex; 3] {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            // "/max analyze this"
            Regex::new(r"(?i)^/(\w+)\s+").expect("valid regex"),
            // "deep mode: prove ..."
            Regex::new(r"(?i)^(\w+) mode[:,\s]+").expect("valid regex"),
            // "[complex] refactor ..."
            Regex::new(r"(?i)^\[(\w+)\] ?").expect("valid regex"),
        ]
    })
}

/// Map a directive word to its tier; unlisted words are not directives
fn alias_tier(word: &str) -> Option<Tier> {
    match word.to_ascii_lowercase().as_str() {
        "simple" | "basic" | "cheap" => Some(Tier::Simple),
        "medium" | "balanced" => Some(Tier::Medium),
        "complex" | "advanced" => Some(Tier::Complex),
        "max" | "reasoning" | "think" | "deep" => Some(Tier::Reasoning),
        _ => None,
    }
}

/// Detect a tier directive at the start of the classification input
///
/// The three patterns are tried in order; the first whose word maps to a
/// tier wins. A pattern match whose word is not a known alias is left
/// untouched (e.g. `/usr/bin/env` is not a directive).
pub fn parse_mode_override(input: &str) -> Option<ModeOverride> {
    for pattern in patterns() {
        if let Some(captures) = pattern.captures(input) {
            let word = captures.get(1).expect("group 1 exists").as_str();
            if let Some(tier) = alias_tier(word) {
                let matched_len = captures.get(0).expect("match exists").len();
                return Some(ModeOverride {
                    tier,
                    alias: word.to_ascii_lowercase(),
                    stripped: input[matched_len..].to_owned(),
                });
            }
        }
    }
    None
}
