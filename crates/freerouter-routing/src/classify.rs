//! Weighted fourteen-dimension complexity classification
//!
//! Classifies a prompt by keyword/structure signals into one of four tiers.
//! Pure function, sub-millisecond, no external calls. The system prompt is
//! deliberately excluded from complexity scoring (long agent "souls" must
//! not inflate complexity); it only feeds the total-token guard.

use std::sync::OnceLock;

use freerouter_config::{ScoringConfig, Tier};
use regex::Regex;

/// Result of classifying a prompt
#[derive(Debug, Clone)]
pub struct Classification {
    /// Classified tier, or `None` when confidence fell below the threshold
    pub tier: Option<Tier>,
    /// Weighted score across all dimensions
    pub score: f64,
    /// Calibrated confidence in [0, 1]
    pub confidence: f64,
    /// Agentic-task score in [0, 1], scored independently of the tier
    pub agentic_score: f64,
    /// Human-readable signals that fired, e.g. `code:2`
    pub signals: Vec<String>,
    /// Estimated user-prompt tokens (~4 chars per token)
    pub user_tokens: u64,
    /// Estimated system + user tokens
    pub total_tokens: u64,
}

/// Estimate a token count as `ceil(len / 4)`
pub fn estimate_tokens(text: &str) -> u64 {
    (text.len() as u64).div_ceil(4)
}

fn multi_step_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            Regex::new(r"(?i)first.*then").expect("valid regex"),
            Regex::new(r"(?i)step \d").expect("valid regex"),
            Regex::new(r"\d\.\s").expect("valid regex"),
        ]
    })
}

fn structured_output_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)json|structured|schema").expect("valid regex"))
}

/// Count keyword matches in lowercased text
fn count_matches(text: &str, keywords: &[String]) -> usize {
    keywords.iter().filter(|kw| text.contains(kw.as_str())).count()
}

/// Map a match count to a dimension value via two thresholds
fn band(count: usize, low: usize, high: usize, low_val: f64, high_val: f64) -> f64 {
    if count >= high {
        high_val
    } else if count >= low {
        low_val
    } else {
        0.0
    }
}

fn sigmoid(x: f64, steepness: f64) -> f64 {
    1.0 / (1.0 + (-steepness * x).exp())
}

/// Classify a prompt
///
/// `prompt` is the classification input (bounded context plus the full last
/// user message); `system_prompt` contributes only to `total_tokens`.
pub fn classify(prompt: &str, system_prompt: &str, cfg: &ScoringConfig) -> Classification {
    let user_tokens = estimate_tokens(prompt);
    let total_tokens = estimate_tokens(prompt) + estimate_tokens(system_prompt);

    let text = prompt.to_lowercase();
    let w = &cfg.weights;
    let kw = &cfg.keywords;

    let mut signals = Vec::new();
    let mut score = 0.0;

    // 1. Token count: short prompts pull down, long ones push up
    let token_val = if user_tokens <= cfg.simple_token_band {
        -1.0
    } else if user_tokens >= cfg.complex_token_band {
        1.0
    } else {
        0.0
    };
    score += token_val * w.token_count;
    if token_val != 0.0 {
        signals.push(format!("tokens:{user_tokens}"));
    }

    // 2. Code presence (keywords and fences share a list)
    let code_count = count_matches(&text, &kw.code);
    score += band(code_count, 1, 2, 0.5, 1.0) * w.code_presence;
    if code_count > 0 {
        signals.push(format!("code:{code_count}"));
    }

    // 3. Reasoning markers
    let reasoning_count = count_matches(&text, &kw.reasoning);
    score += band(reasoning_count, 1, 2, 0.7, 1.0) * w.reasoning_markers;
    if reasoning_count > 0 {
        signals.push(format!("reasoning:{reasoning_count}"));
    }

    // 4. Technical term density
    let tech_count = count_matches(&text, &kw.technical);
    score += band(tech_count, 2, 4, 0.5, 1.0) * w.technical_terms;
    if tech_count > 0 {
        signals.push(format!("technical:{tech_count}"));
    }

    // 5. Creative markers
    let creative_count = count_matches(&text, &kw.creative);
    score += band(creative_count, 1, 2, 0.3, 0.5) * w.creative_markers;

    // 6. Simple indicators pull the score down
    let simple_count = count_matches(&text, &kw.simple);
    if simple_count > 0 {
        score -= w.simple_indicators;
        signals.push(format!("simple:{simple_count}"));
    }

    // 7. Multi-step patterns ("step 1", "first ... then", enumerations)
    let multi_count = multi_step_patterns().iter().filter(|re| re.is_match(&text)).count();
    score += band(multi_count, 1, 2, 0.5, 0.8) * w.multi_step_patterns;
    if multi_count > 0 {
        signals.push(format!("multistep:{multi_count}"));
    }

    // 8. Question complexity
    let question_count = text.matches('?').count();
    score += band(question_count, 2, 4, 0.4, 0.8) * w.question_complexity;

    // 9. Imperative verbs
    let imperative_count = count_matches(&text, &kw.imperative);
    score += band(imperative_count, 1, 3, 0.3, 0.6) * w.imperative_verbs;

    // 10. Constraint indicators
    let constraint_count = count_matches(&text, &kw.constraint);
    score += band(constraint_count, 1, 3, 0.3, 0.7) * w.constraint_count;

    // 11. Structured-output keywords
    let format_count = count_matches(&text, &kw.output_format);
    score += band(format_count, 1, 2, 0.4, 0.7) * w.output_format;

    // 12. Back-references
    let reference_count = count_matches(&text, &kw.reference);
    score += band(reference_count, 1, 2, 0.3, 0.5) * w.reference_complexity;

    // 13. Negations
    let negation_count = count_matches(&text, &kw.negation);
    score += band(negation_count, 2, 3, 0.3, 0.5) * w.negation_complexity;

    // 14. Domain-specific vocabulary
    let domain_count = count_matches(&text, &kw.domain);
    score += band(domain_count, 1, 2, 0.6, 1.0) * w.domain_specificity;
    if domain_count > 0 {
        signals.push(format!("domain:{domain_count}"));
    }

    // Agentic dimension: separate score, saturating at six hits
    let agentic_count = count_matches(&text, &kw.agentic);
    let agentic_score = (agentic_count as f64 / 6.0).min(1.0);
    if agentic_count > 0 {
        signals.push(format!("agentic:{agentic_count}"));
    }

    let [b1, b2, b3] = cfg.boundaries.as_array();
    let tier = if score < b1 {
        Tier::Simple
    } else if score < b2 {
        Tier::Medium
    } else if score < b3 {
        Tier::Complex
    } else {
        Tier::Reasoning
    };

    let min_distance = [b1, b2, b3]
        .iter()
        .map(|b| (score - b).abs())
        .fold(f64::MAX, f64::min);
    let confidence = sigmoid(min_distance, cfg.sigmoid_steepness);

    Classification {
        tier: (confidence >= cfg.confidence_threshold).then_some(tier),
        score,
        confidence,
        agentic_score,
        signals,
        user_tokens,
        total_tokens,
    }
}

/// Apply the post-scoring overrides and resolve an ambiguous tier
///
/// Returns the final tier, its confidence, and any override signals.
/// The structured-output check runs against the user prompt only; a system
/// prompt mentioning "json" never upgrades the tier.
pub fn resolve_tier(classification: &Classification, prompt: &str, cfg: &ScoringConfig) -> (Tier, f64, Vec<String>) {
    let mut signals = Vec::new();

    // Ambiguous classifications fall back to the configured default
    let (mut tier, mut confidence) = match classification.tier {
        Some(tier) => (tier, classification.confidence),
        None => {
            signals.push(format!("ambiguous-default:{}", cfg.ambiguous_default_tier));
            (cfg.ambiguous_default_tier, 0.5)
        }
    };

    // Very large contexts always go to a large-context-capable tier
    if classification.total_tokens > cfg.max_tokens_force_complex {
        tier = Tier::Complex;
        confidence = 0.95;
        signals.push(format!("large-request:{}", classification.total_tokens));
    }

    // Structured-output requests need a model that can hold a schema
    if tier < cfg.structured_output_min_tier && structured_output_re().is_match(prompt) {
        tier = cfg.structured_output_min_tier;
        signals.push("structured-output-upgrade".to_owned());
    }

    (tier, confidence, signals)
}
