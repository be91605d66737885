//! Tier-to-model selection
//!
//! Resolves a tier against the active tier table into a routing decision:
//! selected model, ordered fallback chain, cost estimate against the Opus
//! baseline, and a human-readable rationale.

use freerouter_config::{Tier, TierTable};

use crate::catalog::ModelCatalog;

/// How the routing decision was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMethod {
    /// Classified by the scoring rules
    Rules,
    /// Explicit user tier directive in the prompt
    Override,
    /// Caller specified a concrete model
    Explicit,
}

impl std::fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rules => write!(f, "rules"),
            Self::Override => write!(f, "override"),
            Self::Explicit => write!(f, "explicit"),
        }
    }
}

/// Immutable routing decision for a single request
#[derive(Debug, Clone)]
pub struct RoutingDecision {
    /// Selected model id (`provider/model`)
    pub model: String,
    /// Tier the request was routed at; `None` for explicit model requests
    pub tier: Option<Tier>,
    /// Classification confidence in [0, 1]
    pub confidence: f64,
    /// How the decision was reached
    pub method: RouteMethod,
    /// Routing rationale, surfaced in the `X-FreeRouter-Reasoning` header
    pub reasoning: String,
    /// Estimated dollar cost of the request against the selected model
    pub cost_estimate: f64,
    /// Cost of the same request against the Opus-class baseline
    pub baseline_cost: f64,
    /// Fraction saved versus the baseline, in [0, 1]
    pub savings: f64,
    /// Full fallback chain: selected model first, alternates in order
    pub chain: Vec<String>,
}

/// Resolve a tier into a routing decision
///
/// The chain is the tier's primary followed by its fallbacks, deduplicated,
/// then filtered by advertised context window: a model is dropped when its
/// window is smaller than `total_tokens * 1.1`. When filtering would empty
/// the chain the original chain is restored (an oversized request on every
/// model is still better served by trying than by failing locally).
pub fn select(
    tier: Tier,
    confidence: f64,
    method: RouteMethod,
    reasoning: String,
    table: &TierTable,
    catalog: &ModelCatalog,
    input_tokens: u64,
    total_tokens: u64,
) -> RoutingDecision {
    let entry = table.entry(tier);

    let mut chain: Vec<String> = Vec::with_capacity(1 + entry.fallback.len());
    chain.push(entry.primary.clone());
    for fallback in &entry.fallback {
        if !chain.contains(fallback) {
            chain.push(fallback.clone());
        }
    }

    let required_window = (total_tokens as f64 * 1.1) as u64;
    let filtered: Vec<String> = chain
        .iter()
        .filter(|model| {
            catalog
                .find(model)
                .is_none_or(|entry| entry.context_window >= required_window)
        })
        .cloned()
        .collect();
    let chain = if filtered.is_empty() { chain } else { filtered };

    let model = chain[0].clone();
    let cost_estimate = catalog.find(&model).map_or(0.0, |e| e.estimate_cost(input_tokens));
    let baseline_cost = catalog.baseline_cost(input_tokens);
    let savings = if baseline_cost > 0.0 {
        ((baseline_cost - cost_estimate) / baseline_cost).clamp(0.0, 1.0)
    } else {
        0.0
    };

    tracing::debug!(
        %tier,
        %model,
        confidence,
        %method,
        chain_len = chain.len(),
        "tier resolved to model"
    );

    RoutingDecision {
        model,
        tier: Some(tier),
        confidence,
        method,
        reasoning,
        cost_estimate,
        baseline_cost,
        savings,
        chain,
    }
}

/// Build a decision for a caller-specified model
///
/// No classification, no fallbacks: the chain is the requested model alone.
pub fn explicit(model: String, catalog: &ModelCatalog, input_tokens: u64) -> RoutingDecision {
    let cost_estimate = catalog.find(&model).map_or(0.0, |e| e.estimate_cost(input_tokens));
    let baseline_cost = catalog.baseline_cost(input_tokens);
    let savings = if baseline_cost > 0.0 {
        ((baseline_cost - cost_estimate) / baseline_cost).clamp(0.0, 1.0)
    } else {
        0.0
    };

    RoutingDecision {
        chain: vec![model.clone()],
        reasoning: format!("explicit model: {model}"),
        model,
        tier: None,
        confidence: 1.0,
        method: RouteMethod::Explicit,
        cost_estimate,
        baseline_cost,
        savings,
    }
}
