//! Configuration model for FreeRouter
//!
//! JSON configuration with deep-merge into built-in defaults, `$VAR`
//! environment substitution, `~/` expansion, and startup validation.

#![allow(clippy::must_use_candidate)]

pub mod auth;
mod env;
mod loader;
pub mod models;
pub mod provider;
pub mod scoring;
pub mod thinking;
pub mod tiers;
pub mod timeouts;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use auth::CredentialConfig;
pub use models::ModelProfileConfig;
pub use provider::{ApiKind, ProviderConfig};
pub use scoring::{DimensionWeights, KeywordLists, ScoringConfig, TierBoundaries};
pub use thinking::{EnabledThinkingConfig, ThinkingConfig};
pub use tiers::{Tier, TierEntry, TierTable};
pub use timeouts::TimeoutConfig;

/// Default listen port
const DEFAULT_PORT: u16 = 3456;

/// Top-level FreeRouter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Listen port
    pub port: u16,
    /// Listen host
    pub host: String,
    /// Upstream provider descriptors keyed by name
    pub providers: IndexMap<String, ProviderConfig>,
    /// Base tier table: complexity tier to model mapping
    pub tiers: TierTable,
    /// Tier table used when a request is detected as agentic
    ///
    /// Defaults to a copy of `tiers` so operators can diverge the two
    /// without a code change.
    pub agentic_tiers: Option<TierTable>,
    /// Tier boundary overrides applied on top of `scoring.boundaries`
    pub tier_boundaries: Option<TierBoundaries>,
    /// Extended thinking configuration for Anthropic upstreams
    pub thinking: ThinkingConfig,
    /// Per-provider credentials
    pub auth: IndexMap<String, CredentialConfig>,
    /// Classifier scoring configuration
    pub scoring: ScoringConfig,
    /// Per-tier attempt deadlines and the streaming stall timeout
    pub timeouts: TimeoutConfig,
    /// Model catalog overrides (pricing, context windows)
    pub models: Vec<ModelProfileConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            host: "127.0.0.1".to_owned(),
            providers: provider::default_providers(),
            tiers: TierTable::default(),
            agentic_tiers: None,
            tier_boundaries: None,
            thinking: ThinkingConfig::default(),
            auth: IndexMap::new(),
            scoring: ScoringConfig::default(),
            timeouts: TimeoutConfig::default(),
            models: Vec::new(),
        }
    }
}

impl Config {
    /// Scoring configuration with top-level boundary overrides applied
    pub fn effective_scoring(&self) -> ScoringConfig {
        let mut scoring = self.scoring.clone();
        if let Some(boundaries) = &self.tier_boundaries {
            scoring.boundaries = boundaries.clone();
        }
        scoring
    }

    /// The tier table to consult for a request
    pub fn tier_table(&self, agentic: bool) -> &TierTable {
        if agentic {
            self.agentic_tiers.as_ref().unwrap_or(&self.tiers)
        } else {
            &self.tiers
        }
    }
}
