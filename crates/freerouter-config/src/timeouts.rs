use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::tiers::Tier;

/// Per-tier attempt deadlines and the streaming stall timeout, in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeoutConfig {
    pub simple: u64,
    pub medium: u64,
    pub complex: u64,
    pub reasoning: u64,
    /// Maximum mid-stream silence before the upstream read is aborted
    pub stall: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            simple: 30,
            medium: 60,
            complex: 120,
            reasoning: 120,
            stall: 30,
        }
    }
}

impl TimeoutConfig {
    /// Attempt deadline for a tier
    ///
    /// Explicit-model requests have no tier; they get the COMPLEX deadline.
    pub fn deadline(&self, tier: Option<Tier>) -> Duration {
        let secs = match tier {
            Some(Tier::Simple) => self.simple,
            Some(Tier::Medium) => self.medium,
            Some(Tier::Reasoning) => self.reasoning,
            Some(Tier::Complex) | None => self.complex,
        };
        Duration::from_secs(secs)
    }

    /// Streaming stall timeout
    pub fn stall_timeout(&self) -> Duration {
        Duration::from_secs(self.stall)
    }
}
