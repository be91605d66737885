//! Process-wide request statistics
//!
//! Read by `/health` and `/stats`. Counters are atomics; the per-tier and
//! per-model maps sit behind short-lived mutexes.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Mutable statistics store
#[derive(Debug, Default)]
pub struct Stats {
    total_requests: AtomicU64,
    errors: AtomicU64,
    timeouts: AtomicU64,
    by_tier: Mutex<BTreeMap<String, u64>>,
    by_model: Mutex<BTreeMap<String, u64>>,
    /// Sum of per-request savings fractions versus the Opus baseline
    savings_sum: Mutex<f64>,
}

/// Point-in-time view of the statistics
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub total_requests: u64,
    pub errors: u64,
    pub timeouts: u64,
    pub by_tier: BTreeMap<String, u64>,
    pub by_model: BTreeMap<String, u64>,
    pub estimated_savings: f64,
}

impl Stats {
    /// Record an accepted request routed at a tier
    pub fn record_request(&self, tier_label: &str, savings: f64) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut map) = self.by_tier.lock() {
            *map.entry(tier_label.to_owned()).or_default() += 1;
        }
        if let Ok(mut sum) = self.savings_sum.lock() {
            *sum += savings;
        }
    }

    /// Record the model that served a request
    pub fn record_model(&self, model: &str) {
        if let Ok(mut map) = self.by_model.lock() {
            *map.entry(model.to_owned()).or_default() += 1;
        }
    }

    /// Record a failed attempt
    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a timed-out attempt (also counts as an error)
    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot for the health and stats endpoints
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            by_tier: self.by_tier.lock().map(|m| m.clone()).unwrap_or_default(),
            by_model: self.by_model.lock().map(|m| m.clone()).unwrap_or_default(),
            estimated_savings: self.savings_sum.lock().map(|s| *s).unwrap_or_default(),
        }
    }
}
