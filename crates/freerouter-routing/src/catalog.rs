//! Model catalog: pricing, context windows, output limits
//!
//! Ships with built-in profiles for the stock providers; config overrides
//! add or replace entries so operators can register new upstream models
//! without a code change. Prices are dollars per million tokens.

use std::collections::HashMap;

use freerouter_config::ModelProfileConfig;

/// Opus-class baseline pricing used when no opus model is in the catalog
const BASELINE_INPUT_PER_MTOK: f64 = 15.0;
const BASELINE_OUTPUT_PER_MTOK: f64 = 75.0;
const BASELINE_MAX_OUTPUT: u64 = 32_000;

/// One model's catalog entry
#[derive(Debug, Clone)]
pub struct ModelEntry {
    /// Model id in `provider/model` form
    pub id: String,
    pub input_per_mtok: f64,
    pub output_per_mtok: f64,
    pub context_window: u64,
    pub max_output: u64,
}

impl ModelEntry {
    /// Estimate the dollar cost of a request against this model
    ///
    /// Input is the estimated prompt tokens; output is priced at the
    /// model's own maximum output.
    pub fn estimate_cost(&self, input_tokens: u64) -> f64 {
        (input_tokens as f64 / 1_000_000.0) * self.input_per_mtok
            + (self.max_output as f64 / 1_000_000.0) * self.output_per_mtok
    }
}

/// Catalog of all known models
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    entries: HashMap<String, ModelEntry>,
}

fn entry(id: &str, input: f64, output: f64, ctx: u64, max_out: u64) -> ModelEntry {
    ModelEntry {
        id: id.to_owned(),
        input_per_mtok: input,
        output_per_mtok: output,
        context_window: ctx,
        max_output: max_out,
    }
}

fn builtin_entries() -> Vec<ModelEntry> {
    vec![
        entry("anthropic/claude-opus-4.6", 5.0, 25.0, 1_000_000, 128_000),
        entry("anthropic/claude-sonnet-4", 3.0, 15.0, 200_000, 64_000),
        entry("anthropic/claude-haiku-4.5", 1.0, 5.0, 200_000, 8_000),
        entry("openai/gpt-5.2", 1.75, 14.0, 400_000, 128_000),
        entry("openai/gpt-5-mini", 0.25, 2.0, 200_000, 65_000),
        entry("openai/gpt-5-nano", 0.05, 0.4, 128_000, 32_000),
    ]
}

impl ModelCatalog {
    /// Build the catalog from the built-ins plus config overrides
    pub fn with_overrides(overrides: &[ModelProfileConfig]) -> Self {
        let mut entries: HashMap<String, ModelEntry> =
            builtin_entries().into_iter().map(|e| (e.id.clone(), e)).collect();

        for profile in overrides {
            entries.insert(
                profile.id.clone(),
                ModelEntry {
                    id: profile.id.clone(),
                    input_per_mtok: profile.input_per_mtok,
                    output_per_mtok: profile.output_per_mtok,
                    context_window: profile.context_window,
                    max_output: profile.max_output,
                },
            );
        }

        Self { entries }
    }

    /// Look up a model entry
    pub fn find(&self, id: &str) -> Option<&ModelEntry> {
        self.entries.get(id)
    }

    /// Baseline cost: the same request routed to the most expensive
    /// Opus-class model
    pub fn baseline_cost(&self, input_tokens: u64) -> f64 {
        let (input, output, max_output) = self
            .entries
            .values()
            .filter(|e| e.id.contains("opus"))
            .map(|e| (e.input_per_mtok, e.output_per_mtok, e.max_output))
            .fold(None, |best: Option<(f64, f64, u64)>, candidate| match best {
                Some(b) if b.0 >= candidate.0 => Some(b),
                _ => Some(candidate),
            })
            .unwrap_or((BASELINE_INPUT_PER_MTOK, BASELINE_OUTPUT_PER_MTOK, BASELINE_MAX_OUTPUT));

        (input_tokens as f64 / 1_000_000.0) * input + (max_output as f64 / 1_000_000.0) * output
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::with_overrides(&[])
    }
}
