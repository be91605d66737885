use serde::{Deserialize, Serialize};

/// Catalog entry override for one model
///
/// Lets operators register new upstream models (pricing, context window)
/// without a code change. Prices are dollars per million tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelProfileConfig {
    /// Model id in `provider/model` form
    pub id: String,
    pub input_per_mtok: f64,
    pub output_per_mtok: f64,
    pub context_window: u64,
    #[serde(default = "default_max_output")]
    pub max_output: u64,
}

fn default_max_output() -> u64 {
    8_192
}
