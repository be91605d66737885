use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use url::Url;

/// Upstream wire protocol spoken by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKind {
    /// Anthropic Messages API
    Anthropic,
    /// OpenAI-compatible chat completions API
    Openai,
}

/// Descriptor for a single upstream provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// API base URL, e.g. `https://api.anthropic.com/v1`
    pub base_url: Url,
    /// Wire protocol
    pub api: ApiKind,
    /// Static headers attached to every request to this provider
    #[serde(default)]
    pub headers: IndexMap<String, String>,
}

/// Provider name assumed when a model id carries no `provider/` prefix
pub const DEFAULT_PROVIDER: &str = "anthropic";

/// Split a model id into its provider name and bare model id
///
/// `"openai/gpt-5-mini"` splits at the first slash; a bare id implies the
/// default provider.
pub fn split_model_id(model: &str) -> (&str, &str) {
    model.split_once('/').unwrap_or((DEFAULT_PROVIDER, model))
}

/// Built-in provider registry: Anthropic and OpenAI public endpoints
pub fn default_providers() -> IndexMap<String, ProviderConfig> {
    let mut providers = IndexMap::new();
    providers.insert(
        "anthropic".to_owned(),
        ProviderConfig {
            base_url: Url::parse("https://api.anthropic.com/v1").expect("valid default URL"),
            api: ApiKind::Anthropic,
            headers: IndexMap::new(),
        },
    );
    providers.insert(
        "openai".to_owned(),
        ProviderConfig {
            base_url: Url::parse("https://api.openai.com/v1").expect("valid default URL"),
            api: ApiKind::Openai,
            headers: IndexMap::new(),
        },
    );
    providers
}
