//! Config builders for tests

use freerouter_config::{ApiKind, Config, ProviderConfig, TierEntry, TierTable};
use url::Url;

fn provider(base_url: &str, api: ApiKind) -> ProviderConfig {
    ProviderConfig {
        base_url: Url::parse(base_url).expect("valid mock URL"),
        api,
        headers: indexmap::IndexMap::new(),
    }
}

fn uniform_table(primary: &str, fallback: &[&str]) -> TierTable {
    let entry = TierEntry {
        primary: primary.to_owned(),
        fallback: fallback.iter().map(|f| (*f).to_owned()).collect(),
    };
    TierTable {
        simple: entry.clone(),
        medium: entry.clone(),
        complex: entry.clone(),
        reasoning: entry,
    }
}

/// Config with a single OpenAI-compatible provider named `mock`
///
/// Every tier routes to `mock/test-model` with `mock/fallback-model` as the
/// only fallback.
pub fn openai_only(base_url: &str) -> Config {
    let mut config = Config::default();
    config.host = "127.0.0.1".to_owned();
    config.port = 0;

    config.providers.clear();
    config.providers.insert("mock".to_owned(), provider(base_url, ApiKind::Openai));
    config.tiers = uniform_table("mock/test-model", &["mock/fallback-model"]);
    config.agentic_tiers = None;

    config
}

/// Config with a failing primary provider and a healthy fallback provider
pub fn with_failover(failing_base: &str, healthy_base: &str) -> Config {
    let mut config = openai_only(failing_base);
    config
        .providers
        .insert("backup".to_owned(), provider(healthy_base, ApiKind::Openai));
    config.tiers = uniform_table("mock/test-model", &["backup/rescue-model"]);
    config
}

/// Config with a single Anthropic provider named `anthro`
pub fn anthropic_only(base_url: &str) -> Config {
    let mut config = openai_only(base_url);
    config.providers.clear();
    config
        .providers
        .insert("anthro".to_owned(), provider(base_url, ApiKind::Anthropic));
    config.tiers = uniform_table("anthro/claude-test", &[]);
    config
}
