//! Per-provider credential cache
//!
//! Credentials are loaded lazily from config (inline value or environment
//! indirection), cached for the life of the snapshot, and invalidated by
//! the reload endpoints. A token selects OAuth-style headers upstream; an
//! API key selects the provider's key header.

use std::collections::HashMap;
use std::sync::Arc;

use freerouter_config::{Config, auth::default_key_env};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::RwLock;

/// Prefix convention identifying Anthropic OAuth tokens
const OAUTH_TOKEN_PREFIX: &str = "sk-ant-oat";

/// A resolved upstream credential
#[derive(Debug, Clone)]
pub enum Credential {
    /// OAuth access token: bearer auth plus the OAuth beta surface
    Token(SecretString),
    /// Plain API key
    ApiKey(SecretString),
}

impl Credential {
    /// Whether this credential selects the OAuth request shape
    pub fn is_oauth(&self) -> bool {
        matches!(self, Self::Token(_))
    }

    /// The secret value for header construction
    pub fn expose(&self) -> &str {
        match self {
            Self::Token(s) | Self::ApiKey(s) => s.expose_secret(),
        }
    }
}

/// Classify a raw secret by the OAuth prefix convention
fn classify(raw: String) -> Credential {
    if raw.starts_with(OAUTH_TOKEN_PREFIX) {
        Credential::Token(raw.into())
    } else {
        Credential::ApiKey(raw.into())
    }
}

/// Resolve a provider's credential from config and environment
fn load(provider: &str, config: &Config) -> Option<Credential> {
    if let Some(entry) = config.auth.get(provider) {
        if let Some(token) = &entry.token {
            return Some(Credential::Token(token.clone()));
        }
        if let Some(key) = &entry.api_key {
            return Some(Credential::ApiKey(key.clone()));
        }
        if let Some(var) = &entry.token_env
            && let Ok(raw) = std::env::var(var)
        {
            return Some(Credential::Token(raw.into()));
        }
        if let Some(var) = &entry.api_key_env
            && let Ok(raw) = std::env::var(var)
        {
            return Some(Credential::ApiKey(raw.into()));
        }
    }

    std::env::var(default_key_env(provider)).ok().map(classify)
}

/// Concurrent read-mostly credential cache
#[derive(Debug, Default)]
pub struct CredentialCache {
    entries: RwLock<HashMap<String, Option<Arc<Credential>>>>,
}

impl CredentialCache {
    /// Get the credential for a provider, loading it on first use
    pub async fn get(&self, provider: &str, config: &Config) -> Option<Arc<Credential>> {
        if let Some(cached) = self.entries.read().await.get(provider) {
            return cached.clone();
        }

        let loaded = load(provider, config).map(Arc::new);
        self.entries
            .write()
            .await
            .insert(provider.to_owned(), loaded.clone());
        loaded
    }

    /// Drop all cached credentials; the next use reloads them
    pub async fn invalidate(&self) {
        self.entries.write().await.clear();
        tracing::info!("credential cache invalidated");
    }
}
