//! Shared application state
//!
//! The config snapshot is immutable and swapped atomically on reload:
//! request handlers clone the `Arc` once at request start and never observe
//! torn state. A failed reload leaves the running snapshot untouched.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use freerouter_config::Config;
use freerouter_routing::ModelCatalog;
use tokio::sync::RwLock;

use crate::auth::{Credential, CredentialCache};
use crate::stats::Stats;

/// Immutable per-reload view of the configuration
#[derive(Debug)]
pub struct Snapshot {
    pub config: Config,
    pub catalog: ModelCatalog,
}

impl Snapshot {
    /// Build a snapshot from a validated config
    pub fn new(config: Config) -> Self {
        let catalog = ModelCatalog::with_overrides(&config.models);
        Self { config, catalog }
    }
}

/// Cloneable handle to the process-wide state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    snapshot: RwLock<Arc<Snapshot>>,
    credentials: CredentialCache,
    stats: Stats,
    client: reqwest::Client,
    config_path: Option<PathBuf>,
    started: Instant,
}

impl AppState {
    /// Build the state from a loaded config
    pub fn new(config: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                snapshot: RwLock::new(Arc::new(Snapshot::new(config))),
                credentials: CredentialCache::default(),
                stats: Stats::default(),
                client: reqwest::Client::new(),
                config_path,
                started: Instant::now(),
            }),
        }
    }

    /// The current config snapshot; held for the request's duration
    pub async fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&*self.inner.snapshot.read().await)
    }

    /// Process-wide statistics
    pub fn stats(&self) -> &Stats {
        &self.inner.stats
    }

    /// Shared HTTP client for upstream calls
    pub fn http_client(&self) -> reqwest::Client {
        self.inner.client.clone()
    }

    /// Seconds since the server started
    pub fn uptime_secs(&self) -> u64 {
        self.inner.started.elapsed().as_secs()
    }

    /// Credential for a provider under the given snapshot
    pub async fn credential(&self, provider: &str, config: &Config) -> Option<Arc<Credential>> {
        self.inner.credentials.get(provider, config).await
    }

    /// Drop cached credentials; the next request reloads them
    pub async fn reload_credentials(&self) {
        self.inner.credentials.invalidate().await;
    }

    /// Re-read the config file, validate it, and atomically publish it
    ///
    /// Also invalidates the credential cache. On any error the running
    /// snapshot stays active.
    pub async fn reload_config(&self) -> anyhow::Result<()> {
        let config = match &self.inner.config_path {
            Some(path) => Config::load(path)?,
            None => Config::discover()?.0,
        };

        let snapshot = Arc::new(Snapshot::new(config));
        *self.inner.snapshot.write().await = snapshot;
        self.inner.credentials.invalidate().await;

        tracing::info!("configuration reloaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn snapshot_swap_is_atomic_for_readers() {
        let state = AppState::new(Config::default(), None);
        let before = state.snapshot().await;

        // a reader holding the old snapshot keeps seeing it after a swap
        let mut config = Config::default();
        config.port = 9999;
        *state.inner.snapshot.write().await = Arc::new(Snapshot::new(config));

        assert_ne!(before.config.port, 9999);
        assert_eq!(state.snapshot().await.config.port, 9999);
    }

    #[tokio::test]
    async fn failed_reload_keeps_old_snapshot() {
        let dir = std::env::temp_dir().join("freerouter-state-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let state = AppState::new(Config::default(), Some(path));
        let before = state.snapshot().await.config.port;

        assert!(state.reload_config().await.is_err());
        assert_eq!(state.snapshot().await.config.port, before);
    }
}
