//! Server assembly
//!
//! Builds the axum router from configuration, layers CORS and request
//! tracing, and serves with graceful shutdown.

mod cors;

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::Router;
use freerouter_config::Config;
use freerouter_llm::AppState;
use tower_http::trace::TraceLayer;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configured host cannot be parsed.
    pub fn new(config: Config, config_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let host: std::net::IpAddr = config
            .host
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid listen host '{}': {e}", config.host))?;
        let listen_address = SocketAddr::new(host, config.port);

        let state = AppState::new(config, config_path);

        let router = freerouter_llm::api_router(state)
            .layer(TraceLayer::new_for_http())
            .layer(cors::cors_layer());

        Ok(Self {
            router,
            listen_address,
        })
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "freerouter listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}
