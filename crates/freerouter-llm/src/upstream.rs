//! Upstream provider clients
//!
//! One implementation per back-side wire format. Both normalize their
//! output to OpenAI-shaped JSON values (a full `chat.completion` for
//! non-streaming, `chat.completion.chunk`s for streaming) with the model
//! field already namespaced, so the request pipeline is format-agnostic.

use std::pin::Pin;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use freerouter_config::{ProviderConfig, Tier, ThinkingConfig};
use futures_util::{Stream, StreamExt};
use serde_json::Value;
use std::sync::Arc;

use crate::auth::Credential;
use crate::error::ProxyError;
use crate::protocol::anthropic::{ANTHROPIC_VERSION, AnthropicResponse, AnthropicStreamEvent};
use crate::protocol::openai::OpenAiRequest;
use crate::translate;
use crate::translate::anthropic::AnthropicStreamState;

/// Beta features required on the OAuth path: Claude Code identity, OAuth,
/// interleaved thinking, fine-grained tool streaming
const OAUTH_BETA_FLAGS: &str =
    "claude-code-20250219,oauth-2025-04-20,interleaved-thinking-2025-05-14,fine-grained-tool-streaming-2025-05-14";

/// User-agent sent on the OAuth path, identifying the CLI
const OAUTH_USER_AGENT: &str = "claude-cli/2.1.0 (external, cli)";

/// Upstream error bodies are truncated to this many characters
const ERROR_BODY_LIMIT: usize = 500;

/// One upstream attempt's inputs
#[derive(Debug, Clone)]
pub struct Attempt {
    /// Raw front body (already override-stripped), used by the pass-through
    pub raw_body: Value,
    /// Parsed front request, used by the translator
    pub request: OpenAiRequest,
    /// Bare upstream model id (provider prefix removed)
    pub bare_model: String,
    /// Tier the request was routed at; `None` for explicit requests
    pub tier: Option<Tier>,
}

/// Stream of OpenAI-shaped chunk values
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Value, ProxyError>> + Send>>;

/// Trait implemented by each back-side client
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Send a non-streaming completion; returns an OpenAI-shaped response
    async fn complete(&self, attempt: &Attempt) -> Result<Value, ProxyError>;

    /// Send a streaming completion; returns OpenAI-shaped chunks
    async fn complete_stream(&self, attempt: &Attempt) -> Result<ChunkStream, ProxyError>;
}

/// Build the client for a provider descriptor
pub fn make_upstream(
    provider: &ProviderConfig,
    credential: Option<Arc<Credential>>,
    thinking: ThinkingConfig,
    client: reqwest::Client,
) -> Box<dyn Upstream> {
    match provider.api {
        freerouter_config::ApiKind::Anthropic => Box::new(AnthropicUpstream {
            client,
            provider: provider.clone(),
            credential,
            thinking,
        }),
        freerouter_config::ApiKind::Openai => Box::new(OpenAiUpstream {
            client,
            provider: provider.clone(),
            credential,
        }),
    }
}

fn endpoint(provider: &ProviderConfig, path: &str) -> String {
    let base = provider.base_url.as_str().trim_end_matches('/');
    format!("{base}{path}")
}

fn truncate_body(body: &str) -> String {
    body.chars().take(ERROR_BODY_LIMIT).collect()
}

/// Turn a non-2xx response into an upstream error with status and body
async fn upstream_error(response: reqwest::Response) -> ProxyError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    ProxyError::Upstream(format!("upstream returned {status}: {}", truncate_body(&body)))
}

// -- Anthropic --

/// Anthropic Messages API client with full wire translation
pub struct AnthropicUpstream {
    client: reqwest::Client,
    provider: ProviderConfig,
    credential: Option<Arc<Credential>>,
    thinking: ThinkingConfig,
}

impl AnthropicUpstream {
    fn is_oauth(&self) -> bool {
        self.credential.as_ref().is_some_and(|c| c.is_oauth())
    }

    fn request_builder(&self, body: &Value) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .post(endpoint(&self.provider, "/messages"))
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("accept", "application/json, text/event-stream")
            .json(body);

        for (name, value) in &self.provider.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        match self.credential.as_deref() {
            Some(cred @ Credential::Token(_)) => {
                builder = builder
                    .bearer_auth(cred.expose())
                    .header("anthropic-beta", OAUTH_BETA_FLAGS)
                    .header("user-agent", OAUTH_USER_AGENT)
                    .header("x-app", "cli")
                    .header("anthropic-dangerous-direct-browser-access", "true");
            }
            Some(cred @ Credential::ApiKey(_)) => {
                builder = builder.header("x-api-key", cred.expose());
            }
            None => {}
        }

        builder
    }

    async fn send(&self, attempt: &Attempt, stream: bool) -> Result<reqwest::Response, ProxyError> {
        let wire_request = translate::anthropic::build_request(
            &attempt.request,
            &attempt.bare_model,
            attempt.tier,
            &self.thinking,
            self.is_oauth(),
            stream,
        );
        let body = serde_json::to_value(&wire_request)
            .map_err(|e| ProxyError::Internal(anyhow::anyhow!("request serialization failed: {e}")))?;

        let response = self.request_builder(&body).send().await.map_err(|e| {
            tracing::warn!(error = %e, model = %attempt.bare_model, "anthropic request failed");
            ProxyError::Upstream(e.to_string())
        })?;

        if !response.status().is_success() {
            return Err(upstream_error(response).await);
        }
        Ok(response)
    }
}

#[async_trait]
impl Upstream for AnthropicUpstream {
    async fn complete(&self, attempt: &Attempt) -> Result<Value, ProxyError> {
        let response = self.send(attempt, false).await?;

        let wire_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| ProxyError::Upstream(format!("failed to parse response: {e}")))?;

        let openai = translate::anthropic::response_to_openai(&wire_response, &attempt.bare_model);
        serde_json::to_value(openai).map_err(|e| ProxyError::Internal(anyhow::anyhow!("serialization failed: {e}")))
    }

    async fn complete_stream(&self, attempt: &Attempt) -> Result<ChunkStream, ProxyError> {
        let response = self.send(attempt, true).await?;

        let mut events = response.bytes_stream().eventsource();
        let mut state = AnthropicStreamState::new(&attempt.bare_model);

        let chunks = async_stream::stream! {
            while let Some(item) = events.next().await {
                match item {
                    Ok(event) => {
                        let data = event.data.trim();
                        if data.is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<AnthropicStreamEvent>(data) {
                            Ok(stream_event) => {
                                let done = matches!(stream_event, AnthropicStreamEvent::MessageStop);
                                if let Some(chunk) = state.convert_event(&stream_event)
                                    && let Ok(value) = serde_json::to_value(chunk)
                                {
                                    yield Ok(value);
                                }
                                if done {
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::debug!(error = %e, "skipping unparseable anthropic SSE event");
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(ProxyError::Upstream(format!("stream read failed: {e}")));
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(chunks))
    }
}

// -- OpenAI pass-through --

/// OpenAI-compatible client; forwards the raw body and rewrites the model
pub struct OpenAiUpstream {
    client: reqwest::Client,
    provider: ProviderConfig,
    credential: Option<Arc<Credential>>,
}

impl OpenAiUpstream {
    fn request_builder(&self, body: &Value) -> reqwest::RequestBuilder {
        let mut builder = self.client.post(endpoint(&self.provider, "/chat/completions")).json(body);

        for (name, value) in &self.provider.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(cred) = self.credential.as_deref() {
            builder = builder.bearer_auth(cred.expose());
        }

        builder
    }

    async fn send(&self, attempt: &Attempt, stream: bool) -> Result<reqwest::Response, ProxyError> {
        let body = translate::openai::prepare_body(&attempt.raw_body, &attempt.bare_model, stream);

        let response = self.request_builder(&body).send().await.map_err(|e| {
            tracing::warn!(error = %e, model = %attempt.bare_model, "openai request failed");
            ProxyError::Upstream(e.to_string())
        })?;

        if !response.status().is_success() {
            return Err(upstream_error(response).await);
        }
        Ok(response)
    }
}

#[async_trait]
impl Upstream for OpenAiUpstream {
    async fn complete(&self, attempt: &Attempt) -> Result<Value, ProxyError> {
        let response = self.send(attempt, false).await?;

        let mut body: Value = response
            .json()
            .await
            .map_err(|e| ProxyError::Upstream(format!("failed to parse response: {e}")))?;

        translate::openai::rewrite_model(&mut body, &attempt.bare_model);
        Ok(body)
    }

    async fn complete_stream(&self, attempt: &Attempt) -> Result<ChunkStream, ProxyError> {
        let response = self.send(attempt, true).await?;

        let mut events = response.bytes_stream().eventsource();
        let bare_model = attempt.bare_model.clone();

        let chunks = async_stream::stream! {
            while let Some(item) = events.next().await {
                match item {
                    Ok(event) => {
                        let data = event.data.trim();
                        if data.is_empty() {
                            continue;
                        }
                        if data == "[DONE]" {
                            break;
                        }
                        match serde_json::from_str::<Value>(data) {
                            Ok(mut chunk) => {
                                translate::openai::rewrite_model(&mut chunk, &bare_model);
                                yield Ok(chunk);
                            }
                            Err(e) => {
                                tracing::debug!(error = %e, "skipping unparseable openai SSE event");
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(ProxyError::Upstream(format!("stream read failed: {e}")));
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(chunks))
    }
}
