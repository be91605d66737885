//! Request lifecycle
//!
//! READ_BODY → VALIDATE → CLASSIFY → BUILD_CHAIN → attempts. Fallback to
//! the next chain entry is only possible before any client bytes are
//! written; once a streaming response has begun, failures are reported as
//! an SSE error tail followed by `[DONE]`.

use std::convert::Infallible;
use std::time::Duration;

use axum::body::Bytes;
use axum::response::sse::Event;
use axum::response::{IntoResponse, Response, Sse};
use futures_util::StreamExt;
use http::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

use freerouter_config::provider::split_model_id;
use freerouter_routing::{RouteMethod, RoutingDecision, classify, estimate_tokens, parse_mode_override, resolve_tier};

use crate::context::extract_context;
use crate::error::ProxyError;
use crate::protocol::openai::{OpenAiContent, OpenAiRequest};
use crate::state::{AppState, Snapshot};
use crate::upstream::{Attempt, ChunkStream, make_upstream};
use crate::{AUTO_MODEL, MODEL_NAMESPACE, handlers};

/// Tier label used in headers and stats for explicit-model requests
const EXPLICIT_LABEL: &str = "EXPLICIT";

/// Character cap on the `X-FreeRouter-Reasoning` header
const REASONING_HEADER_LIMIT: usize = 200;

/// A validated, routed request ready for upstream attempts
struct RoutedRequest {
    decision: RoutingDecision,
    raw_body: Value,
    request: OpenAiRequest,
}

/// Entry point for both chat completion routes
pub async fn handle_chat(state: AppState, body: Bytes) -> Response {
    match chat_inner(state, &body).await {
        Ok(response) => response,
        Err(error) => handlers::error_response(&error),
    }
}

async fn chat_inner(state: AppState, body: &Bytes) -> Result<Response, ProxyError> {
    let raw_body: Value =
        serde_json::from_slice(body).map_err(|e| ProxyError::BadRequest(format!("invalid JSON body: {e}")))?;
    let request: OpenAiRequest = serde_json::from_value(raw_body.clone())
        .map_err(|e| ProxyError::BadRequest(format!("invalid chat completion request: {e}")))?;

    if request.model.is_empty() {
        return Err(ProxyError::BadRequest("missing 'model' field".to_owned()));
    }
    if request.messages.is_empty() {
        return Err(ProxyError::BadRequest("'messages' must not be empty".to_owned()));
    }

    let snapshot = state.snapshot().await;
    let routed = route_request(raw_body, request, &snapshot)?;

    tracing::info!(
        model = %routed.decision.model,
        tier = %tier_label(&routed.decision),
        method = %routed.decision.method,
        confidence = routed.decision.confidence,
        "routing decision made"
    );

    run_chain(&state, &snapshot, routed).await
}

fn tier_label(decision: &RoutingDecision) -> String {
    decision.tier.map_or_else(|| EXPLICIT_LABEL.to_owned(), |t| t.to_string())
}

/// Estimated tokens across the full conversation, for cost estimation
///
/// Distinct from the classification window's `total_tokens`: that value
/// samples the last three messages (truncated) and guards context windows,
/// while cost estimation needs every message the upstream will see.
fn message_tokens(request: &OpenAiRequest) -> u64 {
    request.messages.iter().map(|m| estimate_tokens(&m.text())).sum()
}

/// Classify (or honor an override / explicit model) and build the chain
fn route_request(raw_body: Value, request: OpenAiRequest, snapshot: &Snapshot) -> Result<RoutedRequest, ProxyError> {
    let config = &snapshot.config;
    let auto_alias = format!("{MODEL_NAMESPACE}/{AUTO_MODEL}");
    let is_auto = request.model == AUTO_MODEL || request.model == auto_alias;

    if !is_auto {
        let (provider, _) = split_model_id(&request.model);
        if !config.providers.contains_key(provider) {
            return Err(ProxyError::BadRequest(format!(
                "model '{}' references unknown provider '{provider}'",
                request.model
            )));
        }
        let decision = freerouter_routing::explicit(request.model.clone(), &snapshot.catalog, message_tokens(&request));
        return Ok(RoutedRequest {
            decision,
            raw_body,
            request,
        });
    }

    let context = extract_context(&request.messages)?;
    let scoring = config.effective_scoring();

    if let Some(directive) = parse_mode_override(&context.prompt) {
        let (mut raw_body, mut request) = (raw_body, request);
        strip_override(&mut request, &mut raw_body);

        let total_tokens = estimate_tokens(&context.prompt) + estimate_tokens(&context.system_prompt);
        let table = config.tier_table(scoring.force_agentic);
        let decision = freerouter_routing::select(
            directive.tier,
            1.0,
            RouteMethod::Override,
            format!("user-mode: {}", directive.tier.to_string().to_lowercase()),
            table,
            &snapshot.catalog,
            message_tokens(&request),
            total_tokens,
        );
        return Ok(RoutedRequest {
            decision,
            raw_body,
            request,
        });
    }

    let classification = classify(&context.prompt, &context.system_prompt, &scoring);
    let (tier, confidence, override_signals) = resolve_tier(&classification, &context.prompt, &scoring);

    let agentic = scoring.force_agentic || classification.agentic_score >= scoring.agentic_threshold;
    let table = config.tier_table(agentic);

    let mut signals = classification.signals.clone();
    signals.extend(override_signals);
    if agentic {
        signals.push(format!("agentic-mode:{:.2}", classification.agentic_score));
    }
    let reasoning = format!(
        "score {:.3}, confidence {confidence:.2}, signals: [{}]",
        classification.score,
        signals.join(", ")
    );

    let decision = freerouter_routing::select(
        tier,
        confidence,
        RouteMethod::Rules,
        reasoning,
        table,
        &snapshot.catalog,
        message_tokens(&request),
        classification.total_tokens,
    );

    Ok(RoutedRequest {
        decision,
        raw_body,
        request,
    })
}

/// Remove a recognized directive prefix from the message that carries it
///
/// The directive was detected on the classification input; the message it
/// came from is the latest user message whose own text starts with it.
fn strip_override(request: &mut OpenAiRequest, raw_body: &mut Value) {
    for idx in (0..request.messages.len()).rev() {
        let msg = &request.messages[idx];
        if msg.role != "user" {
            continue;
        }
        if let Some(directive) = parse_mode_override(&msg.text()) {
            request.messages[idx].content = Some(OpenAiContent::Text(directive.stripped.clone()));
            if let Some(messages) = raw_body.get_mut("messages").and_then(Value::as_array_mut)
                && let Some(raw_msg) = messages.get_mut(idx)
                && let Some(obj) = raw_msg.as_object_mut()
            {
                obj.insert("content".to_owned(), Value::String(directive.stripped));
            }
            return;
        }
    }
}

/// Try every chain entry in order under the tier deadline
async fn run_chain(state: &AppState, snapshot: &Snapshot, routed: RoutedRequest) -> Result<Response, ProxyError> {
    let config = &snapshot.config;
    let stream = routed.request.stream.unwrap_or(false);
    let deadline = config.timeouts.deadline(routed.decision.tier);
    let label = tier_label(&routed.decision);

    state.stats().record_request(&label, routed.decision.savings);

    let mut last_error = ProxyError::Upstream("no upstream attempted".to_owned());

    for model_id in &routed.decision.chain {
        let (provider_name, bare_model) = split_model_id(model_id);
        let Some(provider) = config.providers.get(provider_name) else {
            last_error = ProxyError::BadRequest(format!(
                "model '{model_id}' references unknown provider '{provider_name}'"
            ));
            continue;
        };

        let credential = state.credential(provider_name, config).await;
        let upstream = make_upstream(provider, credential, config.thinking.clone(), state.http_client());
        let attempt = Attempt {
            raw_body: routed.raw_body.clone(),
            request: routed.request.clone(),
            bare_model: bare_model.to_owned(),
            tier: routed.decision.tier,
        };

        let outcome: Result<(), ProxyError> = if stream {
            match tokio::time::timeout(deadline, upstream.complete_stream(&attempt)).await {
                Err(_) => Err(ProxyError::UpstreamTimeout(deadline)),
                Ok(Err(e)) => Err(e),
                Ok(Ok(chunks)) => {
                    state.stats().record_model(model_id);
                    return Ok(streaming_response(
                        state.clone(),
                        &routed.decision,
                        &label,
                        model_id,
                        chunks,
                        config.timeouts.stall_timeout(),
                    ));
                }
            }
        } else {
            match tokio::time::timeout(deadline, upstream.complete(&attempt)).await {
                Err(_) => Err(ProxyError::UpstreamTimeout(deadline)),
                Ok(Err(e)) => Err(e),
                Ok(Ok(body)) => {
                    state.stats().record_model(model_id);
                    let mut response = (axum::Json(body)).into_response();
                    response
                        .headers_mut()
                        .extend(decision_headers(&routed.decision, &label, model_id));
                    return Ok(response);
                }
            }
        };

        let error = outcome.expect_err("success returns above");
        if error.is_timeout() {
            state.stats().record_timeout();
        } else {
            state.stats().record_error();
        }
        tracing::warn!(model = %model_id, error = %error, "attempt failed before response, trying next chain entry");
        last_error = error;
    }

    Err(last_error)
}

/// Observable routing headers attached to every chat response
fn decision_headers(decision: &RoutingDecision, tier_label: &str, served_model: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let reasoning: String = decision
        .reasoning
        .chars()
        .take(REASONING_HEADER_LIMIT)
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .collect();

    for (name, value) in [
        ("x-freerouter-model", served_model),
        ("x-freerouter-tier", tier_label),
        ("x-freerouter-reasoning", reasoning.as_str()),
    ] {
        if let (Ok(name), Ok(value)) = (HeaderName::try_from(name), HeaderValue::from_str(value)) {
            headers.insert(name, value);
        }
    }
    headers
}

/// Stream translated chunks to the client with a stall timeout
///
/// Headers are sent as soon as this response is returned, so every failure
/// from here on is reported in-stream: an SSE error event and `[DONE]`,
/// never a fallback.
fn streaming_response(
    state: AppState,
    decision: &RoutingDecision,
    tier_label: &str,
    served_model: &str,
    mut chunks: ChunkStream,
    stall: Duration,
) -> Response {
    let headers = decision_headers(decision, tier_label, served_model);

    let events = async_stream::stream! {
        loop {
            match tokio::time::timeout(stall, chunks.next()).await {
                Err(_) => {
                    state.stats().record_timeout();
                    tracing::warn!(stall_secs = stall.as_secs(), "stream stalled, aborting upstream read");
                    yield Ok::<_, Infallible>(error_event(&format!(
                        "upstream stalled: no data received for {}s",
                        stall.as_secs()
                    )));
                    yield Ok(done_event());
                    break;
                }
                Ok(None) => {
                    yield Ok(done_event());
                    break;
                }
                Ok(Some(Ok(chunk))) => {
                    yield Ok(Event::default().data(chunk.to_string()));
                }
                Ok(Some(Err(error))) => {
                    state.stats().record_error();
                    tracing::warn!(error = %error, "stream failed mid-flight");
                    yield Ok(error_event(&error.to_string()));
                    yield Ok(done_event());
                    break;
                }
            }
        }
    };

    let mut response = Sse::new(events).into_response();
    response.headers_mut().extend(headers);
    response
}

fn error_event(message: &str) -> Event {
    Event::default().data(serde_json::json!({"error": {"message": message}}).to_string())
}

fn done_event() -> Event {
    Event::default().data("[DONE]")
}
