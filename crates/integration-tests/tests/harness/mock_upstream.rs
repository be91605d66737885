//! Mock upstream servers
//!
//! `MockOpenAi` implements a minimal OpenAI-compatible chat endpoint;
//! `MockAnthropic` implements a minimal Messages API with scripted SSE
//! scenarios. Both bind to port 0 and record received bodies.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use http::StatusCode;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// Streaming behavior for the Anthropic mock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnthropicScenario {
    /// Plain text: "Hello" then end_turn
    Text,
    /// A thinking block followed by visible text
    ThinkingThenText,
    /// A `get_weather(city=Paris)` tool call split across json deltas
    ToolUse,
}

struct MockState {
    fail_remaining: AtomicU32,
    requests: Mutex<Vec<Value>>,
    /// Delay inserted after the first streamed chunk (stall simulation)
    stall_after_first: Option<Duration>,
    scenario: AnthropicScenario,
}

impl MockState {
    fn record(&self, body: &Value) {
        self.requests.lock().expect("not poisoned").push(body.clone());
    }

    fn should_fail(&self) -> bool {
        self.fail_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

async fn start_router(app: Router) -> anyhow::Result<(SocketAddr, CancellationToken)> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_clone.cancelled().await;
            })
            .await
            .ok();
    });

    Ok((addr, shutdown))
}

// -- OpenAI mock --

/// Mock OpenAI-compatible backend
pub struct MockOpenAi {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

impl MockOpenAi {
    /// Start a mock that always succeeds
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_inner(0, None).await
    }

    /// Start a mock that fails the first `n` requests with 500
    pub async fn start_failing(n: u32) -> anyhow::Result<Self> {
        Self::start_inner(n, None).await
    }

    /// Start a mock whose stream stalls after the first chunk
    pub async fn start_stalling(delay: Duration) -> anyhow::Result<Self> {
        Self::start_inner(0, Some(delay)).await
    }

    async fn start_inner(fail: u32, stall: Option<Duration>) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            fail_remaining: AtomicU32::new(fail),
            requests: Mutex::new(Vec::new()),
            stall_after_first: stall,
            scenario: AnthropicScenario::Text,
        });

        let app = Router::new()
            .route("/chat/completions", routing::post(openai_chat))
            .with_state(Arc::clone(&state));
        let (addr, shutdown) = start_router(app).await?;

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for a provider descriptor
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// The most recent request body received
    pub fn last_request(&self) -> Option<Value> {
        self.state.requests.lock().expect("not poisoned").last().cloned()
    }

    /// Number of chat requests received
    pub fn request_count(&self) -> usize {
        self.state.requests.lock().expect("not poisoned").len()
    }
}

impl Drop for MockOpenAi {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn openai_chat(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.record(&body);

    if state.should_fail() {
        return (StatusCode::INTERNAL_SERVER_ERROR, "mock upstream failure").into_response();
    }

    let model = body["model"].as_str().unwrap_or("mock-model").to_owned();

    if body["stream"] == json!(true) {
        let stall = state.stall_after_first;
        let chunk = move |delta: Value, finish: Value| {
            json!({
                "id": "chatcmpl-mock",
                "object": "chat.completion.chunk",
                "created": 1,
                "model": model.clone(),
                "choices": [{"index": 0, "delta": delta, "finish_reason": finish}]
            })
        };

        let events = async_stream::stream! {
            yield Ok::<_, std::convert::Infallible>(
                Event::default().data(chunk(json!({"role": "assistant", "content": "Hel"}), Value::Null).to_string()),
            );
            if let Some(delay) = stall {
                tokio::time::sleep(delay).await;
            }
            yield Ok(Event::default().data(chunk(json!({"content": "lo"}), Value::Null).to_string()));
            yield Ok(Event::default().data(chunk(json!({}), json!("stop")).to_string()));
            yield Ok(Event::default().data("[DONE]"));
        };
        return Sse::new(events).into_response();
    }

    Json(json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion",
        "created": 1,
        "model": model,
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": "Hello from the mock"},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 3, "completion_tokens": 5, "total_tokens": 8}
    }))
    .into_response()
}

// -- Anthropic mock --

/// Mock Anthropic Messages API backend
pub struct MockAnthropic {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

impl MockAnthropic {
    /// Start a mock driving the given streaming scenario
    pub async fn start(scenario: AnthropicScenario) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            fail_remaining: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
            stall_after_first: None,
            scenario,
        });

        let app = Router::new()
            .route("/messages", routing::post(anthropic_messages))
            .with_state(Arc::clone(&state));
        let (addr, shutdown) = start_router(app).await?;

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for a provider descriptor
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// The most recent request body received
    pub fn last_request(&self) -> Option<Value> {
        self.state.requests.lock().expect("not poisoned").last().cloned()
    }
}

impl Drop for MockAnthropic {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn scenario_events(scenario: AnthropicScenario) -> Vec<Value> {
    let mut events = vec![json!({
        "type": "message_start",
        "message": {"id": "msg_mock", "model": "claude-test", "usage": {"input_tokens": 3, "output_tokens": 0}}
    })];

    match scenario {
        AnthropicScenario::Text => {
            events.extend([
                json!({"type": "content_block_start", "index": 0, "content_block": {"type": "text", "text": ""}}),
                json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "Hello"}}),
                json!({"type": "content_block_stop", "index": 0}),
                json!({"type": "message_delta", "delta": {"stop_reason": "end_turn"}, "usage": {"input_tokens": 3, "output_tokens": 2}}),
            ]);
        }
        AnthropicScenario::ThinkingThenText => {
            events.extend([
                json!({"type": "content_block_start", "index": 0, "content_block": {"type": "thinking", "thinking": ""}}),
                json!({"type": "content_block_delta", "index": 0, "delta": {"type": "thinking_delta", "thinking": "SECRET-THOUGHT"}}),
                json!({"type": "content_block_delta", "index": 0, "delta": {"type": "signature_delta", "signature": "sig"}}),
                json!({"type": "content_block_stop", "index": 0}),
                json!({"type": "content_block_start", "index": 1, "content_block": {"type": "text", "text": ""}}),
                json!({"type": "content_block_delta", "index": 1, "delta": {"type": "text_delta", "text": "visible answer"}}),
                json!({"type": "content_block_stop", "index": 1}),
                json!({"type": "message_delta", "delta": {"stop_reason": "end_turn"}, "usage": null}),
            ]);
        }
        AnthropicScenario::ToolUse => {
            events.extend([
                json!({"type": "content_block_start", "index": 0, "content_block": {"type": "tool_use", "id": "toolu_mock", "name": "get_weather", "input": {}}}),
                json!({"type": "content_block_delta", "index": 0, "delta": {"type": "input_json_delta", "partial_json": "{\"city\":"}}),
                json!({"type": "content_block_delta", "index": 0, "delta": {"type": "input_json_delta", "partial_json": "\"Paris\"}"}}),
                json!({"type": "content_block_stop", "index": 0}),
                json!({"type": "message_delta", "delta": {"stop_reason": "tool_use"}, "usage": null}),
            ]);
        }
    }

    events.push(json!({"type": "message_stop"}));
    events
}

async fn anthropic_messages(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.record(&body);

    if body["stream"] == json!(true) {
        let events = scenario_events(state.scenario);
        let stream = async_stream::stream! {
            yield Ok::<_, std::convert::Infallible>(Event::default().event("ping").data(json!({"type": "ping"}).to_string()));
            for event in events {
                let name = event["type"].as_str().unwrap_or("message_delta").to_owned();
                yield Ok(Event::default().event(name).data(event.to_string()));
            }
        };
        return Sse::new(stream).into_response();
    }

    Json(json!({
        "id": "msg_mock",
        "type": "message",
        "role": "assistant",
        "content": [{"type": "text", "text": "Hello from Anthropic mock"}],
        "model": body["model"].as_str().unwrap_or("claude-test"),
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 3, "output_tokens": 5}
    }))
    .into_response()
}
