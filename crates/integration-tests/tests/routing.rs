//! End-to-end routing behavior: classification headers, mode overrides,
//! explicit models, and request validation

mod harness;

use harness::config;
use harness::mock_upstream::MockOpenAi;
use harness::server::TestServer;
use serde_json::json;

#[tokio::test]
async fn auto_greeting_routes_to_simple() {
    let mock = MockOpenAi::start().await.unwrap();
    let server = TestServer::start(config::openai_only(&mock.base_url())).await.unwrap();

    let response = server
        .chat(json!({"model": "auto", "messages": [{"role": "user", "content": "hi"}]}))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["x-freerouter-tier"], "SIMPLE");
    assert_eq!(response.headers()["x-freerouter-model"], "mock/test-model");

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["object"], "chat.completion");
    assert_eq!(body["model"], "freerouter/test-model");
    assert!(body["choices"][0]["message"]["content"].is_string());
}

#[tokio::test]
async fn max_override_forces_reasoning_and_strips_prefix() {
    let mock = MockOpenAi::start().await.unwrap();
    let server = TestServer::start(config::openai_only(&mock.base_url())).await.unwrap();

    let response = server
        .chat(json!({
            "model": "auto",
            "messages": [{"role": "user", "content": "/max analyze this distributed system"}]
        }))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["x-freerouter-tier"], "REASONING");
    let reasoning = response.headers()["x-freerouter-reasoning"].to_str().unwrap();
    assert!(reasoning.contains("user-mode: reasoning"), "reasoning header: {reasoning}");

    // the upstream must receive the prompt without the directive
    let upstream_body = mock.last_request().unwrap();
    assert_eq!(
        upstream_body["messages"][0]["content"],
        "analyze this distributed system"
    );
}

#[tokio::test]
async fn explicit_model_bypasses_classification() {
    let mock = MockOpenAi::start().await.unwrap();
    let server = TestServer::start(config::openai_only(&mock.base_url())).await.unwrap();

    let response = server
        .chat(json!({
            "model": "mock/test-model",
            "messages": [{"role": "user", "content": "prove the theorem step by step"}]
        }))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["x-freerouter-tier"], "EXPLICIT");
    assert_eq!(response.headers()["x-freerouter-model"], "mock/test-model");
    assert_eq!(mock.last_request().unwrap()["model"], "test-model");
}

#[tokio::test]
async fn system_prompt_soul_does_not_inflate_tier() {
    let mock = MockOpenAi::start().await.unwrap();
    let server = TestServer::start(config::openai_only(&mock.base_url())).await.unwrap();

    let soul = "You are an expert distributed-systems architect. ".repeat(800);
    let response = server
        .chat(json!({
            "model": "auto",
            "messages": [
                {"role": "system", "content": soul},
                {"role": "user", "content": "hello"}
            ]
        }))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["x-freerouter-tier"], "SIMPLE");
}

#[tokio::test]
async fn missing_messages_is_a_bad_request() {
    let mock = MockOpenAi::start().await.unwrap();
    let server = TestServer::start(config::openai_only(&mock.base_url())).await.unwrap();

    let response = server.chat(json!({"model": "auto", "messages": []})).await.unwrap();
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"]["type"], "invalid_request_error");
    assert_eq!(mock.request_count(), 0);
}

#[tokio::test]
async fn no_user_message_is_a_bad_request() {
    let mock = MockOpenAi::start().await.unwrap();
    let server = TestServer::start(config::openai_only(&mock.base_url())).await.unwrap();

    let response = server
        .chat(json!({
            "model": "auto",
            "messages": [{"role": "assistant", "content": "hello there"}]
        }))
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(mock.request_count(), 0);
}

#[tokio::test]
async fn invalid_json_body_is_a_bad_request() {
    let mock = MockOpenAi::start().await.unwrap();
    let server = TestServer::start(config::openai_only(&mock.base_url())).await.unwrap();

    let response = server
        .client()
        .post(server.url("/v1/chat/completions"))
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn bare_chat_completions_path_works_too() {
    let mock = MockOpenAi::start().await.unwrap();
    let server = TestServer::start(config::openai_only(&mock.base_url())).await.unwrap();

    let response = server
        .client()
        .post(server.url("/chat/completions"))
        .json(&json!({"model": "auto", "messages": [{"role": "user", "content": "hi"}]}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}
