//! Streaming translation: tool calls, thinking suppression, [DONE]
//! framing, and stall handling

mod harness;

use std::time::Duration;

use harness::mock_upstream::{AnthropicScenario, MockAnthropic, MockOpenAi};
use harness::server::TestServer;
use harness::{config, sse_data_lines};
use serde_json::{Value, json};

#[tokio::test]
async fn anthropic_text_stream_translates_to_openai_chunks() {
    let mock = MockAnthropic::start(AnthropicScenario::Text).await.unwrap();
    let server = TestServer::start(config::anthropic_only(&mock.base_url())).await.unwrap();

    let response = server
        .chat(json!({"model": "auto", "messages": [{"role": "user", "content": "hi"}], "stream": true}))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let lines = sse_data_lines(response).await;
    assert_eq!(lines.last().map(String::as_str), Some("[DONE]"));

    let chunks: Vec<Value> = lines[..lines.len() - 1]
        .iter()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert!(chunks.iter().all(|c| c["object"] == "chat.completion.chunk"));
    assert!(chunks.iter().all(|c| c["model"] == "freerouter/claude-test"));

    let text: String = chunks
        .iter()
        .filter_map(|c| c["choices"][0]["delta"]["content"].as_str())
        .collect();
    assert_eq!(text, "Hello");

    let finish = chunks.last().unwrap()["choices"][0]["finish_reason"].as_str();
    assert_eq!(finish, Some("stop"));
}

#[tokio::test]
async fn streaming_tool_call_round_trips() {
    let mock = MockAnthropic::start(AnthropicScenario::ToolUse).await.unwrap();
    let server = TestServer::start(config::anthropic_only(&mock.base_url())).await.unwrap();

    let response = server
        .chat(json!({
            "model": "auto",
            "messages": [{"role": "user", "content": "what's the weather in Paris?"}],
            "stream": true,
            "tools": [{
                "type": "function",
                "function": {
                    "name": "get_weather",
                    "parameters": {"type": "object", "properties": {"city": {"type": "string"}}}
                }
            }]
        }))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let lines = sse_data_lines(response).await;
    assert_eq!(lines.last().map(String::as_str), Some("[DONE]"));

    let chunks: Vec<Value> = lines[..lines.len() - 1]
        .iter()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    // first tool chunk carries the name and empty arguments
    let first_tool = &chunks[0]["choices"][0]["delta"]["tool_calls"][0];
    assert_eq!(first_tool["index"], 0);
    assert_eq!(first_tool["function"]["name"], "get_weather");
    assert_eq!(first_tool["function"]["arguments"], "");

    // argument fragments concatenate to the full JSON
    let arguments: String = chunks
        .iter()
        .filter_map(|c| c["choices"][0]["delta"]["tool_calls"][0]["function"]["arguments"].as_str())
        .collect();
    let parsed: Value = serde_json::from_str(&arguments).unwrap();
    assert_eq!(parsed, json!({"city": "Paris"}));

    let finish = chunks.last().unwrap()["choices"][0]["finish_reason"].as_str();
    assert_eq!(finish, Some("tool_calls"));
}

#[tokio::test]
async fn thinking_never_reaches_the_client() {
    let mock = MockAnthropic::start(AnthropicScenario::ThinkingThenText).await.unwrap();
    let server = TestServer::start(config::anthropic_only(&mock.base_url())).await.unwrap();

    let response = server
        .chat(json!({"model": "auto", "messages": [{"role": "user", "content": "hi"}], "stream": true}))
        .await
        .unwrap();

    let lines = sse_data_lines(response).await;
    for line in &lines {
        assert!(!line.contains("SECRET-THOUGHT"), "thinking leaked: {line}");
    }

    let text: String = lines
        .iter()
        .filter(|l| l.as_str() != "[DONE]")
        .filter_map(|l| serde_json::from_str::<Value>(l).ok())
        .filter_map(|c| c["choices"][0]["delta"]["content"].as_str().map(ToOwned::to_owned))
        .collect();
    assert_eq!(text, "visible answer");
}

#[tokio::test]
async fn openai_passthrough_stream_rewrites_model_and_appends_done() {
    let mock = MockOpenAi::start().await.unwrap();
    let server = TestServer::start(config::openai_only(&mock.base_url())).await.unwrap();

    let response = server
        .chat(json!({"model": "auto", "messages": [{"role": "user", "content": "hi"}], "stream": true}))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let lines = sse_data_lines(response).await;
    assert_eq!(lines.last().map(String::as_str), Some("[DONE]"));

    let text: String = lines[..lines.len() - 1]
        .iter()
        .map(|l| serde_json::from_str::<Value>(l).unwrap())
        .inspect(|c| assert_eq!(c["model"], "freerouter/test-model"))
        .filter_map(|c| c["choices"][0]["delta"]["content"].as_str().map(ToOwned::to_owned))
        .collect();
    assert_eq!(text, "Hello");
}

#[tokio::test]
async fn stalled_stream_ends_with_error_and_done() {
    let mock = MockOpenAi::start_stalling(Duration::from_secs(10)).await.unwrap();
    let mut config = config::openai_only(&mock.base_url());
    config.timeouts.stall = 1;
    let server = TestServer::start(config).await.unwrap();

    let response = server
        .chat(json!({"model": "auto", "messages": [{"role": "user", "content": "hi"}], "stream": true}))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let lines = sse_data_lines(response).await;
    assert_eq!(lines.last().map(String::as_str), Some("[DONE]"));

    let error_line = lines
        .iter()
        .find(|l| l.contains("\"error\""))
        .expect("an SSE error event before [DONE]");
    let error: Value = serde_json::from_str(error_line).unwrap();
    assert!(error["error"]["message"].as_str().unwrap().contains("stalled"));

    // the stall counts as a timeout
    let stats: Value = server
        .client()
        .get(server.url("/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["timeouts"], 1);
}
