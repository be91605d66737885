//! OpenAI ↔ Anthropic translation
//!
//! Request building (system concatenation, tool-result coalescing, thinking
//! attachment), non-streaming response conversion, and the per-stream state
//! machine that turns Anthropic SSE events into OpenAI chunks.

use std::time::{SystemTime, UNIX_EPOCH};

use freerouter_config::{Tier, ThinkingConfig};

use crate::protocol::anthropic::{
    AnthropicContent, AnthropicContentBlock, AnthropicMessage, AnthropicRequest, AnthropicResponse,
    AnthropicResponseBlock, AnthropicStreamContentBlock, AnthropicStreamDelta, AnthropicStreamEvent, AnthropicSystem,
    AnthropicSystemBlock, AnthropicThinking, AnthropicTool, AnthropicToolChoice,
};
use crate::protocol::openai::{
    OpenAiChoice, OpenAiChoiceMessage, OpenAiFunctionCall, OpenAiMessage, OpenAiRequest, OpenAiResponse,
    OpenAiStreamChoice, OpenAiStreamChunk, OpenAiStreamDelta, OpenAiStreamFunctionCall, OpenAiStreamToolCall,
    OpenAiToolCall, OpenAiUsage,
};
use crate::{MODEL_NAMESPACE, context};

/// Default max tokens when the caller leaves it unset (the API requires it)
const DEFAULT_MAX_TOKENS: u32 = 4_096;

/// Identity block sent first on the OAuth path
const CLAUDE_CODE_IDENTITY: &str = "You are Claude Code, Anthropic's official CLI for Claude.";

fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

/// Namespace a bare upstream model id for the client-facing response
pub fn public_model(bare_model: &str) -> String {
    format!("{MODEL_NAMESPACE}/{bare_model}")
}

// -- Request building --

/// Select the thinking configuration for a model at a tier
///
/// Adaptive-capable models think adaptively at COMPLEX and REASONING;
/// MEDIUM gets a fixed budget; SIMPLE and explicit-model requests get none.
pub fn thinking_for(bare_model: &str, tier: Option<Tier>, cfg: &ThinkingConfig) -> Option<AnthropicThinking> {
    match tier? {
        Tier::Complex | Tier::Reasoning if cfg.is_adaptive(bare_model) => Some(AnthropicThinking::Adaptive),
        Tier::Medium if cfg.is_enabled(bare_model) => Some(AnthropicThinking::Enabled {
            budget_tokens: cfg.enabled.budget,
        }),
        _ => None,
    }
}

/// Build an Anthropic Messages request from the front request
pub fn build_request(
    req: &OpenAiRequest,
    bare_model: &str,
    tier: Option<Tier>,
    thinking_cfg: &ThinkingConfig,
    oauth: bool,
    stream: bool,
) -> AnthropicRequest {
    let system_text = context::system_prompt_of(&req.messages);
    let system = build_system(&system_text, oauth);

    let messages = convert_messages(&req.messages);

    let tools = req.tools.as_ref().map(|tools| {
        tools
            .iter()
            .map(|t| AnthropicTool {
                name: t.function.name.clone(),
                description: t.function.description.clone(),
                input_schema: t
                    .function
                    .parameters
                    .clone()
                    .unwrap_or_else(|| serde_json::json!({"type": "object", "properties": {}})),
            })
            .collect()
    });

    let tool_choice = if req.tools.is_some() {
        Some(convert_tool_choice(req.tool_choice.as_ref()))
    } else {
        None
    };

    let thinking = thinking_for(bare_model, tier, thinking_cfg);

    // Raise max_tokens by the thinking budget so the caller's output budget
    // is preserved once thinking tokens are spent.
    let mut max_tokens = req.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);
    if let Some(AnthropicThinking::Enabled { budget_tokens }) = &thinking {
        max_tokens += budget_tokens;
    }

    // Temperature and extended thinking are mutually exclusive upstream
    let temperature = if thinking.is_some() { None } else { req.temperature };

    AnthropicRequest {
        model: bare_model.to_owned(),
        max_tokens,
        system,
        messages,
        temperature,
        top_p: if thinking.is_some() { None } else { req.top_p },
        stop_sequences: req.stop.clone(),
        stream: stream.then_some(true),
        tools,
        tool_choice,
        thinking,
    }
}

/// Build the system field
///
/// OAuth requests send a two-block array: the Claude Code identity, then
/// the user's system string, both ephemerally cached. API-key requests
/// send a plain string.
fn build_system(system_text: &str, oauth: bool) -> Option<AnthropicSystem> {
    if oauth {
        let mut blocks = vec![AnthropicSystemBlock::ephemeral(CLAUDE_CODE_IDENTITY)];
        if !system_text.is_empty() {
            blocks.push(AnthropicSystemBlock::ephemeral(system_text));
        }
        return Some(AnthropicSystem::Blocks(blocks));
    }

    if system_text.is_empty() {
        None
    } else {
        Some(AnthropicSystem::Text(system_text.to_owned()))
    }
}

/// Convert the conversation, coalescing consecutive tool results
fn convert_messages(messages: &[OpenAiMessage]) -> Vec<AnthropicMessage> {
    let mut out: Vec<AnthropicMessage> = Vec::new();

    for msg in messages {
        if msg.is_system() {
            continue;
        }

        match msg.role.as_str() {
            "tool" => {
                let block = AnthropicContentBlock::ToolResult {
                    tool_use_id: msg.tool_call_id.clone().unwrap_or_default(),
                    content: Some(serde_json::to_string(&msg.text()).unwrap_or_default()),
                };
                push_tool_result(&mut out, block);
            }
            "assistant" if msg.tool_calls.is_some() => {
                let mut blocks = Vec::new();
                let text = msg.text();
                if !text.is_empty() {
                    blocks.push(AnthropicContentBlock::Text { text });
                }
                for tc in msg.tool_calls.iter().flatten() {
                    let input =
                        serde_json::from_str(&tc.function.arguments).unwrap_or_else(|_| serde_json::json!({}));
                    blocks.push(AnthropicContentBlock::ToolUse {
                        id: tc.id.clone(),
                        name: tc.function.name.clone(),
                        input,
                    });
                }
                out.push(AnthropicMessage {
                    role: "assistant".to_owned(),
                    content: AnthropicContent::Blocks(blocks),
                });
            }
            role => {
                let role = if role == "assistant" { "assistant" } else { "user" };
                out.push(AnthropicMessage {
                    role: role.to_owned(),
                    content: AnthropicContent::Text(msg.text()),
                });
            }
        }
    }

    out
}

/// Append a tool result, merging into the previous user message only when
/// that message is already all-tool-result
fn push_tool_result(out: &mut Vec<AnthropicMessage>, block: AnthropicContentBlock) {
    if let Some(last) = out.last_mut()
        && last.role == "user"
        && let AnthropicContent::Blocks(blocks) = &mut last.content
        && blocks
            .iter()
            .all(|b| matches!(b, AnthropicContentBlock::ToolResult { .. }))
    {
        blocks.push(block);
        return;
    }

    out.push(AnthropicMessage {
        role: "user".to_owned(),
        content: AnthropicContent::Blocks(vec![block]),
    });
}

/// Map the OpenAI `tool_choice` field
fn convert_tool_choice(choice: Option<&serde_json::Value>) -> AnthropicToolChoice {
    let simple = |choice_type: &str| AnthropicToolChoice {
        choice_type: choice_type.to_owned(),
        name: None,
    };

    match choice {
        Some(serde_json::Value::String(s)) => match s.as_str() {
            "none" => simple("none"),
            "required" => simple("any"),
            _ => simple("auto"),
        },
        Some(serde_json::Value::Object(obj)) => obj
            .get("function")
            .and_then(|f| f.get("name"))
            .and_then(|n| n.as_str())
            .map_or_else(
                || simple("auto"),
                |name| AnthropicToolChoice {
                    choice_type: "tool".to_owned(),
                    name: Some(name.to_owned()),
                },
            ),
        _ => simple("auto"),
    }
}

// -- Non-streaming response conversion --

/// Map an Anthropic stop reason to an OpenAI finish reason
fn finish_reason_of(stop_reason: Option<&str>) -> Option<String> {
    stop_reason.map(|s| match s {
        "tool_use" => "tool_calls".to_owned(),
        "end_turn" => "stop".to_owned(),
        other => other.to_owned(),
    })
}

/// Convert a Messages API response to an OpenAI chat completion
pub fn response_to_openai(resp: &AnthropicResponse, bare_model: &str) -> OpenAiResponse {
    let mut text = String::new();
    let mut tool_calls: Vec<OpenAiToolCall> = Vec::new();

    for block in &resp.content {
        match block {
            AnthropicResponseBlock::Text { text: t } => text.push_str(t),
            AnthropicResponseBlock::Thinking { .. } => {}
            AnthropicResponseBlock::ToolUse { id, name, input } => {
                let id = if id.is_empty() {
                    format!("call_{}", tool_calls.len())
                } else {
                    id.clone()
                };
                tool_calls.push(OpenAiToolCall {
                    id,
                    tool_type: "function".to_owned(),
                    function: OpenAiFunctionCall {
                        name: name.clone(),
                        arguments: serde_json::to_string(input).unwrap_or_else(|_| "{}".to_owned()),
                    },
                });
            }
        }
    }

    let message = OpenAiChoiceMessage {
        role: "assistant".to_owned(),
        content: if text.is_empty() && !tool_calls.is_empty() {
            None
        } else {
            Some(text)
        },
        tool_calls: if tool_calls.is_empty() { None } else { Some(tool_calls) },
    };

    OpenAiResponse {
        id: resp.id.clone(),
        object: "chat.completion".to_owned(),
        created: unix_now(),
        model: public_model(bare_model),
        choices: vec![OpenAiChoice {
            index: 0,
            message,
            finish_reason: finish_reason_of(resp.stop_reason.as_deref()),
        }],
        usage: Some(OpenAiUsage {
            prompt_tokens: resp.usage.input_tokens,
            completion_tokens: resp.usage.output_tokens,
            total_tokens: resp.usage.input_tokens + resp.usage.output_tokens,
        }),
    }
}

// -- Stream conversion --

/// Per-stream translation state
///
/// Request-local by design; nothing here may outlive the stream.
#[derive(Debug)]
pub struct AnthropicStreamState {
    response_id: String,
    model: String,
    created: u64,
    /// Inside a thinking block: every text delta is suppressed
    in_thinking: bool,
    /// Inside a tool_use block: input_json deltas map to argument fragments
    in_tool_use: bool,
    /// Running tool call index; −1 until the first tool_use block starts
    tool_index: i32,
    /// Last stop_reason seen in a message_delta
    stop_reason: Option<String>,
}

impl AnthropicStreamState {
    /// Create the state for one stream
    pub fn new(bare_model: &str) -> Self {
        Self {
            response_id: format!("chatcmpl-{}", unix_now()),
            model: public_model(bare_model),
            created: unix_now(),
            in_thinking: false,
            in_tool_use: false,
            tool_index: -1,
            stop_reason: None,
        }
    }

    fn chunk(&self, delta: OpenAiStreamDelta, finish_reason: Option<String>) -> OpenAiStreamChunk {
        OpenAiStreamChunk {
            id: self.response_id.clone(),
            object: "chat.completion.chunk".to_owned(),
            created: self.created,
            model: self.model.clone(),
            choices: vec![OpenAiStreamChoice {
                index: 0,
                delta,
                finish_reason,
            }],
        }
    }

    /// Convert one upstream event into at most one client chunk
    ///
    /// Thinking content never reaches the client; keep-alive pings and
    /// block boundaries produce nothing.
    pub fn convert_event(&mut self, event: &AnthropicStreamEvent) -> Option<OpenAiStreamChunk> {
        match event {
            AnthropicStreamEvent::Ping => None,

            AnthropicStreamEvent::MessageStart { message } => {
                if !message.id.is_empty() {
                    self.response_id.clone_from(&message.id);
                }
                None
            }

            AnthropicStreamEvent::ContentBlockStart { content_block, .. } => match content_block {
                AnthropicStreamContentBlock::Thinking { .. } => {
                    self.in_thinking = true;
                    self.in_tool_use = false;
                    None
                }
                AnthropicStreamContentBlock::Text { .. } => {
                    self.in_thinking = false;
                    self.in_tool_use = false;
                    None
                }
                AnthropicStreamContentBlock::ToolUse { id, name, .. } => {
                    self.in_thinking = false;
                    self.in_tool_use = true;
                    self.tool_index += 1;
                    Some(self.chunk(
                        OpenAiStreamDelta {
                            role: None,
                            content: None,
                            tool_calls: Some(vec![OpenAiStreamToolCall {
                                index: u32::try_from(self.tool_index).unwrap_or(0),
                                id: Some(id.clone()),
                                tool_type: Some("function".to_owned()),
                                function: Some(OpenAiStreamFunctionCall {
                                    name: Some(name.clone()),
                                    arguments: Some(String::new()),
                                }),
                            }]),
                        },
                        None,
                    ))
                }
            },

            AnthropicStreamEvent::ContentBlockDelta { delta, .. } => match delta {
                AnthropicStreamDelta::TextDelta { text } => {
                    if self.in_thinking {
                        return None;
                    }
                    Some(self.chunk(
                        OpenAiStreamDelta {
                            role: None,
                            content: Some(text.clone()),
                            tool_calls: None,
                        },
                        None,
                    ))
                }
                AnthropicStreamDelta::ThinkingDelta { .. } | AnthropicStreamDelta::SignatureDelta { .. } => None,
                AnthropicStreamDelta::InputJsonDelta { partial_json } => {
                    if !self.in_tool_use {
                        return None;
                    }
                    Some(self.chunk(
                        OpenAiStreamDelta {
                            role: None,
                            content: None,
                            tool_calls: Some(vec![OpenAiStreamToolCall {
                                index: u32::try_from(self.tool_index).unwrap_or(0),
                                id: None,
                                tool_type: None,
                                function: Some(OpenAiStreamFunctionCall {
                                    name: None,
                                    arguments: Some(partial_json.clone()),
                                }),
                            }]),
                        },
                        None,
                    ))
                }
            },

            AnthropicStreamEvent::ContentBlockStop { .. } => {
                self.in_thinking = false;
                self.in_tool_use = false;
                None
            }

            AnthropicStreamEvent::MessageDelta { delta, .. } => {
                if delta.stop_reason.is_some() {
                    self.stop_reason.clone_from(&delta.stop_reason);
                }
                None
            }

            AnthropicStreamEvent::MessageStop => {
                let finish = if self.stop_reason.as_deref() == Some("tool_use") {
                    "tool_calls"
                } else {
                    "stop"
                };
                Some(self.chunk(OpenAiStreamDelta::default(), Some(finish.to_owned())))
            }
        }
    }
}
