//! Classification input extraction
//!
//! Splits the message list into the concatenated system prompt and a
//! bounded conversational context. A short "check this" after a long
//! technical discussion must inherit context; a long system prompt (an
//! agent "soul") must not inflate complexity, so it never enters the
//! classification input.

use crate::error::ProxyError;
use crate::protocol::openai::OpenAiMessage;

/// How many trailing conversation messages feed the classification input
const CONTEXT_MESSAGES: usize = 3;

/// Character cap applied to every context message except the final user turn
const CONTEXT_TRUNCATE: usize = 500;

/// Extracted classification input
#[derive(Debug, Clone)]
pub struct ExtractedContext {
    /// All system and developer messages, in order, newline-joined
    pub system_prompt: String,
    /// Truncated context followed by the full last user message
    pub prompt: String,
}

/// Concatenate all system and developer messages
pub fn system_prompt_of(messages: &[OpenAiMessage]) -> String {
    messages
        .iter()
        .filter(|m| m.is_system())
        .map(OpenAiMessage::text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the classification input from a message list
///
/// # Errors
///
/// Returns `BadRequest` when the conversation holds no user message.
pub fn extract_context(messages: &[OpenAiMessage]) -> Result<ExtractedContext, ProxyError> {
    let system_prompt = system_prompt_of(messages);

    let conversation: Vec<&OpenAiMessage> = messages.iter().filter(|m| !m.is_system()).collect();

    let last_user_idx = conversation
        .iter()
        .rposition(|m| m.role == "user")
        .ok_or_else(|| ProxyError::BadRequest("no user message found in messages".to_owned()))?;
    let last_user_text = conversation[last_user_idx].text();

    let context_start = conversation.len().saturating_sub(CONTEXT_MESSAGES);
    let mut parts: Vec<String> = conversation[context_start..]
        .iter()
        .enumerate()
        .filter(|(offset, _)| context_start + offset != last_user_idx)
        .map(|(_, m)| truncate_chars(&m.text(), CONTEXT_TRUNCATE))
        .filter(|t| !t.is_empty())
        .collect();
    parts.push(last_user_text);

    Ok(ExtractedContext {
        system_prompt,
        prompt: parts.join("\n"),
    })
}

/// Truncate to a maximum number of characters, respecting char boundaries
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_owned(),
        None => text.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::openai::OpenAiContent;

    fn msg(role: &str, content: &str) -> OpenAiMessage {
        OpenAiMessage {
            role: role.to_owned(),
            content: Some(OpenAiContent::Text(content.to_owned())),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        }
    }

    #[test]
    fn single_user_message() {
        let ctx = extract_context(&[msg("user", "hello")]).unwrap();
        assert_eq!(ctx.prompt, "hello");
        assert_eq!(ctx.system_prompt, "");
    }

    #[test]
    fn system_and_developer_messages_concatenate_in_order() {
        let ctx = extract_context(&[
            msg("system", "first"),
            msg("developer", "second"),
            msg("user", "hi"),
        ])
        .unwrap();
        assert_eq!(ctx.system_prompt, "first\nsecond");
        assert_eq!(ctx.prompt, "hi");
    }

    #[test]
    fn context_is_last_three_messages_with_truncation() {
        let long = "x".repeat(800);
        let ctx = extract_context(&[
            msg("user", "ancient history"),
            msg("assistant", &long),
            msg("user", "older question"),
            msg("assistant", "short answer"),
            msg("user", "check this"),
        ])
        .unwrap();

        // last three: "older question", "short answer", "check this"
        assert!(!ctx.prompt.contains("ancient history"));
        assert_eq!(ctx.prompt, "older question\nshort answer\ncheck this");
    }

    #[test]
    fn context_messages_are_truncated_but_last_user_is_not() {
        let long_context = "c".repeat(800);
        let long_question = "q".repeat(800);
        let ctx = extract_context(&[msg("assistant", &long_context), msg("user", &long_question)]).unwrap();

        let lines: Vec<&str> = ctx.prompt.split('\n').collect();
        assert_eq!(lines[0].len(), 500);
        assert_eq!(lines[1].len(), 800);
    }

    #[test]
    fn no_user_message_is_rejected() {
        let err = extract_context(&[msg("system", "soul"), msg("assistant", "hi")]).unwrap_err();
        assert!(matches!(err, ProxyError::BadRequest(_)));
    }

    #[test]
    fn prompt_is_non_empty_whenever_a_user_message_exists() {
        let ctx = extract_context(&[msg("user", "")]).unwrap();
        // an empty user message still yields a (possibly empty) prompt slot,
        // but any non-empty user text must survive
        let ctx2 = extract_context(&[msg("assistant", "a"), msg("user", "b")]).unwrap();
        assert!(ctx2.prompt.contains('b'));
        assert_eq!(ctx.system_prompt, "");
    }

    #[test]
    fn parts_content_contributes_to_system_prompt() {
        let parts = OpenAiMessage {
            role: "system".to_owned(),
            content: Some(OpenAiContent::Parts(vec![
                crate::protocol::openai::OpenAiContentPart::Text {
                    text: "from parts".to_owned(),
                },
            ])),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        };
        let ctx = extract_context(&[parts, msg("user", "hi")]).unwrap();
        assert_eq!(ctx.system_prompt, "from parts");
    }

    #[test]
    fn truncation_respects_multibyte_boundaries() {
        let ja = "日".repeat(600);
        let truncated = truncate_chars(&ja, 500);
        assert_eq!(truncated.chars().count(), 500);
    }
}
