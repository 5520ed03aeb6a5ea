//! UI messages → model messages.
//!
//! Assistant messages are split at `step-start` boundaries. Each step becomes
//! an assistant message (text + tool calls) followed by a tool message with
//! the results. Tool parts that never completed are dropped, since a call
//! without a result is not valid model input.

use hypr_core::{HyprUIMessage, MessagePart, Role, ToolState};
use serde_json::Value;

use crate::model::{ModelContent, ModelMessage, ModelRole};

/// Convert a UI history into the model's message format.
pub fn to_model_messages(messages: &[HyprUIMessage]) -> Vec<ModelMessage> {
    let mut out = Vec::with_capacity(messages.len());
    for message in messages {
        match message.role {
            Role::System => push_text(&mut out, ModelRole::System, message),
            Role::User => push_text(&mut out, ModelRole::User, message),
            Role::Assistant => push_assistant(&mut out, message),
        }
    }
    out
}

fn push_text(out: &mut Vec<ModelMessage>, role: ModelRole, message: &HyprUIMessage) {
    let content: Vec<ModelContent> = message
        .parts
        .iter()
        .filter_map(|p| match p {
            MessagePart::Text { text } if !text.is_empty() => Some(ModelContent::Text { text: text.clone() }),
            _ => None,
        })
        .collect();
    if content.is_empty() {
        tracing::debug!(id = %message.id, "skipping message without text");
        return;
    }
    out.push(ModelMessage { role, content });
}

fn push_assistant(out: &mut Vec<ModelMessage>, message: &HyprUIMessage) {
    let mut step = Vec::new();
    let mut results = Vec::new();

    for part in &message.parts {
        match part {
            MessagePart::StepStart => flush_step(out, &mut step, &mut results),
            MessagePart::Text { text } if !text.is_empty() => {
                step.push(ModelContent::Text { text: text.clone() });
            }
            MessagePart::Tool(tool) => {
                let (output, is_error) = match tool.state {
                    ToolState::OutputAvailable => (tool.output.clone().unwrap_or(Value::Null), false),
                    ToolState::OutputError => (
                        Value::String(tool.error_text.clone().unwrap_or_default()),
                        true,
                    ),
                    ToolState::InputStreaming | ToolState::InputAvailable => continue,
                };
                step.push(ModelContent::ToolCall {
                    tool_call_id: tool.tool_call_id.clone(),
                    tool_name: tool.tool_name.clone(),
                    input: tool.input.clone().unwrap_or(Value::Null),
                });
                results.push(ModelContent::ToolResult {
                    tool_call_id: tool.tool_call_id.clone(),
                    tool_name: tool.tool_name.clone(),
                    output,
                    is_error,
                });
            }
            MessagePart::Text { .. } | MessagePart::Other(_) => {}
        }
    }
    flush_step(out, &mut step, &mut results);
}

fn flush_step(out: &mut Vec<ModelMessage>, step: &mut Vec<ModelContent>, results: &mut Vec<ModelContent>) {
    if !step.is_empty() {
        out.push(ModelMessage {
            role: ModelRole::Assistant,
            content: std::mem::take(step),
        });
    }
    if !results.is_empty() {
        out.push(ModelMessage {
            role: ModelRole::Tool,
            content: std::mem::take(results),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use hypr_core::ToolPart;
    use serde_json::json;

    fn tool(id: &str, state: ToolState) -> MessagePart {
        MessagePart::Tool(ToolPart {
            tool_name: "search_sessions".into(),
            tool_call_id: id.into(),
            state,
            input: Some(json!({"query": "standup"})),
            output: (state == ToolState::OutputAvailable).then(|| json!({"results": []})),
            error_text: (state == ToolState::OutputError).then(|| "boom".to_string()),
        })
    }

    #[test]
    fn user_and_system_text() {
        let messages = vec![
            HyprUIMessage::new("s", Role::System, vec![MessagePart::text("be brief")]),
            HyprUIMessage::user("u", "hello"),
        ];
        let out = to_model_messages(&messages);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].role, ModelRole::System);
        assert_eq!(out[1].text_content(), "hello");
    }

    #[test]
    fn empty_user_message_is_skipped() {
        let messages = vec![HyprUIMessage::new("u", Role::User, vec![MessagePart::StepStart])];
        assert!(to_model_messages(&messages).is_empty());
    }

    #[test]
    fn assistant_steps_become_call_and_result_messages() {
        let messages = vec![HyprUIMessage::new(
            "a",
            Role::Assistant,
            vec![
                MessagePart::StepStart,
                MessagePart::text("let me look"),
                tool("c1", ToolState::OutputAvailable),
                MessagePart::StepStart,
                tool("c2", ToolState::OutputError),
                MessagePart::StepStart,
                MessagePart::text("found nothing"),
            ],
        )];
        let out = to_model_messages(&messages);
        let roles: Vec<ModelRole> = out.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            [
                ModelRole::Assistant,
                ModelRole::Tool,
                ModelRole::Assistant,
                ModelRole::Tool,
                ModelRole::Assistant,
            ]
        );
        assert_error_result(&out[3].content[0]);
        assert_eq!(out[4].text_content(), "found nothing");
    }

    fn assert_error_result(content: &ModelContent) {
        assert_matches!(
            content,
            ModelContent::ToolResult { is_error: true, output, .. } if output == &json!("boom")
        );
    }

    #[test]
    fn incomplete_tool_parts_are_dropped() {
        let messages = vec![HyprUIMessage::new(
            "a",
            Role::Assistant,
            vec![tool("c1", ToolState::InputAvailable), tool("c2", ToolState::InputStreaming)],
        )];
        assert!(to_model_messages(&messages).is_empty());
    }

    #[test]
    fn unknown_parts_are_ignored() {
        let messages = vec![HyprUIMessage::new(
            "a",
            Role::Assistant,
            vec![
                MessagePart::Other(json!({"type": "reasoning", "text": "hmm"})),
                MessagePart::text("answer"),
            ],
        )];
        let out = to_model_messages(&messages);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text_content(), "answer");
    }
}
