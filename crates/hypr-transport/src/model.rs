//! Language model abstraction.
//!
//! The transport does not talk to a provider directly. Anything that can
//! turn a [`ModelRequest`] into a stream of [`ModelEvent`]s plugs in here.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ModelError, StreamError};

/// Provider-agnostic message role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelRole {
    /// System prompt.
    System,
    /// User input.
    User,
    /// Model output, including tool calls.
    Assistant,
    /// Tool results.
    Tool,
}

/// One content block in a model message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ModelContent {
    /// Plain text.
    Text {
        /// The text.
        text: String,
    },
    /// A tool invocation issued by the model.
    #[serde(rename_all = "camelCase")]
    ToolCall {
        /// Call ID, echoed by the matching result.
        tool_call_id: String,
        /// Tool name.
        tool_name: String,
        /// Arguments.
        input: Value,
    },
    /// The outcome of a tool invocation.
    #[serde(rename_all = "camelCase")]
    ToolResult {
        /// Call ID of the invocation.
        tool_call_id: String,
        /// Tool name.
        tool_name: String,
        /// Output value, or the error text for failures.
        output: Value,
        /// True when the tool failed.
        is_error: bool,
    },
}

/// A message in the model's conversation format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelMessage {
    /// Role.
    pub role: ModelRole,
    /// Content blocks.
    pub content: Vec<ModelContent>,
}

impl ModelMessage {
    /// Single-text-block message.
    pub fn text(role: ModelRole, text: impl Into<String>) -> Self {
        Self {
            role,
            content: vec![ModelContent::Text { text: text.into() }],
        }
    }

    /// Concatenated text blocks.
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| match c {
                ModelContent::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Tool advertised to the model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: String,
    /// What the tool does.
    pub description: String,
    /// JSON Schema for the arguments.
    pub parameters: Value,
}

/// One model call.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelRequest {
    /// System instructions.
    pub instructions: String,
    /// Conversation, already windowed.
    pub messages: Vec<ModelMessage>,
    /// Tools the model may call.
    pub tools: Vec<ToolDefinition>,
    /// 1-based step number within the turn.
    pub step: usize,
}

/// Why the model stopped producing output for a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FinishReason {
    /// Natural end of output.
    Stop,
    /// The model wants tool results.
    ToolCalls,
    /// Output token limit reached.
    Length,
    /// Output was filtered.
    ContentFilter,
    /// Provider-specific reason.
    Other,
}

/// Events produced by a model stream.
#[derive(Clone, Debug, PartialEq)]
pub enum ModelEvent {
    /// Incremental text.
    TextDelta {
        /// Text fragment.
        delta: String,
    },
    /// A complete tool call.
    ToolCall {
        /// Call ID.
        tool_call_id: String,
        /// Tool name.
        tool_name: String,
        /// Arguments.
        input: Value,
    },
    /// End of this step's output.
    Finish {
        /// Why the step ended.
        reason: FinishReason,
    },
    /// The stream failed. No further events are read.
    Error(StreamError),
}

/// Boxed event stream returned by [`LanguageModel::stream`].
pub type ModelEventStream = Pin<Box<dyn Stream<Item = ModelEvent> + Send>>;

/// A streaming language model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier, for logs.
    fn model_id(&self) -> &str;

    /// Start one model call.
    async fn stream(&self, request: ModelRequest) -> Result<ModelEventStream, ModelError>;
}
