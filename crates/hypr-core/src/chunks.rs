//! UI message stream chunks.
//!
//! [`UiMessageChunk`] is what the transport hands to the UI while a turn is
//! in flight. Chunks are transient (never persisted); the UI folds them into
//! a [`crate::HyprUIMessage`] which is what gets stored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::messages::MessageMetadata;

/// Events emitted while streaming an assistant response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum UiMessageChunk {
    /// Response started.
    #[serde(rename_all = "camelCase")]
    Start {
        /// ID of the assistant message being produced.
        message_id: String,
        /// Metadata to merge into the message (carries `createdAt`).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message_metadata: Option<MessageMetadata>,
    },

    /// An agent step (one model call) started.
    StartStep,

    /// Text block started.
    TextStart {
        /// Text block ID.
        id: String,
    },

    /// Incremental text content.
    TextDelta {
        /// Text block ID.
        id: String,
        /// Text fragment.
        delta: String,
    },

    /// Text block completed.
    TextEnd {
        /// Text block ID.
        id: String,
    },

    /// The model issued a complete tool call.
    #[serde(rename_all = "camelCase")]
    ToolInputAvailable {
        /// Tool call ID.
        tool_call_id: String,
        /// Tool name.
        tool_name: String,
        /// Tool arguments.
        input: Value,
    },

    /// A tool call produced output.
    #[serde(rename_all = "camelCase")]
    ToolOutputAvailable {
        /// Tool call ID.
        tool_call_id: String,
        /// Tool output.
        output: Value,
    },

    /// A tool call failed.
    #[serde(rename_all = "camelCase")]
    ToolOutputError {
        /// Tool call ID.
        tool_call_id: String,
        /// Error message.
        error_text: String,
    },

    /// An agent step finished.
    FinishStep,

    /// Response finished.
    #[serde(rename_all = "camelCase")]
    Finish {
        /// Metadata to merge into the message.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message_metadata: Option<MessageMetadata>,
    },

    /// The caller stopped the stream.
    Abort,

    /// The turn failed. `error_text` is already normalized for display.
    #[serde(rename_all = "camelCase")]
    Error {
        /// Display string.
        error_text: String,
    },
}

impl UiMessageChunk {
    /// Wire `type` of this chunk.
    pub fn chunk_type(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::StartStep => "start-step",
            Self::TextStart { .. } => "text-start",
            Self::TextDelta { .. } => "text-delta",
            Self::TextEnd { .. } => "text-end",
            Self::ToolInputAvailable { .. } => "tool-input-available",
            Self::ToolOutputAvailable { .. } => "tool-output-available",
            Self::ToolOutputError { .. } => "tool-output-error",
            Self::FinishStep => "finish-step",
            Self::Finish { .. } => "finish",
            Self::Abort => "abort",
            Self::Error { .. } => "error",
        }
    }

    /// True for chunks after which no more chunks follow.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finish { .. } | Self::Abort | Self::Error { .. })
    }
}
