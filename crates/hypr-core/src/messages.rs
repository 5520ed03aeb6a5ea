//! UI chat messages.
//!
//! [`HyprUIMessage`] is one chat turn as the app stores and displays it:
//! a role, ordered [`MessagePart`]s, and optional [`MessageMetadata`].
//!
//! Metadata is the one persisted wire contract (`createdAt`, `contextRefs`).
//! It round-trips through stored chat history, so deserialization is
//! lenient: malformed refs are dropped, unknown fields are preserved.

use serde::de::{Deserializer, Error as _};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value, json};

use crate::constants::TOOL_PART_PREFIX;
use crate::entity::ContextRef;

// ─────────────────────────────────────────────────────────────────────────────
// Role
// ─────────────────────────────────────────────────────────────────────────────

/// Author of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions.
    System,
    /// The human.
    User,
    /// The model.
    Assistant,
}

// ─────────────────────────────────────────────────────────────────────────────
// Metadata
// ─────────────────────────────────────────────────────────────────────────────

/// Per-message metadata.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageMetadata {
    /// Creation time in milliseconds since the Unix epoch.
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<i64>,
    /// Context attached when the message was sent.
    #[serde(
        default,
        deserialize_with = "lenient_refs",
        skip_serializing_if = "Option::is_none"
    )]
    pub context_refs: Option<Vec<ContextRef>>,
    /// Fields written by newer app versions.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    let raw = Option::<Value>::deserialize(d)?;
    Ok(raw.and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64))))
}

fn lenient_refs<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<ContextRef>>, D::Error> {
    let raw = Option::<Value>::deserialize(d)?;
    Ok(match raw {
        Some(Value::Array(items)) => Some(items.iter().filter_map(ContextRef::from_value).collect()),
        _ => None,
    })
}

fn lenient_metadata<'de, D: Deserializer<'de>>(d: D) -> Result<Option<MessageMetadata>, D::Error> {
    let raw = Option::<Value>::deserialize(d)?;
    Ok(raw
        .filter(Value::is_object)
        .and_then(|v| serde_json::from_value(v).ok()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Parts
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle of a tool-call part.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolState {
    /// Arguments are still streaming in.
    InputStreaming,
    /// Arguments complete, not yet executed.
    InputAvailable,
    /// Executed successfully.
    OutputAvailable,
    /// Execution failed.
    OutputError,
}

impl ToolState {
    /// Wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InputStreaming => "input-streaming",
            Self::InputAvailable => "input-available",
            Self::OutputAvailable => "output-available",
            Self::OutputError => "output-error",
        }
    }

    /// Parse the wire representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "input-streaming" => Some(Self::InputStreaming),
            "input-available" => Some(Self::InputAvailable),
            "output-available" => Some(Self::OutputAvailable),
            "output-error" => Some(Self::OutputError),
            _ => None,
        }
    }
}

/// A tool call recorded on an assistant message. Serialized as `tool-<name>`.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolPart {
    /// Tool name (the part type without the `tool-` prefix).
    pub tool_name: String,
    /// Tool call ID. Empty when the wire part carried none.
    pub tool_call_id: String,
    /// Lifecycle state.
    pub state: ToolState,
    /// Tool arguments.
    pub input: Option<Value>,
    /// Tool output, when `state` is `output-available`.
    pub output: Option<Value>,
    /// Error text, when `state` is `output-error`.
    pub error_text: Option<String>,
}

/// One content part of a message.
#[derive(Clone, Debug, PartialEq)]
pub enum MessagePart {
    /// Plain text.
    Text {
        /// Text content.
        text: String,
    },
    /// Boundary between agent steps.
    StepStart,
    /// Tool call.
    Tool(ToolPart),
    /// Any part type this crate does not model, kept verbatim.
    Other(Value),
}

impl MessagePart {
    /// Build a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Wire `type` of this part.
    pub fn part_type(&self) -> String {
        match self {
            Self::Text { .. } => "text".to_owned(),
            Self::StepStart => "step-start".to_owned(),
            Self::Tool(tool) => format!("{TOOL_PART_PREFIX}{}", tool.tool_name),
            Self::Other(v) => v
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned(),
        }
    }

    /// Encode as the wire JSON object.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Text { text } => json!({ "type": "text", "text": text }),
            Self::StepStart => json!({ "type": "step-start" }),
            Self::Tool(tool) => {
                let mut obj = Map::new();
                let _ = obj.insert("type".into(), Value::String(self.part_type()));
                let _ = obj.insert("toolCallId".into(), Value::String(tool.tool_call_id.clone()));
                let _ = obj.insert("state".into(), Value::String(tool.state.as_str().into()));
                if let Some(input) = &tool.input {
                    let _ = obj.insert("input".into(), input.clone());
                }
                if let Some(output) = &tool.output {
                    let _ = obj.insert("output".into(), output.clone());
                }
                if let Some(error_text) = &tool.error_text {
                    let _ = obj.insert("errorText".into(), Value::String(error_text.clone()));
                }
                Value::Object(obj)
            }
            Self::Other(v) => v.clone(),
        }
    }

    /// Decode a wire JSON object. Never fails: unrecognized or malformed
    /// parts are kept as [`MessagePart::Other`].
    pub fn from_value(value: Value) -> Self {
        let Some(part_type) = value.get("type").and_then(Value::as_str) else {
            return Self::Other(value);
        };
        match part_type {
            "text" => match value.get("text").and_then(Value::as_str) {
                Some(text) => Self::text(text),
                None => Self::Other(value),
            },
            "step-start" => Self::StepStart,
            t if t.len() > TOOL_PART_PREFIX.len() && t.starts_with(TOOL_PART_PREFIX) => {
                Self::tool_from_value(&value).map_or(Self::Other(value), Self::Tool)
            }
            _ => Self::Other(value),
        }
    }

    fn tool_from_value(value: &Value) -> Option<ToolPart> {
        let part_type = value.get("type")?.as_str()?;
        let tool_name = part_type.strip_prefix(TOOL_PART_PREFIX)?;
        let tool_call_id = value
            .get("toolCallId")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let state = ToolState::parse(value.get("state")?.as_str()?)?;
        Some(ToolPart {
            tool_name: tool_name.to_owned(),
            tool_call_id: tool_call_id.to_owned(),
            state,
            input: value.get("input").cloned(),
            output: value.get("output").cloned(),
            error_text: value
                .get("errorText")
                .and_then(Value::as_str)
                .map(str::to_owned),
        })
    }
}

impl Serialize for MessagePart {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MessagePart {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if !value.is_object() {
            return Err(D::Error::custom("message part must be an object"));
        }
        Ok(Self::from_value(value))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HyprUIMessage
// ─────────────────────────────────────────────────────────────────────────────

/// One chat turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HyprUIMessage {
    /// Message ID.
    pub id: String,
    /// Author.
    pub role: Role,
    /// Ordered content parts.
    #[serde(default)]
    pub parts: Vec<MessagePart>,
    /// Optional metadata.
    #[serde(
        default,
        deserialize_with = "lenient_metadata",
        skip_serializing_if = "Option::is_none"
    )]
    pub metadata: Option<MessageMetadata>,
}

impl HyprUIMessage {
    /// Create a message with the given parts and no metadata.
    pub fn new(id: impl Into<String>, role: Role, parts: Vec<MessagePart>) -> Self {
        Self {
            id: id.into(),
            role,
            parts,
            metadata: None,
        }
    }

    /// Create a single-text-part user message.
    pub fn user(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, Role::User, vec![MessagePart::text(text)])
    }

    /// Create a single-text-part assistant message.
    pub fn assistant(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, Role::Assistant, vec![MessagePart::text(text)])
    }

    /// Attach metadata (builder style).
    #[must_use]
    pub fn with_metadata(mut self, metadata: MessageMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Refs attached to this message, or an empty slice.
    pub fn context_refs(&self) -> &[ContextRef] {
        self.metadata
            .as_ref()
            .and_then(|m| m.context_refs.as_deref())
            .unwrap_or_default()
    }

    /// Concatenated text of all text parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                MessagePart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Iterate over tool parts.
    pub fn tool_parts(&self) -> impl Iterator<Item = &ToolPart> {
        self.parts.iter().filter_map(|p| match p {
            MessagePart::Tool(tool) => Some(tool),
            _ => None,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
