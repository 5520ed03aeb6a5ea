//! Chunk → message folding.

use std::collections::HashMap;

use hypr_core::{HyprUIMessage, MessageMetadata, MessagePart, Role, ToolPart, ToolState, UiMessageChunk};

/// Builds the assistant message a chunk stream describes.
///
/// When the last original message is from the assistant, its parts are
/// continued rather than replaced.
#[derive(Clone, Debug)]
pub struct UiMessageAccumulator {
    message: HyprUIMessage,
    continued: bool,
    text_parts: HashMap<String, usize>,
    tool_parts: HashMap<String, usize>,
    error: Option<String>,
    aborted: bool,
    finished: bool,
}

impl UiMessageAccumulator {
    /// Start accumulating a response to `original_messages`.
    pub fn new(original_messages: &[HyprUIMessage]) -> Self {
        let (message, continued) = match original_messages.last() {
            Some(last) if last.role == Role::Assistant => (last.clone(), true),
            _ => (HyprUIMessage::new(String::new(), Role::Assistant, Vec::new()), false),
        };
        Self {
            message,
            continued,
            text_parts: HashMap::new(),
            tool_parts: HashMap::new(),
            error: None,
            aborted: false,
            finished: false,
        }
    }

    /// Apply one chunk.
    pub fn apply(&mut self, chunk: &UiMessageChunk) {
        match chunk {
            UiMessageChunk::Start {
                message_id,
                message_metadata,
            } => {
                if !self.continued {
                    self.message.id.clone_from(message_id);
                }
                self.merge_metadata(message_metadata.as_ref());
            }
            UiMessageChunk::StartStep => self.message.parts.push(MessagePart::StepStart),
            UiMessageChunk::TextStart { id } => {
                let index = self.push(MessagePart::text(""));
                let _ = self.text_parts.insert(id.clone(), index);
            }
            UiMessageChunk::TextDelta { id, delta } => {
                let index = match self.text_parts.get(id) {
                    Some(&index) => index,
                    None => {
                        let index = self.push(MessagePart::text(""));
                        let _ = self.text_parts.insert(id.clone(), index);
                        index
                    }
                };
                if let Some(MessagePart::Text { text }) = self.message.parts.get_mut(index) {
                    text.push_str(delta);
                }
            }
            UiMessageChunk::TextEnd { id } => {
                let _ = self.text_parts.remove(id);
            }
            UiMessageChunk::ToolInputAvailable {
                tool_call_id,
                tool_name,
                input,
            } => {
                let index = self.push(MessagePart::Tool(ToolPart {
                    tool_name: tool_name.clone(),
                    tool_call_id: tool_call_id.clone(),
                    state: ToolState::InputAvailable,
                    input: Some(input.clone()),
                    output: None,
                    error_text: None,
                }));
                let _ = self.tool_parts.insert(tool_call_id.clone(), index);
            }
            UiMessageChunk::ToolOutputAvailable { tool_call_id, output } => {
                if let Some(part) = self.tool_part_mut(tool_call_id) {
                    part.state = ToolState::OutputAvailable;
                    part.output = Some(output.clone());
                }
            }
            UiMessageChunk::ToolOutputError {
                tool_call_id,
                error_text,
            } => {
                if let Some(part) = self.tool_part_mut(tool_call_id) {
                    part.state = ToolState::OutputError;
                    part.error_text = Some(error_text.clone());
                }
            }
            UiMessageChunk::FinishStep => {}
            UiMessageChunk::Finish { message_metadata } => {
                self.merge_metadata(message_metadata.as_ref());
                self.finished = true;
            }
            UiMessageChunk::Abort => self.aborted = true,
            UiMessageChunk::Error { error_text } => self.error = Some(error_text.clone()),
        }
    }

    /// The message so far.
    pub fn message(&self) -> &HyprUIMessage {
        &self.message
    }

    /// Normalized error text, if the stream failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// True once an `abort` chunk was applied.
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// True once a `finish` chunk was applied.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Consume into the message.
    pub fn into_message(self) -> HyprUIMessage {
        self.message
    }

    fn push(&mut self, part: MessagePart) -> usize {
        self.message.parts.push(part);
        self.message.parts.len() - 1
    }

    fn tool_part_mut(&mut self, tool_call_id: &str) -> Option<&mut ToolPart> {
        let index = *self.tool_parts.get(tool_call_id)?;
        match self.message.parts.get_mut(index) {
            Some(MessagePart::Tool(part)) => Some(part),
            _ => None,
        }
    }

    /// Keeps an existing `createdAt`. Extra fields from the stream overwrite.
    fn merge_metadata(&mut self, incoming: Option<&MessageMetadata>) {
        let Some(incoming) = incoming else { return };
        let metadata = self.message.metadata.get_or_insert_with(MessageMetadata::default);
        if metadata.created_at.is_none() {
            metadata.created_at = incoming.created_at;
        }
        for (key, value) in &incoming.extra {
            let _ = metadata.extra.insert(key.clone(), value.clone());
        }
    }
}
