//! The bounded tool-calling loop.
//!
//! Each step: window the history, call the model, forward its text and tool
//! calls to the UI, run the tools, append call/result messages, and decide
//! whether to go again. The loop owns the full history; only the windowed
//! slice is sent.

use std::sync::Arc;

use futures::StreamExt;
use hypr_core::UiMessageChunk;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::agent::chunk_sink::ChunkSink;
use crate::agent::stop::StopCondition;
use crate::agent::tool_executor::{ToolCall, execute_tool};
use crate::agent::window::WindowPolicy;
use crate::errors::{StreamError, normalize_error};
use crate::model::{LanguageModel, ModelContent, ModelEvent, ModelEventStream, ModelMessage, ModelRequest, ModelRole};
use crate::prompts::DEFAULT_INSTRUCTIONS;
use crate::tools::ToolRegistry;

/// How a run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunEnd {
    /// The model produced a step without tool calls.
    Completed,
    /// The stop condition was reached after a tool step.
    StepLimit,
    /// The cancellation token fired.
    Aborted,
    /// The model failed. Carries the normalized display string.
    Failed(String),
    /// The chunk receiver went away.
    Disconnected,
}

/// Result of [`ToolLoopAgent::run`].
#[derive(Clone, Debug)]
pub struct AgentOutcome {
    /// How the run ended.
    pub end: RunEnd,
    /// Model steps started.
    pub steps: usize,
    /// Full history including this turn's assistant and tool messages.
    pub messages: Vec<ModelMessage>,
}

/// Per-step output collected from the model stream.
#[derive(Debug, Default)]
struct StepOutput {
    text: String,
    tool_calls: Vec<ToolCall>,
}

impl StepOutput {
    fn assistant_message(&self) -> Option<ModelMessage> {
        let mut content = Vec::new();
        if !self.text.is_empty() {
            content.push(ModelContent::Text { text: self.text.clone() });
        }
        content.extend(self.tool_calls.iter().map(|c| ModelContent::ToolCall {
            tool_call_id: c.tool_call_id.clone(),
            tool_name: c.tool_name.clone(),
            input: c.input.clone(),
        }));
        (!content.is_empty()).then_some(ModelMessage {
            role: ModelRole::Assistant,
            content,
        })
    }
}

enum StepEnd {
    Done(StepOutput),
    Stopped(RunEnd),
}

/// Agent that alternates model calls and tool execution until the model
/// stops asking for tools or the stop condition is met.
pub struct ToolLoopAgent {
    model: Arc<dyn LanguageModel>,
    tools: Arc<ToolRegistry>,
    instructions: String,
    stop_when: StopCondition,
    window: WindowPolicy,
}

impl ToolLoopAgent {
    /// Agent with default instructions, a 5-step cap and the 20/10 window.
    pub fn new(model: Arc<dyn LanguageModel>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            model,
            tools,
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            stop_when: StopCondition::default(),
            window: WindowPolicy::default(),
        }
    }

    /// Replace the system instructions.
    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Replace the stop condition.
    #[must_use]
    pub fn with_stop_condition(mut self, stop_when: StopCondition) -> Self {
        self.stop_when = stop_when;
        self
    }

    /// Replace the per-step window.
    #[must_use]
    pub fn with_window(mut self, window: WindowPolicy) -> Self {
        self.window = window;
        self
    }

    /// System instructions.
    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// Stop condition.
    pub fn stop_condition(&self) -> StopCondition {
        self.stop_when
    }

    /// Per-step window.
    pub fn window(&self) -> WindowPolicy {
        self.window
    }

    /// Run the loop, emitting step/text/tool chunks into `sink`.
    ///
    /// `start`/`finish`/`abort`/`error` framing is left to the caller, which
    /// maps [`RunEnd`] onto the terminal chunk.
    #[instrument(skip_all, fields(chat_id = %chat_id, model = %self.model.model_id()))]
    pub async fn run(
        &self,
        chat_id: &str,
        mut messages: Vec<ModelMessage>,
        sink: &ChunkSink,
        cancel: &CancellationToken,
    ) -> AgentOutcome {
        let definitions = self.tools.definitions();
        let mut steps = 0;

        let end = loop {
            if cancel.is_cancelled() {
                break RunEnd::Aborted;
            }
            steps += 1;

            let window = self.window.apply(&messages);
            if window.len() < messages.len() {
                debug!(step = steps, total = messages.len(), sent = window.len(), "windowed history");
            }
            let request = ModelRequest {
                instructions: self.instructions.clone(),
                messages: window.to_vec(),
                tools: definitions.clone(),
                step: steps,
            };

            if !sink.emit(UiMessageChunk::StartStep).await {
                break RunEnd::Disconnected;
            }

            let stream = match self.model.stream(request).await {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(step = steps, error = %e, "model call failed");
                    break RunEnd::Failed(normalize_error(&StreamError::from(e)));
                }
            };

            let output = match consume_step(stream, steps, sink, cancel).await {
                StepEnd::Done(output) => output,
                StepEnd::Stopped(end) => break end,
            };

            if let Some(assistant) = output.assistant_message() {
                messages.push(assistant);
            }

            if output.tool_calls.is_empty() {
                let _ = sink.emit(UiMessageChunk::FinishStep).await;
                break RunEnd::Completed;
            }

            let mut results = Vec::with_capacity(output.tool_calls.len());
            let mut interrupted = None;
            for call in &output.tool_calls {
                if cancel.is_cancelled() {
                    interrupted = Some(RunEnd::Aborted);
                    break;
                }
                let (chunk, result) = match execute_tool(call, &self.tools, chat_id, cancel).await {
                    Ok(value) => (
                        UiMessageChunk::ToolOutputAvailable {
                            tool_call_id: call.tool_call_id.clone(),
                            output: value.clone(),
                        },
                        ModelContent::ToolResult {
                            tool_call_id: call.tool_call_id.clone(),
                            tool_name: call.tool_name.clone(),
                            output: value,
                            is_error: false,
                        },
                    ),
                    Err(e) => {
                        let error_text = e.to_string();
                        (
                            UiMessageChunk::ToolOutputError {
                                tool_call_id: call.tool_call_id.clone(),
                                error_text: error_text.clone(),
                            },
                            ModelContent::ToolResult {
                                tool_call_id: call.tool_call_id.clone(),
                                tool_name: call.tool_name.clone(),
                                output: Value::String(error_text),
                                is_error: true,
                            },
                        )
                    }
                };
                if !sink.emit(chunk).await {
                    interrupted = Some(RunEnd::Disconnected);
                    break;
                }
                results.push(result);
            }
            if !results.is_empty() {
                messages.push(ModelMessage {
                    role: ModelRole::Tool,
                    content: results,
                });
            }
            if let Some(end) = interrupted {
                break end;
            }

            if !sink.emit(UiMessageChunk::FinishStep).await {
                break RunEnd::Disconnected;
            }
            if self.stop_when.is_met(steps) {
                info!(steps, "step limit reached");
                break RunEnd::StepLimit;
            }
        };

        debug!(steps, end = ?end, "tool loop finished");
        AgentOutcome { end, steps, messages }
    }
}

/// Drain one model stream into `sink`, collecting text and tool calls.
async fn consume_step(
    mut stream: ModelEventStream,
    step: usize,
    sink: &ChunkSink,
    cancel: &CancellationToken,
) -> StepEnd {
    let mut output = StepOutput::default();
    let mut blocks = 0usize;
    let mut open_text: Option<String> = None;

    loop {
        let event = tokio::select! {
            biased;
            () = cancel.cancelled() => return StepEnd::Stopped(RunEnd::Aborted),
            event = stream.next() => event,
        };
        let Some(event) = event else { break };

        match event {
            ModelEvent::TextDelta { delta } => {
                if delta.is_empty() {
                    continue;
                }
                let id = if let Some(id) = &open_text {
                    id.clone()
                } else {
                    blocks += 1;
                    let id = format!("text-{step}-{blocks}");
                    if !sink.emit(UiMessageChunk::TextStart { id: id.clone() }).await {
                        return StepEnd::Stopped(RunEnd::Disconnected);
                    }
                    open_text = Some(id.clone());
                    id
                };
                output.text.push_str(&delta);
                if !sink.emit(UiMessageChunk::TextDelta { id, delta }).await {
                    return StepEnd::Stopped(RunEnd::Disconnected);
                }
            }
            ModelEvent::ToolCall {
                tool_call_id,
                tool_name,
                input,
            } => {
                if let Some(id) = open_text.take() {
                    if !sink.emit(UiMessageChunk::TextEnd { id }).await {
                        return StepEnd::Stopped(RunEnd::Disconnected);
                    }
                }
                let chunk = UiMessageChunk::ToolInputAvailable {
                    tool_call_id: tool_call_id.clone(),
                    tool_name: tool_name.clone(),
                    input: input.clone(),
                };
                if !sink.emit(chunk).await {
                    return StepEnd::Stopped(RunEnd::Disconnected);
                }
                output.tool_calls.push(ToolCall {
                    tool_call_id,
                    tool_name,
                    input,
                });
            }
            ModelEvent::Finish { reason } => {
                debug!(step, ?reason, "model step finished");
                break;
            }
            ModelEvent::Error(error) => {
                let text = normalize_error(&error);
                warn!(step, error = %text, "model stream error");
                return StepEnd::Stopped(RunEnd::Failed(text));
            }
        }
    }

    if let Some(id) = open_text.take() {
        if !sink.emit(UiMessageChunk::TextEnd { id }).await {
            return StepEnd::Stopped(RunEnd::Disconnected);
        }
    }
    StepEnd::Done(output)
}
