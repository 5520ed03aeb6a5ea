//! Shared fakes for transport integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use hypr_core::{ContextRef, ContextSource, HyprUIMessage, SessionContext, UiMessageChunk};
use hypr_transport::errors::{ModelError, ResolveError, ToolError};
use hypr_transport::model::{FinishReason, ModelEvent, ModelEventStream, ModelRequest, ToolDefinition};
use hypr_transport::{ContextResolver, LanguageModel, Tool, ToolContext, UiMessageStream};
use parking_lot::Mutex;
use serde_json::{Value, json};

// ─────────────────────────────────────────────────────────────────────────────
// Models
// ─────────────────────────────────────────────────────────────────────────────

/// One scripted model step.
pub enum Step {
    Events(Vec<ModelEvent>),
    Fail(ModelError),
}

/// Plays back one [`Step`] per call and records every request.
pub struct ScriptedModel {
    steps: Mutex<VecDeque<Step>>,
    pub requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedModel {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// A single text-only step.
    pub fn replying(text: &str) -> Arc<Self> {
        Self::new(vec![Step::Events(vec![delta(text), finish()])])
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn request(&self, index: usize) -> ModelRequest {
        self.requests.lock()[index].clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn model_id(&self) -> &str {
        "scripted"
    }

    async fn stream(&self, request: ModelRequest) -> Result<ModelEventStream, ModelError> {
        self.requests.lock().push(request);
        let step = self.steps.lock().pop_front();
        match step {
            Some(Step::Events(events)) => Ok(Box::pin(futures::stream::iter(events))),
            Some(Step::Fail(err)) => Err(err),
            None => Ok(Box::pin(futures::stream::iter(vec![finish()]))),
        }
    }
}

/// Emits a delta every few milliseconds until the consumer stops it.
pub struct SlowModel;

#[async_trait]
impl LanguageModel for SlowModel {
    fn model_id(&self) -> &str {
        "slow"
    }

    async fn stream(&self, _request: ModelRequest) -> Result<ModelEventStream, ModelError> {
        let events = async_stream::stream! {
            for i in 0..1000 {
                yield ModelEvent::TextDelta { delta: format!("{i} ") };
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            yield ModelEvent::Finish { reason: FinishReason::Stop };
        };
        Ok(Box::pin(events))
    }
}

pub fn delta(text: &str) -> ModelEvent {
    ModelEvent::TextDelta { delta: text.into() }
}

pub fn tool_call(id: &str, name: &str, input: Value) -> ModelEvent {
    ModelEvent::ToolCall {
        tool_call_id: id.into(),
        tool_name: name.into(),
        input,
    }
}

pub fn finish() -> ModelEvent {
    ModelEvent::Finish {
        reason: FinishReason::Stop,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Context
// ─────────────────────────────────────────────────────────────────────────────

/// Resolves refs by session id from a fixed map; unknown ids are `None`,
/// ids listed in `broken` fail.
#[derive(Default)]
pub struct MapResolver {
    sessions: HashMap<String, SessionContext>,
    broken: Vec<String>,
    pub calls: Mutex<Vec<String>>,
}

impl MapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(mut self, id: &str, title: &str, notes: &str) -> Self {
        let _ = self.sessions.insert(
            id.to_string(),
            SessionContext {
                title: Some(title.into()),
                raw_content: Some(notes.into()),
                ..SessionContext::default()
            },
        );
        self
    }

    pub fn with_broken(mut self, id: &str) -> Self {
        self.broken.push(id.to_string());
        self
    }
}

#[async_trait]
impl ContextResolver for MapResolver {
    async fn resolve(&self, context_ref: &ContextRef) -> Result<Option<SessionContext>, ResolveError> {
        let id = context_ref.session_id().to_string();
        self.calls.lock().push(id.clone());
        if self.broken.contains(&id) {
            return Err(ResolveError::Storage(format!("cannot read {id}")));
        }
        Ok(self.sessions.get(&id).cloned())
    }
}

pub fn manual_ref(id: &str) -> ContextRef {
    ContextRef::session(format!("session:manual:{id}"), id, Some(ContextSource::Manual))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tools
// ─────────────────────────────────────────────────────────────────────────────

/// Returns its input under `echo`.
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "echo".into(),
            description: "Echo the input".into(),
            parameters: json!({"type": "object"}),
        }
    }

    async fn execute(&self, input: Value, _ctx: &ToolContext) -> Result<Value, ToolError> {
        Ok(json!({ "echo": input }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Alternating user/assistant history ending with a user message.
pub fn history(len: usize) -> Vec<HyprUIMessage> {
    (0..len)
        .map(|i| {
            let offset = len - 1 - i;
            if offset % 2 == 0 {
                HyprUIMessage::user(format!("u{i}"), format!("question {i}"))
            } else {
                HyprUIMessage::assistant(format!("a{i}"), format!("answer {i}"))
            }
        })
        .collect()
}

pub async fn collect(stream: UiMessageStream) -> Vec<UiMessageChunk> {
    stream.collect().await
}

pub fn chunk_types(chunks: &[UiMessageChunk]) -> Vec<&'static str> {
    chunks.iter().map(UiMessageChunk::chunk_type).collect()
}
