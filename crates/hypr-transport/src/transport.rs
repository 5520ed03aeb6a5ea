//! The chat transport.
//!
//! `send_messages` runs context injection on the caller's task, then spawns
//! the tool loop and hands back the receiving end immediately.

use std::sync::Arc;

use hypr_context::ExtractorRegistry;
use hypr_core::{ContextEntity, HyprUIMessage, MessageMetadata, Role, UiMessageChunk};
use hypr_settings::ChatSettings;
use metrics::counter;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, instrument};

use crate::agent::{ChunkSink, RunEnd, StopCondition, ToolLoopAgent, WindowPolicy};
use crate::context::{ContextInjector, ContextRenderer, ContextResolver, TemplateContextRenderer};
use crate::convert::to_model_messages;
use crate::errors::TransportError;
use crate::model::{LanguageModel, ModelMessage};
use crate::prompts;
use crate::stream::UiMessageStream;
use crate::tools::ToolRegistry;

/// Default chunk channel capacity.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// One send.
#[derive(Clone, Debug)]
pub struct SendMessagesRequest {
    /// Chat the messages belong to.
    pub chat_id: String,
    /// Full history, last message being the new user turn (or the assistant
    /// message to continue).
    pub messages: Vec<HyprUIMessage>,
    /// Caller-owned stop signal. A fresh token is used when `None`.
    pub cancel: Option<CancellationToken>,
}

impl SendMessagesRequest {
    /// Request without an external stop signal.
    pub fn new(chat_id: impl Into<String>, messages: Vec<HyprUIMessage>) -> Self {
        Self {
            chat_id: chat_id.into(),
            messages,
            cancel: None,
        }
    }

    /// Attach a stop signal.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Context-aware streaming chat transport.
pub struct ChatTransport {
    agent: Arc<ToolLoopAgent>,
    injector: ContextInjector,
    extractors: Arc<ExtractorRegistry>,
    channel_capacity: usize,
}

impl ChatTransport {
    /// Start building a transport around `model`.
    pub fn builder(model: Arc<dyn LanguageModel>, resolver: Arc<dyn ContextResolver>) -> ChatTransportBuilder {
        ChatTransportBuilder::new(model, resolver)
    }

    /// Send a turn and stream the response.
    ///
    /// Context is resolved and rendered before this returns; the model loop
    /// runs on a spawned task. The stream always ends with exactly one
    /// `finish`, `abort` or `error` chunk unless it is dropped first.
    #[instrument(skip_all, fields(chat_id = %request.chat_id, messages = request.messages.len()))]
    pub async fn send_messages(&self, request: SendMessagesRequest) -> UiMessageStream {
        let SendMessagesRequest {
            chat_id,
            messages,
            cancel,
        } = request;
        counter!("chat_turns_total").increment(1);
        info!("chat turn started");

        let augmented = self.injector.inject(&messages).await;
        let model_messages = to_model_messages(&augmented);
        let message_id = response_message_id(&messages);
        let created_at = chrono::Utc::now().timestamp_millis();

        let cancel = cancel.unwrap_or_default();
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let turn = run_turn(
            Arc::clone(&self.agent),
            chat_id,
            model_messages,
            ChunkSink::new(tx),
            cancel.clone(),
            message_id,
            created_at,
        );
        let _handle = tokio::spawn(turn.in_current_span());

        UiMessageStream::new(messages, rx, cancel)
    }

    /// Streams are not resumable; always `None`.
    pub async fn reconnect_to_stream(&self, chat_id: &str) -> Option<UiMessageStream> {
        debug!(chat_id, "reconnect requested; streams are not resumable");
        None
    }

    /// Context entities found in prior tool outputs of `messages`.
    pub fn tool_context(&self, messages: &[HyprUIMessage]) -> Vec<ContextEntity> {
        self.extractors.extract(messages)
    }

    /// Shared extractor registry.
    pub fn extractors(&self) -> &Arc<ExtractorRegistry> {
        &self.extractors
    }

    /// The configured agent.
    pub fn agent(&self) -> &ToolLoopAgent {
        &self.agent
    }
}

impl std::fmt::Debug for ChatTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatTransport")
            .field("stop_when", &self.agent.stop_condition())
            .field("window", &self.agent.window())
            .field("extractors", &self.extractors)
            .finish_non_exhaustive()
    }
}

/// Install the `tracing` subscriber described by `settings.logging`.
///
/// Returns `false` when a subscriber was already installed.
pub fn init_logging(settings: &ChatSettings) -> bool {
    hypr_core::logging::init_subscriber(&settings.logging.level, settings.logging.json)
}

/// Continue the last assistant message, or mint a new id.
fn response_message_id(messages: &[HyprUIMessage]) -> String {
    match messages.last() {
        Some(last) if last.role == Role::Assistant => last.id.clone(),
        _ => format!("msg_{}", uuid::Uuid::now_v7().simple()),
    }
}

async fn run_turn(
    agent: Arc<ToolLoopAgent>,
    chat_id: String,
    messages: Vec<ModelMessage>,
    sink: ChunkSink,
    cancel: CancellationToken,
    message_id: String,
    created_at: i64,
) {
    let start = UiMessageChunk::Start {
        message_id,
        message_metadata: Some(MessageMetadata {
            created_at: Some(created_at),
            ..MessageMetadata::default()
        }),
    };
    if !sink.emit(start).await {
        return;
    }

    let outcome = agent.run(&chat_id, messages, &sink, &cancel).await;
    info!(steps = outcome.steps, end = ?outcome.end, "chat turn finished");

    let terminal = match outcome.end {
        RunEnd::Completed | RunEnd::StepLimit => UiMessageChunk::Finish { message_metadata: None },
        RunEnd::Aborted => UiMessageChunk::Abort,
        RunEnd::Failed(error_text) => UiMessageChunk::Error { error_text },
        RunEnd::Disconnected => return,
    };
    let _ = sink.emit(terminal).await;
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for [`ChatTransport`].
pub struct ChatTransportBuilder {
    model: Arc<dyn LanguageModel>,
    resolver: Arc<dyn ContextResolver>,
    renderer: Option<Arc<dyn ContextRenderer>>,
    tools: ToolRegistry,
    extractors: Option<Arc<ExtractorRegistry>>,
    settings: ChatSettings,
    channel_capacity: usize,
}

impl ChatTransportBuilder {
    fn new(model: Arc<dyn LanguageModel>, resolver: Arc<dyn ContextResolver>) -> Self {
        Self {
            model,
            resolver,
            renderer: None,
            tools: ToolRegistry::new(),
            extractors: None,
            settings: (*hypr_settings::get_settings()).clone(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Replace the built-in template renderer.
    #[must_use]
    pub fn renderer(mut self, renderer: Arc<dyn ContextRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Tools the model may call.
    #[must_use]
    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    /// Share an extractor registry with the UI. Defaults to
    /// [`ExtractorRegistry::with_builtins`].
    #[must_use]
    pub fn extractors(mut self, extractors: Arc<ExtractorRegistry>) -> Self {
        self.extractors = Some(extractors);
        self
    }

    /// Step cap, window and instructions. Defaults to the global
    /// [`hypr_settings::get_settings`] value.
    #[must_use]
    pub fn settings(mut self, settings: &ChatSettings) -> Self {
        self.settings = settings.clone();
        self
    }

    /// Chunk channel capacity.
    #[must_use]
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Build the transport.
    pub fn build(self) -> Result<ChatTransport, TransportError> {
        let renderer = match self.renderer {
            Some(renderer) => renderer,
            None => Arc::new(TemplateContextRenderer::new()?),
        };
        let agent = ToolLoopAgent::new(self.model, Arc::new(self.tools))
            .with_instructions(prompts::instructions(self.settings.agent.instructions.as_deref()))
            .with_stop_condition(StopCondition::StepCountIs(self.settings.agent.max_tool_steps))
            .with_window(WindowPolicy::from(&self.settings.window));

        Ok(ChatTransport {
            agent: Arc::new(agent),
            injector: ContextInjector::new(self.resolver, renderer),
            extractors: self
                .extractors
                .unwrap_or_else(|| Arc::new(ExtractorRegistry::with_builtins())),
            channel_capacity: self.channel_capacity,
        })
    }
}
