//! # hypr-transport
//!
//! The send-message contract for one chat turn.
//!
//! - **Model**: [`model::LanguageModel`] trait, the external "given
//!   instructions, tools and messages, produce an event stream" capability
//! - **Tools**: [`tools::Tool`] trait and [`tools::ToolRegistry`]
//! - **Agent**: [`agent::ToolLoopAgent`] bounded tool loop with per-step
//!   history windowing
//! - **Context**: [`context::ContextInjector`] resolves message refs and
//!   prepends one rendered block per user message
//! - **Stream**: [`stream::UiMessageStream`] typed chunk channel with a stop
//!   signal, and [`stream::UiMessageAccumulator`] to fold it back into a message
//! - **Transport**: [`transport::ChatTransport`] wires it all together
//!
//! ## Crate Position
//!
//! Depends on: hypr-core, hypr-context, hypr-settings.
//!
//! ## Data Flow
//!
//! `send_messages` → inject context → convert to model messages →
//! `ToolLoopAgent::run` (window → model → tools → loop) → chunks → UI

#![deny(unsafe_code)]

pub mod agent;
pub mod context;
pub mod convert;
pub mod errors;
pub mod model;
pub mod prompts;
pub mod stream;
pub mod tools;
pub mod transport;

pub use agent::{AgentOutcome, RunEnd, StopCondition, ToolLoopAgent, WindowPolicy};
pub use context::{ContextInjector, ContextRenderer, ContextResolver, RenderOutput, TemplateContextRenderer};
pub use errors::{ModelError, ResolveError, StreamError, ToolError, TransportError, normalize_error};
pub use model::{LanguageModel, ModelEvent, ModelEventStream, ModelMessage, ModelRequest};
pub use stream::{UiMessageAccumulator, UiMessageStream};
pub use tools::{Tool, ToolContext, ToolRegistry};
pub use transport::{ChatTransport, ChatTransportBuilder, SendMessagesRequest, init_logging};
