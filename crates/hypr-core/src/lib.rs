//! # hypr-core
//!
//! Foundation types for the Hypr chat transport.
//!
//! This crate provides the shared vocabulary that all other hypr crates depend on:
//!
//! - **Context entities**: [`entity::ContextEntity`] closed sum type with `Session`,
//!   `Account`, `Device` variants, plus the hydrated [`entity::SessionContext`]
//! - **Context refs**: [`entity::ContextRef`], the lean persistable handle for
//!   session-kind entities
//! - **Messages**: [`messages::HyprUIMessage`] with ordered [`messages::MessagePart`]s
//!   and [`messages::MessageMetadata`] (the one persisted wire contract)
//! - **Stream chunks**: [`chunks::UiMessageChunk`] events emitted to the UI
//! - **Logging**: [`logging::init_subscriber`] for `tracing` setup
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other hypr crates.

#![deny(unsafe_code)]

pub mod chunks;
pub mod constants;
pub mod entity;
pub mod logging;
pub mod messages;

pub use chunks::UiMessageChunk;
pub use constants::CURRENT_SESSION_CONTEXT_KEY;
pub use entity::{ContextEntity, ContextRef, ContextSource, Keyed, SessionContext};
pub use messages::{HyprUIMessage, MessageMetadata, MessagePart, Role, ToolPart, ToolState};
