//! Tool-output extractor registry.
//!
//! An extractor is a pure function from a tool's raw output to zero or more
//! [`ContextEntity`] values. The registry is an explicit object built at
//! application start and shared (via `Arc`) by both the UI-side extraction
//! and the transport; there is no module-global state.
//!
//! Tools without a registered extractor never surface in context.

use std::collections::HashMap;
use std::sync::Arc;

use hypr_core::constants::{SEARCH_KEY_QUALIFIER, SESSION_KEY_PREFIX};
use hypr_core::{ContextEntity, ContextSource, HyprUIMessage, SessionContext, ToolState};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use crate::compose::compose;
use crate::session_parse::parse_session_context;

/// Name of the built-in session search tool.
pub const SEARCH_SESSIONS_TOOL: &str = "search_sessions";

/// Shared extractor function.
pub type Extractor = Arc<dyn Fn(&Value) -> Vec<ContextEntity> + Send + Sync>;

/// Maps tool names to extractors.
///
/// Read-mostly: registration is expected at startup and overwrites any
/// previous extractor for the same name.
#[derive(Default)]
pub struct ExtractorRegistry {
    extractors: RwLock<HashMap<String, Extractor>>,
}

impl ExtractorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in extractors (`search_sessions`).
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        let _ = registry.register(SEARCH_SESSIONS_TOOL, extract_search_sessions);
        registry
    }

    /// Register `extractor` for `tool_name`.
    ///
    /// Returns `true` if an existing extractor was replaced.
    pub fn register<F>(&self, tool_name: impl Into<String>, extractor: F) -> bool
    where
        F: Fn(&Value) -> Vec<ContextEntity> + Send + Sync + 'static,
    {
        self.extractors
            .write()
            .insert(tool_name.into(), Arc::new(extractor))
            .is_some()
    }

    /// Look up the extractor for `tool_name`.
    pub fn get(&self, tool_name: &str) -> Option<Extractor> {
        self.extractors.read().get(tool_name).cloned()
    }

    /// Registered tool names, sorted.
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.extractors.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Run the extractor for one tool output. Unknown tools yield nothing.
    pub fn extract_output(&self, tool_name: &str, output: &Value) -> Vec<ContextEntity> {
        // Clone out of the lock so an extractor can never hold it.
        match self.get(tool_name) {
            Some(extractor) => extractor(output),
            None => Vec::new(),
        }
    }

    /// Scan `messages` for completed tool calls and extract their context.
    ///
    /// Only tool parts in `output-available` state qualify. Results are
    /// deduplicated by key across the whole scan, first occurrence wins.
    pub fn extract(&self, messages: &[HyprUIMessage]) -> Vec<ContextEntity> {
        let groups = messages
            .iter()
            .flat_map(HyprUIMessage::tool_parts)
            .filter(|part| part.state == ToolState::OutputAvailable)
            .filter_map(|part| {
                let Some(extractor) = self.get(&part.tool_name) else {
                    debug!(tool_name = %part.tool_name, "no extractor registered, skipping");
                    return None;
                };
                let output = part.output.as_ref().unwrap_or(&Value::Null);
                Some(extractor(output))
            });
        compose(groups)
    }
}

impl std::fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractorRegistry")
            .field("tools", &self.tool_names())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Built-in: search_sessions
// ─────────────────────────────────────────────────────────────────────────────

/// Extract sessions from `search_sessions` output.
///
/// Expects `{ results: [{ id, title?, excerpt?, sessionContext? }] }`. Each
/// result becomes a tool-sourced session keyed `session:search:<id>`. A
/// structured `sessionContext` is validated field by field; without one, a
/// minimal context is built from `title` and `excerpt`.
pub fn extract_search_sessions(output: &Value) -> Vec<ContextEntity> {
    let Some(results) = output.get("results").and_then(Value::as_array) else {
        debug!("search_sessions output has no results array");
        return Vec::new();
    };

    results
        .iter()
        .filter_map(|result| {
            let obj = result.as_object()?;
            let Some(id) = obj.get("id").and_then(result_id) else {
                debug!("search_sessions result without usable id, skipping");
                return None;
            };
            let title = obj.get("title").and_then(Value::as_str).map(str::to_owned);
            let excerpt = obj.get("excerpt").and_then(Value::as_str).map(str::to_owned);

            let session_context = match obj.get("sessionContext").and_then(parse_session_context) {
                Some(mut ctx) => {
                    if ctx.title.is_none() {
                        ctx.title = title;
                    }
                    ctx
                }
                None => SessionContext {
                    title,
                    raw_content: excerpt,
                    ..SessionContext::default()
                },
            };

            Some(ContextEntity::session(
                format!("{SESSION_KEY_PREFIX}:{SEARCH_KEY_QUALIFIER}:{id}"),
                Some(id),
                Some(ContextSource::Tool),
                session_context,
            ))
        })
        .collect()
}

/// IDs arrive as strings or integers depending on the backing store.
fn result_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}
