//! Per-message context injection.
//!
//! For every user message carrying `contextRefs`: dedupe by key, resolve
//! each ref in order, render the survivors, and prepend the block as a new
//! leading text part. Blocks are cached for the duration of one call under
//! the canonical fingerprint of the deduplicated refs, so a ref list repeated
//! in the same order is rendered once. A reordered list renders its own
//! block in its own order.

use std::collections::HashMap;
use std::sync::Arc;

use hypr_context::{compose, stable_context_fingerprint};
use hypr_core::{ContextRef, HyprUIMessage, Keyed, MessagePart, Role};
use metrics::counter;
use tracing::{debug, warn};

use crate::context::renderer::ContextRenderer;
use crate::context::resolver::ContextResolver;

/// Resolves and renders message context, then prepends it.
#[derive(Clone)]
pub struct ContextInjector {
    resolver: Arc<dyn ContextResolver>,
    renderer: Arc<dyn ContextRenderer>,
}

impl ContextInjector {
    /// Create an injector.
    pub fn new(resolver: Arc<dyn ContextResolver>, renderer: Arc<dyn ContextRenderer>) -> Self {
        Self { resolver, renderer }
    }

    /// Augmented copy of `messages`.
    ///
    /// Messages that are not from the user, have no refs, or whose refs all
    /// fail to resolve are returned unchanged. Ids and metadata are never
    /// touched.
    pub async fn inject(&self, messages: &[HyprUIMessage]) -> Vec<HyprUIMessage> {
        let mut cache: HashMap<String, Option<String>> = HashMap::new();
        let mut out = Vec::with_capacity(messages.len());
        for message in messages {
            out.push(self.inject_one(message, &mut cache).await);
        }
        out
    }

    async fn inject_one(&self, message: &HyprUIMessage, cache: &mut HashMap<String, Option<String>>) -> HyprUIMessage {
        if message.role != Role::User {
            return message.clone();
        }
        let refs: Vec<ContextRef> = compose([message.context_refs().iter().cloned()]);
        if refs.is_empty() {
            return message.clone();
        }

        let key = stable_context_fingerprint(&refs);
        let block = if let Some(block) = cache.get(&key) {
            debug!(id = %message.id, "context block cache hit");
            block.clone()
        } else {
            let block = self.render_block(&refs).await;
            let _ = cache.insert(key, block.clone());
            block
        };

        let Some(block) = block else {
            return message.clone();
        };
        let mut augmented = message.clone();
        augmented.parts.insert(0, MessagePart::text(format!("{block}\n\n")));
        augmented
    }

    async fn render_block(&self, refs: &[ContextRef]) -> Option<String> {
        let mut contexts = Vec::with_capacity(refs.len());
        for context_ref in refs {
            match self.resolver.resolve(context_ref).await {
                Ok(Some(ctx)) => contexts.push(ctx),
                Ok(None) => warn!(key = context_ref.key(), "context ref did not resolve"),
                Err(e) => warn!(key = context_ref.key(), error = %e, "context ref failed to resolve"),
            }
        }
        if contexts.is_empty() {
            return None;
        }

        let output = self.renderer.render(&contexts).await;
        if let Some(error) = &output.error {
            warn!(error = %error, "context render failed");
        }
        let block = output.into_block()?;
        counter!("chat_context_blocks_rendered_total").increment(1);
        debug!(refs = refs.len(), resolved = contexts.len(), "rendered context block");
        Some(block)
    }
}

impl std::fmt::Debug for ContextInjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextInjector").finish_non_exhaustive()
    }
}
