//! Ref → session context lookup.

use async_trait::async_trait;
use hypr_core::{ContextRef, SessionContext};

use crate::errors::ResolveError;

/// Looks up the session a ref points at.
///
/// `Ok(None)` means the session no longer exists. Both `None` and errors
/// drop the ref from the rendered block; neither fails the turn.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContextResolver: Send + Sync {
    /// Resolve one ref.
    async fn resolve(&self, context_ref: &ContextRef) -> Result<Option<SessionContext>, ResolveError>;
}
