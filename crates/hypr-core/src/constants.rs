//! Shared constants.

/// Reserved key for the session that is currently open in the app.
///
/// Entities and refs with this key are derivable from live application
/// state on replay and are never persisted with a message.
pub const CURRENT_SESSION_CONTEXT_KEY: &str = "session:current";

/// Key prefix segment shared by every session-kind entity.
pub const SESSION_KEY_PREFIX: &str = "session";

/// Qualifier used for sessions surfaced by the `search_sessions` tool.
pub const SEARCH_KEY_QUALIFIER: &str = "search";

/// Message part type prefix for tool-call parts (`tool-<name>`).
pub const TOOL_PART_PREFIX: &str = "tool-";
