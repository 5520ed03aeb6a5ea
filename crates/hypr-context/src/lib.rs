//! # hypr-context
//!
//! Everything that turns "things the assistant should know about" into a
//! clean, ordered, deduplicated context set.
//!
//! - **Extractors**: [`extractors::ExtractorRegistry`] maps tool names to pure
//!   functions that turn tool output into [`hypr_core::ContextEntity`] values
//! - **Parsing**: [`session_parse::parse_session_context`] total, field-by-field
//!   validation of untrusted session payloads
//! - **Composition**: [`compose::compose`] ordered union by key
//! - **Persistence**: [`persistence::persistable_context_refs`] and
//!   [`persistence::stable_context_fingerprint`]
//!
//! ## Crate Position
//!
//! Depends on: hypr-core.
//! Depended on by: hypr-transport.
//!
//! ## Key Invariant
//!
//! Nothing in this crate fails. Malformed input yields fewer or emptier
//! entities, never an error.

#![deny(unsafe_code)]

pub mod compose;
pub mod extractors;
pub mod persistence;
pub mod session_parse;

pub use compose::compose;
pub use extractors::{Extractor, ExtractorRegistry, SEARCH_SESSIONS_TOOL};
pub use persistence::{
    attach_context_refs, persistable_context_refs, refs_for_entities, stable_context_fingerprint,
    to_persistable_message,
};
pub use session_parse::parse_session_context;
