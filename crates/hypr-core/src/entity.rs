//! Context entities and their persistable refs.
//!
//! Two families:
//!
//! - **[`ContextEntity`]**: a self-contained, displayable unit of background
//!   information (a session, the current account, the current device) that may
//!   be attached to a chat turn. Recomputed per render, never mutated in place.
//! - **[`ContextRef`]**: the lean handle stored on a message. Only session-kind
//!   entities project to a ref; account/device facts are rendered for the
//!   current turn only.
//!
//! Both are closed enums tagged by `kind`, so adding a kind forces every
//! consumer to handle it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::SESSION_KEY_PREFIX;

// ─────────────────────────────────────────────────────────────────────────────
// Keyed
// ─────────────────────────────────────────────────────────────────────────────

/// Anything identified by a globally unique dedup key.
pub trait Keyed {
    /// The dedup key (e.g. `session:search:42`).
    fn key(&self) -> &str;
}

impl<T: Keyed + ?Sized> Keyed for &T {
    fn key(&self) -> &str {
        (**self).key()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Provenance
// ─────────────────────────────────────────────────────────────────────────────

/// Where a piece of context came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContextSource {
    /// Surfaced by a completed tool call in the message history.
    Tool,
    /// Added by the user from the context bar.
    Manual,
    /// The session that is open in the app right now.
    AutoCurrent,
}

impl ContextSource {
    /// Wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tool => "tool",
            Self::Manual => "manual",
            Self::AutoCurrent => "auto-current",
        }
    }

    /// Parse the wire representation. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "tool" => Some(Self::Tool),
            "manual" => Some(Self::Manual),
            "auto-current" => Some(Self::AutoCurrent),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session context
// ─────────────────────────────────────────────────────────────────────────────

/// Hydrated view of a meeting or note. Hydration may be partial.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionContext {
    /// Session title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Session date as stored by the app (ISO 8601).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// The user's raw notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_content: Option<String>,
    /// AI-enhanced notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhanced_content: Option<String>,
    /// Ordered transcript segments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<Transcript>,
    /// People attending the session.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub participants: Vec<Participant>,
    /// Linked calendar event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<SessionEvent>,
}

impl SessionContext {
    /// True when no field carries any information.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.date.is_none()
            && self.raw_content.is_none()
            && self.enhanced_content.is_none()
            && self.transcript.as_ref().is_none_or(|t| t.segments.is_empty())
            && self.participants.is_empty()
            && self.event.is_none()
    }
}

/// Transcript of a session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transcript {
    /// Segments in spoken order.
    pub segments: Vec<TranscriptSegment>,
}

/// One speaker turn in a transcript.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptSegment {
    /// Speaker label, when diarization identified one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    /// Spoken text.
    pub text: String,
    /// Segment start offset in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_ms: Option<u64>,
    /// Segment end offset in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_ms: Option<u64>,
}

/// Session participant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Display name.
    pub name: String,
    /// Job title, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
}

/// Calendar event linked to a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    /// Event name.
    pub name: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Account / device facts
// ─────────────────────────────────────────────────────────────────────────────

/// Partial identity facts about the current user.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountInfo {
    /// Account user ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Full name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// Organization name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
}

/// Partial facts about the current machine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceInfo {
    /// OS family (`macos`, `windows`, `linux`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// CPU architecture.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    /// OS version string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
    /// App version string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    /// BCP 47 locale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// IANA timezone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// ContextEntity
// ─────────────────────────────────────────────────────────────────────────────

/// Session-kind entity payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEntity {
    /// Dedup key, `session:<qualifier>:<id>` or [`crate::CURRENT_SESSION_CONTEXT_KEY`].
    pub key: String,
    /// Provenance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ContextSource>,
    /// Session ID. Parsed from `key` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Hydrated session view.
    #[serde(default)]
    pub session_context: SessionContext,
    /// Whether the context bar lets the user remove this entity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removable: Option<bool>,
}

/// Account-kind entity payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccountEntity {
    /// Dedup key.
    pub key: String,
    /// Provenance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ContextSource>,
    /// Account facts.
    #[serde(flatten)]
    pub info: AccountInfo,
}

/// Device-kind entity payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeviceEntity {
    /// Dedup key.
    pub key: String,
    /// Provenance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ContextSource>,
    /// Device facts.
    #[serde(flatten)]
    pub info: DeviceInfo,
}

/// A piece of context the assistant should know about.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContextEntity {
    /// A meeting or note.
    Session(SessionEntity),
    /// The signed-in account.
    Account(AccountEntity),
    /// The current machine.
    Device(DeviceEntity),
}

impl ContextEntity {
    /// Build a session entity.
    pub fn session(
        key: impl Into<String>,
        session_id: Option<String>,
        source: Option<ContextSource>,
        session_context: SessionContext,
    ) -> Self {
        Self::Session(SessionEntity {
            key: key.into(),
            source,
            session_id,
            session_context,
            removable: None,
        })
    }

    /// Discriminant as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Session(_) => "session",
            Self::Account(_) => "account",
            Self::Device(_) => "device",
        }
    }

    /// Provenance, if recorded.
    pub fn source(&self) -> Option<ContextSource> {
        match self {
            Self::Session(e) => e.source,
            Self::Account(e) => e.source,
            Self::Device(e) => e.source,
        }
    }

    /// Project to a persistable [`ContextRef`].
    ///
    /// Only session entities have a ref. A missing `session_id` is recovered
    /// from a `session:<qualifier>:<id>` key; any other key yields `None`.
    pub fn to_ref(&self) -> Option<ContextRef> {
        match self {
            Self::Session(entity) => {
                let session_id = match &entity.session_id {
                    Some(id) => id.clone(),
                    None => session_id_from_key(&entity.key)?.to_owned(),
                };
                Some(ContextRef::Session {
                    key: entity.key.clone(),
                    source: entity.source,
                    session_id,
                })
            }
            Self::Account(_) | Self::Device(_) => None,
        }
    }
}

impl Keyed for ContextEntity {
    fn key(&self) -> &str {
        match self {
            Self::Session(e) => &e.key,
            Self::Account(e) => &e.key,
            Self::Device(e) => &e.key,
        }
    }
}

/// Recover the session ID from a `session:<qualifier>:<id>` key.
///
/// Everything after the qualifier is the ID, so IDs containing `:` survive.
pub fn session_id_from_key(key: &str) -> Option<&str> {
    let mut segments = key.splitn(3, ':');
    if segments.next() != Some(SESSION_KEY_PREFIX) {
        return None;
    }
    let _qualifier = segments.next()?;
    segments.next().filter(|id| !id.is_empty())
}

// ─────────────────────────────────────────────────────────────────────────────
// ContextRef
// ─────────────────────────────────────────────────────────────────────────────

/// Minimal, persistable pointer to a session-kind context entity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContextRef {
    /// Reference to a session.
    Session {
        /// Dedup key of the originating entity.
        key: String,
        /// Provenance of the originating entity.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source: Option<ContextSource>,
        /// Session to resolve.
        #[serde(rename = "sessionId")]
        session_id: String,
    },
}

impl ContextRef {
    /// Build a session ref.
    pub fn session(
        key: impl Into<String>,
        session_id: impl Into<String>,
        source: Option<ContextSource>,
    ) -> Self {
        Self::Session {
            key: key.into(),
            source,
            session_id: session_id.into(),
        }
    }

    /// Discriminant as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Session { .. } => "session",
        }
    }

    /// Provenance of the originating entity.
    pub fn source(&self) -> Option<ContextSource> {
        match self {
            Self::Session { source, .. } => *source,
        }
    }

    /// Session ID this ref points to.
    pub fn session_id(&self) -> &str {
        match self {
            Self::Session { session_id, .. } => session_id,
        }
    }

    /// Validate an untrusted JSON value as a ref.
    ///
    /// Requires `kind == "session"`, string `key` and `sessionId`, and a
    /// `source` that is absent, `null`, or one of the known values.
    /// Anything else is rejected with `None`; this never panics.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        if obj.get("kind").and_then(Value::as_str) != Some("session") {
            return None;
        }
        let key = obj.get("key")?.as_str()?;
        let session_id = obj.get("sessionId")?.as_str()?;
        let source = match obj.get("source") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(ContextSource::parse(s)?),
            Some(_) => return None,
        };
        Some(Self::session(key, session_id, source))
    }
}

impl Keyed for ContextRef {
    fn key(&self) -> &str {
        match self {
            Self::Session { key, .. } => key,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
