//! What context gets stored with a message, and how a ref set is identified.
//!
//! Tool-found context and "whatever session is open right now" are both
//! re-derivable on replay, so neither is written to the stored message.
//! Everything else (manually added sessions, refs without provenance) is.

use hypr_core::{CURRENT_SESSION_CONTEXT_KEY, ContextEntity, ContextRef, ContextSource, HyprUIMessage, Keyed};
use serde_json::{Value, json};

use crate::compose::compose;

/// Refs worth storing: not tool-sourced and not the current-session key.
pub fn persistable_context_refs(refs: &[ContextRef]) -> Vec<ContextRef> {
    refs.iter()
        .filter(|r| r.source() != Some(ContextSource::Tool) && r.key() != CURRENT_SESSION_CONTEXT_KEY)
        .cloned()
        .collect()
}

/// Canonical identity string for a ref list.
///
/// Each ref is normalized to `{ kind, key, source: source ?? null, sessionId }`
/// and serialized with object keys sorted. Array order is preserved, so two
/// lists with the same refs in a different order fingerprint differently.
pub fn stable_context_fingerprint(refs: &[ContextRef]) -> String {
    let normalized = Value::Array(
        refs.iter()
            .map(|r| {
                json!({
                    "kind": r.kind(),
                    "key": r.key(),
                    "source": r.source().map(ContextSource::as_str),
                    "sessionId": r.session_id(),
                })
            })
            .collect(),
    );
    let mut out = String::new();
    write_sorted(&normalized, &mut out);
    out
}

/// Serialize `value` with object keys sorted at every depth.
fn write_sorted(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_sorted(item, out);
            }
            out.push(']');
        }
        Value::Object(obj) => {
            let mut entries: Vec<(&String, &Value)> = obj.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_sorted(item, out);
            }
            out.push('}');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Project entities to refs, deduplicated by key in first-seen order.
///
/// Entities without a ref projection (accounts, devices, unparseable
/// session keys) are skipped.
pub fn refs_for_entities(entities: &[ContextEntity]) -> Vec<ContextRef> {
    compose([entities.iter()])
        .into_iter()
        .filter_map(ContextEntity::to_ref)
        .collect()
}

/// Stamp `refs` onto an outgoing message's metadata.
///
/// An empty list clears `contextRefs` rather than writing `[]`.
#[must_use]
pub fn attach_context_refs(mut message: HyprUIMessage, refs: Vec<ContextRef>) -> HyprUIMessage {
    let metadata = message.metadata.get_or_insert_with(Default::default);
    metadata.context_refs = if refs.is_empty() { None } else { Some(refs) };
    message
}

/// The copy of `message` that should be written to chat history.
///
/// Refs are filtered through [`persistable_context_refs`]; nothing else
/// changes.
pub fn to_persistable_message(message: &HyprUIMessage) -> HyprUIMessage {
    let mut stored = message.clone();
    if let Some(metadata) = stored.metadata.as_mut() {
        if let Some(refs) = metadata.context_refs.take() {
            let kept = persistable_context_refs(&refs);
            metadata.context_refs = if kept.is_empty() { None } else { Some(kept) };
        }
    }
    stored
}

#[cfg(test)]
mod tests {
    use super::*;
    use hypr_core::entity::{AccountEntity, AccountInfo};
    use hypr_core::{MessageMetadata, SessionContext};

    fn r(key: &str, id: &str, source: Option<ContextSource>) -> ContextRef {
        ContextRef::session(key, id, source)
    }

    // ── persistable_context_refs ─────────────────────────────────────────

    #[test]
    fn filters_tool_and_current_session() {
        let refs = vec![
            r("session:search:1", "1", Some(ContextSource::Tool)),
            r("session:manual:2", "2", Some(ContextSource::Manual)),
            r("session:manual:3", "3", None),
            r(CURRENT_SESSION_CONTEXT_KEY, "4", Some(ContextSource::AutoCurrent)),
        ];
        let kept = persistable_context_refs(&refs);
        let keys: Vec<&str> = kept.iter().map(Keyed::key).collect();
        assert_eq!(keys, ["session:manual:2", "session:manual:3"]);
    }

    #[test]
    fn only_source_and_key_decide() {
        let refs = vec![r("session:manual:4", "4", Some(ContextSource::AutoCurrent))];
        assert_eq!(persistable_context_refs(&refs), refs);
    }

    #[test]
    fn current_session_key_filtered_regardless_of_source() {
        let refs = vec![
            r(CURRENT_SESSION_CONTEXT_KEY, "9", None),
            r(CURRENT_SESSION_CONTEXT_KEY, "9", Some(ContextSource::AutoCurrent)),
        ];
        assert!(persistable_context_refs(&refs).is_empty());
    }

    // ── stable_context_fingerprint ───────────────────────────────────────

    #[test]
    fn fingerprint_is_canonical() {
        let fp = stable_context_fingerprint(&[r("session:search:1", "1", Some(ContextSource::Tool))]);
        assert_eq!(
            fp,
            r#"[{"key":"session:search:1","kind":"session","sessionId":"1","source":"tool"}]"#
        );
    }

    #[test]
    fn absent_source_fingerprints_as_null() {
        let from_struct = stable_context_fingerprint(&[r("k", "1", None)]);
        let from_json: ContextRef = serde_json::from_value(json!({
            "sessionId": "1", "source": null, "key": "k", "kind": "session"
        }))
        .unwrap();
        assert_eq!(from_struct, stable_context_fingerprint(&[from_json]));
        assert!(from_struct.contains(r#""source":null"#));
    }

    #[test]
    fn fingerprint_preserves_list_order() {
        let a = r("session:manual:1", "1", None);
        let b = r("session:manual:2", "2", None);
        assert_ne!(
            stable_context_fingerprint(&[a.clone(), b.clone()]),
            stable_context_fingerprint(&[b, a])
        );
    }

    #[test]
    fn fingerprint_of_empty_list() {
        assert_eq!(stable_context_fingerprint(&[]), "[]");
    }

    #[test]
    fn sorted_writer_sorts_nested_objects() {
        let mut out = String::new();
        write_sorted(&json!({"b": {"z": 1, "a": [true, null]}, "a": "x\"y"}), &mut out);
        assert_eq!(out, r#"{"a":"x\"y","b":{"a":[true,null],"z":1}}"#);
    }

    // ── message helpers ──────────────────────────────────────────────────

    #[test]
    fn refs_for_entities_skips_non_sessions() {
        let entities = vec![
            ContextEntity::session(CURRENT_SESSION_CONTEXT_KEY, Some("7".into()), Some(ContextSource::AutoCurrent), SessionContext::default()),
            ContextEntity::Account(AccountEntity {
                key: "account:me".into(),
                source: None,
                info: AccountInfo::default(),
            }),
            ContextEntity::session("session:search:8", None, Some(ContextSource::Tool), SessionContext::default()),
            ContextEntity::session("session:search:8", Some("dup".into()), None, SessionContext::default()),
            ContextEntity::session("bogus", None, None, SessionContext::default()),
        ];
        let refs = refs_for_entities(&entities);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].session_id(), "7");
        assert_eq!(refs[1].session_id(), "8");
    }

    #[test]
    fn persistable_message_drops_ephemeral_refs() {
        let message = attach_context_refs(
            HyprUIMessage::user("m1", "what did we decide?"),
            vec![
                r(CURRENT_SESSION_CONTEXT_KEY, "1", Some(ContextSource::AutoCurrent)),
                r("session:manual:2", "2", Some(ContextSource::Manual)),
            ],
        );
        assert_eq!(message.context_refs().len(), 2);

        let stored = to_persistable_message(&message);
        assert_eq!(stored.context_refs().len(), 1);
        assert_eq!(stored.context_refs()[0].session_id(), "2");
        assert_eq!(stored.parts, message.parts);
    }

    #[test]
    fn persistable_message_omits_empty_ref_list() {
        let message = HyprUIMessage::user("m1", "hi").with_metadata(MessageMetadata {
            created_at: Some(1),
            context_refs: Some(vec![r("session:search:1", "1", Some(ContextSource::Tool))]),
            ..MessageMetadata::default()
        });
        let stored = to_persistable_message(&message);
        let metadata = stored.metadata.unwrap();
        assert!(metadata.context_refs.is_none());
        assert_eq!(metadata.created_at, Some(1));
    }

    #[test]
    fn attach_empty_clears_refs() {
        let message = attach_context_refs(HyprUIMessage::user("m", "x"), vec![]);
        assert!(message.metadata.unwrap().context_refs.is_none());
    }
}
