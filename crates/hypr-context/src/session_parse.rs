//! Total parsing of untrusted session-context payloads.
//!
//! Tool output is model-adjacent data and can be wrong in any field. Each
//! field is checked on its own; a bad field becomes `None` (or is skipped
//! inside a list) without affecting its siblings.

use hypr_core::entity::{Participant, SessionEvent, Transcript, TranscriptSegment};
use hypr_core::SessionContext;
use serde_json::{Map, Value};

/// Parse a session-context object field by field.
///
/// Returns `None` only when `value` is not a JSON object.
pub fn parse_session_context(value: &Value) -> Option<SessionContext> {
    let obj = value.as_object()?;
    Some(SessionContext {
        title: string_field(obj, "title"),
        date: string_field(obj, "date"),
        raw_content: string_field(obj, "rawContent"),
        enhanced_content: string_field(obj, "enhancedContent"),
        transcript: obj.get("transcript").and_then(parse_transcript),
        participants: obj
            .get("participants")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(parse_participant).collect())
            .unwrap_or_default(),
        event: obj.get("event").and_then(parse_event),
    })
}

fn string_field(obj: &Map<String, Value>, name: &str) -> Option<String> {
    obj.get(name).and_then(Value::as_str).map(str::to_owned)
}

fn millis_field(obj: &Map<String, Value>, name: &str) -> Option<u64> {
    let value = obj.get(name)?;
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
}

/// Accepts `{ segments: [...] }` or a bare segment array.
fn parse_transcript(value: &Value) -> Option<Transcript> {
    let segments = match value {
        Value::Array(items) => items,
        Value::Object(obj) => obj.get("segments")?.as_array()?,
        _ => return None,
    };
    Some(Transcript {
        segments: segments.iter().filter_map(parse_segment).collect(),
    })
}

fn parse_segment(value: &Value) -> Option<TranscriptSegment> {
    let obj = value.as_object()?;
    Some(TranscriptSegment {
        speaker: string_field(obj, "speaker"),
        text: string_field(obj, "text")?,
        start_ms: millis_field(obj, "startMs"),
        end_ms: millis_field(obj, "endMs"),
    })
}

fn parse_participant(value: &Value) -> Option<Participant> {
    let obj = value.as_object()?;
    Some(Participant {
        name: string_field(obj, "name")?,
        job_title: string_field(obj, "jobTitle"),
    })
}

fn parse_event(value: &Value) -> Option<SessionEvent> {
    let name = value.as_object()?.get("name")?.as_str()?;
    Some(SessionEvent {
        name: name.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn full_payload() {
        let ctx = parse_session_context(&json!({
            "title": "Weekly sync",
            "date": "2026-10-01T10:00:00Z",
            "rawContent": "notes",
            "enhancedContent": "## Summary",
            "transcript": {"segments": [
                {"speaker": "Ana", "text": "Hello", "startMs": 0, "endMs": 1200}
            ]},
            "participants": [{"name": "Ana", "jobTitle": "PM"}],
            "event": {"name": "Weekly sync"}
        }))
        .unwrap();

        assert_eq!(ctx.title.as_deref(), Some("Weekly sync"));
        let segment = &ctx.transcript.unwrap().segments[0];
        assert_eq!(segment.end_ms, Some(1200));
        assert_eq!(ctx.participants[0].job_title.as_deref(), Some("PM"));
        assert_eq!(ctx.event.unwrap().name, "Weekly sync");
    }

    #[test]
    fn bad_fields_are_dropped_individually() {
        let ctx = parse_session_context(&json!({
            "title": 12,
            "date": "2026-10-01",
            "rawContent": null,
            "transcript": {"segments": [
                {"speaker": 1, "text": "kept"},
                {"speaker": "Bo"},
                "junk",
                {"text": "also kept", "startMs": -5, "endMs": "soon"}
            ]},
            "participants": [{"name": "Ana"}, {"jobTitle": "CEO"}, 7],
            "event": "not an object"
        }))
        .unwrap();

        assert!(ctx.title.is_none());
        assert_eq!(ctx.date.as_deref(), Some("2026-10-01"));
        assert!(ctx.raw_content.is_none());

        let segments = ctx.transcript.unwrap().segments;
        assert_eq!(segments.len(), 2);
        assert!(segments[0].speaker.is_none());
        assert!(segments[1].start_ms.is_none());
        assert!(segments[1].end_ms.is_none());

        assert_eq!(ctx.participants.len(), 1);
        assert!(ctx.event.is_none());
    }

    #[test]
    fn bare_segment_array_accepted() {
        let ctx = parse_session_context(&json!({
            "transcript": [{"text": "hi", "startMs": 1.5}]
        }))
        .unwrap();
        assert_eq!(ctx.transcript.unwrap().segments[0].start_ms, Some(1));
    }

    #[test]
    fn malformed_transcript_is_none() {
        let ctx = parse_session_context(&json!({"transcript": {"segments": "x"}})).unwrap();
        assert!(ctx.transcript.is_none());
    }

    #[test]
    fn non_object_is_none() {
        assert!(parse_session_context(&json!("x")).is_none());
        assert!(parse_session_context(&json!([])).is_none());
        assert!(parse_session_context(&Value::Null).is_none());
    }
}
