//! Line Parser (spec.md §4.2): decodes one JSONL line into a `Message`, or
//! reports why it could not, without ever failing the file scan.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::error::SkipReason;
use crate::message::{
    parse_content_value, Message, MessageKind, Payload, RawLine, StringOrParts,
};
use crate::query::RequiredLiteralSet;

/// The mandatory pre-filter (spec.md §4.2): a cheap, case-insensitive
/// substring search on the raw bytes, performed *before* any JSON parsing.
/// Returns `true` when the line can be safely skipped because none of the
/// required literals occur in it.
///
/// Must stay adjacent to line reading and ahead of `parse_line` — spec.md §9
/// calls this out as a contract, not an optimization, because the JSON
/// parsing work dominates once it runs unconditionally.
///
/// Lowercasing is full-Unicode (`str::to_lowercase`), matching how required
/// literals are lowercased at query-parse time (`query/parser.rs`) and how
/// `ast::contains_ci` compares them post-parse. An ASCII-only lowercase here
/// would desync from that and could reject a line the query would actually
/// match (e.g. a literal `"Café"` against a line containing `CAFÉ`) —
/// unsound per the §8 pre-filter invariant.
pub fn prefilter_reject(line: &[u8], required: &RequiredLiteralSet) -> bool {
    if required.is_empty() {
        return false;
    }
    let lowered = String::from_utf8_lossy(line).to_lowercase();
    !required.literals().iter().any(|lit| lowered.contains(lit.as_str()))
}

/// Decode one JSONL line into a `Message`. `project_path` is supplied by the
/// scanner — it is derived from the file's location, never from the record
/// itself (spec.md §3).
pub fn parse_line(line: &[u8], project_path: Option<PathBuf>) -> Result<Message, SkipReason> {
    if line.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(SkipReason::Empty);
    }

    let raw: RawLine = serde_json::from_slice(line).map_err(|_| SkipReason::MalformedJson)?;

    let kind = raw
        .r#type
        .as_deref()
        .and_then(MessageKind::parse)
        .ok_or(SkipReason::UnknownKind)?;

    let timestamp = raw
        .timestamp
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    let (payload, uuid) = match kind {
        MessageKind::User | MessageKind::Assistant => {
            let (id, role, content) = match &raw.message {
                Some(inner) => (
                    inner.id.clone(),
                    inner.role.clone(),
                    inner
                        .content
                        .as_ref()
                        .map(parse_content_value)
                        .unwrap_or(StringOrParts::Other),
                ),
                None => (None, None, StringOrParts::Other),
            };
            let payload = Payload::UserOrAssistant { id, role, content };
            let uuid = raw.uuid.unwrap_or_default();
            (payload, uuid)
        }
        MessageKind::System => {
            let content = match &raw.content {
                Some(serde_json::Value::String(s)) => s.clone(),
                _ => String::new(),
            };
            let payload = Payload::System { content };
            let uuid = raw.uuid.unwrap_or_default();
            (payload, uuid)
        }
        MessageKind::Summary => {
            let summary = match &raw.summary {
                Some(serde_json::Value::String(s)) => s.clone(),
                _ => String::new(),
            };
            let leaf_uuid = raw.leaf_uuid.clone();
            let payload = Payload::Summary {
                summary,
                leaf_uuid: leaf_uuid.clone(),
            };
            // spec.md §4.1: summaries fall back to leafUuid; if both are
            // missing, synthesize the empty string.
            let uuid = raw
                .uuid
                .filter(|s| !s.is_empty())
                .or(leaf_uuid)
                .unwrap_or_default();
            (payload, uuid)
        }
    };

    let searchable_text = crate::message::searchable_text(kind, &payload).into_owned();

    Ok(Message {
        kind,
        uuid,
        timestamp,
        session_id: raw.session_id,
        project_path,
        payload,
        searchable_text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Query;

    #[test]
    fn empty_line_is_skipped() {
        assert_eq!(parse_line(b"   ", None), Err(SkipReason::Empty));
    }

    #[test]
    fn malformed_json_is_skipped() {
        assert_eq!(parse_line(b"not json", None), Err(SkipReason::MalformedJson));
    }

    #[test]
    fn missing_type_is_unknown_kind() {
        assert_eq!(
            parse_line(br#"{"uuid":"a"}"#, None),
            Err(SkipReason::UnknownKind)
        );
    }

    #[test]
    fn user_message_with_string_content() {
        let line = br#"{"type":"user","uuid":"u1","timestamp":"2025-01-15T10:00:00Z","message":{"role":"user","content":"connection failed"}}"#;
        let msg = parse_line(line, None).unwrap();
        assert_eq!(msg.kind, MessageKind::User);
        assert_eq!(msg.searchable_text, "connection failed");
        assert!(msg.timestamp.is_some());
    }

    #[test]
    fn summary_falls_back_to_leaf_uuid() {
        let line = br#"{"type":"summary","leafUuid":"leaf-1","summary":"recap of session"}"#;
        let msg = parse_line(line, None).unwrap();
        assert_eq!(msg.uuid, "leaf-1");
        assert_eq!(msg.searchable_text, "recap of session");
    }

    #[test]
    fn summary_without_any_uuid_synthesizes_empty_string() {
        let line = br#"{"type":"summary","summary":"no ids here"}"#;
        let msg = parse_line(line, None).unwrap();
        assert_eq!(msg.uuid, "");
    }

    #[test]
    fn invalid_timestamp_does_not_fail_parse() {
        let line = br#"{"type":"system","timestamp":"not-a-date","content":"boot"}"#;
        let msg = parse_line(line, None).unwrap();
        assert!(msg.timestamp.is_none());
    }

    #[test]
    fn prefilter_rejects_lines_missing_every_required_literal() {
        let query: Query = "connection AND failed".parse().unwrap();
        let required = query.required_literals();
        assert!(!required.is_empty());

        assert!(prefilter_reject(b"nothing interesting here", &required));
        assert!(!prefilter_reject(b"a CONNECTION was failed", &required));
    }

    #[test]
    fn prefilter_lowercases_non_ascii_letters_too() {
        let query: Query = "\"café\"".parse().unwrap();
        let required = query.required_literals();
        assert!(!required.is_empty());

        // Uppercase accented form must still be found by the pre-filter, or
        // a line the query would have matched gets skipped before it's even
        // parsed as JSON.
        let line = "a message about CAFÉ culture".as_bytes();
        assert!(!prefilter_reject(line, &required));
    }
}
