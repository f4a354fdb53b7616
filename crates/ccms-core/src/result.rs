//! Result record (spec.md §3): a full `Message` clone plus the originating
//! file path and rendered snippet. Immutable once produced.

use std::cmp::Ordering;
use std::path::PathBuf;

use crate::message::Message;

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub message: Message,
    pub file: PathBuf,
    pub snippet: String,
}

/// Ordered by timestamp ascending, ties broken by file path then uuid
/// (spec.md §3). A missing timestamp sorts before any present one — an
/// arbitrary but deterministic choice (DESIGN.md records it as a resolved
/// Open Question), consistent with `Option`'s derived ordering.
pub fn cmp(a: &SearchResult, b: &SearchResult) -> Ordering {
    a.message
        .timestamp
        .cmp(&b.message.timestamp)
        .then_with(|| a.file.cmp(&b.file))
        .then_with(|| a.message.uuid.cmp(&b.message.uuid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{MessageKind, Payload};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn result(ts: Option<i64>, file: &str, uuid: &str) -> SearchResult {
        SearchResult {
            message: Message {
                kind: MessageKind::User,
                uuid: uuid.to_string(),
                timestamp: ts.map(|s| Utc.timestamp_opt(s, 0).unwrap()),
                session_id: None,
                project_path: None,
                payload: Payload::System {
                    content: String::new(),
                },
                searchable_text: String::new(),
            },
            file: PathBuf::from(file),
            snippet: String::new(),
        }
    }

    #[test]
    fn sorts_by_timestamp_then_file_then_uuid() {
        let mut results = vec![
            result(Some(200), "b.jsonl", "z"),
            result(Some(100), "a.jsonl", "y"),
            result(Some(100), "a.jsonl", "a"),
            result(None, "c.jsonl", "q"),
        ];
        results.sort_by(cmp);
        let order: Vec<&str> = results.iter().map(|r| r.message.uuid.as_str()).collect();
        assert_eq!(order, vec!["q", "a", "y", "z"]);
    }
}
