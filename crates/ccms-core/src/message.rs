//! The semantic shape of one session message (spec.md §3, §4.1).
//!
//! The source system (a Go CLI) walks `interface{}` to pull text out of a
//! message. Here that becomes a closed tagged variant per message kind plus
//! an open "content part" enum: unknown part types fall into `Other` and
//! contribute no searchable text, which keeps the projection stable as the
//! upstream session format grows new part types.

use std::borrow::Cow;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// `type` field of a session JSONL record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    User,
    Assistant,
    System,
    Summary,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::User => "user",
            MessageKind::Assistant => "assistant",
            MessageKind::System => "system",
            MessageKind::Summary => "summary",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(MessageKind::User),
            "assistant" => Some(MessageKind::Assistant),
            "system" => Some(MessageKind::System),
            "summary" => Some(MessageKind::Summary),
            _ => None,
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `content` is either a bare string or an ordered sequence of typed parts.
#[derive(Debug, Clone)]
pub enum StringOrParts {
    String(String),
    Parts(Vec<ContentPart>),
    /// Present but neither shape spec.md §4.2 expects (e.g. a number, null,
    /// an object). Contributes no searchable text; the Message is kept so
    /// metadata filters still apply.
    Other,
}

/// One element of a `content` array.
#[derive(Debug, Clone)]
pub enum ContentPart {
    Text { text: String },
    Thinking { thinking: String },
    ToolUse,
    ToolResult { content: ToolResultContent },
    Image,
    /// Any `type` this model does not know about yet.
    Other,
}

/// `tool_result.content` is itself either a string or a nested sequence of
/// text-bearing parts (spec.md §3).
#[derive(Debug, Clone)]
pub enum ToolResultContent {
    String(String),
    Parts(Vec<ContentPart>),
    Other,
}

/// The payload variant named by `kind`.
#[derive(Debug, Clone)]
pub enum Payload {
    UserOrAssistant {
        #[allow(dead_code)]
        id: Option<String>,
        #[allow(dead_code)]
        role: Option<String>,
        content: StringOrParts,
    },
    System {
        content: String,
    },
    Summary {
        summary: String,
        #[allow(dead_code)]
        leaf_uuid: Option<String>,
    },
}

/// One parsed JSONL record.
#[derive(Debug, Clone)]
pub struct Message {
    pub kind: MessageKind,
    pub uuid: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub session_id: Option<String>,
    pub project_path: Option<PathBuf>,
    pub payload: Payload,
    /// Precomputed projection (spec.md §4.1). Computed once, eagerly, by the
    /// line parser rather than recomputed on every filter/query evaluation.
    pub searchable_text: String,
}

fn parts_text(parts: &[ContentPart]) -> Vec<&str> {
    let mut out = Vec::new();
    for part in parts {
        match part {
            ContentPart::Text { text } => out.push(text.as_str()),
            ContentPart::Thinking { thinking } => out.push(thinking.as_str()),
            ContentPart::ToolResult { content } => match content {
                ToolResultContent::String(s) => out.push(s.as_str()),
                ToolResultContent::Parts(inner) => out.extend(parts_text(inner)),
                ToolResultContent::Other => {}
            },
            ContentPart::ToolUse | ContentPart::Image | ContentPart::Other => {}
        }
    }
    out
}

/// Deterministic projection to the universe the query engine searches
/// (spec.md §4.1). Returns a borrowed view whenever no concatenation is
/// needed, matching the "borrowed slice when possible" guidance.
pub fn searchable_text<'a>(kind: MessageKind, payload: &'a Payload) -> Cow<'a, str> {
    match (kind, payload) {
        (_, Payload::System { content }) => Cow::Borrowed(content.as_str()),
        (_, Payload::Summary { summary, .. }) => Cow::Borrowed(summary.as_str()),
        (_, Payload::UserOrAssistant { content, .. }) => match content {
            StringOrParts::String(s) => Cow::Borrowed(s.as_str()),
            StringOrParts::Parts(parts) => {
                let fragments = parts_text(parts);
                Cow::Owned(fragments.join("\n"))
            }
            StringOrParts::Other => Cow::Borrowed(""),
        },
    }
}

/// Raw shape of one JSONL line, deserialized lazily: fields not needed to
/// build a `Message` are left as untyped `Value` and never walked.
#[derive(Debug, Deserialize)]
pub(crate) struct RawLine {
    #[serde(rename = "type")]
    pub r#type: Option<String>,
    pub uuid: Option<String>,
    #[serde(rename = "leafUuid")]
    pub leaf_uuid: Option<String>,
    pub timestamp: Option<String>,
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
    pub message: Option<RawInner>,
    pub content: Option<Value>,
    pub summary: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawInner {
    pub id: Option<String>,
    pub role: Option<String>,
    pub content: Option<Value>,
}

pub(crate) fn parse_content_value(value: &Value) -> StringOrParts {
    match value {
        Value::String(s) => StringOrParts::String(s.clone()),
        Value::Array(items) => StringOrParts::Parts(items.iter().map(parse_part).collect()),
        _ => StringOrParts::Other,
    }
}

fn parse_part(value: &Value) -> ContentPart {
    let ty = value.get("type").and_then(Value::as_str).unwrap_or("");
    match ty {
        "text" => ContentPart::Text {
            text: value
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string(),
        },
        "thinking" => ContentPart::Thinking {
            thinking: value
                .get("thinking")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string(),
        },
        "tool_use" => ContentPart::ToolUse,
        "tool_result" => {
            let content = match value.get("content") {
                Some(Value::String(s)) => ToolResultContent::String(s.clone()),
                Some(Value::Array(items)) => {
                    ToolResultContent::Parts(items.iter().map(parse_part).collect())
                }
                _ => ToolResultContent::Other,
            };
            ContentPart::ToolResult { content }
        }
        "image" => ContentPart::Image,
        _ => ContentPart::Other,
    }
}
