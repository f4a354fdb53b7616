//! Renders a `SearchOutcome` to stdout in one of the three formats spec.md
//! §6 names. JSON/JSONL build their own `serde_json::Value` objects rather
//! than deriving `Serialize` on `ccms_core::SearchResult` — the wire shape
//! (`timestamp`, `kind`, `uuid`, `sessionId?`, `file`, `text`) is a CLI
//! concern, not a property of the core result type.

use std::time::Duration;

use ccms_core::{Message, SearchOutcome, SearchResult};
use console::{style, Term};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
    Jsonl,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Format::Text),
            "json" => Ok(Format::Json),
            "jsonl" => Ok(Format::Jsonl),
            other => Err(format!("unknown format '{other}' (expected text|json|jsonl)")),
        }
    }
}

pub fn render(
    outcome: &SearchOutcome,
    format: Format,
    full_text: bool,
    elapsed: Duration,
    max_results: usize,
    color: bool,
) {
    match format {
        Format::Text => render_text(outcome, full_text, elapsed, max_results, color),
        Format::Json => {
            let values: Vec<Value> = outcome.results.iter().map(to_value).collect();
            println!("{}", serde_json::to_string_pretty(&values).unwrap());
        }
        Format::Jsonl => {
            for result in &outcome.results {
                println!("{}", to_value(result));
            }
        }
    }
}

fn to_value(result: &SearchResult) -> Value {
    let msg = &result.message;
    json!({
        "timestamp": msg.timestamp.map(|ts| ts.to_rfc3339()),
        "kind": msg.kind.as_str(),
        "uuid": msg.uuid,
        "sessionId": msg.session_id,
        "file": result.file.to_string_lossy(),
        "text": result.snippet,
    })
}

fn render_text(
    outcome: &SearchOutcome,
    full_text: bool,
    elapsed: Duration,
    max_results: usize,
    color: bool,
) {
    let term = Term::stdout();
    let _ = &term;

    for result in &outcome.results {
        println!("{}", header_line(&result.message, &result.file, color));
        let body = if full_text {
            result.message.searchable_text.clone()
        } else {
            result.snippet.clone()
        };
        println!("{body}");
        println!();
    }

    println!(
        "⏱  Search completed in {}ms",
        elapsed.as_millis()
    );
    if max_results != 0 && outcome.total_matches > outcome.results.len() as u64 {
        println!(
            "(Showing {} of {} total results)",
            outcome.results.len(),
            outcome.total_matches
        );
    }
}

fn header_line(msg: &Message, file: &std::path::Path, color: bool) -> String {
    let timestamp = msg
        .timestamp
        .map(|ts| ts.to_rfc3339())
        .unwrap_or_else(|| "unknown".to_string());
    let filename = file
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_else(|| file.to_string_lossy().to_string());

    if color {
        format!(
            "{} {} [{}] {}",
            style(timestamp).dim(),
            style(msg.kind.as_str()).cyan().bold(),
            filename,
            msg.uuid
        )
    } else {
        format!("{timestamp} {} [{filename}] {}", msg.kind.as_str(), msg.uuid)
    }
}

/// `--no-color` or `NO_COLOR` (spec.md §6) disables ANSI output.
pub fn color_enabled(no_color_flag: bool) -> bool {
    if no_color_flag {
        return false;
    }
    std::env::var_os("NO_COLOR").is_none()
}
