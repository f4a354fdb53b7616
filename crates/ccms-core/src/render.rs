//! Result Renderer (spec.md §4.7): turns a message's searchable text and a
//! query into a short, display-safe snippet.

use crate::query::Query;

const CONTEXT_CHARS: usize = 50;
const FALLBACK_CHARS: usize = 100;

/// Builds the snippet shown alongside a result: `CONTEXT_CHARS` characters
/// of context on either side of the query's first match, with embedded
/// newlines and tabs flattened to spaces and `...` markers where the
/// window doesn't reach the start/end of the text. Falls back to the first
/// `FALLBACK_CHARS` characters when the query can't report a match
/// location (e.g. a top-level `NOT`).
pub fn snippet(text: &str, query: &Query) -> String {
    match query.locate(text) {
        Some((start_byte, end_byte)) => windowed(text, start_byte, end_byte),
        None => fallback(text),
    }
}

fn windowed(text: &str, start_byte: usize, end_byte: usize) -> String {
    let offsets: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
    let char_len = offsets.len();

    let start_ci = offsets
        .iter()
        .position(|&b| b >= start_byte)
        .unwrap_or(char_len);
    let end_ci = offsets
        .iter()
        .position(|&b| b >= end_byte)
        .unwrap_or(char_len);

    let window_start = start_ci.saturating_sub(CONTEXT_CHARS);
    let window_end = (end_ci + CONTEXT_CHARS).min(char_len);

    let prefix = if window_start > 0 { "..." } else { "" };
    let suffix = if window_end < char_len { "..." } else { "" };

    let body: String = text
        .chars()
        .skip(window_start)
        .take(window_end - window_start)
        .map(flatten)
        .collect();

    format!("{prefix}{body}{suffix}")
}

fn fallback(text: &str) -> String {
    let truncated = text.chars().count() > FALLBACK_CHARS;
    let body: String = text.chars().take(FALLBACK_CHARS).map(flatten).collect();
    if truncated {
        format!("{body}...")
    } else {
        body
    }
}

fn flatten(c: char) -> char {
    if c == '\n' || c == '\t' {
        ' '
    } else {
        c
    }
}
