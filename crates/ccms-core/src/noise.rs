//! Claude Code protocol noise detection, used only by the optional
//! `--hide-noise` filter (SPEC_FULL.md §C.2). Never consulted by query
//! matching itself — every Message the query predicate accepts is still a
//! match; this only controls whether `FilterSet` additionally excludes it
//! from the reported results when the flag is set.

const SYSTEM_PREFIXES: &[&str] = &[
    "<local-command",
    "<command-",
    "<system-reminder>",
    "Caveat:",
];

const NOISE_PATTERNS: &[&str] = &[
    "[Request interrupted",
    "[Session resumed",
    "[Tool output truncated",
    "[Session paused",
    "[Connection lost",
];

/// `true` when `text` looks like Claude Code protocol plumbing rather than
/// a meaningful conversational turn.
pub fn is_noise(text: &str) -> bool {
    if text.is_empty() {
        return true;
    }
    if SYSTEM_PREFIXES.iter().any(|p| text.starts_with(p)) {
        return true;
    }
    NOISE_PATTERNS.iter().any(|p| text.contains(p))
}
