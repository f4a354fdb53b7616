//! Error taxonomy for the CCMS search pipeline.
//!
//! Split along the line spec.md §7 draws: fatal errors that bubble out of
//! `main` before any worker starts, and recoverable ones that are captured
//! per-file and never abort the scan.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors: malformed CLI input, an unparseable glob, or a query/regex
/// that failed to compile. All of these are detected before dispatch and
/// exit the process with a non-zero code (see `ccms-cli`).
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid glob pattern '{pattern}': {reason}")]
    GlobError { pattern: String, reason: String },

    #[error("query parse error at position {position}: expected {expected}")]
    QueryParseError { position: usize, expected: String },

    #[error("invalid regex /{pattern}/: {reason}")]
    InvalidRegex { pattern: String, reason: String },
}

/// Reasons a single JSONL line was not turned into a `Message`. Never fatal:
/// the scanner logs and moves on to the next line (spec.md §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The line was empty or whitespace-only.
    Empty,
    /// The line did not parse as a JSON object at all, or parsed but did not
    /// fit the shapes `ccms_core::message` understands.
    MalformedJson,
    /// The line parsed as JSON but `type` was missing or not one of
    /// `user`/`assistant`/`system`/`summary`.
    UnknownKind,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SkipReason::Empty => "empty line",
            SkipReason::MalformedJson => "malformed JSON",
            SkipReason::UnknownKind => "unknown message kind",
        };
        write!(f, "{s}")
    }
}

/// A recoverable failure encountered while scanning one file. Aggregated by
/// the coordinator into a diagnostics vector (spec.md §4.3, §7) and never
/// propagated as a scan failure.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("I/O error reading {path} after {lines_processed} lines: {source}")]
    Io {
        path: PathBuf,
        lines_processed: usize,
        #[source]
        source: std::io::Error,
    },
}

/// One entry in the coordinator's diagnostics vector: either a per-file scan
/// failure or a per-line skip, tagged with enough context for `-v` output.
#[derive(Debug)]
pub enum Diagnostic {
    Scan {
        path: PathBuf,
        error: ScanError,
    },
    Skip {
        path: PathBuf,
        line_number: usize,
        reason: SkipReason,
    },
    LineTooLong {
        path: PathBuf,
        line_number: usize,
        byte_len: usize,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::Scan { path, error } => write!(f, "{}: {error}", path.display()),
            Diagnostic::Skip {
                path,
                line_number,
                reason,
            } => write!(f, "{}:{line_number}: {reason}", path.display()),
            Diagnostic::LineTooLong {
                path,
                line_number,
                byte_len,
            } => write!(
                f,
                "{}:{line_number}: line too long ({byte_len} bytes), skipped",
                path.display()
            ),
        }
    }
}
