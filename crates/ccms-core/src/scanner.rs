//! File Scanner (spec.md §4.3): streams one file line by line, owns its own
//! I/O buffer, and feeds each line to the Line Parser.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::warn;

use crate::error::{ScanError, SkipReason};
use crate::message::Message;
use crate::parser;
use crate::project;
use crate::query::RequiredLiteralSet;

/// Initial internal buffer size for the underlying `BufReader`.
const INITIAL_BUFFER: usize = 10 * 1024 * 1024;

/// A single logical line may grow the scratch buffer up to this many bytes
/// before it is abandoned with a `LineTooLong` diagnostic (spec.md §4.3:
/// "raise as needed... ceiling (>= 64 MiB)").
const LINE_CEILING: usize = 64 * 1024 * 1024;

pub struct ScanStats {
    pub lines_processed: usize,
}

/// One outcome per non-empty line read from the file.
pub enum ScanEvent {
    Message(Box<Message>),
    Skip {
        line_number: usize,
        reason: SkipReason,
    },
    LineTooLong {
        line_number: usize,
        byte_len: usize,
    },
}

/// Scans `path`, calling `on_event` for every line. Returns the count of
/// lines processed whether or not an I/O error eventually terminates the
/// scan early — the caller (the coordinator) logs and moves on to the next
/// file rather than aborting the whole run (spec.md §4.3, §7).
pub fn scan_file(
    path: &Path,
    required: &RequiredLiteralSet,
    cancelled: &AtomicBool,
    mut on_event: impl FnMut(ScanEvent),
) -> Result<ScanStats, (ScanError, ScanStats)> {
    let project_path = project::derive_project_path(path);

    let file = File::open(path).map_err(|e| {
        warn!(path = %path.display(), error = %e, "failed to open file for scanning");
        let err = match e.kind() {
            io::ErrorKind::NotFound => ScanError::NotFound {
                path: path.to_path_buf(),
            },
            io::ErrorKind::PermissionDenied => ScanError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => ScanError::Io {
                path: path.to_path_buf(),
                lines_processed: 0,
                source: e,
            },
        };
        (err, ScanStats { lines_processed: 0 })
    })?;

    let mut reader = BufReader::with_capacity(INITIAL_BUFFER, file);
    let mut line_buf: Vec<u8> = Vec::with_capacity(4096);
    let mut line_number = 0usize;

    loop {
        if cancelled.load(Ordering::Relaxed) {
            break;
        }

        match read_bounded_line(&mut reader, &mut line_buf, LINE_CEILING) {
            Ok(LineOutcome::Eof) => break,
            Ok(LineOutcome::Line) => {
                line_number += 1;
                if line_buf.is_empty() {
                    continue;
                }
                if parser::prefilter_reject(&line_buf, required) {
                    continue;
                }
                match parser::parse_line(&line_buf, project_path.clone()) {
                    Ok(msg) => on_event(ScanEvent::Message(Box::new(msg))),
                    Err(SkipReason::Empty) => {}
                    Err(reason) => on_event(ScanEvent::Skip {
                        line_number,
                        reason,
                    }),
                }
            }
            Ok(LineOutcome::TooLong(byte_len)) => {
                line_number += 1;
                on_event(ScanEvent::LineTooLong {
                    line_number,
                    byte_len,
                });
            }
            Err(source) => {
                warn!(
                    path = %path.display(),
                    lines_processed = line_number,
                    error = %source,
                    "I/O error mid-file, abandoning this file"
                );
                return Err((
                    ScanError::Io {
                        path: path.to_path_buf(),
                        lines_processed: line_number,
                        source,
                    },
                    ScanStats {
                        lines_processed: line_number,
                    },
                ));
            }
        }
    }

    Ok(ScanStats { lines_processed: line_number })
}

enum LineOutcome {
    Eof,
    Line,
    TooLong(usize),
}

/// Reads one `\n`-terminated (or EOF-terminated) line into `buf`, refusing
/// to grow `buf` past `ceiling` bytes. Lines beyond the ceiling are still
/// fully consumed from the reader (so scanning resumes at the right byte)
/// but are not retained in memory.
fn read_bounded_line(
    reader: &mut impl BufRead,
    buf: &mut Vec<u8>,
    ceiling: usize,
) -> io::Result<LineOutcome> {
    buf.clear();
    let mut total_len = 0usize;
    let mut exceeded = false;

    loop {
        let available = reader.fill_buf()?;
        if available.is_empty() {
            return Ok(if total_len == 0 {
                LineOutcome::Eof
            } else if exceeded {
                LineOutcome::TooLong(total_len)
            } else {
                LineOutcome::Line
            });
        }

        if let Some(pos) = available.iter().position(|&b| b == b'\n') {
            total_len += pos;
            if !exceeded {
                if buf.len() + pos <= ceiling {
                    buf.extend_from_slice(&available[..pos]);
                } else {
                    exceeded = true;
                }
            }
            reader.consume(pos + 1);
            // Trim a trailing '\r' for CRLF-terminated files.
            if !exceeded && buf.last() == Some(&b'\r') {
                buf.pop();
            }
            return Ok(if exceeded {
                LineOutcome::TooLong(total_len)
            } else {
                LineOutcome::Line
            });
        }

        total_len += available.len();
        if !exceeded {
            if buf.len() + available.len() <= ceiling {
                buf.extend_from_slice(available);
            } else {
                exceeded = true;
            }
        }
        let consumed = available.len();
        reader.consume(consumed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Query;
    use std::io::Write;
    use std::sync::atomic::AtomicBool;
    use tempfile::NamedTempFile;

    fn required_for(src: &str) -> RequiredLiteralSet {
        let q = Query::parse(src).unwrap();
        q.required_literals()
    }

    #[test]
    fn scans_valid_and_malformed_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"type":"user","uuid":"u1","message":{{"role":"user","content":"foo"}}}}"#
        )
        .unwrap();
        writeln!(file, "not json").unwrap();

        let required = RequiredLiteralSet::default();
        let cancelled = AtomicBool::new(false);
        let mut messages = 0;
        let mut skips = 0;

        let stats = scan_file(file.path(), &required, &cancelled, |event| match event {
            ScanEvent::Message(_) => messages += 1,
            ScanEvent::Skip { .. } => skips += 1,
            ScanEvent::LineTooLong { .. } => {}
        })
        .unwrap();

        assert_eq!(messages, 1);
        assert_eq!(skips, 1);
        assert_eq!(stats.lines_processed, 2);
    }

    #[test]
    fn prefilter_skips_lines_without_any_required_literal() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"type":"user","uuid":"u1","message":{{"content":"nothing relevant"}}}}"#
        )
        .unwrap();
        writeln!(
            file,
            r#"{{"type":"user","uuid":"u2","message":{{"content":"a gem is hidden here"}}}}"#
        )
        .unwrap();

        let required = required_for("gem");
        let cancelled = AtomicBool::new(false);
        let mut seen = Vec::new();

        scan_file(file.path(), &required, &cancelled, |event| {
            if let ScanEvent::Message(msg) = event {
                seen.push(msg.searchable_text.clone());
            }
        })
        .unwrap();

        assert_eq!(seen, vec!["a gem is hidden here".to_string()]);
    }

    #[test]
    fn missing_file_reports_not_found() {
        let required = RequiredLiteralSet::default();
        let cancelled = AtomicBool::new(false);
        let err = scan_file(Path::new("/no/such/file.jsonl"), &required, &cancelled, |_| {});
        assert!(matches!(err, Err((ScanError::NotFound { .. }, _))));
    }
}
