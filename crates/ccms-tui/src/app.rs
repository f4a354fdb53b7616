//! Application state for the interactive search session.

use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyModifiers};
use tracing::{debug, warn};

use ccms_core::{Coordinator, FilterSet, Query, SearchResult};

pub enum Status {
    Idle,
    Searching,
    Done { elapsed: Duration, total_matches: u64 },
    Error(String),
}

enum SearchMsg {
    Done {
        results: Vec<SearchResult>,
        total_matches: u64,
        elapsed: Duration,
    },
    Error(String),
}

pub struct App {
    pattern: String,
    filters: FilterSet,
    max_results: usize,

    pub input: String,
    pub cursor: usize,
    pub results: Vec<SearchResult>,
    pub selected: usize,
    pub status: Status,
    pub should_quit: bool,
    pub clipboard_message: Option<String>,

    search_rx: Option<mpsc::Receiver<SearchMsg>>,
}

impl App {
    pub fn new(pattern: String, initial_query: String, filters: FilterSet, max_results: usize) -> Self {
        let cursor = initial_query.len();
        let mut app = App {
            pattern,
            filters,
            max_results,
            input: initial_query,
            cursor,
            results: Vec::new(),
            selected: 0,
            status: Status::Idle,
            should_quit: false,
            clipboard_message: None,
            search_rx: None,
        };
        app.trigger_search();
        app
    }

    /// Handles one key event. Returns `true` if the key was consumed.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        match code {
            KeyCode::Esc => {
                self.should_quit = true;
                true
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                true
            }
            KeyCode::Enter => {
                self.trigger_search();
                true
            }
            KeyCode::Down => {
                self.move_selection(1);
                true
            }
            KeyCode::Up => {
                self.move_selection(-1);
                true
            }
            KeyCode::Char('y') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.copy_selected_to_clipboard();
                true
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    let start = prev_char_boundary(&self.input, self.cursor);
                    self.input.replace_range(start..self.cursor, "");
                    self.cursor = start;
                }
                true
            }
            KeyCode::Left => {
                self.cursor = prev_char_boundary(&self.input, self.cursor);
                true
            }
            KeyCode::Right => {
                self.cursor = next_char_boundary(&self.input, self.cursor);
                true
            }
            KeyCode::Char(c) => {
                self.input.insert(self.cursor, c);
                self.cursor += c.len_utf8();
                true
            }
            _ => false,
        }
    }

    fn move_selection(&mut self, delta: isize) {
        if self.results.is_empty() {
            return;
        }
        let len = self.results.len() as isize;
        let next = (self.selected as isize + delta).rem_euclid(len);
        self.selected = next as usize;
    }

    fn copy_selected_to_clipboard(&mut self) {
        let Some(result) = self.results.get(self.selected) else {
            return;
        };
        match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(result.snippet.clone())) {
            Ok(()) => self.clipboard_message = Some("copied snippet to clipboard".to_string()),
            Err(e) => self.clipboard_message = Some(format!("clipboard unavailable: {e}")),
        }
    }

    /// Parses `self.input` and spawns a background search. A parse failure
    /// is reported in `self.status` without starting a thread.
    pub fn trigger_search(&mut self) {
        let query = match Query::parse(&self.input) {
            Ok(q) => q,
            Err(e) => {
                warn!(query = %self.input, error = %e, "query failed to parse");
                self.status = Status::Error(e.to_string());
                return;
            }
        };

        debug!(query = %self.input, "triggering background search");
        let pattern = self.pattern.clone();
        let filters = self.filters.clone();
        let max_results = self.max_results;
        let (tx, rx) = mpsc::channel();
        self.search_rx = Some(rx);
        self.status = Status::Searching;

        thread::spawn(move || {
            let coordinator = Coordinator::new(query, filters, max_results);
            let started = Instant::now();
            let msg = match coordinator.run(&pattern) {
                Ok(outcome) => SearchMsg::Done {
                    results: outcome.results,
                    total_matches: outcome.total_matches,
                    elapsed: started.elapsed(),
                },
                Err(e) => SearchMsg::Error(e.to_string()),
            };
            let _ = tx.send(msg);
        });
    }

    /// Non-blocking check for a finished background search. Called once per
    /// draw loop iteration.
    pub fn poll_search(&mut self) {
        let Some(rx) = &self.search_rx else {
            return;
        };
        match rx.try_recv() {
            Ok(SearchMsg::Done {
                results,
                total_matches,
                elapsed,
            }) => {
                self.results = results;
                self.selected = 0;
                self.status = Status::Done {
                    elapsed,
                    total_matches,
                };
                self.search_rx = None;
            }
            Ok(SearchMsg::Error(message)) => {
                self.status = Status::Error(message);
                self.search_rx = None;
            }
            Err(mpsc::TryRecvError::Empty) => {}
            Err(mpsc::TryRecvError::Disconnected) => {
                self.search_rx = None;
            }
        }
    }
}

/// Nearest char boundary at or before `idx` in `s`. `self.cursor` is a byte
/// offset (required by `String::insert`/`replace_range`), but a multi-byte
/// character must move/delete as one unit or the next edit panics on a
/// split UTF-8 sequence.
fn prev_char_boundary(s: &str, idx: usize) -> usize {
    let mut i = idx.saturating_sub(1);
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Nearest char boundary at or after `idx` in `s`.
fn next_char_boundary(s: &str, idx: usize) -> usize {
    let mut i = (idx + 1).min(s.len());
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        App::new(
            "/tmp/nonexistent/*.jsonl".to_string(),
            String::new(),
            FilterSet::default(),
            10,
        )
    }

    #[test]
    fn typing_inserts_at_cursor_and_advances_it() {
        let mut app = app();
        app.handle_key(KeyCode::Char('a'), KeyModifiers::NONE);
        app.handle_key(KeyCode::Char('b'), KeyModifiers::NONE);
        assert_eq!(app.input, "ab");
        assert_eq!(app.cursor, 2);
    }

    #[test]
    fn backspace_removes_before_cursor() {
        let mut app = app();
        app.input = "ab".to_string();
        app.cursor = 2;
        app.handle_key(KeyCode::Backspace, KeyModifiers::NONE);
        assert_eq!(app.input, "a");
        assert_eq!(app.cursor, 1);
    }

    #[test]
    fn typing_and_deleting_multi_byte_characters_does_not_panic() {
        let mut app = app();
        for c in "café".chars() {
            app.handle_key(KeyCode::Char(c), KeyModifiers::NONE);
        }
        assert_eq!(app.input, "café");
        assert_eq!(app.cursor, "café".len());

        // 'é' is a multi-byte char; backspace must remove the whole char,
        // not split its UTF-8 sequence and leave a byte-boundary panic.
        app.handle_key(KeyCode::Backspace, KeyModifiers::NONE);
        assert_eq!(app.input, "caf");
        assert_eq!(app.cursor, "caf".len());

        app.cursor = 0;
        app.handle_key(KeyCode::Right, KeyModifiers::NONE);
        app.handle_key(KeyCode::Right, KeyModifiers::NONE);
        app.handle_key(KeyCode::Right, KeyModifiers::NONE);
        assert_eq!(app.cursor, "caf".len());
    }

    #[test]
    fn esc_sets_should_quit() {
        let mut app = app();
        assert!(app.handle_key(KeyCode::Esc, KeyModifiers::NONE));
        assert!(app.should_quit);
    }

    #[test]
    fn selection_wraps_around_empty_and_nonempty_lists() {
        let mut app = app();
        app.move_selection(1);
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn malformed_query_reports_error_without_spawning_a_search() {
        let mut app = app();
        app.input = "(unclosed".to_string();
        app.trigger_search();
        assert!(matches!(app.status, Status::Error(_)));
        assert!(app.search_rx.is_none());
    }
}
