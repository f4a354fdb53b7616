//! Filter Set (spec.md §3, §4.5): cheap metadata predicates evaluated
//! before the query predicate, short-circuiting in a fixed order.

use chrono::{DateTime, Utc};

use crate::message::{Message, MessageKind};
use crate::noise;

#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    pub role: Option<MessageKind>,
    pub session_id: Option<String>,
    pub project_path_prefix: Option<String>,
    pub before: Option<DateTime<Utc>>,
    pub after: Option<DateTime<Utc>>,
    /// `--hide-noise` (SPEC_FULL.md §C.2): additionally excludes messages
    /// that look like Claude Code protocol plumbing. Off by default, so it
    /// never changes the documented boolean match semantics unless a caller
    /// opts in.
    pub hide_noise: bool,
}

impl FilterSet {
    /// Order of application (spec.md §4.5): role -> session_id ->
    /// project_path_prefix -> time window. Each check is O(1) and the whole
    /// chain short-circuits before the (comparatively expensive) query
    /// predicate ever runs.
    pub fn accepts(&self, msg: &Message) -> bool {
        if self.is_noop() {
            return true;
        }

        if let Some(role) = self.role {
            if msg.kind != role {
                return false;
            }
        }

        if let Some(ref want) = self.session_id {
            match &msg.session_id {
                Some(id) if id == want => {}
                _ => return false,
            }
        }

        if let Some(ref prefix) = self.project_path_prefix {
            match &msg.project_path {
                Some(path) => {
                    if !path.to_string_lossy().starts_with(prefix.as_str()) {
                        return false;
                    }
                }
                None => return false,
            }
        }

        if self.before.is_some() || self.after.is_some() {
            match msg.timestamp {
                Some(ts) => {
                    if let Some(before) = self.before {
                        if ts >= before {
                            return false;
                        }
                    }
                    if let Some(after) = self.after {
                        if ts <= after {
                            return false;
                        }
                    }
                }
                // A time window is set but the message has no timestamp:
                // rejected silently (spec.md §4.5).
                None => return false,
            }
        }

        if self.hide_noise && noise::is_noise(&msg.searchable_text) {
            return false;
        }

        true
    }

    pub fn is_noop(&self) -> bool {
        self.role.is_none()
            && self.session_id.is_none()
            && self.project_path_prefix.is_none()
            && self.before.is_none()
            && self.after.is_none()
            && !self.hide_noise
    }
}
