//! Derives a message's `project_path` from the session file's location
//! rather than from the record (spec.md §3).
//!
//! The default corpus layout is `~/.claude/projects/<encoded>/<session>.jsonl`
//! where `<encoded>` is the absolute project directory with `/` replaced by
//! `-`. This module decodes that, the way the Claude Code dashboard tooling
//! this crate grew out of always has, with the same path-traversal and
//! symlink hardening and the same git-worktree normalization (SPEC_FULL.md
//! §C.1).

use std::path::{Component, Path, PathBuf};

/// Decode the parent directory name of a session file into an absolute
/// project path. Falls back to the literal directory name when it doesn't
/// look encoded, and to `None` when there is no parent directory at all.
pub fn derive_project_path(session_path: &Path) -> Option<PathBuf> {
    let encoded = session_path.parent()?.file_name()?.to_str()?;
    let decoded = sanitize_project_path(encoded);
    Some(PathBuf::from(normalize_worktree_path(&decoded)))
}

/// SECURITY: strips `..` components and rejects symlinked targets so a
/// maliciously named directory under the corpus root cannot be used to
/// claim an arbitrary `project_path` for filtering purposes.
fn sanitize_project_path(encoded: &str) -> String {
    let decoded = if let Some(stripped) = encoded.strip_prefix('-') {
        format!("/{}", stripped.replace('-', "/"))
    } else {
        encoded.replace('-', "/")
    };

    let normalized: PathBuf = Path::new(&decoded)
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect();

    #[cfg(unix)]
    {
        if normalized.exists() {
            if let Ok(metadata) = std::fs::symlink_metadata(&normalized) {
                if metadata.is_symlink() {
                    return "unknown".to_string();
                }
            }
        }
    }

    let path_str = normalized.to_string_lossy().to_string();
    if decoded.starts_with('/') && !path_str.starts_with('/') {
        format!("/{path_str}")
    } else {
        path_str
    }
}

/// Normalizes git worktree checkouts back to their parent repository path,
/// so sessions run from a worktree still group under the main project.
fn normalize_worktree_path(path: &str) -> String {
    let normalized = path
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    let normalized = if path.starts_with('/') {
        format!("/{normalized}")
    } else {
        normalized
    };

    if let Some(idx) = normalized.find("/worktrees/") {
        return normalized[..idx].to_string();
    }
    if let Some(idx) = normalized.find("/.worktrees/") {
        return normalized[..idx].to_string();
    }

    let components: Vec<&str> = normalized.split('/').collect();
    if let Some(idx) = components.iter().position(|&c| c == "worktrees") {
        if idx > 0 {
            return components[..idx].join("/");
        }
    }

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_dash_encoded_absolute_path() {
        let session = PathBuf::from("/home/me/.claude/projects/-home-me-myproject/abc.jsonl");
        let derived = derive_project_path(&session).unwrap();
        assert_eq!(derived, PathBuf::from("/home/me/myproject"));
    }

    #[test]
    fn strips_path_traversal_components() {
        let session =
            PathBuf::from("/home/me/.claude/projects/-home-me-..-..-etc/abc.jsonl");
        let derived = derive_project_path(&session).unwrap();
        assert!(!derived.to_string_lossy().contains(".."));
    }

    #[test]
    fn normalizes_worktree_checkout_to_parent_repo() {
        let session = PathBuf::from(
            "/home/me/.claude/projects/-home-me-repo-worktrees-feature-x/abc.jsonl",
        );
        let derived = derive_project_path(&session).unwrap();
        assert_eq!(derived, PathBuf::from("/home/me/repo"));
    }
}
