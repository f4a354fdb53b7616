//! Query Language (spec.md §4.4): parses and evaluates boolean expressions
//! over literals and regexes against a message's `searchable_text`.

mod ast;
mod lexer;
mod parser;
mod required_literals;

use std::str::FromStr;

pub use ast::{Leaf, Node};
pub use required_literals::RequiredLiteralSet;

use crate::error::CoreError;

/// A compiled query. Cheap to clone-share across workers: regexes are
/// reference-counted internally by the `regex` crate's `Regex` type, and the
/// whole tree is wrapped once in an `Arc` by the coordinator.
#[derive(Debug, Clone)]
pub struct Query {
    root: Option<Node>,
    required: RequiredLiteralSet,
}

impl Query {
    pub fn parse(src: &str) -> Result<Self, CoreError> {
        let root = parser::parse(src)?;
        let required = required_literals::compute(root.as_ref());
        Ok(Query { root, required })
    }

    /// Empty query string: matches every message (spec.md §4.4).
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn matches(&self, text: &str) -> bool {
        match &self.root {
            None => true,
            Some(node) => node.eval(text),
        }
    }

    pub fn required_literals(&self) -> RequiredLiteralSet {
        self.required.clone()
    }

    /// Locate the first match span for the result renderer (spec.md §4.7):
    /// the position of the first required literal, or the first regex
    /// match, whichever the query tree can produce. Returns byte offsets
    /// into `text`.
    pub fn locate(&self, text: &str) -> Option<(usize, usize)> {
        let node = self.root.as_ref()?;
        locate_in(node, text)
    }
}

fn locate_in(node: &Node, text: &str) -> Option<(usize, usize)> {
    match node {
        Node::Leaf(Leaf::Literal(lit)) => {
            if lit.is_empty() {
                return None;
            }
            let lower = text.to_lowercase();
            lower.find(lit).map(|start| (start, start + lit.len()))
        }
        Node::Leaf(Leaf::Regex { compiled, .. }) => {
            compiled.find(text).map(|m| (m.start(), m.end()))
        }
        Node::And(a, b) | Node::Or(a, b) => {
            match (locate_in(a, text), locate_in(b, text)) {
                (Some(x), Some(y)) => Some(if x.0 <= y.0 { x } else { y }),
                (Some(x), None) => Some(x),
                (None, Some(y)) => Some(y),
                (None, None) => None,
            }
        }
        Node::Not(_) => None,
    }
}

impl FromStr for Query {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Query::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_matches_everything() {
        let q = Query::parse("").unwrap();
        assert!(q.is_empty());
        assert!(q.matches("anything at all"));
        assert!(q.matches(""));
    }

    #[test]
    fn bareword_is_case_insensitive_substring() {
        let q = Query::parse("Error").unwrap();
        assert!(q.matches("an ERROR occurred"));
        assert!(!q.matches("all good"));
    }

    #[test]
    fn and_or_not_precedence() {
        let q = Query::parse("a OR b AND NOT c").unwrap();
        // NOT > AND > OR: a OR (b AND (NOT c))
        assert!(q.matches("a")); // matches via left branch regardless of b/c
        assert!(q.matches("b")); // b true, c absent -> NOT c true
        assert!(!q.matches("b c")); // b true but c present -> NOT c false, a absent
    }

    #[test]
    fn parentheses_override_precedence() {
        let q = Query::parse("(a OR b) AND c").unwrap();
        assert!(q.matches("a c"));
        assert!(q.matches("b c"));
        assert!(!q.matches("a b"));
    }

    #[test]
    fn quoted_literal_preserves_spaces() {
        let q = Query::parse("\"connection failed\"").unwrap();
        assert!(q.matches("a connection failed at host"));
        assert!(!q.matches("connection was ok, nothing failed here separately"));
    }

    #[test]
    fn regex_with_case_insensitive_flag() {
        let q = Query::parse("/^error:\\s*\\d+/i").unwrap();
        assert!(q.matches("Error: 42"));
        assert!(q.matches("error: 7"));
        assert!(!q.matches("not an error"));
    }

    #[test]
    fn regex_without_flag_is_case_sensitive() {
        let q = Query::parse("/^Error:\\s*\\d+/").unwrap();
        assert!(q.matches("Error: 42"));
        assert!(!q.matches("error: 7"));
    }

    #[test]
    fn malformed_query_reports_parse_error() {
        let err = Query::parse("(a AND b").unwrap_err();
        assert!(matches!(err, CoreError::QueryParseError { .. }));
    }

    #[test]
    fn invalid_regex_is_reported() {
        let err = Query::parse("/[unclosed/").unwrap_err();
        assert!(matches!(err, CoreError::InvalidRegex { .. }));
    }
}
