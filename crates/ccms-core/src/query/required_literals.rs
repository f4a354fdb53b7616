//! Required-literal set computation (spec.md §4.4): a conservative lower
//! bound of substrings any matching document must contain, used to drive
//! the line parser's raw-bytes pre-filter.

use std::collections::BTreeSet;

use regex_syntax::hir::{Hir, HirKind};

use super::ast::{Leaf, Node};

/// The computed set. Empty means the pre-filter is disabled for this query.
#[derive(Debug, Clone, Default)]
pub struct RequiredLiteralSet {
    literals: Vec<String>,
}

impl RequiredLiteralSet {
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn literals(&self) -> &[String] {
        &self.literals
    }
}

/// Negation-normal form: `Not` only ever wraps a leaf here, after De Morgan
/// has been pushed all the way down (spec.md §4.4 step 1).
enum Nnf {
    Pos(Leaf),
    Neg(Leaf),
    And(Box<Nnf>, Box<Nnf>),
    Or(Box<Nnf>, Box<Nnf>),
}

fn to_nnf(node: &Node, negate: bool) -> Nnf {
    match node {
        Node::Leaf(leaf) => {
            if negate {
                Nnf::Neg(leaf.clone())
            } else {
                Nnf::Pos(leaf.clone())
            }
        }
        Node::And(a, b) => {
            if negate {
                Nnf::Or(Box::new(to_nnf(a, true)), Box::new(to_nnf(b, true)))
            } else {
                Nnf::And(Box::new(to_nnf(a, false)), Box::new(to_nnf(b, false)))
            }
        }
        Node::Or(a, b) => {
            if negate {
                Nnf::And(Box::new(to_nnf(a, true)), Box::new(to_nnf(b, true)))
            } else {
                Nnf::Or(Box::new(to_nnf(a, false)), Box::new(to_nnf(b, false)))
            }
        }
        Node::Not(inner) => to_nnf(inner, !negate),
    }
}

/// Returns the literals this subtree *necessarily* contributes, or `None`
/// if the subtree cannot soundly guarantee any specific literal is present
/// (spec.md §4.4 step 2/3).
fn analyze(nnf: &Nnf) -> Option<Vec<String>> {
    match nnf {
        Nnf::Neg(_) => None,
        Nnf::Pos(Leaf::Literal(lit)) => {
            if lit.is_empty() {
                None
            } else {
                Some(vec![lit.clone()])
            }
        }
        Nnf::Pos(Leaf::Regex { pattern, .. }) => extract_regex_literals(pattern),
        Nnf::And(a, b) => {
            let la = analyze(a);
            let lb = analyze(b);
            match (la, lb) {
                (None, None) => None,
                (Some(x), None) => Some(x),
                (None, Some(y)) => Some(y),
                (Some(mut x), Some(y)) => {
                    x.extend(y);
                    Some(x)
                }
            }
        }
        Nnf::Or(a, b) => {
            // Only sound if EVERY branch contributes; then take one
            // representative per branch (spec.md §4.4 step 2).
            let la = analyze(a)?;
            let lb = analyze(b)?;
            let rep_a = la.into_iter().next()?;
            let rep_b = lb.into_iter().next()?;
            Some(vec![rep_a, rep_b])
        }
    }
}

/// Walks the regex's parsed syntax tree for the simple literal/alternation
/// shapes spec.md §4.4 step 3 names. Anything else (a metacharacter at
/// position 0, character classes, repetition, anchors mixed with literals
/// via `Concat`, …) conservatively contributes nothing.
fn extract_regex_literals(pattern: &str) -> Option<Vec<String>> {
    let hir = regex_syntax::Parser::new().parse(pattern).ok()?;
    match hir.kind() {
        HirKind::Alternation(alts) => {
            let mut out = Vec::with_capacity(alts.len());
            for alt in alts {
                let lit = literal_of(alt)?;
                if lit.is_empty() {
                    return None;
                }
                out.push(lit.to_lowercase());
            }
            Some(out)
        }
        _ => literal_of(&hir)
            .filter(|s| !s.is_empty())
            .map(|s| vec![s.to_lowercase()]),
    }
}

fn literal_of(hir: &Hir) -> Option<String> {
    match hir.kind() {
        HirKind::Literal(lit) => Some(String::from_utf8_lossy(&lit.0).into_owned()),
        HirKind::Concat(parts) => {
            let mut out = String::new();
            for part in parts {
                out.push_str(&literal_of(part)?);
            }
            Some(out)
        }
        _ => None,
    }
}

/// Entry point used by `Query`: compute the set for a (possibly absent —
/// the empty query) compiled tree.
pub fn compute(root: Option<&Node>) -> RequiredLiteralSet {
    let Some(root) = root else {
        return RequiredLiteralSet::default();
    };
    let nnf = to_nnf(root, false);
    let literals = analyze(&nnf).unwrap_or_default();
    // Dedup while keeping the set small; order doesn't matter for the
    // pre-filter's "any of" check.
    let dedup: BTreeSet<String> = literals.into_iter().collect();
    RequiredLiteralSet {
        literals: dedup.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Query;
    use pretty_assertions::assert_eq;

    fn required_for(src: &str) -> Vec<String> {
        let q: Query = src.parse().unwrap();
        let mut lits = q.required_literals().literals().to_vec();
        lits.sort();
        lits
    }

    #[test]
    fn conjunction_requires_both_literals() {
        assert_eq!(required_for("connection AND failed"), vec!["connection", "failed"]);
    }

    #[test]
    fn disjunction_of_two_contributing_literals_requires_one_of_each() {
        let mut lits = required_for("foo OR bar");
        lits.sort();
        assert_eq!(lits, vec!["bar", "foo"]);
    }

    #[test]
    fn negation_alone_disables_prefilter() {
        assert!(required_for("NOT error").is_empty());
    }

    #[test]
    fn disjunction_with_one_non_contributing_branch_disables_prefilter() {
        assert!(required_for("foo OR NOT bar").is_empty());
    }

    #[test]
    fn simple_regex_alternation_contributes_both_literals() {
        assert_eq!(required_for("/foo|bar/"), vec!["bar", "foo"]);
    }

    #[test]
    fn anchored_regex_contributes_nothing() {
        assert!(required_for(r"/^Error:\s*\d+/").is_empty());
    }

    #[test]
    fn and_of_positive_and_negated_keeps_the_positive_literal() {
        assert_eq!(required_for("connection AND NOT failed"), vec!["connection"]);
    }
}
