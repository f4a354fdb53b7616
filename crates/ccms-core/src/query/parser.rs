//! Recursive-descent parser over the query tokens, precedence
//! `NOT > AND > OR` with parentheses for grouping (spec.md §4.4).

use regex::RegexBuilder;

use super::ast::{Leaf, Node};
use super::lexer::{Lexer, Token};
use crate::error::CoreError;

struct Parser {
    tokens: Vec<Token>,
    positions: Vec<usize>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn position(&self) -> usize {
        self.positions.get(self.pos).copied().unwrap_or_else(|| {
            self.positions.last().copied().unwrap_or(0) + 1 // end of input
        })
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn parse_or(&mut self) -> Result<Node, CoreError> {
        let mut node = self.parse_and()?;
        while matches!(self.peek(), Some(Token::Or)) {
            self.advance();
            let rhs = self.parse_and()?;
            node = Node::Or(Box::new(node), Box::new(rhs));
        }
        Ok(node)
    }

    fn parse_and(&mut self) -> Result<Node, CoreError> {
        let mut node = self.parse_not()?;
        while matches!(self.peek(), Some(Token::And)) {
            self.advance();
            let rhs = self.parse_not()?;
            node = Node::And(Box::new(node), Box::new(rhs));
        }
        Ok(node)
    }

    fn parse_not(&mut self) -> Result<Node, CoreError> {
        if matches!(self.peek(), Some(Token::Not)) {
            self.advance();
            let inner = self.parse_not()?;
            return Ok(Node::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Node, CoreError> {
        let position = self.position();
        match self.advance() {
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(CoreError::QueryParseError {
                        position,
                        expected: "closing ')'".to_string(),
                    }),
                }
            }
            Some(Token::Literal(lit)) => Ok(Node::Leaf(Leaf::Literal(lit.to_lowercase()))),
            Some(Token::Regex { pattern, flags }) => {
                let mut builder = RegexBuilder::new(&pattern);
                builder
                    .case_insensitive(flags.contains('i'))
                    .multi_line(flags.contains('m'))
                    .dot_matches_new_line(flags.contains('s'));
                let compiled = builder.build().map_err(|e| CoreError::InvalidRegex {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })?;
                Ok(Node::Leaf(Leaf::Regex {
                    compiled,
                    pattern,
                    flags,
                }))
            }
            Some(other) => Err(CoreError::QueryParseError {
                position,
                expected: format!("literal, regex, or '(' (found {other:?})"),
            }),
            None => Err(CoreError::QueryParseError {
                position,
                expected: "literal, regex, or '('".to_string(),
            }),
        }
    }
}

/// Parse a query string into a compiled boolean tree, or `None` for the
/// empty query (spec.md §4.4: "An empty query string matches every
/// message").
pub fn parse(src: &str) -> Result<Option<Node>, CoreError> {
    if src.trim().is_empty() {
        return Ok(None);
    }

    let lexed = Lexer::new(src).tokenize().map_err(|e| CoreError::QueryParseError {
        position: e.position,
        expected: e.expected,
    })?;

    let positions: Vec<usize> = lexed.iter().map(|s| s.position).collect();
    let tokens: Vec<Token> = lexed.into_iter().map(|s| s.token).collect();

    let mut parser = Parser {
        tokens,
        positions,
        pos: 0,
    };
    let node = parser.parse_or()?;
    if parser.pos != parser.tokens.len() {
        return Err(CoreError::QueryParseError {
            position: parser.position(),
            expected: "end of query".to_string(),
        });
    }
    Ok(Some(node))
}
