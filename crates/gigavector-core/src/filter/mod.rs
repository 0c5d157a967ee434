//! Metadata predicate filter DSL: tokenizer, recursive-descent parser, AST,
//! and evaluator.
//!
//! ```text
//! expr   := or
//! or     := and ( "OR" and )*
//! and    := unary ( "AND" unary )*
//! unary  := "NOT" unary | atom
//! atom   := "(" expr ")" | comparison
//! comparison := ident op literal
//! op     := "==" | "!=" | "<" | "<=" | ">" | ">="
//!         | "CONTAINS" | "PREFIX" | "SUFFIX" | "IN"
//! literal:= string | number
//! ```
//!
//! Hand-written tokenizer + recursive-descent parser; the grammar is small
//! enough that a parser-generator dependency isn't worth pulling in.

mod lexer;

use crate::error::{Error, Result};
use crate::record::Metadata;
use lexer::{Lexer, Token};

/// A comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Contains,
    Prefix,
    Suffix,
    In,
}

/// A literal value in a comparison or `IN` list.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
}

impl Literal {
    fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Number(_) => None,
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::String(s) => s.parse().ok(),
        }
    }
}

/// The filter predicate AST. Owns all of its subnodes and literals.
#[derive(Debug, Clone)]
pub enum Filter {
    Comparison {
        key: String,
        op: Op,
        value: Literal,
        in_list: Vec<Literal>,
    },
    And(Box<Filter>, Box<Filter>),
    Or(Box<Filter>, Box<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    /// Parses `src` into a filter tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] on malformed input. No position
    /// information is surfaced, per the DSL's error contract.
    pub fn parse(src: &str) -> Result<Self> {
        let tokens = Lexer::new(src).tokenize().map_err(|_| Error::ParseError)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
        };
        let filter = parser.parse_expr()?;
        if parser.pos != parser.tokens.len() {
            return Err(Error::ParseError);
        }
        Ok(filter)
    }

    /// Evaluates the filter against a record's metadata.
    ///
    /// A missing key evaluates the containing comparison to `false` (and,
    /// under `NOT`, to `true`). Numeric comparisons parse both sides as
    /// `f64`; if either parse fails the comparison is `false`. `AND`/`OR`
    /// short-circuit.
    #[must_use]
    pub fn eval(&self, metadata: &Metadata) -> bool {
        match self {
            Self::Comparison {
                key,
                op,
                value,
                in_list,
            } => {
                let Some(stored) = metadata.get(key) else {
                    return false;
                };
                eval_comparison(stored, *op, value, in_list)
            }
            Self::And(lhs, rhs) => lhs.eval(metadata) && rhs.eval(metadata),
            Self::Or(lhs, rhs) => lhs.eval(metadata) || rhs.eval(metadata),
            Self::Not(inner) => !inner.eval(metadata),
        }
    }
}

fn eval_comparison(stored: &str, op: Op, value: &Literal, in_list: &[Literal]) -> bool {
    match op {
        Op::Eq | Op::Ne => {
            let equal = match value {
                Literal::String(s) => stored == s,
                Literal::Number(_) => match (stored.parse::<f64>(), value.as_number()) {
                    (Ok(a), Some(b)) => (a - b).abs() < f64::EPSILON,
                    _ => false,
                },
            };
            if op == Op::Eq {
                equal
            } else {
                !equal
            }
        }
        Op::Lt | Op::Le | Op::Gt | Op::Ge => {
            let (Ok(a), Some(b)) = (stored.parse::<f64>(), value.as_number()) else {
                return false;
            };
            match op {
                Op::Lt => a < b,
                Op::Le => a <= b,
                Op::Gt => a > b,
                Op::Ge => a >= b,
                _ => unreachable!(),
            }
        }
        Op::Contains => value.as_str().is_some_and(|needle| stored.contains(needle)),
        Op::Prefix => value.as_str().is_some_and(|needle| stored.starts_with(needle)),
        Op::Suffix => value.as_str().is_some_and(|needle| stored.ends_with(needle)),
        Op::In => in_list.iter().any(|lit| match lit {
            Literal::String(s) => stored == s,
            Literal::Number(_) => stored
                .parse::<f64>()
                .ok()
                .zip(lit.as_number())
                .is_some_and(|(a, b)| (a - b).abs() < f64::EPSILON),
        }),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, tok: &Token) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_expr(&mut self) -> Result<Filter> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Filter> {
        let mut lhs = self.parse_and()?;
        while self.eat(&Token::Or) {
            let rhs = self.parse_and()?;
            lhs = Filter::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Filter> {
        let mut lhs = self.parse_unary()?;
        while self.eat(&Token::And) {
            let rhs = self.parse_unary()?;
            lhs = Filter::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Filter> {
        if self.eat(&Token::Not) {
            let inner = self.parse_unary()?;
            return Ok(Filter::Not(Box::new(inner)));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<Filter> {
        if self.eat(&Token::LParen) {
            let inner = self.parse_expr()?;
            if !self.eat(&Token::RParen) {
                return Err(Error::ParseError);
            }
            return Ok(inner);
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Filter> {
        let key = match self.advance() {
            Some(Token::Ident(s)) => s.clone(),
            _ => return Err(Error::ParseError),
        };
        let op = match self.advance() {
            Some(Token::EqEq) => Op::Eq,
            Some(Token::Ne) => Op::Ne,
            Some(Token::Lt) => Op::Lt,
            Some(Token::Le) => Op::Le,
            Some(Token::Gt) => Op::Gt,
            Some(Token::Ge) => Op::Ge,
            Some(Token::Contains) => Op::Contains,
            Some(Token::Prefix) => Op::Prefix,
            Some(Token::Suffix) => Op::Suffix,
            Some(Token::In) => Op::In,
            _ => return Err(Error::ParseError),
        };
        if op == Op::In {
            if !self.eat(&Token::LParen) {
                return Err(Error::ParseError);
            }
            let mut list = Vec::new();
            loop {
                list.push(self.parse_literal()?);
                if self.eat(&Token::Comma) {
                    continue;
                }
                break;
            }
            if !self.eat(&Token::RParen) {
                return Err(Error::ParseError);
            }
            return Ok(Filter::Comparison {
                key,
                op,
                value: Literal::String(String::new()),
                in_list: list,
            });
        }
        let value = self.parse_literal()?;
        Ok(Filter::Comparison {
            key,
            op,
            value,
            in_list: Vec::new(),
        })
    }

    fn parse_literal(&mut self) -> Result<Literal> {
        match self.advance() {
            Some(Token::String(s)) => Ok(Literal::String(s.clone())),
            Some(Token::Number(n)) => Ok(Literal::Number(*n)),
            _ => Err(Error::ParseError),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn md(pairs: &[(&str, &str)]) -> Metadata {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn simple_equality() {
        let f = Filter::parse(r#"color == "red""#).unwrap();
        assert!(f.eval(&md(&[("color", "red")])));
        assert!(!f.eval(&md(&[("color", "blue")])));
        assert!(!f.eval(&md(&[])));
    }

    #[test]
    fn and_or_not_precedence() {
        let f = Filter::parse(
            r#"(country == "US" OR country == "CA") AND NOT status == "deleted""#,
        )
        .unwrap();
        assert!(f.eval(&md(&[("country", "US"), ("status", "active")])));
        assert!(!f.eval(&md(&[("country", "US"), ("status", "deleted")])));
        assert!(!f.eval(&md(&[("country", "FR"), ("status", "active")])));
    }

    #[test]
    fn invalid_syntax_fails() {
        assert!(Filter::parse("invalid syntax !@#$").is_err());
    }

    #[test]
    fn numeric_comparison() {
        let f = Filter::parse("age >= 21").unwrap();
        assert!(f.eval(&md(&[("age", "30")])));
        assert!(!f.eval(&md(&[("age", "18")])));
        assert!(!f.eval(&md(&[("age", "not-a-number")])));
    }

    #[test]
    fn string_ops() {
        assert!(Filter::parse(r#"name CONTAINS "oo""#)
            .unwrap()
            .eval(&md(&[("name", "foobar")])));
        assert!(Filter::parse(r#"name PREFIX "foo""#)
            .unwrap()
            .eval(&md(&[("name", "foobar")])));
        assert!(Filter::parse(r#"name SUFFIX "bar""#)
            .unwrap()
            .eval(&md(&[("name", "foobar")])));
    }

    #[test]
    fn in_list() {
        let f = Filter::parse(r#"color IN ("red", "blue", "green")"#).unwrap();
        assert!(f.eval(&md(&[("color", "blue")])));
        assert!(!f.eval(&md(&[("color", "purple")])));
    }

    #[test]
    fn parse_is_deterministic_across_calls() {
        let f = Filter::parse(r#"tag == "x""#).unwrap();
        let m = md(&[("tag", "x")]);
        for _ in 0..5 {
            assert!(f.eval(&m));
        }
    }

    #[test]
    fn escaped_quotes_in_strings() {
        let f = Filter::parse(r#"name == "say \"hi\"""#).unwrap();
        assert!(f.eval(&md(&[("name", "say \"hi\"")])));
    }
}
