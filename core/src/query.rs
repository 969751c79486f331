//! Boolean query parsing.
//!
//! Two grammars are supported. [`Grammar::Reference`] dispatches on the first operator
//! substring found (` and not `, ` and `, ` or `, ` not `) and treats everything else,
//! parentheses included, as literal term text. [`Grammar::Extended`] is a precedence
//! parser (NOT > AND > OR) with parenthesized grouping; it accepts every query the
//! reference grammar accepts and additionally nests.

use crate::error::MalformedQuery;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Term(String),
    And(Vec<Query>),
    Or(Vec<Query>),
    /// Complement within the corpus.
    Not(Box<Query>),
    /// Left minus right.
    AndNot(Box<Query>, Box<Query>),
}

impl Query {
    pub fn term(text: &str) -> Self { Query::Term(text.trim().to_string()) }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, items: &[Query], op: &str) -> fmt::Result {
            write!(f, "(")?;
            for (i, q) in items.iter().enumerate() {
                if i > 0 { write!(f, " {op} ")?; }
                write!(f, "{q}")?;
            }
            write!(f, ")")
        }
        match self {
            Query::Term(t) => write!(f, "{t:?}"),
            Query::And(items) => join(f, items, "AND"),
            Query::Or(items) => join(f, items, "OR"),
            Query::Not(inner) => write!(f, "NOT {inner}"),
            Query::AndNot(l, r) => write!(f, "({l} AND NOT {r})"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grammar {
    #[default]
    Reference,
    Extended,
}

impl FromStr for Grammar {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reference" => Ok(Grammar::Reference),
            "extended" => Ok(Grammar::Extended),
            other => Err(format!("unknown grammar `{other}` (expected reference or extended)")),
        }
    }
}

pub fn parse(query: &str, grammar: Grammar) -> Result<Query, MalformedQuery> {
    match grammar {
        Grammar::Reference => parse_reference(query),
        Grammar::Extended => Parser::new(lex(query)).parse(),
    }
}

fn parse_reference(query: &str) -> Result<Query, MalformedQuery> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return Err(MalformedQuery::Empty);
    }
    if let Some((left, right)) = q.split_once(" and not ") {
        let left = left.trim();
        let positive = if left.contains(" and ") { conjunction(left) } else { Query::term(left) };
        return Ok(Query::AndNot(Box::new(positive), Box::new(Query::term(right))));
    }
    if q.contains(" and ") {
        return Ok(conjunction(&q));
    }
    if q.contains(" or ") {
        return Ok(Query::Or(q.split(" or ").map(Query::term).collect()));
    }
    if q.contains(" not ") {
        let parts: Vec<&str> = q.split(" not ").collect();
        return match parts.as_slice() {
            [positive, negative] => Ok(Query::AndNot(Box::new(Query::term(positive)), Box::new(Query::term(negative)))),
            _ => Err(MalformedQuery::NotArity(parts.len())),
        };
    }
    Ok(Query::Term(q))
}

fn conjunction(q: &str) -> Query { Query::And(q.split(" and ").map(Query::term).collect()) }

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(w) => write!(f, "{w}"),
            Token::And => write!(f, "AND"),
            Token::Or => write!(f, "OR"),
            Token::Not => write!(f, "NOT"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

fn lex(query: &str) -> Vec<Token> {
    fn flush(word: &mut String, tokens: &mut Vec<Token>) {
        if word.is_empty() { return; }
        let token = match word.to_lowercase().as_str() {
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            lowered => Token::Word(lowered.to_string()),
        };
        tokens.push(token);
        word.clear();
    }

    let mut tokens = Vec::new();
    let mut word = String::new();
    for c in query.chars() {
        match c {
            '(' | ')' => {
                flush(&mut word, &mut tokens);
                tokens.push(if c == '(' { Token::LParen } else { Token::RParen });
            }
            c if c.is_whitespace() => flush(&mut word, &mut tokens),
            c => word.push(c),
        }
    }
    flush(&mut word, &mut tokens);
    tokens
}

/// Deepest allowed nesting of parentheses and NOTs. Bounds recursion in parsing,
/// evaluation and drop.
pub const MAX_DEPTH: usize = 256;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self { Self { tokens, pos: 0, depth: 0 } }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, MalformedQuery>) -> Result<T, MalformedQuery> {
        if self.depth >= MAX_DEPTH {
            return Err(MalformedQuery::TooDeep(MAX_DEPTH));
        }
        self.depth += 1;
        let res = f(self);
        self.depth -= 1;
        res
    }

    fn parse(mut self) -> Result<Query, MalformedQuery> {
        if self.tokens.is_empty() {
            return Err(MalformedQuery::Empty);
        }
        let query = self.or_expr()?;
        match self.peek() {
            None => Ok(query),
            Some(tok) => Err(MalformedQuery::UnexpectedToken(tok.to_string())),
        }
    }

    fn peek(&self) -> Option<&Token> { self.tokens.get(self.pos) }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn or_expr(&mut self) -> Result<Query, MalformedQuery> {
        let mut operands = vec![self.and_expr()?];
        while self.eat(&Token::Or) {
            operands.push(self.and_expr()?);
        }
        Ok(if operands.len() == 1 { operands.remove(0) } else { Query::Or(operands) })
    }

    // `a NOT b` is read as `a AND NOT b`.
    fn and_expr(&mut self) -> Result<Query, MalformedQuery> {
        let mut acc = self.unary()?;
        loop {
            let next = match self.peek() {
                Some(Token::And) => {
                    self.pos += 1;
                    self.unary()?
                }
                Some(Token::Not) => self.unary()?,
                _ => break,
            };
            acc = match (acc, next) {
                (left, Query::Not(inner)) => Query::AndNot(Box::new(left), inner),
                (Query::And(mut items), right) => {
                    items.push(right);
                    Query::And(items)
                }
                (left, right) => Query::And(vec![left, right]),
            };
        }
        Ok(acc)
    }

    fn unary(&mut self) -> Result<Query, MalformedQuery> {
        if self.eat(&Token::Not) {
            return Ok(Query::Not(Box::new(self.nested(Self::unary)?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Query, MalformedQuery> {
        match self.peek().cloned() {
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.nested(Self::or_expr)?;
                if self.eat(&Token::RParen) { Ok(inner) } else { Err(MalformedQuery::UnclosedParen) }
            }
            Some(Token::Word(_)) => {
                let mut words = Vec::new();
                while let Some(Token::Word(w)) = self.peek() {
                    words.push(w.clone());
                    self.pos += 1;
                }
                Ok(Query::Term(words.join(" ")))
            }
            Some(tok) => Err(MalformedQuery::UnexpectedToken(tok.to_string())),
            None => Err(MalformedQuery::UnexpectedEnd),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> Query { Query::Term(s.into()) }
    fn b(q: Query) -> Box<Query> { Box::new(q) }
    fn reference(q: &str) -> Result<Query, MalformedQuery> { parse(q, Grammar::Reference) }
    fn extended(q: &str) -> Result<Query, MalformedQuery> { parse(q, Grammar::Extended) }

    #[test]
    fn reference_single_term_is_case_folded() {
        assert_eq!(reference("  Dog  "), Ok(t("dog")));
    }

    #[test]
    fn reference_conjunction_and_disjunction() {
        assert_eq!(reference("dog AND cat AND mouse"), Ok(Query::And(vec![t("dog"), t("cat"), t("mouse")])));
        assert_eq!(reference("dog Or cat"), Ok(Query::Or(vec![t("dog"), t("cat")])));
    }

    #[test]
    fn reference_and_has_priority_over_or() {
        assert_eq!(reference("a or b and c"), Ok(Query::And(vec![t("a or b"), t("c")])));
    }

    #[test]
    fn reference_and_not_splits_on_first_occurrence() {
        assert_eq!(
            reference("dog AND bird AND NOT cat"),
            Ok(Query::AndNot(b(Query::And(vec![t("dog"), t("bird")])), b(t("cat"))))
        );
        assert_eq!(reference("a and not b and not c"), Ok(Query::AndNot(b(t("a")), b(t("b and not c")))));
    }

    #[test]
    fn reference_binary_not() {
        assert_eq!(reference("dog NOT cat"), Ok(Query::AndNot(b(t("dog")), b(t("cat")))));
        assert_eq!(reference("a not b not c"), Err(MalformedQuery::NotArity(3)));
    }

    #[test]
    fn reference_keeps_parentheses_literal() {
        assert_eq!(
            reference("(bm25 OR tf-idf) AND retrieval"),
            Ok(Query::And(vec![t("(bm25 or tf-idf)"), t("retrieval")]))
        );
    }

    #[test]
    fn reference_malformed_inputs() {
        assert_eq!(reference(""), Err(MalformedQuery::Empty));
        assert_eq!(reference("   "), Err(MalformedQuery::Empty));
        // no surrounding spaces, so no operator: a single literal term
        assert_eq!(reference("a not"), Ok(t("a not")));
    }

    #[test]
    fn extended_precedence() {
        assert_eq!(extended("a OR b AND c"), Ok(Query::Or(vec![t("a"), Query::And(vec![t("b"), t("c")])])));
        assert_eq!(extended("NOT a AND b"), Ok(Query::And(vec![Query::Not(b(t("a"))), t("b")])));
    }

    #[test]
    fn extended_groups_and_negates() {
        assert_eq!(
            extended("neural AND NOT (bm25 OR tf-idf)"),
            Ok(Query::AndNot(b(t("neural")), b(Query::Or(vec![t("bm25"), t("tf-idf")]))))
        );
        assert_eq!(extended("dog not cat"), Ok(Query::AndNot(b(t("dog")), b(t("cat")))));
        assert_eq!(extended("((dog))"), Ok(t("dog")));
    }

    #[test]
    fn extended_adjacent_words_form_one_term() {
        assert_eq!(extended("small Mouse AND garden"), Ok(Query::And(vec![t("small mouse"), t("garden")])));
    }

    #[test]
    fn extended_errors() {
        assert_eq!(extended(""), Err(MalformedQuery::Empty));
        assert_eq!(extended("(a OR b"), Err(MalformedQuery::UnclosedParen));
        assert_eq!(extended("a AND"), Err(MalformedQuery::UnexpectedEnd));
        assert_eq!(extended("a )"), Err(MalformedQuery::UnexpectedToken(")".into())));
        assert_eq!(extended("OR a"), Err(MalformedQuery::UnexpectedToken("OR".into())));
    }

    #[test]
    fn extended_nesting_is_bounded() {
        let ok = format!("{}dog{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        assert_eq!(extended(&ok), Ok(t("dog")));
        let deep = format!("{}dog{}", "(".repeat(100_000), ")".repeat(100_000));
        assert_eq!(extended(&deep), Err(MalformedQuery::TooDeep(MAX_DEPTH)));
        let nots = format!("{}dog", "NOT ".repeat(100_000));
        assert_eq!(extended(&nots), Err(MalformedQuery::TooDeep(MAX_DEPTH)));
        let unclosed = "(".repeat(100_000);
        assert_eq!(extended(&unclosed), Err(MalformedQuery::TooDeep(MAX_DEPTH)));
    }

    #[test]
    fn display_is_readable() {
        let q = extended("a AND NOT (b OR c)").unwrap();
        assert_eq!(q.to_string(), r#"("a" AND NOT ("b" OR "c"))"#);
    }

    #[test]
    fn grammar_from_str() {
        assert_eq!("Extended".parse::<Grammar>(), Ok(Grammar::Extended));
        assert!("pratt".parse::<Grammar>().is_err());
    }
}
