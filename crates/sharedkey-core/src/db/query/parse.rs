//! Minimal textual query grammar:
//!
//! ```text
//! query   := FROM ident [ WHERE ident '=' literal ]
//! literal := '\'' text '\'' | digits
//! ```
//!
//! Keywords are case-insensitive. A quote inside a text literal is written
//! twice (`'o''brien'`).

use crate::{db::query::QueryError, key::Key};
use std::{iter::Peekable, str::CharIndices};

///
/// TextQuery
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TextQuery {
    pub entity: String,
    pub filter: Option<KeyFilter>,
}

///
/// KeyFilter
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyFilter {
    pub field: String,
    pub value: Key,
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Token {
    Ident(String),
    Text(String),
    Uint(u64),
    Eq,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Self::Ident(ident) => format!("identifier '{ident}'"),
            Self::Text(text) => format!("text literal '{text}'"),
            Self::Uint(value) => format!("integer {value}"),
            Self::Eq => "'='".to_string(),
        }
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Self::Ident(ident) if ident.eq_ignore_ascii_case(keyword))
    }
}

/// Parse a textual query into its entity name and optional key filter.
pub fn parse_query(source: &str) -> Result<TextQuery, QueryError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(QueryError::Empty);
    }

    let mut parser = Parser {
        tokens: tokens.into_iter().peekable(),
    };

    parser.keyword("from")?;
    let entity = parser.ident("entity name")?;

    let filter = if parser.at_end() {
        None
    } else {
        parser.keyword("where")?;
        let field = parser.ident("field name")?;
        parser.eq()?;
        let value = parser.literal()?;

        Some(KeyFilter { field, value })
    };

    parser.end()?;

    Ok(TextQuery { entity, filter })
}

struct Parser {
    tokens: Peekable<std::vec::IntoIter<(usize, Token)>>,
}

impl Parser {
    fn next(&mut self, expected: &'static str) -> Result<(usize, Token), QueryError> {
        self.tokens
            .next()
            .ok_or(QueryError::UnexpectedEnd { expected })
    }

    fn at_end(&mut self) -> bool {
        self.tokens.peek().is_none()
    }

    fn keyword(&mut self, keyword: &'static str) -> Result<(), QueryError> {
        let (offset, token) = self.next(keyword)?;
        if token.is_keyword(keyword) {
            Ok(())
        } else {
            Err(unexpected(keyword, &token, offset))
        }
    }

    fn ident(&mut self, expected: &'static str) -> Result<String, QueryError> {
        match self.next(expected)? {
            (_, Token::Ident(ident)) => Ok(ident),
            (offset, token) => Err(unexpected(expected, &token, offset)),
        }
    }

    fn eq(&mut self) -> Result<(), QueryError> {
        match self.next("'='")? {
            (_, Token::Eq) => Ok(()),
            (offset, token) => Err(unexpected("'='", &token, offset)),
        }
    }

    fn literal(&mut self) -> Result<Key, QueryError> {
        match self.next("literal")? {
            (_, Token::Text(text)) => Ok(Key::Text(text)),
            (_, Token::Uint(value)) => Ok(Key::Uint(value)),
            (offset, token) => Err(unexpected("literal", &token, offset)),
        }
    }

    fn end(&mut self) -> Result<(), QueryError> {
        match self.tokens.next() {
            None => Ok(()),
            Some((offset, token)) => Err(unexpected("end of query", &token, offset)),
        }
    }
}

fn unexpected(expected: &'static str, token: &Token, offset: usize) -> QueryError {
    QueryError::UnexpectedToken {
        expected,
        found: token.describe(),
        offset,
    }
}

fn tokenize(source: &str) -> Result<Vec<(usize, Token)>, QueryError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '=' => {
                chars.next();
                tokens.push((offset, Token::Eq));
            }
            '\'' => {
                chars.next();
                tokens.push((offset, Token::Text(text_literal(&mut chars, offset)?)));
            }
            c if c.is_ascii_digit() => {
                let digits = take_while(&mut chars, |c| c.is_ascii_digit());
                let value = digits
                    .parse::<u64>()
                    .map_err(|_| QueryError::IntegerOverflow { literal: digits })?;
                tokens.push((offset, Token::Uint(value)));
            }
            c if c.is_alphabetic() || c == '_' => {
                let ident = take_while(&mut chars, |c| c.is_alphanumeric() || c == '_');
                tokens.push((offset, Token::Ident(ident)));
            }
            found => return Err(QueryError::InvalidCharacter { found, offset }),
        }
    }

    Ok(tokens)
}

fn take_while(chars: &mut Peekable<CharIndices<'_>>, accept: impl Fn(char) -> bool) -> String {
    let mut out = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if !accept(c) {
            break;
        }
        out.push(c);
        chars.next();
    }

    out
}

// Consume a text literal body; the opening quote is already consumed.
fn text_literal(chars: &mut Peekable<CharIndices<'_>>, start: usize) -> Result<String, QueryError> {
    let mut out = String::new();

    while let Some((_, c)) = chars.next() {
        if c != '\'' {
            out.push(c);
            continue;
        }

        // doubled quote
        if matches!(chars.peek(), Some((_, '\''))) {
            chars.next();
            out.push('\'');
            continue;
        }

        return Ok(out);
    }

    Err(QueryError::UnterminatedText { offset: start })
}
