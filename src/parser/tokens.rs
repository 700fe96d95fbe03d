//! Token-stream helpers.
//!
//! sqlparser folds several MySQL clauses (table options, ALTER operation
//! lists, multi-table UPDATE layout) into shapes that move between
//! releases. Traversers read those clauses from the statement's significant
//! tokens with the helpers below.

use std::fmt;

use sqlparser::{
    dialect::MySqlDialect,
    tokenizer::{Token, Tokenizer, TokenizerError}
};

/// Tokenize without unescaping so that rendering tokens reproduces the input.
pub fn tokenize(sql: &str) -> Result<Vec<Token>, TokenizerError> {
    Tokenizer::new(&MySqlDialect {}, sql)
        .with_unescape(false)
        .tokenize()
}

/// Drop whitespace and comments.
pub fn significant(tokens: &[Token]) -> Vec<Token> {
    tokens
        .iter()
        .filter(|t| !matches!(t, Token::Whitespace(_) | Token::EOF))
        .cloned()
        .collect()
}

/// Concatenate tokens back into text, preserving original spacing.
pub fn render_raw(tokens: &[Token]) -> String {
    tokens.iter().map(ToString::to_string).collect()
}

/// Join significant tokens with single spaces.
pub fn render(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Unquoted word equal to `keyword`, ignoring case.
pub fn is_keyword(token: &Token, keyword: &str) -> bool {
    match token {
        Token::Word(w) => w.quote_style.is_none() && w.value.eq_ignore_ascii_case(keyword),
        _ => false
    }
}

/// True when `tokens` begins with the given keyword sequence.
pub fn starts_with(tokens: &[Token], keywords: &[&str]) -> bool {
    tokens.len() >= keywords.len()
        && keywords
            .iter()
            .zip(tokens)
            .all(|(kw, tok)| is_keyword(tok, kw))
}

/// Identifier or keyword text without quotes.
pub fn word(token: &Token) -> Option<&str> {
    match token {
        Token::Word(w) => Some(w.value.as_str()),
        _ => None
    }
}

/// Value text of an option: identifiers, strings and numbers.
pub fn value_text(token: &Token) -> Option<String> {
    match token {
        Token::Word(w) => Some(w.value.clone()),
        Token::SingleQuotedString(s) | Token::DoubleQuotedString(s) => Some(s.clone()),
        Token::Number(n, _) => Some(n.clone()),
        _ => None
    }
}

/// Index of the parenthesis closing the one at `open`.
pub fn matching_paren(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, token) in tokens.iter().enumerate().skip(open) {
        match token {
            Token::LParen => depth += 1,
            Token::RParen => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Position of the first token at parenthesis depth zero matching `pred`.
pub fn find_top_level(tokens: &[Token], pred: impl Fn(&Token) -> bool) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, token) in tokens.iter().enumerate() {
        match token {
            Token::LParen => depth += 1,
            Token::RParen => depth = depth.saturating_sub(1),
            _ if depth == 0 && pred(token) => return Some(idx),
            _ => {}
        }
    }
    None
}

/// Split on top-level separators, dropping empty pieces.
pub fn split_top_level(tokens: &[Token], is_sep: impl Fn(&Token) -> bool) -> Vec<&[Token]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, token) in tokens.iter().enumerate() {
        match token {
            Token::LParen => depth += 1,
            Token::RParen => depth = depth.saturating_sub(1),
            _ if depth == 0 && is_sep(token) => {
                if idx > start {
                    parts.push(&tokens[start..idx]);
                }
                start = idx + 1;
            }
            _ => {}
        }
    }
    if start < tokens.len() {
        parts.push(&tokens[start..]);
    }
    parts
}

/// Keywords at depth zero, upper-cased, in order.
pub fn top_level_keywords(tokens: &[Token]) -> Vec<String> {
    let mut depth = 0usize;
    let mut out = Vec::new();
    for token in tokens {
        match token {
            Token::LParen => depth += 1,
            Token::RParen => depth = depth.saturating_sub(1),
            Token::Word(w) if depth == 0 && w.quote_style.is_none() => {
                out.push(w.value.to_ascii_uppercase())
            }
            _ => {}
        }
    }
    out
}

/// `schema.table` or bare `table` as written in the statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    pub schema: Option<String>,
    pub name:   String
}

impl QualifiedName {
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name:   name.into()
        }
    }

    /// Parse a possibly qualified name at the front of `tokens`.
    ///
    /// Returns the name and the number of tokens consumed.
    pub fn read(tokens: &[Token]) -> Option<(Self, usize)> {
        let first = word(tokens.first()?)?;
        if matches!(tokens.get(1), Some(Token::Period)) {
            if let Some(second) = tokens.get(2).and_then(word) {
                return Some((
                    Self {
                        schema: Some(first.to_string()),
                        name:   second.to_string()
                    },
                    3
                ));
            }
        }
        Some((Self::bare(first), 1))
    }

    /// Parse a rendered object name such as `` `db`.`t` `` or `t`.
    pub fn from_object_name(rendered: &str) -> Self {
        let cleaned: Vec<String> = rendered
            .split('.')
            .map(|part| part.trim().trim_matches(|c| c == '`' || c == '"').to_string())
            .collect();
        match cleaned.as_slice() {
            [.., schema, name] => Self {
                schema: Some(schema.clone()),
                name:   name.clone()
            },
            [name] => Self::bare(name.clone()),
            [] => Self::bare(String::new())
        }
    }

    /// Qualify with `fallback` when no schema was written.
    pub fn qualified_with(&self, fallback: Option<&str>) -> String {
        match (&self.schema, fallback) {
            (Some(schema), _) => format!("{}.{}", schema, self.name),
            (None, Some(schema)) if !schema.is_empty() => format!("{}.{}", schema, self.name),
            _ => self.name.clone()
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.name),
            None => write!(f, "{}", self.name)
        }
    }
}
