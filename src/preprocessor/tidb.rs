//! TiDB and MySQL executable-comment handling.
//!
//! Works on the token stream, so string literals, quoted identifiers and
//! ordinary comments are never rewritten.
//!
//! # Handled constructs
//!
//! - `/*!NNNNN body */` - MySQL versioned comment, body is kept
//! - `/*T![feature] body */` - TiDB feature comment, recorded and removed
//! - `AUTO_RANDOM[(n[, m])]` - TiDB column attribute
//! - `SHARD_ROW_ID_BITS`, `PRE_SPLIT_REGIONS`, `AUTO_ID_CACHE`,
//!   `AUTO_RANDOM_BASE` - TiDB table options
//! - `CLUSTERED` / `NONCLUSTERED` - TiDB primary key attribute
//!
//! Clause removal only applies to `CREATE` and `ALTER` statements.

use sqlparser::tokenizer::{Token, Whitespace};

use super::{PreprocessorMetadata, PreprocessorResult};
use crate::parser::tokens;

const AUTO_RANDOM: &str = "AUTO_RANDOM";

const TABLE_OPTIONS: &[&str] = &[
    "SHARD_ROW_ID_BITS",
    "PRE_SPLIT_REGIONS",
    "AUTO_ID_CACHE",
    "AUTO_RANDOM_BASE"
];

const CLUSTERING: &[&str] = &["CLUSTERED", "NONCLUSTERED"];

/// Preprocess one statement given as text.
///
/// Text the tokenizer rejects is returned unchanged; the parser reports it.
pub fn preprocess(sql: &str) -> PreprocessorResult {
    match tokens::tokenize(sql) {
        Ok(raw) => {
            let (rewritten, metadata) = preprocess_tokens(&raw);
            PreprocessorResult {
                sql: tokens::render_raw(&rewritten).trim().to_string(),
                metadata
            }
        }
        Err(_) => PreprocessorResult {
            sql:      sql.to_string(),
            metadata: PreprocessorMetadata::default()
        }
    }
}

/// Preprocess one statement given as raw tokens, whitespace included.
pub fn preprocess_tokens(raw: &[Token]) -> (Vec<Token>, PreprocessorMetadata) {
    let mut metadata = PreprocessorMetadata::default();
    let unwrapped = unwrap_comments(raw, &mut metadata);
    let significant = tokens::significant(&unwrapped);
    let rewritten = if tokens::starts_with(&significant, &["CREATE"])
        || tokens::starts_with(&significant, &["ALTER"])
    {
        strip_clauses(&unwrapped, &mut metadata)
    } else {
        unwrapped
    };
    (rewritten, metadata)
}

fn unwrap_comments(input: &[Token], metadata: &mut PreprocessorMetadata) -> Vec<Token> {
    let mut out = Vec::with_capacity(input.len());
    for token in input {
        let Token::Whitespace(Whitespace::MultiLineComment(body)) = token else {
            out.push(token.clone());
            continue;
        };
        if let Some(rest) = body.strip_prefix('!') {
            let inner = rest.trim_start_matches(|c: char| c.is_ascii_digit());
            let Ok(inner_tokens) = tokens::tokenize(inner) else {
                out.push(token.clone());
                continue;
            };
            metadata.versioned_comments += 1;
            if !inner.starts_with(char::is_whitespace) {
                out.push(Token::Whitespace(Whitespace::Space));
            }
            out.extend(unwrap_comments(&inner_tokens, metadata));
        } else if let Some((feature, inner)) = feature_comment(body) {
            record_comment_clauses(inner, metadata);
            metadata
                .tidb_features
                .insert(feature.to_string(), inner.to_string());
            trim_trailing_whitespace(&mut out);
        } else {
            out.push(token.clone());
        }
    }
    out
}

/// `T![feature] body` -> (`feature`, `body`)
fn feature_comment(body: &str) -> Option<(&str, &str)> {
    let (feature, inner) = body.strip_prefix("T![")?.split_once(']')?;
    let valid = !feature.is_empty()
        && feature
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    valid.then_some((feature, inner.trim()))
}

/// Clause keywords inside a feature comment count as used features too.
fn record_comment_clauses(inner: &str, metadata: &mut PreprocessorMetadata) {
    let Ok(inner_tokens) = tokens::tokenize(inner) else {
        return;
    };
    for token in &inner_tokens {
        if let Some(upper) = unquoted_upper(token)
            && (upper == AUTO_RANDOM
                || TABLE_OPTIONS.contains(&upper.as_str())
                || CLUSTERING.contains(&upper.as_str()))
        {
            metadata.tidb_features.insert(upper, inner.to_string());
        }
    }
}

fn strip_clauses(input: &[Token], metadata: &mut PreprocessorMetadata) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(input.len());
    let mut idx = 0;
    while idx < input.len() {
        let Some(upper) = unquoted_upper(&input[idx]) else {
            out.push(input[idx].clone());
            idx += 1;
            continue;
        };
        let rest = &input[idx..];
        let removed = if upper == AUTO_RANDOM && follows_definition(&out) {
            Some((auto_random_len(rest), None))
        } else if TABLE_OPTIONS.contains(&upper.as_str()) {
            table_option(rest).map(|(len, value)| (len, Some(value)))
        } else if CLUSTERING.contains(&upper.as_str()) && follows_key(&out) {
            Some((1, Some(upper.clone())))
        } else {
            None
        };

        match removed {
            Some((len, value)) => {
                let text =
                    value.unwrap_or_else(|| tokens::render_raw(&rest[..len]).trim().to_string());
                trim_trailing_whitespace(&mut out);
                if TABLE_OPTIONS.contains(&upper.as_str())
                    && matches!(out.last(), Some(Token::Comma))
                {
                    out.pop();
                    trim_trailing_whitespace(&mut out);
                }
                metadata.tidb_features.insert(upper, text);
                idx += len;
            }
            None => {
                out.push(input[idx].clone());
                idx += 1;
            }
        }
    }
    out
}

fn unquoted_upper(token: &Token) -> Option<String> {
    match token {
        Token::Word(w) if w.quote_style.is_none() => Some(w.value.to_ascii_uppercase()),
        _ => None
    }
}

fn last_significant(out: &[Token]) -> Option<&Token> {
    out.iter()
        .rev()
        .find(|t| !matches!(t, Token::Whitespace(_)))
}

/// A column attribute follows a type word or a type's length list.
fn follows_definition(out: &[Token]) -> bool {
    matches!(last_significant(out), Some(Token::Word(_) | Token::RParen))
}

/// `PRIMARY KEY CLUSTERED` or `PRIMARY KEY (id) CLUSTERED`.
fn follows_key(out: &[Token]) -> bool {
    match last_significant(out) {
        Some(token) if tokens::is_keyword(token, "KEY") => true,
        Some(Token::RParen) => {
            let significant = tokens::significant(out);
            let mut depth = 0usize;
            for (pos, token) in significant.iter().enumerate().rev() {
                match token {
                    Token::RParen => depth += 1,
                    Token::LParen => {
                        depth = depth.saturating_sub(1);
                        if depth == 0 {
                            return pos > 0 && tokens::is_keyword(&significant[pos - 1], "KEY");
                        }
                    }
                    _ => {}
                }
            }
            false
        }
        _ => false
    }
}

fn next_significant(input: &[Token], from: usize) -> Option<usize> {
    (from..input.len()).find(|&i| !matches!(input[i], Token::Whitespace(_) | Token::EOF))
}

/// Length of `AUTO_RANDOM` plus an optional `(n[, m])` argument list.
fn auto_random_len(rest: &[Token]) -> usize {
    let Some(open) = next_significant(rest, 1).filter(|&i| matches!(rest[i], Token::LParen)) else {
        return 1;
    };
    let Some(close) = tokens::matching_paren(rest, open) else {
        return 1;
    };
    let numeric = rest[open + 1..close]
        .iter()
        .all(|t| matches!(t, Token::Number(..) | Token::Comma | Token::Whitespace(_)));
    if numeric { close + 1 } else { 1 }
}

/// `NAME [=] number` -> (token length, number)
fn table_option(rest: &[Token]) -> Option<(usize, String)> {
    let mut pos = next_significant(rest, 1)?;
    if matches!(rest[pos], Token::Eq) {
        pos = next_significant(rest, pos + 1)?;
    }
    match &rest[pos] {
        Token::Number(n, _) => Some((pos + 1, n.clone())),
        _ => None
    }
}

fn trim_trailing_whitespace(out: &mut Vec<Token>) {
    while matches!(out.last(), Some(Token::Whitespace(_))) {
        out.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_comment_recorded() {
        let sql = "CREATE TABLE t (id BIGINT PRIMARY KEY /*T![clustered_index] CLUSTERED */, a INT)";
        let result = preprocess(sql);
        assert_eq!(
            result.sql,
            "CREATE TABLE t (id BIGINT PRIMARY KEY, a INT)"
        );
        assert_eq!(
            result.metadata.tidb_features.get("clustered_index"),
            Some(&"CLUSTERED".to_string())
        );
    }

    #[test]
    fn test_auto_random_removed() {
        let sql = "CREATE TABLE t (id BIGINT AUTO_RANDOM(5) PRIMARY KEY)";
        let result = preprocess(sql);
        assert_eq!(result.sql, "CREATE TABLE t (id BIGINT PRIMARY KEY)");
        assert_eq!(
            result.metadata.tidb_features.get("AUTO_RANDOM"),
            Some(&"AUTO_RANDOM(5)".to_string())
        );
    }

    #[test]
    fn test_auto_random_in_feature_comment() {
        let sql = "CREATE TABLE t (id BIGINT NOT NULL /*T![auto_rand] AUTO_RANDOM(5) */, PRIMARY KEY (id))";
        let result = preprocess(sql);
        assert_eq!(result.sql, "CREATE TABLE t (id BIGINT NOT NULL, PRIMARY KEY (id))");
        assert!(result.metadata.tidb_features.contains_key("auto_rand"));
        assert!(result.metadata.tidb_features.contains_key("AUTO_RANDOM"));
    }

    #[test]
    fn test_table_options_removed() {
        let sql = "CREATE TABLE t (id INT) ENGINE=InnoDB SHARD_ROW_ID_BITS=4 PRE_SPLIT_REGIONS=2";
        let result = preprocess(sql);
        assert_eq!(result.sql, "CREATE TABLE t (id INT) ENGINE=InnoDB");
        assert_eq!(
            result.metadata.tidb_features.get("SHARD_ROW_ID_BITS"),
            Some(&"4".to_string())
        );
        assert!(result.metadata.tidb_features.contains_key("PRE_SPLIT_REGIONS"));
    }

    #[test]
    fn test_nonclustered_primary_key() {
        let sql = "CREATE TABLE t (id INT, PRIMARY KEY (id) NONCLUSTERED)";
        let result = preprocess(sql);
        assert_eq!(result.sql, "CREATE TABLE t (id INT, PRIMARY KEY (id))");
        assert!(result.metadata.tidb_features.contains_key("NONCLUSTERED"));
    }

    #[test]
    fn test_versioned_comment_body_kept() {
        let sql = "/*!40101 SET NAMES utf8mb4 */";
        let result = preprocess(sql);
        assert_eq!(result.sql, "SET NAMES utf8mb4");
        assert_eq!(result.metadata.versioned_comments, 1);
    }

    #[test]
    fn test_string_literals_untouched() {
        let sql = "CREATE TABLE t (id BIGINT PRIMARY KEY COMMENT 'not auto_random', b INT COMMENT 'a clustered b')";
        let result = preprocess(sql);
        assert_eq!(result.sql, sql);
        assert!(result.metadata.tidb_features.is_empty());
    }

    #[test]
    fn test_dml_untouched() {
        let sql = "UPDATE orders SET note = 'a clustered b', shard_row_id_bits = 4 WHERE id = 1";
        let result = preprocess(sql);
        assert_eq!(result.sql, sql);
        assert!(result.metadata.tidb_features.is_empty());
    }

    #[test]
    fn test_quoted_identifier_untouched() {
        let sql = "CREATE TABLE t (`auto_random` INT, `clustered` INT)";
        let result = preprocess(sql);
        assert_eq!(result.sql, sql);
        assert!(result.metadata.tidb_features.is_empty());
    }
}
