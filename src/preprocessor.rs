//! Executable-comment and TiDB syntax preprocessing.
//!
//! MySQL and TiDB hide real DDL inside comments (`/*!50100 ... */`,
//! `/*T![clustered_index] CLUSTERED */`) and TiDB adds table and column
//! clauses that `sqlparser` does not know. This module rewrites a statement
//! into text the MySQL grammar accepts and records what it took out, so
//! rules can still reason about it.
//!
//! # Architecture
//!
//! The preprocessor operates in two phases:
//! 1. **Extraction**: Captures TiDB feature usage
//! 2. **Transformation**: Unwraps versioned comments, removes TiDB-only syntax
//!
//! # Example
//!
//! ```
//! use sql_audit::preprocessor::Preprocessor;
//!
//! let sql = "CREATE TABLE t (id BIGINT AUTO_RANDOM PRIMARY KEY) SHARD_ROW_ID_BITS=4";
//! let result = Preprocessor::new().process(sql);
//!
//! assert!(!result.sql.contains("AUTO_RANDOM"));
//! assert!(result.metadata.tidb_features.contains_key("AUTO_RANDOM"));
//! ```

pub mod tidb;

use indexmap::IndexMap;
use sqlparser::tokenizer::Token;

/// Rewrites statements into parser-friendly MySQL.
#[derive(Debug, Default)]
pub struct Preprocessor;

/// Metadata extracted during preprocessing.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PreprocessorMetadata {
    /// TiDB feature or clause name -> removed text
    pub tidb_features:      IndexMap<String, String>,
    /// Number of `/*!NNNNN ... */` comments unwrapped
    pub versioned_comments: usize
}

/// Result of SQL preprocessing.
#[derive(Debug)]
pub struct PreprocessorResult {
    /// Transformed SQL ready for parsing
    pub sql:      String,
    /// Extracted metadata
    pub metadata: PreprocessorMetadata
}

impl Preprocessor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Process SQL and return transformed result with metadata.
    #[must_use]
    pub fn process(&self, sql: &str) -> PreprocessorResult {
        tidb::preprocess(sql)
    }

    /// Process a statement already split into raw tokens.
    ///
    /// Returns the rewritten tokens, whitespace included.
    #[must_use]
    pub fn process_tokens(&self, raw: &[Token]) -> (Vec<Token>, PreprocessorMetadata) {
        tidb::preprocess_tokens(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_mysql_passthrough() {
        let sql = "CREATE TABLE users (id BIGINT UNSIGNED PRIMARY KEY)";
        let result = Preprocessor::new().process(sql);
        assert_eq!(result.sql, sql);
        assert!(result.metadata.tidb_features.is_empty());
        assert_eq!(result.metadata.versioned_comments, 0);
    }

    #[test]
    fn test_versioned_comment_unwrapped() {
        let sql = "CREATE TABLE t (id INT) /*!50100 ENGINE=InnoDB */";
        let result = Preprocessor::new().process(sql);
        assert!(result.sql.contains("ENGINE=InnoDB"));
        assert!(!result.sql.contains("/*!"));
        assert_eq!(result.metadata.versioned_comments, 1);
    }

    #[test]
    fn test_process_tokens_keeps_whitespace() {
        let raw = crate::parser::tokens::tokenize("CREATE TABLE t (id INT) SHARD_ROW_ID_BITS=4").unwrap();
        let (rewritten, metadata) = Preprocessor::new().process_tokens(&raw);
        assert_eq!(
            crate::parser::tokens::render_raw(&rewritten),
            "CREATE TABLE t (id INT)"
        );
        assert!(metadata.tidb_features.contains_key("SHARD_ROW_ID_BITS"));
    }
}
