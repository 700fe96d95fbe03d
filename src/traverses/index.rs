use std::fmt;

use sqlparser::tokenizer::Token;

use crate::parser::tokens::{self, is_keyword};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Primary,
    Unique,
    Secondary,
    Fulltext,
    Spatial,
    Foreign
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Primary => "主键",
            Self::Unique => "唯一索引",
            Self::Secondary => "二级索引",
            Self::Fulltext => "全文索引",
            Self::Spatial => "空间索引",
            Self::Foreign => "外键"
        };
        f.write_str(label)
    }
}

/// Index or key constraint from a table definition or `ADD INDEX`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexFacts {
    pub kind:       IndexKind,
    pub name:       Option<String>,
    /// `CONSTRAINT symbol` when written
    pub constraint: Option<String>,
    pub columns:    Vec<String>
}

impl IndexFacts {
    /// Parse a key definition; `CHECK` constraints yield `None`.
    pub fn parse(def: &[Token]) -> Option<Self> {
        let mut i = 0;
        let mut constraint = None;
        if def.first().is_some_and(|t| is_keyword(t, "CONSTRAINT")) {
            i = 1;
            let symbol = def.get(1).filter(|t| {
                !["PRIMARY", "UNIQUE", "FOREIGN", "CHECK"]
                    .iter()
                    .any(|kw| is_keyword(t, kw))
            });
            if let Some(symbol) = symbol.and_then(tokens::word) {
                constraint = Some(symbol.to_string());
                i = 2;
            }
        }

        let kw = tokens::word(def.get(i)?)?.to_ascii_uppercase();
        i += 1;
        let kind = match kw.as_str() {
            "PRIMARY" => IndexKind::Primary,
            "UNIQUE" => IndexKind::Unique,
            "INDEX" | "KEY" => IndexKind::Secondary,
            "FULLTEXT" => IndexKind::Fulltext,
            "SPATIAL" => IndexKind::Spatial,
            "FOREIGN" => IndexKind::Foreign,
            _ => return None
        };
        if kind != IndexKind::Secondary
            && def
                .get(i)
                .is_some_and(|t| is_keyword(t, "KEY") || is_keyword(t, "INDEX"))
        {
            i += 1;
        }

        let mut name = None;
        if let Some(Token::Word(w)) = def.get(i)
            && !is_keyword(&def[i], "USING")
        {
            name = Some(w.value.clone());
            i += 1;
        }
        if def.get(i).is_some_and(|t| is_keyword(t, "USING")) {
            i += 2;
        }

        let mut columns = Vec::new();
        if matches!(def.get(i), Some(Token::LParen))
            && let Some(close) = tokens::matching_paren(def, i)
        {
            columns = tokens::split_top_level(&def[i + 1..close], |t| matches!(t, Token::Comma))
                .into_iter()
                .filter_map(|part| part.first().and_then(tokens::word))
                .map(str::to_string)
                .collect();
        }

        if name.is_none() && kind != IndexKind::Primary {
            name = constraint.clone();
        }

        Some(Self {
            kind,
            name,
            constraint,
            columns
        })
    }

    /// Column-level `PRIMARY KEY` / `UNIQUE` attributes.
    pub fn from_column(kind: IndexKind, column: &str) -> Self {
        Self {
            kind,
            name: None,
            constraint: None,
            columns: vec![column.to_string()]
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Columns compared case-insensitively.
    pub fn normalized_columns(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.to_ascii_lowercase()).collect()
    }

    /// True when `self` is a leftmost prefix of (or equal to) `other`.
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        let mine = self.normalized_columns();
        let theirs = other.normalized_columns();
        !mine.is_empty() && mine.len() <= theirs.len() && theirs[..mine.len()] == mine[..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(def: &str) -> Option<IndexFacts> {
        IndexFacts::parse(&tokens::significant(&tokens::tokenize(def).unwrap()))
    }

    #[test]
    fn test_unique_key() {
        let idx = index("UNIQUE KEY uniq_email (email)").unwrap();
        assert_eq!(idx.kind, IndexKind::Unique);
        assert_eq!(idx.name.as_deref(), Some("uniq_email"));
        assert_eq!(idx.columns, vec!["email"]);
    }

    #[test]
    fn test_prefix_length_and_order_ignored() {
        let idx = index("KEY idx_a_b (a(10), b DESC)").unwrap();
        assert_eq!(idx.kind, IndexKind::Secondary);
        assert_eq!(idx.columns, vec!["a", "b"]);
    }

    #[test]
    fn test_constraint_names_unique() {
        let idx = index("CONSTRAINT uniq_code UNIQUE (code)").unwrap();
        assert_eq!(idx.name.as_deref(), Some("uniq_code"));
        assert_eq!(idx.constraint.as_deref(), Some("uniq_code"));
    }

    #[test]
    fn test_primary_and_check() {
        let pk = index("PRIMARY KEY (id)").unwrap();
        assert_eq!(pk.kind, IndexKind::Primary);
        assert!(pk.name.is_none());
        assert!(index("CHECK (a > 0)").is_none());
    }

    #[test]
    fn test_leftmost_prefix() {
        let a = index("KEY idx_a (a)").unwrap();
        let ab = index("KEY idx_a_b (A, b)").unwrap();
        assert!(a.is_prefix_of(&ab));
        assert!(!ab.is_prefix_of(&a));
    }
}
