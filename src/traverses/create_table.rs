use sqlparser::{ast::Statement, tokenizer::Token};

use super::{ColumnFacts, IndexFacts, IndexKind, TableOptions};
use crate::parser::{
    QualifiedName, StmtKind, StmtNode,
    tokens::{self, is_keyword}
};

/// Facts of one `CREATE TABLE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTableFacts {
    pub table:         QualifiedName,
    pub temporary:     bool,
    pub if_not_exists: bool,
    pub as_select:     bool,
    pub like:          Option<QualifiedName>,
    pub columns:       Vec<ColumnFacts>,
    /// Table-level keys followed by column-level `PRIMARY KEY` / `UNIQUE`
    pub indexes:       Vec<IndexFacts>,
    pub options:       TableOptions
}

impl CreateTableFacts {
    pub fn from_stmt(stmt: &StmtNode) -> Option<Self> {
        if stmt.kind != StmtKind::CreateTable {
            return None;
        }
        let mut facts = Self::read_tokens(&stmt.tokens)?;
        if let Statement::CreateTable(create) = &stmt.statement
            && !create.columns.is_empty()
        {
            facts.columns = create.columns.iter().map(ColumnFacts::from_def).collect();
        }
        facts.add_column_keys();
        Some(facts)
    }

    /// Token-only reading, for statements without a parsed definition.
    pub fn from_tokens(all: &[Token]) -> Option<Self> {
        let mut facts = Self::read_tokens(all)?;
        facts.add_column_keys();
        Some(facts)
    }

    fn read_tokens(all: &[Token]) -> Option<Self> {
        let table_kw = all.iter().take(3).position(|t| is_keyword(t, "TABLE"))?;
        let temporary = all[..table_kw].iter().any(|t| is_keyword(t, "TEMPORARY"));
        let mut i = table_kw + 1;
        let if_not_exists = tokens::starts_with(&all[i..], &["IF", "NOT", "EXISTS"]);
        if if_not_exists {
            i += 3;
        }
        let (table, used) = QualifiedName::read(&all[i..])?;
        let rest = &all[i + used..];

        let mut facts = Self {
            table,
            temporary,
            if_not_exists,
            as_select: false,
            like: None,
            columns: Vec::new(),
            indexes: Vec::new(),
            options: TableOptions::default()
        };

        let like_at = match rest {
            [first, ..] if is_keyword(first, "LIKE") => Some(1),
            [Token::LParen, second, ..] if is_keyword(second, "LIKE") => Some(2),
            _ => None
        };
        if let Some(at) = like_at {
            facts.like = QualifiedName::read(&rest[at..]).map(|(name, _)| name);
            return Some(facts);
        }

        let mut after = rest;
        if let [Token::LParen, second, ..] = rest {
            if is_keyword(second, "SELECT") {
                facts.as_select = true;
                return Some(facts);
            }
            let close = tokens::matching_paren(rest, 0)?;
            facts.read_definitions(&rest[1..close]);
            after = &rest[close + 1..];
        }

        let select_at = after
            .iter()
            .position(|t| is_keyword(t, "AS") || is_keyword(t, "SELECT") || matches!(t, Token::LParen));
        if let Some(at) = select_at {
            facts.as_select = after[at..].iter().any(|t| is_keyword(t, "SELECT"));
        }
        facts.options = TableOptions::parse(&after[..select_at.unwrap_or(after.len())]);
        if !facts.options.partitioned {
            facts.options.partitioned = after.iter().any(|t| is_keyword(t, "PARTITION"));
        }
        Some(facts)
    }

    fn read_definitions(&mut self, body: &[Token]) {
        for def in tokens::split_top_level(body, |t| matches!(t, Token::Comma)) {
            if is_index_definition(def) {
                self.indexes.extend(IndexFacts::parse(def));
            } else if let Some(column) = ColumnFacts::parse(def) {
                self.columns.push(column);
            }
        }
    }

    /// Column-level keys go after the table-level ones.
    fn add_column_keys(&mut self) {
        for column in &self.columns {
            if column.primary_key {
                self.indexes
                    .push(IndexFacts::from_column(IndexKind::Primary, &column.name));
            }
            if column.unique {
                self.indexes
                    .push(IndexFacts::from_column(IndexKind::Unique, &column.name));
            }
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnFacts> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn primary_key(&self) -> Option<&IndexFacts> {
        self.indexes.iter().find(|i| i.kind == IndexKind::Primary)
    }
}

/// True when a definition inside `CREATE TABLE (...)` is a key, not a column.
pub fn is_index_definition(def: &[Token]) -> bool {
    def.first().is_some_and(|t| {
        [
            "PRIMARY",
            "UNIQUE",
            "KEY",
            "INDEX",
            "FULLTEXT",
            "SPATIAL",
            "CONSTRAINT",
            "FOREIGN",
            "CHECK"
        ]
        .iter()
        .any(|kw| is_keyword(t, kw))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(sql: &str) -> CreateTableFacts {
        CreateTableFacts::from_tokens(&tokens::significant(&tokens::tokenize(sql).unwrap())).unwrap()
    }

    #[test]
    fn test_columns_indexes_and_options() {
        let f = facts(
            "CREATE TABLE IF NOT EXISTS shop.orders (\
               id BIGINT UNSIGNED AUTO_INCREMENT COMMENT 'pk',\
               code VARCHAR(32) NOT NULL COMMENT 'code',\
               PRIMARY KEY (id),\
               UNIQUE KEY uniq_code (code)\
             ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COMMENT='订单'"
        );
        assert!(f.if_not_exists);
        assert_eq!(f.table.to_string(), "shop.orders");
        assert_eq!(f.columns.len(), 2);
        assert_eq!(f.indexes.len(), 2);
        assert_eq!(f.primary_key().unwrap().columns, vec!["id"]);
        assert_eq!(f.options.engine.as_deref(), Some("InnoDB"));
        assert_eq!(f.options.comment.as_deref(), Some("订单"));
        assert!(!f.as_select);
    }

    #[test]
    fn test_column_level_primary_key() {
        let f = facts("CREATE TABLE t (id INT PRIMARY KEY, name VARCHAR(100))");
        assert_eq!(f.primary_key().unwrap().columns, vec!["id"]);
        assert!(f.options.is_empty());
    }

    #[test]
    fn test_create_as_and_like() {
        assert!(facts("CREATE TABLE t2 AS SELECT * FROM t1").as_select);
        assert!(facts("CREATE TABLE t2 ENGINE=InnoDB SELECT * FROM t1").as_select);
        let like = facts("CREATE TABLE t2 LIKE t1");
        assert_eq!(like.like.unwrap().to_string(), "t1");
    }
}
