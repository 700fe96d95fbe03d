//! Facts for the smaller DDL statements.

use std::ops::ControlFlow;

use sqlparser::{ast::visit_relations, tokenizer::Token};

use super::TableOptions;
use crate::parser::{
    QualifiedName, StmtKind, StmtNode,
    tokens::{self, is_keyword}
};

/// `CREATE [OR REPLACE] [ALGORITHM=..] [DEFINER=..] VIEW name AS SELECT ...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateViewFacts {
    pub view:       QualifiedName,
    pub or_replace: bool,
    /// Relations read by the view's query
    pub tables:     Vec<QualifiedName>
}

impl CreateViewFacts {
    pub fn from_stmt(stmt: &StmtNode) -> Option<Self> {
        if stmt.kind != StmtKind::CreateView {
            return None;
        }
        let view_kw = stmt.tokens.iter().position(|t| is_keyword(t, "VIEW"))?;
        let or_replace = stmt.tokens[..view_kw]
            .iter()
            .any(|t| is_keyword(t, "REPLACE"));
        let mut rest = &stmt.tokens[view_kw + 1..];
        if tokens::starts_with(rest, &["IF", "NOT", "EXISTS"]) {
            rest = &rest[3..];
        }
        let (view, _) = QualifiedName::read(rest)?;

        let mut tables: Vec<QualifiedName> = Vec::new();
        let _ = visit_relations(&stmt.statement, |relation| {
            let name = QualifiedName::from_object_name(&relation.to_string());
            if name != view && !tables.contains(&name) {
                tables.push(name);
            }
            ControlFlow::<()>::Continue(())
        });
        Some(Self {
            view,
            or_replace,
            tables
        })
    }
}

/// `CREATE DATABASE|SCHEMA [IF NOT EXISTS] name [options]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDatabaseFacts {
    pub name:          String,
    pub if_not_exists: bool,
    pub options:       TableOptions
}

impl CreateDatabaseFacts {
    pub fn from_stmt(stmt: &StmtNode) -> Option<Self> {
        if stmt.kind != StmtKind::CreateDatabase {
            return None;
        }
        let mut rest = stmt.tokens.get(2..)?;
        let if_not_exists = tokens::starts_with(rest, &["IF", "NOT", "EXISTS"]);
        if if_not_exists {
            rest = &rest[3..];
        }
        let name = tokens::word(rest.first()?)?.to_string();
        Some(Self {
            name,
            if_not_exists,
            options: TableOptions::parse(&rest[1..])
        })
    }
}

/// `RENAME TABLE a TO b [, c TO d]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameTableFacts {
    pub pairs: Vec<(QualifiedName, QualifiedName)>
}

impl RenameTableFacts {
    pub fn from_stmt(stmt: &StmtNode) -> Option<Self> {
        if stmt.kind != StmtKind::RenameTable {
            return None;
        }
        let body = stmt.tokens.get(2..)?;
        let pairs = tokens::split_top_level(body, |t| matches!(t, Token::Comma))
            .into_iter()
            .filter_map(|pair| {
                let (from, used) = QualifiedName::read(pair)?;
                pair.get(used).filter(|t| is_keyword(t, "TO"))?;
                let (to, _) = QualifiedName::read(&pair[used + 1..])?;
                Some((from, to))
            })
            .collect();
        Some(Self { pairs })
    }
}

/// `ANALYZE [NO_WRITE_TO_BINLOG | LOCAL] TABLE t1 [, t2]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzeTableFacts {
    pub tables: Vec<QualifiedName>
}

impl AnalyzeTableFacts {
    pub fn from_stmt(stmt: &StmtNode) -> Option<Self> {
        if stmt.kind != StmtKind::AnalyzeTable {
            return None;
        }
        let start = stmt
            .tokens
            .iter()
            .position(|t| is_keyword(t, "TABLE"))
            .map_or(1, |i| i + 1);
        Some(Self {
            tables: read_name_list(stmt.tokens.get(start..)?)
        })
    }
}

/// `DROP [TEMPORARY] TABLE|VIEW [IF EXISTS] ...` or `TRUNCATE [TABLE] t`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTableFacts {
    pub truncate:  bool,
    pub view:      bool,
    pub if_exists: bool,
    pub tables:    Vec<QualifiedName>
}

impl DropTableFacts {
    pub fn from_stmt(stmt: &StmtNode) -> Option<Self> {
        let truncate = match stmt.kind {
            StmtKind::DropTable => false,
            StmtKind::TruncateTable => true,
            _ => return None
        };
        let object_kw = stmt
            .tokens
            .iter()
            .take(3)
            .position(|t| is_keyword(t, "TABLE") || is_keyword(t, "VIEW"));
        let view = object_kw.is_some_and(|i| is_keyword(&stmt.tokens[i], "VIEW"));
        let mut rest = stmt.tokens.get(object_kw.map_or(1, |i| i + 1)..)?;
        let if_exists = tokens::starts_with(rest, &["IF", "EXISTS"]);
        if if_exists {
            rest = &rest[2..];
        }
        Some(Self {
            truncate,
            view,
            if_exists,
            tables: read_name_list(rest)
        })
    }

    /// Statement label used in messages.
    pub fn label(&self) -> &'static str {
        if self.truncate { "TRUNCATE" } else { "DROP TABLE" }
    }
}

fn read_name_list(list: &[Token]) -> Vec<QualifiedName> {
    tokens::split_top_level(list, |t| matches!(t, Token::Comma))
        .into_iter()
        .filter_map(|part| QualifiedName::read(part).map(|(name, _)| name))
        .collect()
}
