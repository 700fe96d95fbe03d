use sqlparser::{
    ast::{AlterTableOperation, Statement},
    tokenizer::Token
};

use super::{ColumnFacts, IndexFacts, TableOptions, create_table::is_index_definition};
use crate::parser::{
    self, QualifiedName, StmtKind, StmtNode,
    tokens::{self, is_keyword}
};

/// One comma-separated operation of an `ALTER TABLE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlterOp {
    AddColumns(Vec<ColumnFacts>),
    AddIndex(IndexFacts),
    /// `ADD CONSTRAINT ...`, with the parsed key when it is one
    AddConstraint(Option<IndexFacts>),
    DropColumn(String),
    DropIndex(String),
    DropPrimaryKey,
    DropForeignKey(String),
    RenameTable(QualifiedName),
    RenameIndex { from: String, to: String },
    RenameColumn { from: String, to: String },
    Change { old: String, column: ColumnFacts },
    Modify(ColumnFacts),
    Options(TableOptions),
    Other(String)
}

/// Facts of one `ALTER TABLE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlterTableFacts {
    pub table: QualifiedName,
    pub ops:   Vec<AlterOp>
}

impl AlterTableFacts {
    pub fn from_stmt(stmt: &StmtNode) -> Option<Self> {
        if stmt.kind != StmtKind::AlterTable {
            return None;
        }
        let mut facts = Self::from_tokens(&stmt.tokens)?;
        if let Statement::AlterTable(alter) = &stmt.statement {
            facts.adopt_definitions(&alter.operations);
        }
        Some(facts)
    }

    /// Replace token-read column definitions with the parsed ones, in order.
    ///
    /// Left untouched when the two readings disagree on how many columns
    /// the statement defines.
    fn adopt_definitions(&mut self, operations: &[AlterTableOperation]) {
        let parsed: Vec<ColumnFacts> = operations
            .iter()
            .filter_map(|op| match op {
                AlterTableOperation::AddColumn { column_def, .. } => {
                    Some(ColumnFacts::from_def(column_def))
                }
                AlterTableOperation::ChangeColumn {
                    new_name,
                    data_type,
                    options,
                    ..
                } => Some(ColumnFacts::from_parts(new_name, data_type, options)),
                AlterTableOperation::ModifyColumn {
                    col_name,
                    data_type,
                    options,
                    ..
                } => Some(ColumnFacts::from_parts(col_name, data_type, options)),
                _ => None
            })
            .collect();

        let mut defined: Vec<&mut ColumnFacts> = self
            .ops
            .iter_mut()
            .flat_map(|op| match op {
                AlterOp::AddColumns(columns) => columns.iter_mut().collect::<Vec<_>>(),
                AlterOp::Change { column, .. } | AlterOp::Modify(column) => vec![column],
                _ => Vec::new()
            })
            .collect();
        if defined.len() != parsed.len() {
            return;
        }
        for (slot, column) in defined.iter_mut().zip(parsed) {
            **slot = column;
        }
    }

    pub fn from_tokens(all: &[Token]) -> Option<Self> {
        let table = parser::alter_target(all)?;
        let table_kw = all.iter().position(|t| is_keyword(t, "TABLE"))?;
        let (_, used) = QualifiedName::read(&all[table_kw + 1..])?;
        let body = &all[table_kw + 1 + used..];

        let ops = tokens::split_top_level(body, |t| matches!(t, Token::Comma))
            .into_iter()
            .map(parse_op)
            .collect();
        Some(Self { table, ops })
    }

    pub fn added_columns(&self) -> impl Iterator<Item = &ColumnFacts> {
        self.ops.iter().flat_map(|op| match op {
            AlterOp::AddColumns(columns) => columns.as_slice(),
            _ => &[][..]
        })
    }

    /// Columns redefined by `MODIFY` or `CHANGE`, with the column they replace.
    pub fn redefined_columns(&self) -> impl Iterator<Item = (&str, &ColumnFacts)> {
        self.ops.iter().filter_map(|op| match op {
            AlterOp::Modify(column) => Some((column.name.as_str(), column)),
            AlterOp::Change { old, column } => Some((old.as_str(), column)),
            _ => None
        })
    }

    pub fn has_add_constraint(&self) -> bool {
        self.ops
            .iter()
            .any(|op| matches!(op, AlterOp::AddConstraint(_)))
    }

    pub fn added_indexes(&self) -> impl Iterator<Item = &IndexFacts> {
        self.ops.iter().filter_map(|op| match op {
            AlterOp::AddIndex(index) => Some(index),
            AlterOp::AddConstraint(Some(index)) => Some(index),
            _ => None
        })
    }
}

fn name_at(op: &[Token], at: usize) -> String {
    op.get(at)
        .and_then(tokens::word)
        .map(str::to_string)
        .unwrap_or_default()
}

fn parse_op(op: &[Token]) -> AlterOp {
    let Some(first) = op.first().and_then(tokens::word).map(str::to_ascii_uppercase) else {
        return AlterOp::Other(tokens::render(op));
    };
    let rest = &op[1..];
    match first.as_str() {
        "ADD" => parse_add(rest),
        "DROP" => parse_drop(rest),
        "RENAME" => parse_rename(rest),
        "CHANGE" => {
            let skip = usize::from(rest.first().is_some_and(|t| is_keyword(t, "COLUMN")));
            let old = name_at(rest, skip);
            match ColumnFacts::parse(&rest[(skip + 1).min(rest.len())..]) {
                Some(column) => AlterOp::Change { old, column },
                None => AlterOp::Other(tokens::render(op))
            }
        }
        "MODIFY" => {
            let skip = usize::from(rest.first().is_some_and(|t| is_keyword(t, "COLUMN")));
            ColumnFacts::parse(&rest[skip.min(rest.len())..])
                .map_or_else(|| AlterOp::Other(tokens::render(op)), AlterOp::Modify)
        }
        "ENGINE" | "DEFAULT" | "CHARSET" | "CHARACTER" | "COLLATE" | "COMMENT"
        | "AUTO_INCREMENT" | "ROW_FORMAT" | "CONVERT" => AlterOp::Options(TableOptions::parse(op)),
        _ => AlterOp::Other(tokens::render(op))
    }
}

fn parse_add(rest: &[Token]) -> AlterOp {
    if rest.first().is_some_and(|t| is_keyword(t, "CONSTRAINT")) {
        return AlterOp::AddConstraint(IndexFacts::parse(rest));
    }
    if is_index_definition(rest) {
        return IndexFacts::parse(rest)
            .map_or_else(|| AlterOp::Other(tokens::render(rest)), AlterOp::AddIndex);
    }
    if rest.first().is_some_and(|t| is_keyword(t, "PARTITION")) {
        return AlterOp::Other(format!("ADD {}", tokens::render(rest)));
    }

    let skip = usize::from(rest.first().is_some_and(|t| is_keyword(t, "COLUMN")));
    let defs = &rest[skip.min(rest.len())..];
    let columns = match defs {
        [Token::LParen, ..] => match tokens::matching_paren(defs, 0) {
            Some(close) => tokens::split_top_level(&defs[1..close], |t| matches!(t, Token::Comma))
                .into_iter()
                .filter_map(ColumnFacts::parse)
                .collect(),
            None => Vec::new()
        },
        _ => ColumnFacts::parse(defs).into_iter().collect()
    };
    AlterOp::AddColumns(columns)
}

fn parse_drop(rest: &[Token]) -> AlterOp {
    let kw = rest
        .first()
        .and_then(tokens::word)
        .map(str::to_ascii_uppercase)
        .unwrap_or_default();
    match kw.as_str() {
        "PRIMARY" => AlterOp::DropPrimaryKey,
        "INDEX" | "KEY" => AlterOp::DropIndex(name_at(rest, 1)),
        "FOREIGN" => AlterOp::DropForeignKey(name_at(rest, 2)),
        "COLUMN" => AlterOp::DropColumn(name_at(rest, 1)),
        "CHECK" | "CONSTRAINT" | "PARTITION" => AlterOp::Other(format!("DROP {}", tokens::render(rest))),
        _ => AlterOp::DropColumn(name_at(rest, 0))
    }
}

fn parse_rename(rest: &[Token]) -> AlterOp {
    let kw = rest
        .first()
        .and_then(tokens::word)
        .map(str::to_ascii_uppercase)
        .unwrap_or_default();
    match kw.as_str() {
        "INDEX" | "KEY" => AlterOp::RenameIndex {
            from: name_at(rest, 1),
            to:   name_at(rest, 3)
        },
        "COLUMN" => AlterOp::RenameColumn {
            from: name_at(rest, 1),
            to:   name_at(rest, 3)
        },
        "TO" | "AS" => QualifiedName::read(&rest[1..])
            .map_or_else(|| AlterOp::Other(tokens::render(rest)), |(n, _)| AlterOp::RenameTable(n)),
        _ => QualifiedName::read(rest)
            .map_or_else(|| AlterOp::Other(tokens::render(rest)), |(n, _)| AlterOp::RenameTable(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(sql: &str) -> AlterTableFacts {
        AlterTableFacts::from_tokens(&tokens::significant(&tokens::tokenize(sql).unwrap())).unwrap()
    }

    #[test]
    fn test_multiple_operations() {
        let f = facts(
            "ALTER TABLE d.t ADD COLUMN a INT COMMENT 'x', ADD INDEX idx_a (a), DROP COLUMN b, DROP PRIMARY KEY"
        );
        assert_eq!(f.table.to_string(), "d.t");
        assert_eq!(f.ops.len(), 4);
        assert_eq!(f.added_columns().count(), 1);
        assert_eq!(f.added_indexes().count(), 1);
        assert_eq!(f.ops[2], AlterOp::DropColumn("b".to_string()));
        assert_eq!(f.ops[3], AlterOp::DropPrimaryKey);
    }

    #[test]
    fn test_change_and_modify() {
        let f = facts("ALTER TABLE t CHANGE COLUMN a b BIGINT COMMENT 'b', MODIFY c VARCHAR(20)");
        let redefined: Vec<_> = f.redefined_columns().map(|(old, c)| (old, c.name.as_str())).collect();
        assert_eq!(redefined, vec![("a", "b"), ("c", "c")]);
    }

    #[test]
    fn test_rename_and_constraint() {
        let f = facts("ALTER TABLE t RENAME TO t2");
        assert_eq!(f.ops[0], AlterOp::RenameTable(QualifiedName::bare("t2")));
        let f = facts("ALTER TABLE t ADD CONSTRAINT uniq_a UNIQUE (a)");
        assert!(matches!(f.ops[0], AlterOp::AddConstraint(Some(_))));
        let f = facts("ALTER TABLE t RENAME INDEX idx_a TO idx_b");
        assert_eq!(
            f.ops[0],
            AlterOp::RenameIndex {
                from: "idx_a".to_string(),
                to:   "idx_b".to_string()
            }
        );
    }

    fn parsed_facts(sql: &str) -> AlterTableFacts {
        crate::parser::parse(sql, "utf8mb4", "utf8mb4_general_ci")
            .map(|(audit, _)| AlterTableFacts::from_stmt(&audit.stmts[0]).unwrap())
            .unwrap()
    }

    #[test]
    fn test_definitions_from_ast() {
        let f = parsed_facts(
            "ALTER TABLE t ADD COLUMN r DOUBLE PRECISION NOT NULL DEFAULT 0 COMMENT 'r', MODIFY c BIGINT UNSIGNED AUTO_INCREMENT"
        );
        let added: Vec<_> = f.added_columns().collect();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].data_type, "DOUBLE");
        assert!(added[0].is_float() && added[0].not_null);
        assert_eq!(added[0].default.as_deref(), Some("0"));
        let (old, column) = f.redefined_columns().next().unwrap();
        assert_eq!(old, "c");
        assert_eq!(column.type_text(), "BIGINT UNSIGNED");
        assert!(column.auto_increment);
    }

    #[test]
    fn test_add_column_list() {
        let f = facts("ALTER TABLE t ADD (a INT, b INT)");
        assert_eq!(f.added_columns().count(), 2);
    }
}
