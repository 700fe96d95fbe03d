//! `ALTER TABLE` operation checks.

use crate::{
    introspect::{self, Lookup},
    rules::RuleHint,
    traverses::{AlterOp, AlterTableFacts, ColumnFacts, CreateTableFacts}
};

pub fn check_add_constraint(facts: &AlterTableFacts, ctx: &mut RuleHint<'_>) {
    if facts.has_add_constraint() {
        ctx.halt("禁止使用ALTER TABLE...ADD CONSTRAINT...语法");
    }
}

/// The altered table must exist; an absent table stops the statement.
pub async fn check_table_exists(facts: &AlterTableFacts, ctx: &mut RuleHint<'_>) {
    let target = facts.table.qualified_with(ctx.default_schema());
    ctx.merge_alter = Some(target);
    if let Lookup::NotFound(message) =
        introspect::check_if_table_exists(&facts.table.to_string(), ctx.db).await
    {
        ctx.halt(message);
    }
}

pub fn check_drop_ops(facts: &AlterTableFacts, ctx: &mut RuleHint<'_>) {
    let params = ctx.params;
    let table = &facts.table.name;
    for op in &facts.ops {
        match op {
            AlterOp::DropColumn(column) if !params.enable_drop_cols => {
                ctx.push(format!("表`{}`禁止DROP列`{}`", table, column));
            }
            AlterOp::DropIndex(index) if !params.enable_drop_indexes => {
                ctx.push(format!("表`{}`禁止DROP索引`{}`", table, index));
            }
            AlterOp::DropPrimaryKey if !params.enable_drop_primarykey => {
                ctx.push(format!("表`{}`禁止DROP主键", table));
            }
            _ => {}
        }
    }
}

pub fn check_rename_ops(facts: &AlterTableFacts, ctx: &mut RuleHint<'_>) {
    let params = ctx.params;
    let table = &facts.table.name;
    for op in &facts.ops {
        match op {
            AlterOp::RenameTable(to) if !params.enable_rename_table_name => {
                ctx.push(format!("表`{}`禁止RENAME为`{}`", table, to));
            }
            AlterOp::RenameIndex { from, to } if !params.enable_index_rename => {
                ctx.push(format!("表`{}`禁止RENAME索引`{}`为`{}`", table, from, to));
            }
            AlterOp::RenameColumn { from, to } if !params.enable_column_change_column_name => {
                ctx.push(format!("表`{}`禁止RENAME列`{}`为`{}`", table, from, to));
            }
            _ => {}
        }
    }
}

/// `CHANGE` is rejected; a rename is allowed only by its own toggle.
pub fn check_change(facts: &AlterTableFacts, ctx: &mut RuleHint<'_>) {
    for op in &facts.ops {
        let AlterOp::Change { old, column } = op else {
            continue;
        };
        if old.eq_ignore_ascii_case(&column.name) {
            ctx.push(format!("列`{}`禁止使用CHANGE操作，请使用MODIFY", old));
        } else if !ctx.params.enable_column_change_column_name {
            ctx.push(format!(
                "禁止使用CHANGE修改列名操作，列`{}`不能重命名为`{}`，请使用MODIFY",
                old, column.name
            ));
        }
    }
}

/// Current definition of the altered table, `None` when it cannot be read.
pub async fn current_definition(
    facts: &AlterTableFacts,
    ctx: &mut RuleHint<'_>
) -> Option<CreateTableFacts> {
    let audit = introspect::show_create_table(&facts.table.to_string(), ctx.db, ctx.kv)
        .await
        .ok()?;
    audit.stmts.first().and_then(CreateTableFacts::from_stmt)
}

/// Redefined columns may only change type when allowed.
pub fn check_type_change(facts: &AlterTableFacts, current: &CreateTableFacts, ctx: &mut RuleHint<'_>) {
    let params = ctx.params;
    if params.enable_column_type_change {
        return;
    }
    for (old_name, column) in facts.redefined_columns() {
        let Some(before) = current.column(old_name) else {
            continue;
        };
        let (from, to) = (before.type_text(), column.type_text());
        if from.eq_ignore_ascii_case(&to) {
            continue;
        }
        if params.enable_column_type_change_compatible && is_compatible_change(before, column) {
            continue;
        }
        ctx.push(format!(
            "列`{}`的类型不允许从`{}`变更为`{}`",
            old_name, from, to
        ));
    }
}

const TEXT_RANK: &[&str] = &["TINYTEXT", "TEXT", "MEDIUMTEXT", "LONGTEXT"];
const BLOB_RANK: &[&str] = &["TINYBLOB", "BLOB", "MEDIUMBLOB", "LONGBLOB"];

/// Widening changes that keep every existing value representable.
pub fn is_compatible_change(before: &ColumnFacts, after: &ColumnFacts) -> bool {
    if let (Some(from), Some(to)) = (before.integer_rank(), after.integer_rank()) {
        return to >= from && before.unsigned == after.unsigned;
    }
    let longer = || match (before.length(), after.length()) {
        (Some(from), Some(to)) => to >= from,
        _ => false
    };
    match (before.data_type.as_str(), after.data_type.as_str()) {
        ("CHAR", "CHAR") | ("CHAR", "VARCHAR") | ("VARCHAR", "VARCHAR") => longer(),
        ("BINARY", "BINARY") | ("BINARY", "VARBINARY") | ("VARBINARY", "VARBINARY") => longer(),
        ("DECIMAL", "DECIMAL") => {
            let scale = |c: &ColumnFacts| c.type_args.get(1).cloned().unwrap_or_default();
            scale(before) == scale(after) && longer()
        }
        (from, to) => rank_up(TEXT_RANK, from, to) || rank_up(BLOB_RANK, from, to)
    }
}

fn rank_up(ranks: &[&str], from: &str, to: &str) -> bool {
    let position = |t: &str| ranks.iter().position(|r| *r == t);
    matches!((position(from), position(to)), (Some(a), Some(b)) if b >= a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::tokens;

    fn column(def: &str) -> ColumnFacts {
        ColumnFacts::parse(&tokens::significant(&tokens::tokenize(def).unwrap())).unwrap()
    }

    #[test]
    fn test_integer_widening() {
        assert!(is_compatible_change(&column("a INT"), &column("a BIGINT")));
        assert!(!is_compatible_change(&column("a BIGINT"), &column("a INT")));
        assert!(!is_compatible_change(&column("a INT"), &column("a INT UNSIGNED")));
    }

    #[test]
    fn test_string_widening() {
        assert!(is_compatible_change(&column("a CHAR(10)"), &column("a VARCHAR(20)")));
        assert!(is_compatible_change(&column("a VARCHAR(10)"), &column("a VARCHAR(10)")));
        assert!(!is_compatible_change(&column("a VARCHAR(20)"), &column("a VARCHAR(10)")));
        assert!(!is_compatible_change(&column("a VARCHAR(20)"), &column("a INT")));
        assert!(is_compatible_change(&column("a TEXT"), &column("a LONGTEXT")));
    }

    #[test]
    fn test_decimal_scale_must_match() {
        assert!(is_compatible_change(&column("a DECIMAL(10,2)"), &column("a DECIMAL(12,2)")));
        assert!(!is_compatible_change(&column("a DECIMAL(10,2)"), &column("a DECIMAL(12,4)")));
    }
}
