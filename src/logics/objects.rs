//! Views, databases, renames, ANALYZE and DROP / TRUNCATE.

use super::{common::check_identifier, table::check_charset_and_collation};
use crate::{
    introspect::{self, Lookup},
    parser::QualifiedName,
    rules::RuleHint,
    traverses::{
        AnalyzeTableFacts, CreateDatabaseFacts, CreateViewFacts, DropTableFacts, RenameTableFacts
    }
};

/// A table or view about to be created must not exist yet.
pub async fn check_absent(table: &QualifiedName, ctx: &mut RuleHint<'_>) {
    if let Lookup::Found(message) =
        introspect::check_if_table_exists(&table.to_string(), ctx.db).await
    {
        ctx.halt(message);
    }
}

/// Every listed table must exist.
pub async fn check_present(tables: &[QualifiedName], ctx: &mut RuleHint<'_>) {
    for table in tables {
        if let Lookup::NotFound(message) =
            introspect::check_if_table_exists(&table.to_string(), ctx.db).await
        {
            ctx.push(message);
        }
    }
}

pub fn check_view_allowed(_facts: &CreateViewFacts, ctx: &mut RuleHint<'_>) {
    if !ctx.params.enable_create_view {
        ctx.halt("不允许创建视图");
    }
}

pub fn check_view_name(facts: &CreateViewFacts, ctx: &mut RuleHint<'_>) {
    let max = ctx.params.max_table_name_length;
    check_identifier("视图名", &facts.view.name, max, ctx);
}

pub async fn check_view_absent(facts: &CreateViewFacts, ctx: &mut RuleHint<'_>) {
    if !facts.or_replace {
        check_absent(&facts.view, ctx).await;
    }
}

/// An existing database stops the statement.
pub async fn check_database_absent(facts: &CreateDatabaseFacts, ctx: &mut RuleHint<'_>) {
    if let Lookup::Found(message) = introspect::check_if_database_exists(&facts.name, ctx.db).await {
        ctx.halt(message);
    }
}

pub fn check_database_options(facts: &CreateDatabaseFacts, ctx: &mut RuleHint<'_>) {
    let max = ctx.params.max_table_name_length;
    check_identifier("数据库名", &facts.name, max, ctx);
    if ctx.params.check_table_charset {
        check_charset_and_collation(
            &format!("数据库`{}`", facts.name),
            facts.options.charset.as_deref(),
            facts.options.collation.as_deref(),
            ctx
        );
    }
}

pub fn check_rename_allowed(facts: &RenameTableFacts, ctx: &mut RuleHint<'_>) {
    if ctx.params.enable_rename_table_name {
        return;
    }
    let pairs = facts
        .pairs
        .iter()
        .map(|(from, to)| format!("`{}`->`{}`", from, to))
        .collect::<Vec<_>>()
        .join(",");
    ctx.halt(format!("禁止使用RENAME TABLE语法: {}", pairs));
}

/// Sources must exist and targets must not.
pub async fn check_rename_targets(facts: &RenameTableFacts, ctx: &mut RuleHint<'_>) {
    for (from, to) in &facts.pairs {
        if let Lookup::NotFound(message) =
            introspect::check_if_table_exists(&from.to_string(), ctx.db).await
        {
            ctx.push(message);
        }
        if let Lookup::Found(message) =
            introspect::check_if_table_exists(&to.to_string(), ctx.db).await
        {
            ctx.push(message);
        }
    }
}

pub async fn check_analyze(facts: &AnalyzeTableFacts, ctx: &mut RuleHint<'_>) {
    if !ctx.is_tidb() {
        ctx.push("仅允许TiDB提交Analyze table语法");
        return;
    }
    check_present(&facts.tables, ctx).await;
}

/// DROP and TRUNCATE always leave a message for the reviewer.
pub fn check_drop(facts: &DropTableFacts, ctx: &mut RuleHint<'_>) {
    let allowed = if facts.truncate {
        ctx.params.enable_truncate_table
    } else {
        ctx.params.enable_drop_table
    };
    let tables = facts
        .tables
        .iter()
        .map(|t| format!("`{}`", t))
        .collect::<Vec<_>>()
        .join(",");
    if allowed {
        ctx.push(format!(
            "当前为{}操作，将删除表{}的数据，请确认已备份",
            facts.label(),
            tables
        ));
    } else {
        ctx.halt(format!("禁止执行{}操作，表{}", facts.label(), tables));
    }
}

pub async fn check_drop_targets(facts: &DropTableFacts, ctx: &mut RuleHint<'_>) {
    if !facts.if_exists {
        check_present(&facts.tables, ctx).await;
    }
}
