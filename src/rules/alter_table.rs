use async_trait::async_trait;

use super::{FnRule, Rule, RuleHint};
use crate::{
    logics::{
        alter, column,
        common::{self, Blocklist},
        index, table
    },
    parser::StmtNode,
    traverses::{AlterOp, AlterTableFacts, IndexFacts}
};

struct TableExists;

#[async_trait]
impl Rule for TableExists {
    fn hint(&self) -> &'static str {
        "AlterTable#检查表是否存在"
    }

    async fn check(&self, ctx: &mut RuleHint<'_>, stmt: &StmtNode) {
        if let Some(facts) = AlterTableFacts::from_stmt(stmt) {
            alter::check_table_exists(&facts, ctx).await;
        }
    }
}

struct TypeChange;

#[async_trait]
impl Rule for TypeChange {
    fn hint(&self) -> &'static str {
        "AlterTable#检查列类型变更"
    }

    async fn check(&self, ctx: &mut RuleHint<'_>, stmt: &StmtNode) {
        let Some(facts) = AlterTableFacts::from_stmt(stmt) else {
            return;
        };
        if facts.redefined_columns().next().is_none() {
            return;
        }
        if let Some(current) = alter::current_definition(&facts, ctx).await {
            alter::check_type_change(&facts, &current, ctx);
        }
    }
}

struct AddedIndexes;

#[async_trait]
impl Rule for AddedIndexes {
    fn hint(&self) -> &'static str {
        "AlterTable#检查新增索引"
    }

    async fn check(&self, ctx: &mut RuleHint<'_>, stmt: &StmtNode) {
        let Some(facts) = AlterTableFacts::from_stmt(stmt) else {
            return;
        };
        let added: Vec<IndexFacts> = facts.added_indexes().cloned().collect();
        if added.is_empty() {
            return;
        }

        let (mut existing, mut columns) = (Vec::new(), Vec::new());
        if let Some(current) = alter::current_definition(&facts, ctx).await {
            let dropped: Vec<String> = facts
                .ops
                .iter()
                .filter_map(|op| match op {
                    AlterOp::DropIndex(name) => Some(name.to_ascii_lowercase()),
                    _ => None
                })
                .collect();
            existing = current
                .indexes
                .into_iter()
                .filter(|i| {
                    i.name
                        .as_deref()
                        .is_none_or(|n| !dropped.contains(&n.to_ascii_lowercase()))
                })
                .collect();
            columns = current.columns.into_iter().map(|c| c.name).collect();
            columns.extend(facts.added_columns().map(|c| c.name.clone()));
            columns.extend(facts.redefined_columns().map(|(_, c)| c.name.clone()));
        }
        index::check_indexes(&facts.table.name, &added, &existing, &columns, ctx);
    }
}

pub fn alter_table_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(FnRule::new("AlterTable#检查DDL黑名单", |ctx, stmt| {
            if let Some(facts) = AlterTableFacts::from_stmt(stmt) {
                common::check_blocklist(&[facts.table], Blocklist::Ddl, ctx);
            }
        })),
        Box::new(FnRule::new("AlterTable#检查ADD CONSTRAINT语法", |ctx, stmt| {
            if let Some(facts) = AlterTableFacts::from_stmt(stmt) {
                alter::check_add_constraint(&facts, ctx);
            }
        })),
        Box::new(TableExists),
        Box::new(FnRule::new("AlterTable#检查DROP操作", |ctx, stmt| {
            if let Some(facts) = AlterTableFacts::from_stmt(stmt) {
                alter::check_drop_ops(&facts, ctx);
            }
        })),
        Box::new(FnRule::new("AlterTable#检查RENAME操作", |ctx, stmt| {
            if let Some(facts) = AlterTableFacts::from_stmt(stmt) {
                alter::check_rename_ops(&facts, ctx);
            }
        })),
        Box::new(FnRule::new("AlterTable#检查CHANGE操作", |ctx, stmt| {
            if let Some(facts) = AlterTableFacts::from_stmt(stmt) {
                alter::check_change(&facts, ctx);
            }
        })),
        Box::new(FnRule::new("AlterTable#检查新增列", |ctx, stmt| {
            if let Some(facts) = AlterTableFacts::from_stmt(stmt) {
                column::check_duplicate_columns(facts.added_columns(), ctx);
                column::check_columns(facts.added_columns(), ctx);
            }
        })),
        Box::new(FnRule::new("AlterTable#检查修改列", |ctx, stmt| {
            if let Some(facts) = AlterTableFacts::from_stmt(stmt) {
                column::check_columns(facts.redefined_columns().map(|(_, c)| c), ctx);
            }
        })),
        Box::new(TypeChange),
        Box::new(AddedIndexes),
        Box::new(FnRule::new("AlterTable#检查表选项", |ctx, stmt| {
            let Some(facts) = AlterTableFacts::from_stmt(stmt) else {
                return;
            };
            for op in &facts.ops {
                if let AlterOp::Options(options) = op {
                    table::check_table_options(
                        &facts.table.name,
                        options,
                        table::OptionsOrigin::Alter,
                        ctx
                    );
                }
            }
        })),
        Box::new(FnRule::new("AlterTable#检查TiDB语法", |ctx, stmt| {
            let features: Vec<&str> = stmt.tidb_features.keys().map(String::as_str).collect();
            common::check_tidb_syntax(&features, ctx);
        }))
    ]
}
