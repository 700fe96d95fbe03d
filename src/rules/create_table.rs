use async_trait::async_trait;

use super::{FnRule, Rule, RuleHint};
use crate::{
    logics::{column, common, index, objects, table},
    parser::StmtNode,
    traverses::CreateTableFacts
};

struct TableAbsent;

#[async_trait]
impl Rule for TableAbsent {
    fn hint(&self) -> &'static str {
        "CreateTable#检查表是否存在"
    }

    async fn check(&self, ctx: &mut RuleHint<'_>, stmt: &StmtNode) {
        if let Some(facts) = CreateTableFacts::from_stmt(stmt) {
            objects::check_absent(&facts.table, ctx).await;
        }
    }
}

pub fn create_table_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(TableAbsent),
        Box::new(FnRule::new("CreateTable#检查CREATE TABLE AS语法", |ctx, stmt| {
            if let Some(facts) = CreateTableFacts::from_stmt(stmt) {
                table::check_create_as(&facts, ctx);
            }
        })),
        Box::new(FnRule::new("CreateTable#检查CREATE TABLE LIKE语法", |ctx, stmt| {
            if let Some(facts) = CreateTableFacts::from_stmt(stmt) {
                table::check_create_like(&facts, ctx);
            }
        })),
        Box::new(FnRule::new("CreateTable#检查表名规范", |ctx, stmt| {
            if let Some(facts) = CreateTableFacts::from_stmt(stmt) {
                table::check_table_name(&facts, ctx);
            }
        })),
        Box::new(FnRule::new("CreateTable#检查表选项", |ctx, stmt| {
            if let Some(facts) = CreateTableFacts::from_stmt(stmt) {
                table::check_table_options(
                    &facts.table.name,
                    &facts.options,
                    table::OptionsOrigin::Create,
                    ctx
                );
            }
        })),
        Box::new(FnRule::new("CreateTable#检查TiDB语法", |ctx, stmt| {
            let features: Vec<&str> = stmt.tidb_features.keys().map(String::as_str).collect();
            common::check_tidb_syntax(&features, ctx);
        })),
        Box::new(FnRule::new("CreateTable#检查表注释", |ctx, stmt| {
            if let Some(facts) = CreateTableFacts::from_stmt(stmt) {
                table::check_table_comment(&facts, ctx);
            }
        })),
        Box::new(FnRule::new("CreateTable#检查列定义", |ctx, stmt| {
            if let Some(facts) = CreateTableFacts::from_stmt(stmt) {
                column::check_duplicate_columns(&facts.columns, ctx);
                column::check_columns(&facts.columns, ctx);
            }
        })),
        Box::new(FnRule::new("CreateTable#检查主键", |ctx, stmt| {
            if let Some(facts) = CreateTableFacts::from_stmt(stmt) {
                if facts.as_select || facts.like.is_some() {
                    return;
                }
                let auto_random = stmt.tidb_features.contains_key("AUTO_RANDOM");
                table::check_primary_key(&facts, auto_random, ctx);
            }
        })),
        Box::new(FnRule::new("CreateTable#检查索引", |ctx, stmt| {
            if let Some(facts) = CreateTableFacts::from_stmt(stmt) {
                let columns: Vec<String> = facts.columns.iter().map(|c| c.name.clone()).collect();
                index::check_indexes(&facts.table.name, &facts.indexes, &[], &columns, ctx);
            }
        })),
        Box::new(FnRule::new("CreateTable#检查审计字段", |ctx, stmt| {
            if let Some(facts) = CreateTableFacts::from_stmt(stmt) {
                table::check_audit_columns(&facts, ctx);
            }
        }))
    ]
}
