use async_trait::async_trait;

use super::{FnRule, Rule, RuleHint};
use crate::{
    logics::{
        common::{self, Blocklist},
        dml
    },
    parser::StmtNode,
    traverses::DmlFacts
};

struct TablesExist;

#[async_trait]
impl Rule for TablesExist {
    fn hint(&self) -> &'static str {
        "DML#检查表是否存在"
    }

    async fn check(&self, ctx: &mut RuleHint<'_>, stmt: &StmtNode) {
        if let Some(facts) = DmlFacts::from_stmt(stmt) {
            dml::check_tables_exist(&facts, ctx).await;
        }
    }
}

struct AffectedRows;

#[async_trait]
impl Rule for AffectedRows {
    fn hint(&self) -> &'static str {
        "DML#检查影响行数"
    }

    async fn check(&self, ctx: &mut RuleHint<'_>, stmt: &StmtNode) {
        if let Some(facts) = DmlFacts::from_stmt(stmt) {
            dml::check_affected_rows(&facts, ctx).await;
        }
    }
}

pub fn dml_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(FnRule::new("DML#检查DML黑名单", |ctx, stmt| {
            if let Some(facts) = DmlFacts::from_stmt(stmt) {
                common::check_blocklist(&facts.tables, Blocklist::Dml, ctx);
            }
        })),
        Box::new(TablesExist),
        Box::new(FnRule::new("DML#检查WHERE条件", |ctx, stmt| {
            if let Some(facts) = DmlFacts::from_stmt(stmt) {
                dml::check_where(&facts, ctx);
            }
        })),
        Box::new(FnRule::new("DML#检查LIMIT子句", |ctx, stmt| {
            if let Some(facts) = DmlFacts::from_stmt(stmt) {
                dml::check_limit(&facts, ctx);
            }
        })),
        Box::new(FnRule::new("DML#检查ORDER BY子句", |ctx, stmt| {
            if let Some(facts) = DmlFacts::from_stmt(stmt) {
                dml::check_order_by(&facts, ctx);
            }
        })),
        Box::new(FnRule::new("DML#检查子查询", |ctx, stmt| {
            if let Some(facts) = DmlFacts::from_stmt(stmt) {
                dml::check_subquery(&facts, ctx);
            }
        })),
        Box::new(FnRule::new("DML#检查JOIN条件", |ctx, stmt| {
            if let Some(facts) = DmlFacts::from_stmt(stmt) {
                dml::check_join_on(&facts, ctx);
            }
        })),
        Box::new(FnRule::new("DML#检查INSERT语句", |ctx, stmt| {
            if let Some(facts) = DmlFacts::from_stmt(stmt) {
                dml::check_insert(&facts, ctx);
            }
        })),
        Box::new(AffectedRows)
    ]
}
