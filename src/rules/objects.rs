//! Rule tables for views, databases, renames, ANALYZE and DROP / TRUNCATE.

use async_trait::async_trait;

use super::{FnRule, Rule, RuleHint};
use crate::{
    logics::{
        common::{self, Blocklist},
        objects
    },
    parser::StmtNode,
    traverses::{
        AnalyzeTableFacts, CreateDatabaseFacts, CreateViewFacts, DropTableFacts, RenameTableFacts
    }
};

struct ViewAbsent;

#[async_trait]
impl Rule for ViewAbsent {
    fn hint(&self) -> &'static str {
        "CreateView#检查视图是否存在"
    }

    async fn check(&self, ctx: &mut RuleHint<'_>, stmt: &StmtNode) {
        if let Some(facts) = CreateViewFacts::from_stmt(stmt) {
            objects::check_view_absent(&facts, ctx).await;
        }
    }
}

struct ViewTablesExist;

#[async_trait]
impl Rule for ViewTablesExist {
    fn hint(&self) -> &'static str {
        "CreateView#检查引用的表是否存在"
    }

    async fn check(&self, ctx: &mut RuleHint<'_>, stmt: &StmtNode) {
        if let Some(facts) = CreateViewFacts::from_stmt(stmt) {
            objects::check_present(&facts.tables, ctx).await;
        }
    }
}

pub fn create_view_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(FnRule::new("CreateView#检查是否允许创建视图", |ctx, stmt| {
            if let Some(facts) = CreateViewFacts::from_stmt(stmt) {
                objects::check_view_allowed(&facts, ctx);
            }
        })),
        Box::new(FnRule::new("CreateView#检查视图名规范", |ctx, stmt| {
            if let Some(facts) = CreateViewFacts::from_stmt(stmt) {
                objects::check_view_name(&facts, ctx);
            }
        })),
        Box::new(ViewAbsent),
        Box::new(ViewTablesExist)
    ]
}

struct DatabaseAbsent;

#[async_trait]
impl Rule for DatabaseAbsent {
    fn hint(&self) -> &'static str {
        "CreateDatabase#检查DB是否存在"
    }

    async fn check(&self, ctx: &mut RuleHint<'_>, stmt: &StmtNode) {
        if let Some(facts) = CreateDatabaseFacts::from_stmt(stmt) {
            objects::check_database_absent(&facts, ctx).await;
        }
    }
}

pub fn create_database_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(DatabaseAbsent),
        Box::new(FnRule::new("CreateDatabase#检查DB命名和字符集", |ctx, stmt| {
            if let Some(facts) = CreateDatabaseFacts::from_stmt(stmt) {
                objects::check_database_options(&facts, ctx);
            }
        }))
    ]
}

struct RenameTargets;

#[async_trait]
impl Rule for RenameTargets {
    fn hint(&self) -> &'static str {
        "RenameTable#检查表是否存在"
    }

    async fn check(&self, ctx: &mut RuleHint<'_>, stmt: &StmtNode) {
        if let Some(facts) = RenameTableFacts::from_stmt(stmt) {
            objects::check_rename_targets(&facts, ctx).await;
        }
    }
}

pub fn rename_table_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(FnRule::new("RenameTable#检查DDL黑名单", |ctx, stmt| {
            if let Some(facts) = RenameTableFacts::from_stmt(stmt) {
                let sources: Vec<_> = facts.pairs.into_iter().map(|(from, _)| from).collect();
                common::check_blocklist(&sources, Blocklist::Ddl, ctx);
            }
        })),
        Box::new(FnRule::new("RenameTable#检查是否允许RENAME", |ctx, stmt| {
            if let Some(facts) = RenameTableFacts::from_stmt(stmt) {
                objects::check_rename_allowed(&facts, ctx);
            }
        })),
        Box::new(RenameTargets)
    ]
}

struct Analyze;

#[async_trait]
impl Rule for Analyze {
    fn hint(&self) -> &'static str {
        "AnalyzeTable#检查Analyze语法"
    }

    async fn check(&self, ctx: &mut RuleHint<'_>, stmt: &StmtNode) {
        if let Some(facts) = AnalyzeTableFacts::from_stmt(stmt) {
            objects::check_analyze(&facts, ctx).await;
        }
    }
}

pub fn analyze_table_rules() -> Vec<Box<dyn Rule>> {
    vec![Box::new(Analyze)]
}

struct DropTargets;

#[async_trait]
impl Rule for DropTargets {
    fn hint(&self) -> &'static str {
        "DropTable#检查表是否存在"
    }

    async fn check(&self, ctx: &mut RuleHint<'_>, stmt: &StmtNode) {
        if let Some(facts) = DropTableFacts::from_stmt(stmt) {
            objects::check_drop_targets(&facts, ctx).await;
        }
    }
}

pub fn drop_table_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(FnRule::new("DropTable#检查DDL黑名单", |ctx, stmt| {
            if let Some(facts) = DropTableFacts::from_stmt(stmt) {
                common::check_blocklist(&facts.tables, Blocklist::Ddl, ctx);
            }
        })),
        Box::new(FnRule::new("DropTable#DROP/TRUNCATE操作提醒", |ctx, stmt| {
            if let Some(facts) = DropTableFacts::from_stmt(stmt) {
                objects::check_drop(&facts, ctx);
            }
        })),
        Box::new(DropTargets)
    ]
}
