//! Rule tables for the statement dispatcher.
//!
//! Every statement kind the engine audits has an ordered list of rules. A
//! rule is a small probe: it extracts facts from the statement, hands them
//! to a logic in [`crate::logics`], and leaves its findings on the
//! [`RuleHint`] it was given. The dispatcher builds a fresh hint for every
//! (statement, rule) pair.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────┐     ┌─────────────┐     ┌──────────┐
//! │ StmtNode  │────▶│ rule table  │────▶│ RuleHint │
//! └───────────┘     └─────────────┘     └──────────┘
//!                          │
//!                   ┌──────┴──────┐
//!                   │   logics    │──▶ introspect / cache
//!                   └─────────────┘
//! ```
//!
//! Order within a table matters: a rule that sets
//! [`RuleHint::is_skip_next_step`] stops the remaining rules for that
//! statement.
//!
//! # Implementing a rule
//!
//! ```ignore
//! use sql_audit::rules::{FnRule, Rule};
//!
//! let rule = FnRule::new("DML#检查WHERE条件", |ctx, stmt| {
//!     if stmt.text.is_empty() {
//!         ctx.push("empty");
//!     }
//! });
//! assert_eq!(rule.hint(), "DML#检查WHERE条件");
//! ```

mod alter_table;
mod create_table;
mod dml;
mod objects;

use async_trait::async_trait;

pub use self::{
    alter_table::alter_table_rules,
    create_table::create_table_rules,
    dml::dml_rules,
    objects::{
        analyze_table_rules, create_database_rules, create_view_rules, drop_table_rules,
        rename_table_rules
    }
};
use crate::{
    cache::KvCache,
    config::InspectParams,
    introspect::Executor,
    parser::{StmtKind, StmtNode}
};

/// Per-statement, per-rule context.
pub struct RuleHint<'a> {
    pub db:                &'a dyn Executor,
    pub kv:                &'a mut KvCache,
    /// Text of the statement under audit
    pub query:             &'a str,
    pub params:            &'a InspectParams,
    pub summary:           Vec<String>,
    pub affected_rows:     i64,
    pub is_skip_next_step: bool,
    pub merge_alter:       Option<String>
}

impl<'a> RuleHint<'a> {
    pub fn new(
        db: &'a dyn Executor,
        kv: &'a mut KvCache,
        query: &'a str,
        params: &'a InspectParams
    ) -> Self {
        Self {
            db,
            kv,
            query,
            params,
            summary: Vec::new(),
            affected_rows: 0,
            is_skip_next_step: false,
            merge_alter: None
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.summary.push(message.into());
    }

    /// Push a message and stop the remaining rules for this statement.
    pub fn halt(&mut self, message: impl Into<String>) {
        self.push(message);
        self.is_skip_next_step = true;
    }

    pub fn is_tidb(&self) -> bool {
        self.kv.is_tidb()
    }

    /// Schema of the connection, `None` when unset.
    pub fn default_schema(&self) -> Option<&str> {
        Some(self.db.schema()).filter(|s| !s.is_empty())
    }
}

/// A single audit probe.
#[async_trait]
pub trait Rule: Send + Sync {
    /// `Kind#description` label, for logs.
    fn hint(&self) -> &'static str;

    async fn check(&self, ctx: &mut RuleHint<'_>, stmt: &StmtNode);
}

/// Signature of a rule that needs no introspection.
pub type CheckFn = fn(&mut RuleHint<'_>, &StmtNode);

/// Rule backed by a plain function.
pub struct FnRule {
    hint:  &'static str,
    check: CheckFn
}

impl FnRule {
    pub const fn new(hint: &'static str, check: CheckFn) -> Self {
        Self { hint, check }
    }
}

#[async_trait]
impl Rule for FnRule {
    fn hint(&self) -> &'static str {
        self.hint
    }

    async fn check(&self, ctx: &mut RuleHint<'_>, stmt: &StmtNode) {
        (self.check)(ctx, stmt)
    }
}

/// Rule table for a statement kind, `None` for kinds the engine does not audit.
pub fn rules_for(kind: StmtKind) -> Option<Vec<Box<dyn Rule>>> {
    let rules = match kind {
        StmtKind::CreateTable => create_table_rules(),
        StmtKind::CreateView => create_view_rules(),
        StmtKind::CreateDatabase => create_database_rules(),
        StmtKind::RenameTable => rename_table_rules(),
        StmtKind::AnalyzeTable => analyze_table_rules(),
        StmtKind::DropTable | StmtKind::TruncateTable => drop_table_rules(),
        StmtKind::AlterTable => alter_table_rules(),
        StmtKind::Delete | StmtKind::Insert | StmtKind::Update => dml_rules(),
        _ => return None
    };
    Some(rules)
}
