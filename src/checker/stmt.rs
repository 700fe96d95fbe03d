//! Dispatch of a single statement through its rule table.

use tracing::debug;

use super::report::ReturnData;
use crate::{
    cache::{CacheValue, KvCache},
    config::InspectParams,
    introspect::Executor,
    parser::{self, StmtKind, StmtNode, fingerprint},
    rules::{self, Rule, RuleHint},
    traverses::AlterTableFacts
};

pub const SELECT_MESSAGE: &str = "发现SELECT语句，请删除SELECT语句后重新审核";
pub const UNKNOWN_MESSAGE: &str = "未识别或禁止的审核语句，请联系数据库管理员";

/// Result of one statement plus its ALTER target, if it is an ALTER.
#[derive(Debug)]
pub struct StmtOutcome {
    pub data:        ReturnData,
    pub merge_alter: Option<String>
}

/// Type tag reported for a statement kind.
pub fn type_tag(kind: StmtKind) -> &'static str {
    match kind {
        StmtKind::CreateTable => "CreateTable",
        StmtKind::CreateView => "CreateView",
        StmtKind::CreateDatabase => "CreateDatabase",
        StmtKind::AlterTable => "AlterTable",
        StmtKind::DropTable | StmtKind::TruncateTable => "DropTable",
        StmtKind::RenameTable => "RenameTable",
        StmtKind::AnalyzeTable => "AnalyzeTable",
        StmtKind::Delete | StmtKind::Insert | StmtKind::Update => "DML",
        StmtKind::Select | StmtKind::SetOperation => "DML",
        _ => ""
    }
}

pub async fn check_statement(
    stmt: &StmtNode,
    db: &dyn Executor,
    kv: &mut KvCache,
    params: &InspectParams
) -> StmtOutcome {
    let id = fingerprint::fingerprint_id(&stmt.text);
    kv.put(id.clone(), CacheValue::Flag(true));
    let mut data = ReturnData::new(id, stmt.text.clone(), type_tag(stmt.kind));

    if stmt.kind.is_select() {
        data.warn(SELECT_MESSAGE);
        return StmtOutcome {
            data,
            merge_alter: None
        };
    }
    let Some(rules) = rules::rules_for(stmt.kind) else {
        data.sql_type.clear();
        data.warn(UNKNOWN_MESSAGE);
        return StmtOutcome {
            data,
            merge_alter: None
        };
    };

    debug!(kind = ?stmt.kind, rules = rules.len(), "dispatching statement");
    let mut merge_alter = run_rules(&rules, stmt, db, kv, params, &mut data).await;

    if stmt.kind == StmtKind::AlterTable {
        if AlterTableFacts::from_stmt(stmt).is_some_and(|facts| facts.has_add_constraint()) {
            merge_alter = None;
        } else if let Some(target) = parser::alter_target(&stmt.tokens) {
            let schema = Some(db.schema()).filter(|s| !s.is_empty());
            merge_alter = Some(target.qualified_with(schema));
        }
    }

    StmtOutcome { data, merge_alter }
}

/// Run `rules` in order, each with a fresh context, until one asks to skip
/// the rest. Returns the last ALTER target a rule recorded.
pub(crate) async fn run_rules(
    rules: &[Box<dyn Rule>],
    stmt: &StmtNode,
    db: &dyn Executor,
    kv: &mut KvCache,
    params: &InspectParams,
    data: &mut ReturnData
) -> Option<String> {
    let mut merge_alter = None;
    for rule in rules {
        let mut ctx = RuleHint::new(db, kv, &stmt.text, params);
        rule.check(&mut ctx, stmt).await;
        if !ctx.summary.is_empty() {
            debug!(rule = rule.hint(), findings = ctx.summary.len(), "rule reported");
        }
        data.extend(std::mem::take(&mut ctx.summary));
        if stmt.kind.is_dml() && ctx.affected_rows != 0 {
            data.affected_rows = ctx.affected_rows;
        }
        if let Some(target) = ctx.merge_alter.take() {
            merge_alter = Some(target);
        }
        if ctx.is_skip_next_step {
            debug!(rule = rule.hint(), "remaining rules skipped");
            break;
        }
    }
    merge_alter
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{introspect::OfflineExecutor, rules::FnRule};

    fn stop(ctx: &mut RuleHint<'_>, _stmt: &StmtNode) {
        ctx.halt("stop");
    }

    fn sentinel(ctx: &mut RuleHint<'_>, _stmt: &StmtNode) {
        ctx.push("sentinel ran");
    }

    fn note(ctx: &mut RuleHint<'_>, _stmt: &StmtNode) {
        ctx.push("note");
    }

    fn statement(sql: &str) -> StmtNode {
        let (audit, _) = parser::parse(sql, "", "").unwrap();
        audit.stmts.into_iter().next().unwrap()
    }

    #[tokio::test]
    async fn test_skip_stops_remaining_rules() {
        let rules: Vec<Box<dyn Rule>> = vec![
            Box::new(FnRule::new("note", note)),
            Box::new(FnRule::new("stop", stop)),
            Box::new(FnRule::new("sentinel", sentinel))
        ];
        let stmt = statement("UPDATE t SET a = 1 WHERE id = 1");
        let db = OfflineExecutor::new("");
        let mut kv = KvCache::new("stmt_test_skip");
        let mut data = ReturnData::new(String::new(), stmt.text.clone(), "DML");

        run_rules(&rules, &stmt, &db, &mut kv, &InspectParams::default(), &mut data).await;
        assert_eq!(data.summary, vec!["note", "stop"]);
    }

    #[tokio::test]
    async fn test_select_is_synthesized() {
        let stmt = statement("SELECT * FROM t");
        let db = OfflineExecutor::new("");
        let mut kv = KvCache::new("stmt_test_select");
        let outcome = check_statement(&stmt, &db, &mut kv, &InspectParams::default()).await;
        assert_eq!(outcome.data.summary, vec![SELECT_MESSAGE]);
        assert_eq!(outcome.data.sql_type, "DML");
        assert!(outcome.merge_alter.is_none());
    }

    #[tokio::test]
    async fn test_unknown_kind_clears_type() {
        let stmt = statement("CREATE INDEX idx_a ON t (a)");
        let db = OfflineExecutor::new("");
        let mut kv = KvCache::new("stmt_test_unknown");
        let outcome = check_statement(&stmt, &db, &mut kv, &InspectParams::default()).await;
        assert_eq!(outcome.data.summary, vec![UNKNOWN_MESSAGE]);
        assert!(outcome.data.sql_type.is_empty());
    }

    #[tokio::test]
    async fn test_alter_records_target() {
        let stmt = statement("ALTER TABLE shop.t ADD COLUMN a INT COMMENT 'a'");
        let db = OfflineExecutor::new("");
        let mut kv = KvCache::new("stmt_test_alter");
        let outcome = check_statement(&stmt, &db, &mut kv, &InspectParams::default()).await;
        assert_eq!(outcome.merge_alter.as_deref(), Some("shop.t"));
    }

    #[tokio::test]
    async fn test_add_constraint_records_no_target() {
        let stmt = statement("ALTER TABLE shop.t ADD CONSTRAINT uniq_a UNIQUE (a)");
        let db = OfflineExecutor::new("");
        let mut kv = KvCache::new("stmt_test_constraint");
        let outcome = check_statement(&stmt, &db, &mut kv, &InspectParams::default()).await;
        assert!(outcome.data.level.is_warning());
        assert!(outcome.merge_alter.is_none());
    }
}
