use tracing::debug;

use crate::{
    introspect::{self, Lookup},
    rules::RuleHint,
    traverses::{DmlFacts, DmlKind}
};

/// Every written table must exist.
pub async fn check_tables_exist(facts: &DmlFacts, ctx: &mut RuleHint<'_>) {
    for table in &facts.targets {
        if let Lookup::NotFound(message) =
            introspect::check_if_table_exists(&table.to_string(), ctx.db).await
        {
            ctx.push(message);
        }
    }
}

pub fn check_where(facts: &DmlFacts, ctx: &mut RuleHint<'_>) {
    if ctx.params.dml_must_have_where && facts.kind.is_write_in_place() && !facts.has_where {
        ctx.push(format!("{}语句必须要有WHERE条件", facts.kind.keyword()));
    }
}

pub fn check_limit(facts: &DmlFacts, ctx: &mut RuleHint<'_>) {
    if ctx.params.dml_disable_limit && facts.kind.is_write_in_place() && facts.has_limit {
        ctx.push(format!("{}语句不能有LIMIT子句", facts.kind.keyword()));
    }
}

pub fn check_order_by(facts: &DmlFacts, ctx: &mut RuleHint<'_>) {
    if ctx.params.dml_disable_orderby && facts.kind.is_write_in_place() && facts.has_order_by {
        ctx.push(format!("{}语句不能有ORDER BY子句", facts.kind.keyword()));
    }
}

pub fn check_subquery(facts: &DmlFacts, ctx: &mut RuleHint<'_>) {
    if ctx.params.dml_disable_subquery && facts.kind.is_write_in_place() && facts.has_subquery {
        ctx.push(format!("{}语句不能有子查询", facts.kind.keyword()));
    }
}

pub fn check_join_on(facts: &DmlFacts, ctx: &mut RuleHint<'_>) {
    if ctx.params.check_dml_join_with_on && facts.joins_without_on > 0 {
        ctx.push(format!(
            "{}语句中的JOIN必须要有ON条件",
            facts.kind.keyword()
        ));
    }
}

/// REPLACE, INSERT ... SELECT, column list, row count and ON DUPLICATE.
pub fn check_insert(facts: &DmlFacts, ctx: &mut RuleHint<'_>) {
    let params = ctx.params;
    if facts.kind.is_write_in_place() {
        return;
    }
    if facts.kind == DmlKind::Replace && params.disable_replace {
        ctx.push("禁止使用REPLACE语句");
    }
    if facts.insert_select && params.disable_insert_into_select {
        ctx.push(format!("禁止使用{} INTO SELECT语法", facts.kind.keyword()));
    }
    if !facts.has_column_list {
        ctx.push(format!("{}语句必须指定列名", facts.kind.keyword()));
    }
    if facts.insert_rows as u64 > params.max_insert_rows {
        ctx.push(format!(
            "{}语句单次写入{}行，超出了规则允许的上限{}",
            facts.kind.keyword(),
            facts.insert_rows,
            params.max_insert_rows
        ));
    }
    if facts.on_duplicate && params.disable_on_duplicate {
        ctx.push("禁止使用ON DUPLICATE KEY UPDATE语法");
    }
}

/// Estimate rows touched and compare with the configured maximum.
///
/// `INSERT ... VALUES` counts its rows; everything else asks `EXPLAIN`,
/// and an unavailable plan counts as zero.
pub async fn check_affected_rows(facts: &DmlFacts, ctx: &mut RuleHint<'_>) {
    let params = ctx.params;
    let rows = if !facts.kind.is_write_in_place() && !facts.insert_select {
        facts.insert_rows as i64
    } else {
        match introspect::explain_rows(ctx.query, params.explain_rule, ctx.db).await {
            Ok(rows) => rows,
            Err(err) => {
                debug!(error = %err, "EXPLAIN unavailable, affected rows set to 0");
                0
            }
        }
    };
    ctx.affected_rows = rows;
    if rows > 0 && rows as u64 > params.max_affected_rows {
        ctx.push(format!(
            "当前SQL预计影响行数为{}，超过最大允许值{}",
            rows, params.max_affected_rows
        ));
    }
}
