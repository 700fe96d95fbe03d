//! Checks shared by several statement kinds.

use std::sync::LazyLock;

use regex::Regex;
use sqlparser::keywords::ALL_KEYWORDS;

use crate::{parser::QualifiedName, rules::RuleHint};

static IDENTIFIER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("valid regex"));

/// Which blocklist a target is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blocklist {
    Ddl,
    Dml
}

/// Naming rules for a table, column, index, view or database name.
///
/// `kind` is the noun used in messages, e.g. `表名`. A zero `max_len`
/// disables the length check.
pub fn check_identifier(kind: &str, name: &str, max_len: u32, ctx: &mut RuleHint<'_>) {
    if max_len > 0 && name.chars().count() > max_len as usize {
        ctx.push(format!("{}`{}`的长度超出了规则允许的上限{}", kind, name, max_len));
    }
    if ctx.params.check_identifier && !IDENTIFIER_REGEX.is_match(name) {
        ctx.push(format!("{}`{}`只能包含字母、数字和下划线", kind, name));
    }
    if ctx.params.check_identifier_keyword && is_reserved(name) {
        ctx.push(format!("{}`{}`不能使用MySQL关键字", kind, name));
    }
}

fn is_reserved(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    ALL_KEYWORDS.binary_search(&upper.as_str()).is_ok()
}

/// Stop the statement when any target is on the blocklist.
pub fn check_blocklist(tables: &[QualifiedName], list: Blocklist, ctx: &mut RuleHint<'_>) {
    let params = ctx.params;
    let fallback = ctx.default_schema().map(str::to_string);
    for table in tables {
        let schema = table.schema.as_deref().or(fallback.as_deref());
        let entry = match list {
            Blocklist::Ddl => params.disabled_ddl_table(schema, &table.name),
            Blocklist::Dml => params.disabled_dml_table(schema, &table.name)
        };
        if let Some(entry) = entry {
            let label = match list {
                Blocklist::Ddl => "DDL",
                Blocklist::Dml => "DML"
            };
            let message = format!(
                "表`{}`被限制提交{}工单，原因: {}",
                table.qualified_with(fallback.as_deref()),
                label,
                entry.reason
            );
            ctx.halt(message);
            return;
        }
    }
}

/// TiDB-only clauses stripped by the preprocessor are not portable to MySQL.
pub fn check_tidb_syntax(features: &[&str], ctx: &mut RuleHint<'_>) {
    if features.is_empty() || ctx.is_tidb() {
        return;
    }
    let version_known = ctx
        .kv
        .get_text(crate::cache::DB_VERSION)
        .is_some_and(|v| !v.is_empty());
    if version_known {
        ctx.push(format!(
            "当前数据库为MySQL，不支持TiDB语法: {}",
            features.join(",")
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_table_is_sorted() {
        assert!(is_reserved("select"));
        assert!(is_reserved("TABLE"));
        assert!(!is_reserved("order_items"));
    }

    #[test]
    fn test_identifier_regex() {
        assert!(IDENTIFIER_REGEX.is_match("user_01"));
        assert!(!IDENTIFIER_REGEX.is_match("user-01"));
        assert!(!IDENTIFIER_REGEX.is_match("用户"));
    }
}
