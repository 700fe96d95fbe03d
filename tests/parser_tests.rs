// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

use masterror::AppError;
use sql_audit::parser::{
    SqlCategory, SqlStatementTag, StmtKind, check_sql_type, fingerprint, get_sql_statement,
    get_table_name_from_alter_statement, parse, split_sql_text
};

fn text(err: &AppError) -> String {
    format!("{:?}", err)
}

#[test]
fn test_split_keeps_order_and_drops_terminators() {
    let sql = "/* header */ CREATE TABLE a (id INT);\n\nINSERT INTO a (id) VALUES (1);\nDROP TABLE a;";
    let statements = split_sql_text(sql).unwrap();
    assert_eq!(
        statements,
        vec!["CREATE TABLE a (id INT)", "INSERT INTO a (id) VALUES (1)", "DROP TABLE a"]
    );
}

#[test]
fn test_split_keeps_semicolons_inside_strings() {
    let statements = split_sql_text("UPDATE t SET note = 'a;b' WHERE id = 1; DELETE FROM t WHERE id = 2").unwrap();
    assert_eq!(statements.len(), 2);
    assert!(statements[0].contains("'a;b'"));
}

#[test]
fn test_parse_error_is_reported() {
    let err = parse("UPDATE SET", "", "").unwrap_err();
    assert!(text(&err).contains("SQL解析错误"));
}

#[test]
fn test_statement_kinds() {
    let sql = "SELECT 1 UNION SELECT 2; CREATE VIEW v AS SELECT 1; TRUNCATE TABLE t; \
               DROP DATABASE d; RENAME TABLE a TO b; REPLACE INTO t (id) VALUES (1)";
    let (audit, _) = parse(sql, "", "").unwrap();
    let kinds: Vec<StmtKind> = audit.stmts.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![
            StmtKind::SetOperation,
            StmtKind::CreateView,
            StmtKind::TruncateTable,
            StmtKind::DropDatabase,
            StmtKind::RenameTable,
            StmtKind::Insert
        ]
    );
}

#[test]
fn test_tidb_syntax_is_recorded() {
    let sql = "CREATE TABLE t (id BIGINT AUTO_RANDOM PRIMARY KEY) SHARD_ROW_ID_BITS=4";
    let (audit, _) = parse(sql, "", "").unwrap();
    let stmt = &audit.stmts[0];
    assert_eq!(stmt.kind, StmtKind::CreateTable);
    assert!(stmt.tidb_features.contains_key("AUTO_RANDOM"));
    assert!(stmt.tidb_features.contains_key("SHARD_ROW_ID_BITS"));
}

#[test]
fn test_check_sql_type_modes() {
    assert!(check_sql_type("UPDATE t SET a = 1 WHERE id = 1", SqlCategory::Dml).is_ok());
    assert!(check_sql_type("SELECT * FROM t", SqlCategory::Export).is_ok());
    assert!(check_sql_type("DROP TABLE t", SqlCategory::Export).is_ok());

    let err = check_sql_type("ALTER TABLE t ADD COLUMN a INT", SqlCategory::Dml).unwrap_err();
    assert!(text(&err).contains("DML模式下，不允许提交DDL语句"));

    let err = check_sql_type("DELETE FROM t WHERE id = 1", SqlCategory::Ddl).unwrap_err();
    assert!(text(&err).contains("DDL模式下，不允许提交DML语句"));
}

#[test]
fn test_get_sql_statement_tags() {
    assert_eq!(get_sql_statement("CREATE DATABASE shop").unwrap(), SqlStatementTag::CreateDatabase);
    assert_eq!(get_sql_statement("DROP TABLE t").unwrap(), SqlStatementTag::DropTable);
    assert_eq!(get_sql_statement("TRUNCATE TABLE t").unwrap(), SqlStatementTag::TruncateTable);
    assert_eq!(
        get_sql_statement("CREATE INDEX idx_a ON t (a)").unwrap(),
        SqlStatementTag::CreateIndex
    );
}

#[test]
fn test_get_sql_statement_requires_one_ddl() {
    let err = get_sql_statement("UPDATE t SET a = 1").unwrap_err();
    assert!(text(&err).contains("当前SQL未匹配到规则，执行失败"));
    assert!(get_sql_statement("DROP TABLE a; DROP TABLE b").is_err());
}

#[test]
fn test_alter_table_name() {
    assert_eq!(
        get_table_name_from_alter_statement("ALTER TABLE shop.orders ADD COLUMN a INT").unwrap(),
        "shop.orders"
    );
    assert_eq!(
        get_table_name_from_alter_statement("ALTER TABLE `orders` DROP INDEX idx_a").unwrap(),
        "orders"
    );
    let err = get_table_name_from_alter_statement("DROP TABLE t").unwrap_err();
    assert!(text(&err).contains("未提取到表名"));
}

#[test]
fn test_fingerprint_ignores_literals_and_spacing() {
    let a = fingerprint::fingerprint_id("SELECT * FROM t WHERE id = 1 AND name = 'x'");
    let b = fingerprint::fingerprint_id("select *\n  from T where ID=42 and NAME = 'yy'");
    assert_eq!(a, b);
}

#[test]
fn test_fingerprint_collapses_lists() {
    assert_eq!(
        fingerprint::fingerprint("DELETE FROM t WHERE id IN (1, 2, 3)"),
        fingerprint::fingerprint("DELETE FROM t WHERE id IN (7, 8)")
    );
    assert_ne!(
        fingerprint::fingerprint_id("DELETE FROM t WHERE id = 1"),
        fingerprint::fingerprint_id("DELETE FROM u WHERE id = 1")
    );
}
