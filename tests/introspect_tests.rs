// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

mod common;

use common::{FakeExecutor, ORDERS_DDL};
use sql_audit::{
    cache::{self, KvCache},
    config::ExplainRule,
    error::DbError,
    introspect::{
        DbHandle, DbVars, Executor, Lookup, OfflineExecutor, check_if_database_exists,
        check_if_table_exists, check_if_table_exists_cross_db, explain_rows, get_db_vars,
        quote_ident, show_create_table
    }
};

#[tokio::test]
async fn test_db_vars_from_server() {
    let vars = get_db_vars(&FakeExecutor::tidb()).await.unwrap();
    assert_eq!(vars.db_version, "8.0.11-TiDB-v7.5.0");
    assert_eq!(vars.db_charset, "utf8mb4");
    assert_eq!(vars.large_prefix, "OFF");

    let mut kv = KvCache::new("introspect_vars");
    vars.write_to(&mut kv);
    assert!(kv.is_tidb());
    assert_eq!(kv.get_text(cache::DB_CHARSET), Some("utf8mb4"));
}

#[tokio::test]
async fn test_offline_executor() {
    let db = OfflineExecutor::new("shop");
    assert_eq!(db.schema(), "shop");
    assert!(matches!(get_db_vars(&db).await, Err(DbError::Offline)));
    assert_eq!(check_if_table_exists("t", &db).await, Lookup::Unknown);
    assert_eq!(check_if_database_exists("shop", &db).await, Lookup::Unknown);
    assert_eq!(DbVars::default().db_charset, "utf8");
}

#[tokio::test]
async fn test_table_lookup() {
    let db = FakeExecutor::mysql().with_table("orders", ORDERS_DDL);
    assert!(check_if_table_exists("orders", &db).await.is_found());
    assert!(check_if_table_exists("shop.orders", &db).await.is_found());

    let missing = check_if_table_exists("ghost", &db).await;
    assert!(missing.is_not_found());
    assert_eq!(missing.message(), Some("表或视图`ghost`不存在"));
}

#[tokio::test]
async fn test_cross_db_and_database_lookup() {
    let db = FakeExecutor::mysql().with_table("orders", ORDERS_DDL);
    assert!(check_if_table_exists_cross_db("orders", &db).await.is_found());
    assert!(check_if_table_exists_cross_db("ghost", &db).await.is_not_found());
    assert!(check_if_database_exists("shop", &db).await.is_found());
    assert!(check_if_database_exists("crm", &db).await.is_not_found());
}

#[tokio::test]
async fn test_show_create_table_is_cached() {
    let db = FakeExecutor::mysql().with_table("orders", ORDERS_DDL);
    let mut kv = KvCache::new("introspect_show_create");

    let first = show_create_table("shop.orders", &db, &mut kv).await.unwrap();
    let second = show_create_table("orders", &db, &mut kv).await.unwrap();
    assert_eq!(first.stmts.len(), 1);
    assert_eq!(second.stmts[0].text, first.stmts[0].text);

    let lookups = db
        .queries()
        .iter()
        .filter(|q| q.starts_with("SHOW CREATE TABLE"))
        .count();
    assert_eq!(lookups, 1);
}

#[tokio::test]
async fn test_show_create_table_missing() {
    let db = FakeExecutor::mysql();
    let mut kv = KvCache::new("introspect_show_missing");
    let err = show_create_table("ghost", &db, &mut kv).await.unwrap_err();
    assert!(err.is_missing_table());
}

#[tokio::test]
async fn test_explain_rows() {
    let db = FakeExecutor::mysql().with_explain_rows(42);
    let rows = explain_rows("DELETE FROM t WHERE id = 1", ExplainRule::First, &db)
        .await
        .unwrap();
    assert_eq!(rows, 42);
    assert!(db.queries().iter().any(|q| q == "EXPLAIN DELETE FROM t WHERE id = 1"));

    let rows = explain_rows("DELETE FROM t", ExplainRule::Max, &db).await.unwrap();
    assert_eq!(rows, 42);
}

#[test]
fn test_quote_ident() {
    assert_eq!(quote_ident("orders"), "`orders`");
    assert_eq!(quote_ident("shop.orders"), "`shop`.`orders`");
}

#[test]
fn test_handle_address() {
    let handle = DbHandle::new("127.0.0.1", 3306, "audit", "pw", "shop");
    assert_eq!(handle.address(), "127.0.0.1:3306");
    assert_eq!(handle.user(), "audit");
}
