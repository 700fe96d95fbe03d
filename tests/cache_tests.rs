// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use sql_audit::{
    cache::{self, CacheValue, KvCache, is_active},
    parser::parse
};

#[test]
fn test_cache_registers_request() {
    let kv = KvCache::new("cache_test_register");
    assert_eq!(kv.request_id(), "cache_test_register");
    assert!(is_active("cache_test_register"));
    drop(kv);
    assert!(!is_active("cache_test_register"));
}

#[test]
fn test_cache_shared_request_id() {
    let first = KvCache::new("cache_test_shared");
    let second = KvCache::new("cache_test_shared");
    drop(first);
    assert!(is_active("cache_test_shared"));
    drop(second);
    assert!(!is_active("cache_test_shared"));
}

#[test]
fn test_cache_values() {
    let mut kv = KvCache::new("cache_test_values");
    assert!(kv.is_empty());

    kv.put(cache::DB_VERSION, CacheValue::Text("8.0.11-TiDB-v7.5.0".to_string()));
    kv.put("5F3E", CacheValue::Flag(true));
    let (audit, _) = parse("CREATE TABLE t (id INT)", "", "").unwrap();
    kv.put("t", CacheValue::Table(Arc::new(audit)));

    assert_eq!(kv.len(), 3);
    assert!(kv.is_tidb());
    assert!(matches!(kv.get("5F3E"), Some(CacheValue::Flag(true))));
    assert_eq!(kv.get_table("t").map(|a| a.stmts.len()), Some(1));
    assert!(kv.get_text("t").is_none());

    assert!(kv.delete("5F3E").is_some());
    assert!(kv.get("5F3E").is_none());
}

#[test]
fn test_cache_released_on_panic() {
    let result = std::panic::catch_unwind(|| {
        let _kv = KvCache::new("cache_test_unwind");
        panic!("rule failure");
    });
    assert!(result.is_err());
    assert!(!is_active("cache_test_unwind"));
}
