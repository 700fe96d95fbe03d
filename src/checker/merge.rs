//! Batch pass over the ALTER targets of one request.

use indexmap::IndexMap;

use super::report::ReturnData;
use crate::{
    cache::{self, KvCache},
    config::InspectParams,
    parser::fingerprint
};

/// Flag tables altered more than once in the same request.
///
/// `targets` holds one qualified name per ALTER statement, in input order.
/// Returns `None` when nothing needs merging, the server variables were
/// never loaded, or the dialect's toggle is off. An empty version, as left
/// by offline mode or a failed lookup, counts as MySQL.
pub fn merge_alter_entries(targets: &[String], kv: &KvCache, params: &InspectParams) -> Option<ReturnData> {
    if targets.len() < 2 {
        return None;
    }
    let version = kv.get_text(cache::DB_VERSION)?;
    let tidb = version.to_ascii_lowercase().contains("tidb");
    let (enabled, label) = if tidb {
        (params.enable_tidb_merge_alter_table, "TiDB")
    } else {
        (params.enable_mysql_merge_alter_table, "MySQL")
    };
    if !enabled {
        return None;
    }

    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for target in targets {
        *counts.entry(target.as_str()).or_insert(0) += 1;
    }
    let lines: Vec<String> = counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(table, _)| format!("[{}数据库]表`{}`的多条ALTER操作，请合并为一条ALTER语句", label, table))
        .collect();
    if lines.is_empty() {
        return None;
    }

    let query = targets.join(";");
    let mut data = ReturnData::new(fingerprint::id(&query), String::new(), "");
    data.extend(lines);
    Some(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheValue;

    fn cache(version: &str) -> KvCache {
        let mut kv = KvCache::new(format!("merge_test_{}", version));
        kv.put(cache::DB_VERSION, CacheValue::Text(version.to_string()));
        kv
    }

    fn targets(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_mysql_duplicates_flagged() {
        let kv = cache("8.0.36");
        let data = merge_alter_entries(&targets(&["shop.t", "shop.t", "shop.s"]), &kv, &InspectParams::default())
            .unwrap();
        assert_eq!(data.summary, vec!["[MySQL数据库]表`shop.t`的多条ALTER操作，请合并为一条ALTER语句"]);
        assert!(data.level.is_warning());
    }

    #[test]
    fn test_tidb_toggle_off_by_default() {
        let kv = cache("8.0.11-TiDB-v7.5.0");
        assert!(merge_alter_entries(&targets(&["t", "t"]), &kv, &InspectParams::default()).is_none());

        let params = InspectParams {
            enable_tidb_merge_alter_table: true,
            ..InspectParams::default()
        };
        let data = merge_alter_entries(&targets(&["t", "t"]), &kv, &params).unwrap();
        assert!(data.summary[0].starts_with("[TiDB数据库]"));
    }

    #[test]
    fn test_vars_never_loaded_no_merge() {
        let kv = KvCache::new("merge_test_unloaded");
        assert!(merge_alter_entries(&targets(&["t", "t"]), &kv, &InspectParams::default()).is_none());
    }

    #[test]
    fn test_empty_version_counts_as_mysql() {
        let kv = cache("");
        let data = merge_alter_entries(&targets(&["t", "t"]), &kv, &InspectParams::default()).unwrap();
        assert_eq!(data.summary, vec!["[MySQL数据库]表`t`的多条ALTER操作，请合并为一条ALTER语句"]);
    }

    #[test]
    fn test_distinct_tables_not_merged() {
        let kv = cache("5.7.44");
        assert!(merge_alter_entries(&targets(&["a", "b"]), &kv, &InspectParams::default()).is_none());
    }
}
