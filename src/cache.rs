use std::{
    collections::HashMap,
    sync::{Arc, LazyLock, RwLock}
};

use tracing::debug;

use crate::parser::Audit;

/// Live request ids -> number of caches holding them.
static LIVE_REQUESTS: LazyLock<RwLock<HashMap<String, usize>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Well-known keys.
pub const DB_VERSION: &str = "dbVersion";
pub const DB_CHARSET: &str = "dbCharset";
pub const LARGE_PREFIX: &str = "largePrefix";
pub const INNODB_DEFAULT_ROW_FORMAT: &str = "innodbDefaultRowFormat";

/// Value stored in a [`KvCache`].
#[derive(Debug, Clone)]
pub enum CacheValue {
    Text(String),
    Flag(bool),
    Table(Arc<Audit>)
}

/// Per-request metadata cache.
///
/// Holds server variables, seen fingerprints and parsed `SHOW CREATE TABLE`
/// output. The request id is registered while the cache is alive.
#[derive(Debug)]
pub struct KvCache {
    request_id: String,
    entries:    HashMap<String, CacheValue>
}

impl KvCache {
    pub fn new(request_id: impl Into<String>) -> Self {
        let request_id = request_id.into();
        if let Ok(mut live) = LIVE_REQUESTS.write() {
            *live.entry(request_id.clone()).or_insert(0) += 1;
        }
        Self {
            request_id,
            entries: HashMap::new()
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn put(&mut self, key: impl Into<String>, value: CacheValue) {
        self.entries.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&CacheValue> {
        self.entries.get(key)
    }

    pub fn get_text(&self, key: &str) -> Option<&str> {
        match self.entries.get(key) {
            Some(CacheValue::Text(text)) => Some(text),
            _ => None
        }
    }

    pub fn get_table(&self, key: &str) -> Option<Arc<Audit>> {
        match self.entries.get(key) {
            Some(CacheValue::Table(audit)) => Some(Arc::clone(audit)),
            _ => None
        }
    }

    pub fn delete(&mut self, key: &str) -> Option<CacheValue> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when the cached `dbVersion` names a TiDB server.
    pub fn is_tidb(&self) -> bool {
        self.get_text(DB_VERSION)
            .is_some_and(|v| v.to_ascii_lowercase().contains("tidb"))
    }
}

impl Drop for KvCache {
    fn drop(&mut self) {
        if let Ok(mut live) = LIVE_REQUESTS.write()
            && let Some(count) = live.get_mut(&self.request_id)
        {
            *count -= 1;
            if *count == 0 {
                live.remove(&self.request_id);
            }
        }
        debug!(request_id = %self.request_id, entries = self.entries.len(), "cache released");
    }
}

/// Whether any cache for `request_id` is still alive.
pub fn is_active(request_id: &str) -> bool {
    LIVE_REQUESTS
        .read()
        .map(|live| live.contains_key(request_id))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_getters() {
        let mut kv = KvCache::new("inspect_unit_typed");
        kv.put(DB_VERSION, CacheValue::Text("8.0.32".to_string()));
        kv.put("ABC", CacheValue::Flag(true));
        assert_eq!(kv.get_text(DB_VERSION), Some("8.0.32"));
        assert_eq!(kv.get_text("ABC"), None);
        assert!(kv.get_table(DB_VERSION).is_none());
        assert!(!kv.is_tidb());
    }

    #[test]
    fn test_registration_released_on_drop() {
        let id = "inspect_unit_drop";
        {
            let _kv = KvCache::new(id);
            assert!(is_active(id));
        }
        assert!(!is_active(id));
    }

    #[test]
    fn test_tidb_detection() {
        let mut kv = KvCache::new("inspect_unit_tidb");
        kv.put(DB_VERSION, CacheValue::Text("5.7.25-TiDB-v7.5.0".to_string()));
        assert!(kv.is_tidb());
    }
}
