//! Audit parameters consumed read-only by every rule.
//!
//! Keys serialize in the upper snake case used by the review platform's
//! parameter store (including its historical spellings such as
//! `UNQI_INDEX_PREFIX`), so a JSON dump of stored parameters can be merged
//! directly with [`InspectParams::merge_json`].

use serde::{Deserialize, Serialize};

use crate::error::{AppResult, config_error};

/// Default upper bound for `VARCHAR(n)` when the stored value is zero.
pub const DEFAULT_MAX_VARCHAR_LENGTH: u32 = 16383;

/// How `EXPLAIN` rows are folded into an affected-rows estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplainRule {
    /// Use the first plan row.
    #[default]
    First,
    /// Use the largest estimate across all plan rows.
    Max
}

/// Allowed character set with its recommended collation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharsetSpec {
    pub charset:   String,
    pub recommend: String
}

/// Tables that must not be submitted through the review flow.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisabledTables {
    #[serde(alias = "DB")]
    pub db:     String,
    #[serde(alias = "Tables")]
    pub tables: Vec<String>,
    #[serde(alias = "Reason")]
    pub reason: String
}

impl DisabledTables {
    fn covers(&self, schema: Option<&str>, table: &str) -> bool {
        let schema_matches = match schema {
            Some(schema) => self.db.eq_ignore_ascii_case(schema),
            None => true
        };
        schema_matches && self.tables.iter().any(|t| t.eq_ignore_ascii_case(table))
    }
}

/// Thresholds and toggles for the rule tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct InspectParams {
    // TABLE
    pub max_table_name_length:                u32,
    pub check_table_comment:                  bool,
    pub table_comment_length:                 u32,
    pub check_identifier:                     bool,
    #[serde(rename = "CHECK_IDENTIFER_KEYWORD")]
    pub check_identifier_keyword:             bool,
    pub check_table_charset:                  bool,
    pub table_support_charset:                Vec<CharsetSpec>,
    pub check_table_engine:                   bool,
    pub table_support_engine:                 Vec<String>,
    pub enable_partition_table:               bool,
    pub check_table_primary_key:              bool,
    pub check_table_audit_type_columns:       bool,
    pub enable_create_table_as:               bool,
    pub enable_create_table_like:             bool,
    pub enable_foreign_key:                   bool,
    pub check_table_autoincrement_init_value: bool,
    pub enable_create_view:                   bool,
    pub innodb_row_format:                    Vec<String>,

    // COLUMN
    pub max_column_name_length:               u32,
    pub check_column_charset:                 bool,
    pub check_column_comment:                 bool,
    pub column_max_char_length:               u32,
    pub max_varchar_length:                   u32,
    pub enable_column_blob_type:              bool,
    pub enable_column_json_type:              bool,
    pub enable_column_bit_type:               bool,
    pub enable_column_timestamp_type:         bool,
    pub check_primarykey_use_bigint:          bool,
    pub check_primarykey_use_unsigned:        bool,
    pub check_primarykey_use_auto_increment:  bool,
    pub enable_column_not_null:               bool,
    pub enable_column_time_null:              bool,
    pub check_column_default_value:           bool,
    pub check_column_float_double:            bool,
    pub enable_column_type_change:            bool,
    pub enable_column_type_change_compatible: bool,
    pub enable_column_change_column_name:     bool,

    // INDEX
    pub check_uniq_index_prefix:              bool,
    pub check_secondary_index_prefix:         bool,
    pub check_fulltext_index_prefix:          bool,
    #[serde(rename = "UNQI_INDEX_PREFIX")]
    pub uniq_index_prefix:                    String,
    pub secondary_index_prefix:               String,
    pub fulltext_index_prefix:                String,
    pub secondary_index_max_key_parts:        u32,
    pub primarykey_max_key_parts:             u32,
    pub max_index_keys:                       u32,
    pub enable_index_rename:                  bool,
    pub enable_redundant_index:               bool,

    // ALTER
    pub enable_drop_cols:                     bool,
    pub enable_drop_indexes:                  bool,
    pub enable_drop_primarykey:               bool,
    pub enable_drop_table:                    bool,
    pub enable_truncate_table:                bool,
    pub enable_rename_table_name:             bool,
    pub enable_mysql_merge_alter_table:       bool,
    pub enable_tidb_merge_alter_table:        bool,

    // DML
    pub dml_must_have_where:                  bool,
    pub dml_disable_limit:                    bool,
    pub dml_disable_orderby:                  bool,
    pub dml_disable_subquery:                 bool,
    pub check_dml_join_with_on:               bool,
    pub explain_rule:                         ExplainRule,
    pub max_affected_rows:                    u64,
    pub max_insert_rows:                      u64,
    pub disable_replace:                      bool,
    pub disable_insert_into_select:           bool,
    pub disable_on_duplicate:                 bool,
    pub disable_audit_dml_tables:             Vec<DisabledTables>,
    pub disable_audit_ddl_tables:             Vec<DisabledTables>
}

impl Default for InspectParams {
    fn default() -> Self {
        Self {
            max_table_name_length:                32,
            check_table_comment:                  true,
            table_comment_length:                 64,
            check_identifier:                     true,
            check_identifier_keyword:             false,
            check_table_charset:                  true,
            table_support_charset:                default_charsets(),
            check_table_engine:                   true,
            table_support_engine:                 vec!["InnoDB".to_string()],
            enable_partition_table:               false,
            check_table_primary_key:              true,
            check_table_audit_type_columns:       false,
            enable_create_table_as:               false,
            enable_create_table_like:             false,
            enable_foreign_key:                   false,
            check_table_autoincrement_init_value: true,
            enable_create_view:                   true,
            innodb_row_format:                    vec!["DYNAMIC".to_string()],
            max_column_name_length:               64,
            check_column_charset:                 true,
            check_column_comment:                 true,
            column_max_char_length:               64,
            max_varchar_length:                   DEFAULT_MAX_VARCHAR_LENGTH,
            enable_column_blob_type:              true,
            enable_column_json_type:              true,
            enable_column_bit_type:               true,
            enable_column_timestamp_type:         false,
            check_primarykey_use_bigint:          true,
            check_primarykey_use_unsigned:        true,
            check_primarykey_use_auto_increment:  true,
            enable_column_not_null:               true,
            enable_column_time_null:              true,
            check_column_default_value:           false,
            check_column_float_double:            true,
            enable_column_type_change:            false,
            enable_column_type_change_compatible: true,
            enable_column_change_column_name:     false,
            check_uniq_index_prefix:              true,
            check_secondary_index_prefix:         true,
            check_fulltext_index_prefix:          true,
            uniq_index_prefix:                    "UNIQ_".to_string(),
            secondary_index_prefix:               "IDX_".to_string(),
            fulltext_index_prefix:                "FULL_".to_string(),
            secondary_index_max_key_parts:        8,
            primarykey_max_key_parts:             1,
            max_index_keys:                       12,
            enable_index_rename:                  false,
            enable_redundant_index:               false,
            enable_drop_cols:                     false,
            enable_drop_indexes:                  true,
            enable_drop_primarykey:               false,
            enable_drop_table:                    true,
            enable_truncate_table:                true,
            enable_rename_table_name:             false,
            enable_mysql_merge_alter_table:       true,
            enable_tidb_merge_alter_table:        false,
            dml_must_have_where:                  true,
            dml_disable_limit:                    true,
            dml_disable_orderby:                  true,
            dml_disable_subquery:                 true,
            check_dml_join_with_on:               true,
            explain_rule:                         ExplainRule::First,
            max_affected_rows:                    100,
            max_insert_rows:                      100,
            disable_replace:                      true,
            disable_insert_into_select:           true,
            disable_on_duplicate:                 true,
            disable_audit_dml_tables:             Vec::new(),
            disable_audit_ddl_tables:             Vec::new()
        }
    }
}

fn default_charsets() -> Vec<CharsetSpec> {
    vec![CharsetSpec {
        charset:   "utf8mb4".to_string(),
        recommend: "utf8mb4_general_ci".to_string()
    }]
}

impl InspectParams {
    /// Overlay a JSON object of parameters on top of the current values.
    ///
    /// Unknown keys are ignored, missing keys keep their current value.
    pub fn merge_json(&mut self, raw: &str) -> AppResult<()> {
        let overlay: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| config_error(format!("审核参数不是合法的JSON: {}", e)))?;
        let serde_json::Value::Object(overlay) = overlay else {
            return Err(config_error("审核参数必须是JSON对象"));
        };

        let mut merged = serde_json::to_value(&*self)
            .map_err(|e| config_error(format!("序列化审核参数失败: {}", e)))?;
        if let Some(fields) = merged.as_object_mut() {
            for (key, value) in overlay {
                if fields.contains_key(&key) {
                    fields.insert(key, value);
                }
            }
        }

        *self = serde_json::from_value(merged)
            .map_err(|e| config_error(format!("审核参数类型错误: {}", e)))?;
        self.normalize();
        Ok(())
    }

    /// Repair values the parameter store is known to leave empty.
    pub fn normalize(&mut self) {
        if self.max_varchar_length == 0 {
            self.max_varchar_length = DEFAULT_MAX_VARCHAR_LENGTH;
        }
        if self.table_support_charset.is_empty() {
            self.table_support_charset = default_charsets();
        }
        if self.table_support_engine.is_empty() {
            self.table_support_engine = vec!["InnoDB".to_string()];
        }
    }

    pub fn charset_allowed(&self, charset: &str) -> bool {
        self.table_support_charset
            .iter()
            .any(|c| c.charset.eq_ignore_ascii_case(charset))
    }

    /// Comma separated list for messages.
    pub fn allowed_charsets(&self) -> String {
        self.table_support_charset
            .iter()
            .map(|c| c.charset.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn recommended_collation(&self, charset: &str) -> Option<&str> {
        self.table_support_charset
            .iter()
            .find(|c| c.charset.eq_ignore_ascii_case(charset))
            .map(|c| c.recommend.as_str())
    }

    pub fn engine_allowed(&self, engine: &str) -> bool {
        self.table_support_engine
            .iter()
            .any(|e| e.eq_ignore_ascii_case(engine))
    }

    pub fn row_format_allowed(&self, format: &str) -> bool {
        self.innodb_row_format
            .iter()
            .any(|f| f.eq_ignore_ascii_case(format))
    }

    /// Blocklist entry covering a DML target, if any.
    pub fn disabled_dml_table(&self, schema: Option<&str>, table: &str) -> Option<&DisabledTables> {
        self.disable_audit_dml_tables
            .iter()
            .find(|d| d.covers(schema, table))
    }

    /// Blocklist entry covering a DDL target, if any.
    pub fn disabled_ddl_table(&self, schema: Option<&str>, table: &str) -> Option<&DisabledTables> {
        self.disable_audit_ddl_tables
            .iter()
            .find(|d| d.covers(schema, table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_merge_toggles() {
        let params = InspectParams::default();
        assert!(params.enable_mysql_merge_alter_table);
        assert!(!params.enable_tidb_merge_alter_table);
        assert_eq!(params.max_varchar_length, DEFAULT_MAX_VARCHAR_LENGTH);
    }

    #[test]
    fn test_serialized_keys_use_store_spelling() {
        let value = serde_json::to_value(InspectParams::default()).unwrap();
        assert!(value.get("UNQI_INDEX_PREFIX").is_some());
        assert!(value.get("CHECK_IDENTIFER_KEYWORD").is_some());
        assert!(value.get("MAX_TABLE_NAME_LENGTH").is_some());
    }

    #[test]
    fn test_disabled_table_lookup() {
        let mut params = InspectParams::default();
        params.disable_audit_dml_tables.push(DisabledTables {
            db:     "billing".to_string(),
            tables: vec!["ledger".to_string()],
            reason: "核心账务表".to_string()
        });
        assert!(params.disabled_dml_table(Some("billing"), "LEDGER").is_some());
        assert!(params.disabled_dml_table(Some("other"), "ledger").is_none());
        assert!(params.disabled_dml_table(None, "ledger").is_some());
    }
}
