//! Per-statement results and their wire format.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Message emitted for a statement with no findings.
pub const PASSED: &str = "审核通过";

/// Severity of one result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Pass,
    #[default]
    Info,
    Notice,
    Warn,
    Warning,
    Error
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Info => "INFO",
            Self::Notice => "NOTICE",
            Self::Warn => "WARN",
            Self::Warning => "WARNING",
            Self::Error => "ERROR"
        }
    }

    /// True for levels that should fail a review.
    pub fn is_warning(self) -> bool {
        self >= Self::Warn
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Internal result for one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnData {
    pub fingerprint:   String,
    pub query:         String,
    /// `CreateTable`, `AlterTable`, `DML`, ... or empty for synthesized entries
    pub sql_type:      String,
    pub level:         Level,
    pub summary:       Vec<String>,
    pub affected_rows: i64
}

impl ReturnData {
    pub fn new(fingerprint: String, query: String, sql_type: impl Into<String>) -> Self {
        Self {
            fingerprint,
            query,
            sql_type: sql_type.into(),
            level: Level::Info,
            summary: Vec::new(),
            affected_rows: 0
        }
    }

    /// Append findings; any finding promotes the level to `WARN`.
    pub fn extend(&mut self, messages: impl IntoIterator<Item = String>) {
        let before = self.summary.len();
        self.summary.extend(messages);
        if self.summary.len() > before && self.level < Level::Warn {
            self.level = Level::Warn;
        }
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.extend([message.into()]);
    }
}

/// Wire-format result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditResult {
    pub query:          String,
    #[serde(rename = "type")]
    pub sql_type:       String,
    pub level:          Level,
    pub affected_rows:  i64,
    pub messages:       Vec<String>,
    pub summary:        Vec<String>,
    pub fix_suggestion: String
}

impl From<ReturnData> for AuditResult {
    fn from(data: ReturnData) -> Self {
        let messages = if data.summary.is_empty() {
            vec![PASSED.to_string()]
        } else {
            data.summary.clone()
        };
        Self {
            query: data.query,
            sql_type: data.sql_type,
            level: data.level,
            affected_rows: data.affected_rows,
            messages,
            summary: data.summary,
            fix_suggestion: String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_summary_passes() {
        let data = ReturnData::new("id".into(), "DELETE FROM t WHERE id = 1".into(), "DML");
        let result = AuditResult::from(data);
        assert_eq!(result.level, Level::Info);
        assert_eq!(result.messages, vec![PASSED]);
        assert!(result.summary.is_empty());
    }

    #[test]
    fn test_findings_promote_to_warn() {
        let mut data = ReturnData::new("id".into(), "q".into(), "DML");
        data.extend(Vec::new());
        assert_eq!(data.level, Level::Info);
        data.warn("UPDATE语句必须要有WHERE条件");
        assert_eq!(data.level, Level::Warn);
    }

    #[test]
    fn test_level_wire_names() {
        let json = serde_json::to_string(&[Level::Pass, Level::Warn, Level::Warning]).unwrap();
        assert_eq!(json, r#"["PASS","WARN","WARNING"]"#);
        assert_eq!(Level::Notice.to_string(), "NOTICE");
        assert!(Level::Error.is_warning());
        assert!(!Level::Info.is_warning());
    }

    #[test]
    fn test_type_field_name() {
        let result = AuditResult::from(ReturnData::new("id".into(), "q".into(), "AlterTable"));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["type"], "AlterTable");
        assert_eq!(value["messages"][0], PASSED);
    }
}
