pub use masterror::{AppError, AppResult};
use thiserror::Error;

/// MySQL error number for an unknown table.
pub const ER_NO_SUCH_TABLE: u16 = 1146;

/// MySQL error number for an unknown database.
pub const ER_BAD_DB_ERROR: u16 = 1049;

/// Failure reported by an [`Executor`](crate::introspect::Executor).
///
/// Keeps the server error number so logics can tell "the server said no"
/// apart from "the server could not be reached".
#[derive(Debug, Clone, Error)]
pub enum DbError {
    /// The server answered with an error.
    #[error("数据库返回错误 ({number}): {message}")]
    Server { number: u16, message: String },

    /// Connection, protocol or decoding failure.
    #[error("数据库连接失败: {0}")]
    Connection(String),

    /// The per-call timeout or the request deadline expired.
    #[error("数据库请求超时")]
    Timeout,

    /// The server answered but the payload was not usable.
    #[error("无法解析数据库返回结果: {0}")]
    Malformed(String),

    /// No database handle configured for this request.
    #[error("未配置数据库连接")]
    Offline
}

impl DbError {
    /// Server error number, when the server produced one.
    pub fn number(&self) -> Option<u16> {
        match self {
            Self::Server { number, .. } => Some(*number),
            _ => None
        }
    }

    /// True when the table (or view) does not exist.
    pub fn is_missing_table(&self) -> bool {
        self.number() == Some(ER_NO_SUCH_TABLE) || self.to_string().contains("doesn't exist")
    }

    /// True when the database does not exist.
    pub fn is_missing_database(&self) -> bool {
        self.number() == Some(ER_BAD_DB_ERROR) || self.to_string().contains("Unknown database")
    }
}

/// Create file read error
pub fn file_read_error(path: &str, source: std::io::Error) -> AppError {
    AppError::internal(format!("读取文件'{}'失败: {}", path, source))
}

/// Create query parse error with optional position info
pub fn query_parse_error(message: impl Into<String>) -> AppError {
    let msg = message.into();
    AppError::bad_request(format_sql_error("SQL解析错误", &msg))
}

/// Error returned when a single-statement helper finds nothing it can route.
pub fn rule_match_error() -> AppError {
    AppError::bad_request("当前SQL未匹配到规则，执行失败")
}

/// Ticket type gate failure.
pub fn sql_type_error(message: impl Into<String>) -> AppError {
    AppError::bad_request(message.into())
}

/// Create config error
pub fn config_error(message: impl Into<String>) -> AppError {
    AppError::bad_request(message.into())
}

/// Wrap an introspection failure surfaced outside the rule engine.
pub fn db_error(err: DbError) -> AppError {
    AppError::service(err.to_string())
}

/// Format SQL error with position highlighting
pub fn format_sql_error(prefix: &str, message: &str) -> String {
    // sqlparser reports "... at Line: X, Column: Y"
    if let Some(pos) = extract_position(message) {
        format!(
            "{}(第{}行, 第{}列): {}",
            prefix, pos.line, pos.column, message
        )
    } else {
        format!("{}: {}", prefix, message)
    }
}

struct SqlPosition {
    line:   usize,
    column: usize
}

fn extract_position(message: &str) -> Option<SqlPosition> {
    let line_marker = "Line: ";
    let line_start = message.find(line_marker)? + line_marker.len();
    let rest = &message[line_start..];
    let line_end = rest.find(|c: char| !c.is_ascii_digit())?;
    let line = rest[..line_end].parse().ok()?;

    let after_line = &rest[line_end..];
    let col_marker = after_line.find("Column")?;
    let col_text = after_line[col_marker + "Column".len()..]
        .trim_start_matches(|c: char| c == ':' || c.is_whitespace());
    let col_end = col_text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(col_text.len());
    let column = col_text[..col_end].parse().ok()?;

    Some(SqlPosition { line, column })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_with_position() {
        let text = format_sql_error("SQL解析错误", "Expected: end of statement, found: x at Line: 3, Column: 25");
        assert!(text.starts_with("SQL解析错误(第3行, 第25列)"));
    }

    #[test]
    fn test_format_with_legacy_position() {
        let text = format_sql_error("SQL解析错误", "found: x at Line: 1, Column 7");
        assert!(text.contains("第1行, 第7列"));
    }

    #[test]
    fn test_format_without_position() {
        assert_eq!(format_sql_error("SQL解析错误", "boom"), "SQL解析错误: boom");
    }

    #[test]
    fn test_db_error_classification() {
        let missing = DbError::Server {
            number:  ER_NO_SUCH_TABLE,
            message: "Table 'd.t' doesn't exist".to_string()
        };
        assert!(missing.is_missing_table());
        assert!(!missing.is_missing_database());

        let unknown_db = DbError::Connection("Unknown database 'x'".to_string());
        assert!(unknown_db.is_missing_database());
        assert!(!DbError::Timeout.is_missing_table());
    }
}
