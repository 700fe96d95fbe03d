// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

use sql_audit::error::{
    DbError, config_error, db_error, file_read_error, format_sql_error, query_parse_error,
    rule_match_error, sql_type_error
};

#[test]
fn test_file_read_error() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let error = file_read_error("/path/to/file.sql", io_error);
    assert!(format!("{:?}", error).contains("/path/to/file.sql"));
}

#[test]
fn test_query_parse_error_with_position() {
    let error = query_parse_error("Expected: an expression, found: EOF at Line: 2, Column: 9");
    assert!(format!("{:?}", error).contains("SQL解析错误(第2行, 第9列)"));
}

#[test]
fn test_query_parse_error_without_position() {
    let error = query_parse_error("Unexpected token");
    assert!(format!("{:?}", error).contains("SQL解析错误: Unexpected token"));
}

#[test]
fn test_format_sql_error_plain() {
    assert_eq!(format_sql_error("配置错误", "bad"), "配置错误: bad");
}

#[test]
fn test_other_constructors() {
    assert!(format!("{:?}", rule_match_error()).contains("当前SQL未匹配到规则"));
    assert!(format!("{:?}", sql_type_error("DDL模式下，不允许提交DML语句")).contains("DDL模式"));
    assert!(format!("{:?}", config_error("bad port")).contains("bad port"));
    assert!(format!("{:?}", db_error(DbError::Timeout)).contains("数据库请求超时"));
}

#[test]
fn test_db_error_classification() {
    let missing_table = DbError::Server {
        number:  1146,
        message: "Table 'shop.t' doesn't exist".to_string()
    };
    assert_eq!(missing_table.number(), Some(1146));
    assert!(missing_table.is_missing_table());
    assert!(!missing_table.is_missing_database());

    let missing_db = DbError::Server {
        number:  1049,
        message: "Unknown database 'shop'".to_string()
    };
    assert!(missing_db.is_missing_database());

    assert_eq!(DbError::Offline.number(), None);
    assert!(!DbError::Connection("refused".to_string()).is_missing_table());
}
