//! Integration tests for the sql-audit binary.

use std::io::Write;

use assert_cmd::{Command, cargo::cargo_bin_cmd};
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn cmd() -> Command {
    let mut cmd = cargo_bin_cmd!("sql-audit");
    cmd.env_remove("SQL_AUDIT_DB_HOST").env("HOME", std::env::temp_dir());
    cmd
}

fn sql_file(sql: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", sql).unwrap();
    file
}

#[test]
fn test_check_clean_statement() {
    let file = sql_file("DELETE FROM t WHERE id = 1;");
    cmd()
        .args(["check", file.path().to_str().unwrap(), "--no-color"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("审核通过"));
}

#[test]
fn test_check_with_findings() {
    let file = sql_file("UPDATE t SET name = 'x';");
    cmd()
        .args(["check", file.path().to_str().unwrap(), "--no-color"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("WHERE"));
}

#[test]
fn test_check_json_output() {
    let file = sql_file("SELECT * FROM t;");
    cmd()
        .args(["check", file.path().to_str().unwrap(), "-f", "json"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"level\": \"WARN\""))
        .stdout(predicate::str::contains("SELECT语句"));
}

#[test]
fn test_check_from_stdin() {
    cmd()
        .args(["check", "-", "--no-color"])
        .write_stdin("DROP TABLE t;")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("DROP TABLE"));
}

#[test]
fn test_check_invalid_sql() {
    let file = sql_file("CREATE TABLE (");
    cmd()
        .args(["check", file.path().to_str().unwrap()])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_check_sql_type_gate() {
    let file = sql_file("DROP TABLE t;");
    cmd()
        .args(["check", file.path().to_str().unwrap(), "--sql-type", "dml"])
        .assert()
        .code(2);
}

#[test]
fn test_check_params_file() {
    let sql = sql_file("UPDATE t SET name = 'x';");
    let params = sql_file(r#"{"DML_MUST_HAVE_WHERE": false}"#);
    cmd()
        .args([
            "check",
            sql.path().to_str().unwrap(),
            "--params",
            params.path().to_str().unwrap(),
            "--no-color"
        ])
        .assert()
        .code(0);
}

#[test]
fn test_missing_file() {
    cmd()
        .args(["check", "/nonexistent/input.sql"])
        .assert()
        .code(2);
}

#[test]
fn test_split_command() {
    let file = sql_file("CREATE TABLE a (id INT); DROP TABLE a;");
    cmd()
        .args(["split", file.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("CREATE TABLE a (id INT);"))
        .stdout(predicate::str::contains("DROP TABLE a;"));
}

#[test]
fn test_fingerprint_command() {
    let file = sql_file("SELECT * FROM t WHERE id = 10;");
    cmd()
        .args(["fingerprint", file.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("select * from t where id = ?"));
}

#[test]
fn test_classify_command() {
    let file = sql_file("ALTER TABLE t ADD COLUMN a INT;");
    cmd()
        .args(["classify", file.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("AlterTable"));
}

#[test]
fn test_help() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("check"));
}
