//! Live database introspection.
//!
//! Rules never talk to the server directly. They go through an
//! [`Executor`] and the lookup helpers below, which fold every failure into
//! a [`Lookup`] so that an unreachable server never fails an audit.
//!
//! | Outcome | Meaning |
//! |---------|---------|
//! | [`Lookup::Found`] | the server confirmed the object exists |
//! | [`Lookup::NotFound`] | the server confirmed it does not |
//! | [`Lookup::Unknown`] | the answer could not be determined |

pub mod mysql;

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use indexmap::IndexMap;
use sqlx::mysql::MySqlConnectOptions;

pub use self::mysql::MysqlExecutor;
use crate::{
    cache::{self, CacheValue, KvCache},
    config::ExplainRule,
    error::DbError,
    parser::{self, QualifiedName}
};

/// One result row, column name -> text value (`NULL` for SQL NULL).
pub type Row = IndexMap<String, String>;

/// Seam between the rule engine and a database.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Default schema of the connection.
    fn schema(&self) -> &str;

    /// `host:port` for logs.
    fn address(&self) -> String;

    async fn query(&self, sql: &str) -> Result<Vec<Row>, DbError>;

    /// Run a statement and return affected rows.
    async fn exec(&self, sql: &str) -> Result<u64, DbError>;

    async fn ping(&self) -> Result<(), DbError>;

    /// Release connections held for the request.
    async fn close(&self) {}
}

/// Executor used when no database is configured.
#[derive(Debug, Default, Clone)]
pub struct OfflineExecutor {
    schema: String
}

impl OfflineExecutor {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into()
        }
    }
}

#[async_trait]
impl Executor for OfflineExecutor {
    fn schema(&self) -> &str {
        &self.schema
    }

    fn address(&self) -> String {
        "offline".to_string()
    }

    async fn query(&self, _sql: &str) -> Result<Vec<Row>, DbError> {
        Err(DbError::Offline)
    }

    async fn exec(&self, _sql: &str) -> Result<u64, DbError> {
        Err(DbError::Offline)
    }

    async fn ping(&self) -> Result<(), DbError> {
        Err(DbError::Offline)
    }
}

/// Connection parameters for the audited server.
#[derive(Clone, PartialEq, Eq)]
pub struct DbHandle {
    host:     String,
    port:     u16,
    user:     String,
    password: String,
    schema:   String
}

impl DbHandle {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
        schema: impl Into<String>
    ) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
            password: password.into(),
            schema: schema.into()
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Go-style DSN, for display and logs.
    pub fn dsn(&self) -> String {
        format!(
            "{}:{}@tcp({}:{})/{}?charset=utf8mb4&parseTime=True&loc=Local&timeout=3s&readTimeout=3s&writeTimeout=3s",
            self.user, self.password, self.host, self.port, self.schema
        )
    }

    pub fn connect_options(&self) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .charset("utf8mb4");
        if self.schema.is_empty() {
            options
        } else {
            options.database(&self.schema)
        }
    }
}

impl fmt::Debug for DbHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbHandle")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("schema", &self.schema)
            .finish()
    }
}

/// Result of an existence probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(String),
    NotFound(String),
    Unknown
}

impl Lookup {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Found(msg) | Self::NotFound(msg) => Some(msg),
            Self::Unknown => None
        }
    }
}

/// Server variables used by dialect-sensitive rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbVars {
    pub db_version:                String,
    pub db_charset:                String,
    pub large_prefix:              String,
    pub innodb_default_row_format: String
}

impl Default for DbVars {
    fn default() -> Self {
        Self {
            db_version:                String::new(),
            db_charset:                "utf8".to_string(),
            large_prefix:              "OFF".to_string(),
            innodb_default_row_format: "dynamic".to_string()
        }
    }
}

impl DbVars {
    /// Store under the well-known cache keys.
    pub fn write_to(&self, kv: &mut KvCache) {
        kv.put(cache::DB_VERSION, CacheValue::Text(self.db_version.clone()));
        kv.put(cache::DB_CHARSET, CacheValue::Text(self.db_charset.clone()));
        kv.put(cache::LARGE_PREFIX, CacheValue::Text(self.large_prefix.clone()));
        kv.put(
            cache::INNODB_DEFAULT_ROW_FORMAT,
            CacheValue::Text(self.innodb_default_row_format.clone())
        );
    }
}

/// Quote a possibly qualified identifier with backticks.
pub fn quote_ident(name: &str) -> String {
    let name = QualifiedName::from_object_name(name);
    let quote = |part: &str| format!("`{}`", part.replace('`', "``"));
    match &name.schema {
        Some(schema) => format!("{}.{}", quote(schema), quote(&name.name)),
        None => quote(&name.name)
    }
}

fn quote_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "''")
}

fn first_value<'a>(rows: &'a [Row], column: &str) -> Option<&'a str> {
    rows.first()
        .and_then(|row| row.get(column).or_else(|| row.get(&column.to_ascii_uppercase())))
        .map(String::as_str)
}

pub async fn get_db_vars(db: &dyn Executor) -> Result<DbVars, DbError> {
    let rows = db
        .query(
            "SHOW VARIABLES WHERE Variable_name IN \
             ('innodb_large_prefix','version','character_set_database','innodb_default_row_format')"
        )
        .await?;

    let mut vars = DbVars::default();
    for row in &rows {
        let (Some(name), Some(value)) = (row.get("Variable_name"), row.get("Value")) else {
            continue;
        };
        match name.as_str() {
            "version" => vars.db_version = value.clone(),
            "character_set_database" => vars.db_charset = value.clone(),
            "innodb_default_row_format" => vars.innodb_default_row_format = value.clone(),
            "innodb_large_prefix" => {
                vars.large_prefix = match value.as_str() {
                    "0" => "OFF".to_string(),
                    "1" => "ON".to_string(),
                    other => other.to_ascii_uppercase()
                }
            }
            _ => {}
        }
    }
    Ok(vars)
}

pub async fn check_if_table_exists(table: &str, db: &dyn Executor) -> Lookup {
    if let Err(err) = db.ping().await {
        if err.is_missing_database() {
            return Lookup::NotFound(format!("数据库`{}`不存在", db.schema()));
        }
        return Lookup::Unknown;
    }

    match db.query(&format!("DESC {}", quote_ident(table))).await {
        Ok(_) => Lookup::Found(format!("表或视图`{}`已存在", table)),
        Err(err) if err.is_missing_table() => {
            Lookup::NotFound(format!("表或视图`{}`不存在", table))
        }
        Err(_) => Lookup::Unknown
    }
}

async fn count_lookup(sql: &str, db: &dyn Executor) -> Option<i64> {
    let rows = db.query(sql).await.ok()?;
    first_value(&rows, "count").and_then(|v| v.parse().ok())
}

pub async fn check_if_database_exists(database: &str, db: &dyn Executor) -> Lookup {
    let sql = format!(
        "SELECT COUNT(*) AS count FROM information_schema.schemata WHERE schema_name='{}'",
        quote_literal(database)
    );
    match count_lookup(&sql, db).await {
        None => Lookup::Unknown,
        Some(0) => Lookup::NotFound(format!("数据库`{}`不存在", database)),
        Some(_) => Lookup::Found(format!("数据库`{}`已存在", database))
    }
}

pub async fn check_if_table_exists_cross_db(table: &str, db: &dyn Executor) -> Lookup {
    let sql = format!(
        "SELECT COUNT(*) AS count FROM information_schema.tables WHERE table_name='{}'",
        quote_literal(table)
    );
    match count_lookup(&sql, db).await {
        None => Lookup::Unknown,
        Some(0) => Lookup::NotFound(format!("表或视图`{}`不存在", table)),
        Some(_) => Lookup::Found(format!("表或视图`{}`已存在", table))
    }
}

/// Parsed `SHOW CREATE TABLE` output, cached by bare table name.
pub async fn show_create_table(
    table: &str,
    db: &dyn Executor,
    kv: &mut KvCache
) -> Result<Arc<parser::Audit>, DbError> {
    let key = QualifiedName::from_object_name(table).name;
    if let Some(audit) = kv.get_table(&key) {
        return Ok(audit);
    }

    let rows = db
        .query(&format!("SHOW CREATE TABLE {}", quote_ident(table)))
        .await?;
    let ddl = first_value(&rows, "Create Table")
        .or_else(|| first_value(&rows, "Create View"))
        .ok_or_else(|| DbError::Malformed(format!("SHOW CREATE TABLE {}", table)))?;

    let (audit, _) =
        parser::parse(ddl, "", "").map_err(|e| DbError::Malformed(e.to_string()))?;
    let audit = Arc::new(audit);
    kv.put(key, CacheValue::Table(Arc::clone(&audit)));
    Ok(audit)
}

/// Estimated rows touched by `sql`, from its `EXPLAIN` plan.
pub async fn explain_rows(sql: &str, rule: ExplainRule, db: &dyn Executor) -> Result<i64, DbError> {
    let rows = db.query(&format!("EXPLAIN {}", sql)).await?;
    let estimates = rows.iter().filter_map(|row| {
        row.get("rows")
            .or_else(|| row.get("estRows"))
            .and_then(|v| v.parse::<f64>().ok())
            .map(|v| v.round() as i64)
    });

    let value = match rule {
        ExplainRule::First => estimates.take(1).next(),
        ExplainRule::Max => estimates.max()
    };
    Ok(value.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dsn_format() {
        let handle = DbHandle::new("10.0.0.1", 4000, "audit", "pw", "shop");
        assert_eq!(
            handle.dsn(),
            "audit:pw@tcp(10.0.0.1:4000)/shop?charset=utf8mb4&parseTime=True&loc=Local&timeout=3s&readTimeout=3s&writeTimeout=3s"
        );
        assert!(!format!("{:?}", handle).contains("pw"));
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("t"), "`t`");
        assert_eq!(quote_ident("d.t"), "`d`.`t`");
        assert_eq!(quote_ident("`we`ird`"), "`we``ird`");
    }

    #[test]
    fn test_db_vars_default() {
        let vars = DbVars::default();
        assert_eq!(vars.db_charset, "utf8");
        assert_eq!(vars.large_prefix, "OFF");
        assert_eq!(vars.innodb_default_row_format, "dynamic");
        assert!(vars.db_version.is_empty());
    }
}
