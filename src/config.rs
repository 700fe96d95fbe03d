//! Configuration loading and management.
//!
//! Configuration is loaded from multiple sources with the following precedence
//! (highest to lowest):
//!
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. `.sql-audit.toml` in current directory
//! 4. `~/.config/sql-audit/config.toml`
//! 5. Default values
//!
//! # Configuration File Format
//!
//! ```toml
//! [database]
//! host = "127.0.0.1"
//! port = 3306
//! user = "audit"
//! password = "..."             # or use SQL_AUDIT_DB_PASSWORD
//! schema = "orders"
//!
//! [audit]
//! db_type = "MySQL"            # MySQL or TiDB
//! request_timeout_ms = 30000
//!
//! [params]
//! MAX_TABLE_NAME_LENGTH = 48
//! ENABLE_TIDB_MERGE_ALTER_TABLE = true
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `SQL_AUDIT_DB_HOST` | Database host |
//! | `SQL_AUDIT_DB_PORT` | Database port |
//! | `SQL_AUDIT_DB_USER` | Database user |
//! | `SQL_AUDIT_DB_PASSWORD` | Database password |
//! | `SQL_AUDIT_DB_SCHEMA` | Default schema |
//! | `SQL_AUDIT_DB_TYPE` | Dialect label |

mod params;

use std::{env, fs, path::PathBuf, time::Duration};

use serde::Deserialize;

pub use self::params::{
    CharsetSpec, DEFAULT_MAX_VARCHAR_LENGTH, DisabledTables, ExplainRule, InspectParams
};
use crate::{
    error::{AppResult, config_error},
    introspect::DbHandle
};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub audit:    AuditConfig,
    #[serde(default)]
    pub params:   InspectParams
}

/// Connection settings for live introspection
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub host:     Option<String>,
    #[serde(default = "default_port")]
    pub port:     u16,
    #[serde(default)]
    pub user:     String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub schema:   String
}

fn default_port() -> u16 {
    3306
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host:     None,
            port:     default_port(),
            user:     String::new(),
            password: String::new(),
            schema:   String::new()
        }
    }
}

impl DatabaseConfig {
    /// Build a handle when a host is configured.
    pub fn handle(&self) -> Option<DbHandle> {
        self.host.as_ref().map(|host| {
            DbHandle::new(
                host.clone(),
                self.port,
                self.user.clone(),
                self.password.clone(),
                self.schema.clone()
            )
        })
    }
}

/// Engine behaviour settings
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_db_type")]
    pub db_type:            String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64
}

fn default_db_type() -> String {
    String::from("MySQL")
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            db_type:            default_db_type(),
            request_timeout_ms: default_request_timeout_ms()
        }
    }
}

impl AuditConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Config file in current directory (.sql-audit.toml)
    /// 3. Config file in home directory (~/.config/sql-audit/config.toml)
    /// 4. Default values
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(home) = env::var_os("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("sql-audit")
                .join("config.toml");
            if home_config.exists() {
                config = Self::from_file(&home_config)?;
            }
        }

        let local_config = PathBuf::from(".sql-audit.toml");
        if local_config.exists() {
            config = Self::from_file(&local_config)?;
        }

        config.apply_env(|key| env::var(key).ok())?;
        config.params.normalize();
        Ok(config)
    }

    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| config_error(format!("配置文件格式错误: {}", e)))
    }

    fn from_file(path: &PathBuf) -> AppResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| config_error(format!("读取配置文件失败: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Apply `SQL_AUDIT_*` overrides from the given lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> AppResult<()> {
        if let Some(host) = lookup("SQL_AUDIT_DB_HOST") {
            self.database.host = Some(host);
        }
        if let Some(port) = lookup("SQL_AUDIT_DB_PORT") {
            self.database.port = port
                .parse()
                .map_err(|_| config_error(format!("SQL_AUDIT_DB_PORT不是合法端口: {}", port)))?;
        }
        if let Some(user) = lookup("SQL_AUDIT_DB_USER") {
            self.database.user = user;
        }
        if let Some(password) = lookup("SQL_AUDIT_DB_PASSWORD") {
            self.database.password = password;
        }
        if let Some(schema) = lookup("SQL_AUDIT_DB_SCHEMA") {
            self.database.schema = schema;
        }
        if let Some(db_type) = lookup("SQL_AUDIT_DB_TYPE") {
            self.audit.db_type = db_type;
        }
        Ok(())
    }
}
