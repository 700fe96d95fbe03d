// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex}
};

use async_trait::async_trait;
use sql_audit::{
    checker::Checker,
    error::DbError,
    introspect::{Executor, Row}
};

/// In-memory stand-in for a MySQL server.
#[derive(Default)]
pub struct FakeExecutor {
    pub schema:       String,
    pub version:      String,
    pub tables:       HashMap<String, String>,
    pub databases:    Vec<String>,
    pub explain_rows: i64,
    pub seen:         Mutex<Vec<String>>
}

impl FakeExecutor {
    pub fn mysql() -> Self {
        Self {
            schema: "shop".to_string(),
            version: "8.0.36".to_string(),
            databases: vec!["shop".to_string()],
            ..Self::default()
        }
    }

    pub fn tidb() -> Self {
        Self {
            version: "8.0.11-TiDB-v7.5.0".to_string(),
            ..Self::mysql()
        }
    }

    /// Register `name` with the DDL `SHOW CREATE TABLE` should return.
    pub fn with_table(mut self, name: &str, ddl: &str) -> Self {
        self.tables.insert(name.to_string(), ddl.to_string());
        self
    }

    pub fn with_explain_rows(mut self, rows: i64) -> Self {
        self.explain_rows = rows;
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.seen.lock().map(|q| q.clone()).unwrap_or_default()
    }

    fn table_of(sql: &str, prefix: &str) -> String {
        let target = sql[prefix.len()..].trim().replace('`', "");
        target.rsplit('.').next().unwrap_or_default().to_string()
    }

    fn missing_table(table: &str) -> DbError {
        DbError::Server {
            number:  1146,
            message: format!("Table 'shop.{}' doesn't exist", table)
        }
    }

    fn quoted_literal(sql: &str) -> String {
        sql.rsplit('=').next().unwrap_or_default().trim().trim_matches('\'').to_string()
    }
}

fn row(pairs: &[(&str, &str)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[async_trait]
impl Executor for FakeExecutor {
    fn schema(&self) -> &str {
        &self.schema
    }

    fn address(&self) -> String {
        "fake:3306".to_string()
    }

    async fn query(&self, sql: &str) -> Result<Vec<Row>, DbError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(sql.to_string());
        }

        if sql.starts_with("SHOW VARIABLES") {
            return Ok(vec![
                row(&[("Variable_name", "version"), ("Value", &self.version)]),
                row(&[("Variable_name", "character_set_database"), ("Value", "utf8mb4")]),
                row(&[("Variable_name", "innodb_default_row_format"), ("Value", "dynamic")])
            ]);
        }
        if sql.starts_with("DESC ") {
            let table = Self::table_of(sql, "DESC ");
            if self.tables.contains_key(&table) {
                return Ok(vec![row(&[("Field", "id"), ("Type", "bigint unsigned")])]);
            }
            return Err(Self::missing_table(&table));
        }
        if sql.starts_with("SHOW CREATE TABLE ") {
            let table = Self::table_of(sql, "SHOW CREATE TABLE ");
            return match self.tables.get(&table) {
                Some(ddl) => Ok(vec![row(&[("Table", &table), ("Create Table", ddl)])]),
                None => Err(Self::missing_table(&table))
            };
        }
        if sql.starts_with("EXPLAIN ") {
            return Ok(vec![row(&[("id", "1"), ("rows", &self.explain_rows.to_string())])]);
        }
        if sql.contains("information_schema.schemata") {
            let name = Self::quoted_literal(sql);
            let count = usize::from(self.databases.contains(&name));
            return Ok(vec![row(&[("count", &count.to_string())])]);
        }
        if sql.contains("information_schema.tables") {
            let name = Self::quoted_literal(sql);
            let count = usize::from(self.tables.contains_key(&name));
            return Ok(vec![row(&[("count", &count.to_string())])]);
        }
        Ok(Vec::new())
    }

    async fn exec(&self, _sql: &str) -> Result<u64, DbError> {
        Ok(0)
    }

    async fn ping(&self) -> Result<(), DbError> {
        Ok(())
    }
}

pub const ORDERS_DDL: &str = "CREATE TABLE `orders` (\n  \
    `id` bigint unsigned NOT NULL AUTO_INCREMENT COMMENT '主键',\n  \
    `user_id` bigint unsigned NOT NULL DEFAULT '0' COMMENT '用户',\n  \
    `state` int NOT NULL DEFAULT '0' COMMENT '状态',\n  \
    `note` varchar(64) NOT NULL DEFAULT '' COMMENT '备注',\n  \
    PRIMARY KEY (`id`),\n  \
    KEY `idx_user_id` (`user_id`)\n\
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COMMENT='订单'";

pub fn checker_with(fake: FakeExecutor) -> Checker {
    Checker::new(None, "MySQL").with_executor(Arc::new(fake))
}

pub fn offline_checker() -> Checker {
    Checker::new(None, "MySQL")
}
