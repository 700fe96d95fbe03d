//! sqlx-backed executor for MySQL and TiDB.
//!
//! The pool is sized for one short-lived connection per request. Every call
//! is bounded by three seconds or the request deadline, whichever is first.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{
    Column, Connection, MySqlPool, Row as _,
    mysql::{MySqlDatabaseError, MySqlPoolOptions, MySqlRow}
};
use tokio::time::{Instant, timeout_at};
use tracing::debug;

use super::{DbHandle, Executor, Row};
use crate::error::DbError;

/// Per-call timeout, also used for connect and acquire.
pub const CALL_TIMEOUT: Duration = Duration::from_secs(3);

/// Upper bound for a pooled connection's lifetime.
pub const MAX_LIFETIME: Duration = Duration::from_secs(5);

pub struct MysqlExecutor {
    handle:   DbHandle,
    pool:     MySqlPool,
    deadline: Option<Instant>
}

impl MysqlExecutor {
    /// Build a lazy pool. Must be called inside a tokio runtime.
    pub fn new(handle: DbHandle, deadline: Option<Instant>) -> Self {
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .min_connections(0)
            .acquire_timeout(CALL_TIMEOUT)
            .max_lifetime(MAX_LIFETIME)
            .idle_timeout(MAX_LIFETIME)
            .connect_lazy_with(handle.connect_options());
        Self {
            handle,
            pool,
            deadline
        }
    }

    pub fn handle(&self) -> &DbHandle {
        &self.handle
    }

    fn call_deadline(&self) -> Instant {
        let per_call = Instant::now() + CALL_TIMEOUT;
        match self.deadline {
            Some(deadline) => per_call.min(deadline),
            None => per_call
        }
    }
}

fn map_sqlx_error(err: sqlx::Error) -> DbError {
    match err {
        sqlx::Error::Database(db_err) => {
            let number = db_err
                .try_downcast_ref::<MySqlDatabaseError>()
                .map(MySqlDatabaseError::number)
                .unwrap_or_default();
            DbError::Server {
                number,
                message: db_err.message().to_string()
            }
        }
        sqlx::Error::PoolTimedOut => DbError::Timeout,
        other => DbError::Connection(other.to_string())
    }
}

fn column_text(row: &MySqlRow, idx: usize) -> String {
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return v.unwrap_or_else(|| "NULL".to_string());
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return v.map_or_else(|| "NULL".to_string(), |n| n.to_string());
    }
    if let Ok(v) = row.try_get::<Option<u64>, _>(idx) {
        return v.map_or_else(|| "NULL".to_string(), |n| n.to_string());
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return v.map_or_else(|| "NULL".to_string(), |n| n.to_string());
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
        return v.map_or_else(
            || "NULL".to_string(),
            |bytes| String::from_utf8_lossy(&bytes).into_owned()
        );
    }
    "NULL".to_string()
}

fn row_to_map(row: &MySqlRow) -> Row {
    row.columns()
        .iter()
        .map(|col| (col.name().to_string(), column_text(row, col.ordinal())))
        .collect()
}

#[async_trait]
impl Executor for MysqlExecutor {
    fn schema(&self) -> &str {
        self.handle.schema()
    }

    fn address(&self) -> String {
        self.handle.address()
    }

    async fn query(&self, sql: &str) -> Result<Vec<Row>, DbError> {
        debug!(address = %self.handle.address(), sql, "introspection query");
        let rows = timeout_at(self.call_deadline(), sqlx::raw_sql(sql).fetch_all(&self.pool))
            .await
            .map_err(|_| DbError::Timeout)?
            .map_err(map_sqlx_error)?;
        Ok(rows.iter().map(row_to_map).collect())
    }

    async fn exec(&self, sql: &str) -> Result<u64, DbError> {
        let result = timeout_at(self.call_deadline(), sqlx::raw_sql(sql).execute(&self.pool))
            .await
            .map_err(|_| DbError::Timeout)?
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), DbError> {
        timeout_at(self.call_deadline(), async {
            let mut conn = self.pool.acquire().await?;
            conn.ping().await
        })
        .await
        .map_err(|_| DbError::Timeout)?
        .map_err(map_sqlx_error)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_map_sqlx_error() {
        assert!(matches!(map_sqlx_error(sqlx::Error::PoolTimedOut), DbError::Timeout));
        assert!(matches!(
            map_sqlx_error(sqlx::Error::Protocol("bad packet".to_string())),
            DbError::Connection(_)
        ));
    }

    #[tokio::test]
    async fn test_call_deadline_capped_by_request() {
        let handle = DbHandle::new("127.0.0.1", 3306, "audit", "pw", "shop");
        let deadline = Instant::now() + Duration::from_millis(100);
        let executor = MysqlExecutor::new(handle, Some(deadline));
        assert!(executor.call_deadline() <= deadline);
        assert_eq!(executor.address(), "127.0.0.1:3306");
        assert_eq!(executor.handle().schema(), "shop");

        let unbounded = MysqlExecutor::new(
            DbHandle::new("127.0.0.1", 3306, "audit", "pw", "shop"),
            None
        );
        assert!(unbounded.call_deadline() > deadline);
    }
}
