//! Request entry point.
//!
//! A [`Checker`] audits one block of SQL per [`Checker::check`] call:
//!
//! 1. parse the input into statements (a parse error fails the request);
//! 2. read server variables into a fresh per-request cache;
//! 3. run every statement through its rule table, in input order;
//! 4. append the ALTER merge advice, if any;
//! 5. map everything to [`AuditResult`].
//!
//! # Example
//!
//! ```no_run
//! use sql_audit::checker::Checker;
//!
//! # async fn demo() -> sql_audit::error::AppResult<()> {
//! let mut checker = Checker::new(None, "MySQL");
//! checker.set_db_info("127.0.0.1", 3306, "audit", "secret", "shop");
//! for result in checker.check("UPDATE orders SET state = 1").await? {
//!     println!("{} {:?}", result.level, result.messages);
//! }
//! # Ok(())
//! # }
//! ```

mod merge;
mod report;
mod stmt;

use std::sync::Arc;

use tokio::time::Instant;
use tracing::{Instrument, debug, info_span, instrument::WithSubscriber, warn};

pub use self::{
    merge::merge_alter_entries,
    report::{AuditResult, Level, PASSED, ReturnData},
    stmt::{SELECT_MESSAGE, UNKNOWN_MESSAGE, type_tag}
};
use crate::{
    cache::KvCache,
    config::InspectParams,
    error::{AppResult, DbError},
    introspect::{self, DbHandle, DbVars, Executor, MysqlExecutor, OfflineExecutor},
    parser::{self, fingerprint}
};

/// SQL review engine for one database.
pub struct Checker {
    params:   InspectParams,
    db_type:  String,
    handle:   Option<DbHandle>,
    executor: Option<Arc<dyn Executor>>,
    deadline: Option<Instant>,
    logger:   Option<tracing::Dispatch>
}

impl Checker {
    /// `None` params means [`InspectParams::default`].
    pub fn new(params: Option<InspectParams>, db_type: impl Into<String>) -> Self {
        let mut params = params.unwrap_or_default();
        params.normalize();
        Self {
            params,
            db_type: db_type.into(),
            handle: None,
            executor: None,
            deadline: None,
            logger: None
        }
    }

    /// Connection used for introspection.
    pub fn set_db_info(
        &mut self,
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
        schema: impl Into<String>
    ) {
        self.handle = Some(DbHandle::new(host, port, user, password, schema));
    }

    pub fn with_handle(mut self, handle: Option<DbHandle>) -> Self {
        self.handle = handle;
        self
    }

    /// Use `executor` instead of opening connections from the handle.
    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Every introspection call gives up at `deadline`.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Route this checker's log events to `dispatch`.
    pub fn with_logger(mut self, dispatch: tracing::Dispatch) -> Self {
        self.logger = Some(dispatch);
        self
    }

    pub fn params(&self) -> &InspectParams {
        &self.params
    }

    pub fn db_type(&self) -> &str {
        &self.db_type
    }

    /// Audit every statement in `sql`.
    pub async fn check(&self, sql: &str) -> AppResult<Vec<AuditResult>> {
        match &self.logger {
            Some(dispatch) => self.run(sql).with_subscriber(dispatch.clone()).await,
            None => self.run(sql).await
        }
    }

    fn executor(&self) -> Arc<dyn Executor> {
        if let Some(executor) = &self.executor {
            return Arc::clone(executor);
        }
        match &self.handle {
            Some(handle) => Arc::new(MysqlExecutor::new(handle.clone(), self.deadline)),
            None => Arc::new(OfflineExecutor::new(""))
        }
    }

    async fn run(&self, sql: &str) -> AppResult<Vec<AuditResult>> {
        let request_id = format!("inspect_{}", fingerprint::fingerprint_id(sql));
        let span = info_span!("audit", request_id = %request_id, db_type = %self.db_type);
        async move {
            let (audit, warnings) = parser::parse(sql, "", "")?;
            for warning in &warnings {
                warn!("{}", warning);
            }

            let executor = self.executor();
            let db = executor.as_ref();
            let mut kv = KvCache::new(request_id);

            let vars = match introspect::get_db_vars(db).await {
                Ok(vars) => vars,
                Err(DbError::Offline) => DbVars::default(),
                Err(err) => {
                    warn!(error = %err, address = %db.address(), "读取数据库变量失败，使用默认值");
                    DbVars::default()
                }
            };
            debug!(version = %vars.db_version, "server variables loaded");
            vars.write_to(&mut kv);

            let mut results = Vec::with_capacity(audit.stmts.len() + 1);
            let mut alter_targets = Vec::new();
            for stmt in &audit.stmts {
                let outcome = stmt::check_statement(stmt, db, &mut kv, &self.params).await;
                alter_targets.extend(outcome.merge_alter);
                results.push(outcome.data);
            }
            if let Some(merged) = merge_alter_entries(&alter_targets, &kv, &self.params) {
                results.push(merged);
            }

            db.close().await;
            debug!(statements = audit.stmts.len(), results = results.len(), "audit finished");
            Ok(results.into_iter().map(AuditResult::from).collect())
        }
        .instrument(span)
        .await
    }
}
