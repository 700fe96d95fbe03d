//! Application logic for the sql-audit CLI.
//!
//! This module contains the command implementations separated from the main
//! entry point to enable testing.

use std::{
    fs::read_to_string,
    io::{self, Read},
    time::Duration
};

use indicatif::{ProgressBar, ProgressStyle};
use tokio::time::Instant;

use crate::{
    checker::{AuditResult, Checker},
    cli::{Format, SqlType},
    config::{Config, DatabaseConfig, InspectParams},
    error::{AppResult, file_read_error},
    output::{OutputFormat, OutputOptions, format_results, format_statements},
    parser::{self, SqlCategory, fingerprint}
};

/// Parameters for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckParams {
    pub sql_path:      String,
    pub host:          Option<String>,
    pub port:          Option<u16>,
    pub user:          Option<String>,
    pub password:      Option<String>,
    pub schema:        Option<String>,
    pub db_type:       Option<String>,
    pub params_path:   Option<String>,
    pub sql_type:      Option<SqlType>,
    pub output_format: Option<Format>,
    pub no_color:      bool
}

/// Output from CLI command execution.
///
/// `exit_code` is 0 when every result is INFO, 1 when anything needs
/// attention. Errors never reach this type; `main` maps them to 2.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout:    Vec<String>
}

impl CommandOutput {
    fn ok(stdout: Vec<String>) -> Self {
        Self {
            exit_code: 0,
            stdout
        }
    }
}

/// Convert CLI format to output format
pub fn convert_format(format: Format) -> OutputFormat {
    match format {
        Format::Text => OutputFormat::Text,
        Format::Json => OutputFormat::Json,
        Format::Yaml => OutputFormat::Yaml
    }
}

/// Convert CLI ticket type to a statement category
pub fn convert_sql_type(sql_type: SqlType) -> SqlCategory {
    match sql_type {
        SqlType::Ddl => SqlCategory::Ddl,
        SqlType::Dml => SqlCategory::Dml,
        SqlType::Export => SqlCategory::Export
    }
}

/// 1 when any result is at WARN or above, 0 otherwise.
pub fn calculate_exit_code(results: &[AuditResult]) -> i32 {
    if results.iter().any(|r| r.level.is_warning()) {
        1
    } else {
        0
    }
}

/// Read SQL from a file or stdin ("-").
pub fn read_sql_input(path: &str) -> AppResult<String> {
    if path == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| file_read_error("stdin", e))?;
        Ok(buffer)
    } else {
        read_to_string(path).map_err(|e| file_read_error(path, e))
    }
}

pub fn create_output_options(format: Format, no_color: bool) -> OutputOptions {
    OutputOptions {
        format:  convert_format(format),
        colored: !no_color
    }
}

/// Configured parameters with an optional JSON file merged on top.
pub fn load_params(config: &Config, params_path: Option<&str>) -> AppResult<InspectParams> {
    let mut params = config.params.clone();
    if let Some(path) = params_path {
        let raw = read_to_string(path).map_err(|e| file_read_error(path, e))?;
        params.merge_json(&raw)?;
    }
    Ok(params)
}

/// Connection settings with command-line flags taking precedence.
pub fn resolve_database(params: &CheckParams, config: &Config) -> DatabaseConfig {
    let mut database = config.database.clone();
    if let Some(host) = &params.host {
        database.host = Some(host.clone());
    }
    if let Some(port) = params.port {
        database.port = port;
    }
    if let Some(user) = &params.user {
        database.user = user.clone();
    }
    if let Some(password) = &params.password {
        database.password = password.clone();
    }
    if let Some(schema) = &params.schema {
        database.schema = schema.clone();
    }
    database
}

/// Build a checker for one invocation of `check`.
///
/// Without a host the checker runs offline and every introspection
/// lookup is inconclusive.
pub fn build_checker(params: &CheckParams, config: &Config) -> AppResult<Checker> {
    let inspect = load_params(config, params.params_path.as_deref())?;
    let db_type = params
        .db_type
        .clone()
        .unwrap_or_else(|| config.audit.db_type.clone());
    let handle = resolve_database(params, config).handle();
    Ok(Checker::new(Some(inspect), db_type)
        .with_handle(handle)
        .with_deadline(Instant::now() + config.audit.request_timeout()))
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Audit the SQL named by `params`.
///
/// When `--sql-type` is given the whole input is checked against that
/// ticket type first and a mismatch fails the command.
pub async fn run_check(params: CheckParams, config: Config) -> AppResult<CommandOutput> {
    let sql = read_sql_input(&params.sql_path)?;
    if let Some(sql_type) = params.sql_type {
        parser::check_sql_type(&sql, convert_sql_type(sql_type))?;
    }

    let checker = build_checker(&params, &config)?;
    let live = resolve_database(&params, &config).host.is_some();
    let pb = live.then(|| spinner("Auditing against the database..."));
    let results = checker.check(&sql).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let results = results?;

    let opts = create_output_options(params.output_format.unwrap_or(Format::Text), params.no_color);
    Ok(CommandOutput {
        exit_code: calculate_exit_code(&results),
        stdout:    vec![format_results(&results, &opts)]
    })
}

/// Print each statement of the input.
pub fn run_split(sql_path: &str) -> AppResult<CommandOutput> {
    let sql = read_sql_input(sql_path)?;
    let statements = parser::split_sql_text(&sql)?;
    Ok(CommandOutput::ok(vec![format_statements(&statements)]))
}

/// Print `id<TAB>fingerprint` per statement.
pub fn run_fingerprint(sql_path: &str) -> AppResult<CommandOutput> {
    let sql = read_sql_input(sql_path)?;
    let lines = parser::split_sql_text(&sql)?
        .iter()
        .map(|text| {
            let canonical = fingerprint::fingerprint(text);
            format!("{}\t{}", fingerprint::id(&canonical), canonical)
        })
        .collect();
    Ok(CommandOutput::ok(lines))
}

/// Print the routing tag of a single DDL statement.
pub fn run_classify(sql_path: &str) -> AppResult<CommandOutput> {
    let sql = read_sql_input(sql_path)?;
    let tag = parser::get_sql_statement(&sql)?;
    Ok(CommandOutput::ok(vec![tag.to_string()]))
}
