//! # sql-audit
//!
//! Pre-execution review of MySQL / TiDB change requests.
//!
//! ```bash
//! # Offline review: syntax and static rules only
//! sql-audit check migration.sql
//!
//! # Live review against the target schema
//! export SQL_AUDIT_DB_PASSWORD="..."
//! sql-audit check --host 10.0.0.12 --user audit --schema shop migration.sql -f json
//!
//! # Reject anything that is not DML
//! cat fix.sql | sql-audit check --sql-type dml -
//! ```
//!
//! # Exit Codes
//!
//! - `0` - every statement passed
//! - `1` - at least one statement needs changes
//! - `2` - the input could not be read or parsed

use std::process;

use clap::Parser;
use sql_audit::{
    app::{CheckParams, CommandOutput, run_check, run_classify, run_fingerprint, run_split},
    cli::{Cli, Commands},
    config::Config,
    error::AppResult,
    logging::init_logging
};
use tokio::main;

#[main]
async fn main() {
    match run().await {
        Ok(output) => {
            for line in &output.stdout {
                println!("{}", line);
            }
            process::exit(output.exit_code);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    }
}

async fn run() -> AppResult<CommandOutput> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet)?;
    let config = Config::load()?;

    match cli.command {
        Commands::Check {
            sql,
            host,
            port,
            user,
            password,
            schema,
            db_type,
            params,
            sql_type,
            output_format,
            no_color
        } => {
            let params = CheckParams {
                sql_path: sql.display().to_string(),
                host,
                port,
                user,
                password,
                schema,
                db_type,
                params_path: params.map(|p| p.display().to_string()),
                sql_type,
                output_format: Some(output_format),
                no_color
            };
            run_check(params, config).await
        }
        Commands::Split { sql } => run_split(&sql.display().to_string()),
        Commands::Fingerprint { sql } => run_fingerprint(&sql.display().to_string()),
        Commands::Classify { sql } => run_classify(&sql.display().to_string())
    }
}
