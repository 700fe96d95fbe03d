use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

/// sql-audit - review MySQL / TiDB change requests before they run
#[derive(Parser, Debug)]
#[command(name = "sql-audit")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Audit SQL statements
    Check {
        /// Path to the SQL file (use - for stdin)
        sql: PathBuf,

        /// Database host used for introspection
        #[arg(long)]
        host: Option<String>,

        /// Database port
        #[arg(long)]
        port: Option<u16>,

        /// Database user
        #[arg(long)]
        user: Option<String>,

        /// Database password
        #[arg(long, env = "SQL_AUDIT_DB_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Default schema
        #[arg(long)]
        schema: Option<String>,

        /// Dialect label (MySQL or TiDB)
        #[arg(long)]
        db_type: Option<String>,

        /// JSON file with audit parameters merged over the configuration
        #[arg(long)]
        params: Option<PathBuf>,

        /// Reject statements outside this ticket type before auditing
        #[arg(long, value_enum)]
        sql_type: Option<SqlType>,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        output_format: Format,

        /// Disable colored output
        #[arg(long)]
        no_color: bool
    },

    /// Split SQL text into statements
    Split {
        /// Path to the SQL file (use - for stdin)
        sql: PathBuf
    },

    /// Print the fingerprint and fingerprint id of each statement
    Fingerprint {
        /// Path to the SQL file (use - for stdin)
        sql: PathBuf
    },

    /// Print the statement tag of a single DDL statement
    Classify {
        /// Path to the SQL file (use - for stdin)
        sql: PathBuf
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Format {
    Text,
    Json,
    Yaml
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SqlType {
    Ddl,
    Dml,
    Export
}
