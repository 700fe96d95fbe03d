//! MySQL/TiDB statement parsing and classification.
//!
//! [`parse`] turns a block of SQL into an [`Audit`]: one [`StmtNode`] per
//! statement, each carrying the typed sqlparser AST, its canonical text and
//! the significant tokens of that text.

pub mod fingerprint;
pub mod tokens;

use std::fmt;

use indexmap::IndexMap;
use sqlparser::{
    ast::{SetExpr, Statement},
    dialect::MySqlDialect,
    parser::Parser,
    tokenizer::{Token, Whitespace}
};
use tracing::debug;

pub use self::tokens::QualifiedName;
use crate::{
    error::{AppResult, query_parse_error, rule_match_error, sql_type_error},
    preprocessor::Preprocessor
};

/// Character sets the parser knows how to treat as UTF-8 compatible input.
const KNOWN_CHARSETS: &[&str] = &["", "utf8", "utf8mb4", "utf8mb3", "latin1", "ascii", "binary"];

/// Statement kinds the dispatcher and the routing helpers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StmtKind {
    Select,
    SetOperation,
    CreateTable,
    CreateView,
    CreateDatabase,
    CreateIndex,
    AlterTable,
    DropTable,
    DropIndex,
    DropDatabase,
    TruncateTable,
    Delete,
    Insert,
    Update,
    RenameTable,
    AnalyzeTable,
    Other
}

/// Ticket type a statement belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlCategory {
    Ddl,
    Dml,
    Export,
    Other
}

impl fmt::Display for SqlCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ddl => write!(f, "DDL"),
            Self::Dml => write!(f, "DML"),
            Self::Export => write!(f, "EXPORT"),
            Self::Other => write!(f, "OTHER")
        }
    }
}

impl StmtKind {
    /// Classify a parsed statement.
    ///
    /// `tokens` are the statement's significant tokens; DROP is told apart
    /// by its object keyword.
    pub fn classify(statement: &Statement, tokens: &[Token]) -> Self {
        match statement {
            Statement::Query(query) => match query.body.as_ref() {
                SetExpr::SetOperation { .. } => Self::SetOperation,
                _ => Self::Select
            },
            Statement::CreateTable { .. } => Self::CreateTable,
            Statement::CreateView { .. } => Self::CreateView,
            Statement::CreateDatabase { .. } | Statement::CreateSchema { .. } => {
                Self::CreateDatabase
            }
            Statement::CreateIndex { .. } => Self::CreateIndex,
            Statement::AlterTable { .. } => Self::AlterTable,
            Statement::Drop { .. } => Self::classify_drop(tokens),
            Statement::Truncate { .. } => Self::TruncateTable,
            Statement::Delete { .. } => Self::Delete,
            Statement::Insert { .. } => Self::Insert,
            Statement::Update { .. } => Self::Update,
            Statement::RenameTable { .. } => Self::RenameTable,
            Statement::Analyze { .. } => Self::AnalyzeTable,
            _ => Self::Other
        }
    }

    fn classify_drop(tokens: &[Token]) -> Self {
        let object = tokens
            .iter()
            .skip(1)
            .find(|t| !tokens::is_keyword(t, "TEMPORARY"));
        match object.and_then(tokens::word).map(str::to_ascii_uppercase) {
            Some(kw) if kw == "TABLE" || kw == "VIEW" => Self::DropTable,
            Some(kw) if kw == "INDEX" => Self::DropIndex,
            Some(kw) if kw == "DATABASE" || kw == "SCHEMA" => Self::DropDatabase,
            _ => Self::Other
        }
    }

    pub fn category(self) -> SqlCategory {
        match self {
            Self::Select | Self::SetOperation => SqlCategory::Export,
            Self::Delete | Self::Insert | Self::Update => SqlCategory::Dml,
            Self::CreateTable
            | Self::CreateView
            | Self::CreateDatabase
            | Self::CreateIndex
            | Self::AlterTable
            | Self::DropTable
            | Self::DropIndex
            | Self::DropDatabase
            | Self::TruncateTable
            | Self::RenameTable => SqlCategory::Ddl,
            Self::AnalyzeTable | Self::Other => SqlCategory::Other
        }
    }

    pub fn is_ddl(self) -> bool {
        self.category() == SqlCategory::Ddl
    }

    pub fn is_dml(self) -> bool {
        self.category() == SqlCategory::Dml
    }

    pub fn is_select(self) -> bool {
        self.category() == SqlCategory::Export
    }
}

/// One parsed statement.
#[derive(Debug, Clone)]
pub struct StmtNode {
    /// Statement text as written, without the trailing semicolon
    pub text:          String,
    pub statement:     Statement,
    /// Significant tokens of `text` after preprocessing
    pub tokens:        Vec<Token>,
    pub kind:          StmtKind,
    /// TiDB-only syntax removed before parsing
    pub tidb_features: IndexMap<String, String>
}

impl StmtNode {
    pub fn starts_with(&self, keywords: &[&str]) -> bool {
        tokens::starts_with(&self.tokens, keywords)
    }
}

/// Parse result for one request.
#[derive(Debug, Clone)]
pub struct Audit {
    pub query:     String,
    pub charset:   String,
    pub collation: String,
    pub stmts:     Vec<StmtNode>
}

/// Parse `sql` into statements.
///
/// Returns the audit bundle together with non-fatal warnings.
pub fn parse(sql: &str, charset: &str, collation: &str) -> AppResult<(Audit, Vec<String>)> {
    let mut warnings = Vec::new();
    if !KNOWN_CHARSETS.contains(&charset.to_ascii_lowercase().as_str()) {
        warnings.push(format!("未知字符集`{}`，按utf8mb4解析", charset));
    }

    let raw = tokens::tokenize(sql).map_err(|e| query_parse_error(e.to_string()))?;
    let preprocessor = Preprocessor::new();
    let mut stmts = Vec::new();

    for chunk in tokens::split_top_level(&raw, |t| matches!(t, Token::SemiColon)) {
        let (prepared, metadata) = preprocessor.process_tokens(chunk);
        let significant = tokens::significant(&prepared);
        if significant.is_empty() {
            warnings.push("忽略仅包含注释的语句片段".to_string());
            continue;
        }

        let text = trim_to_significant(chunk);
        let mut parsed = Parser::parse_sql(&MySqlDialect {}, &trim_to_significant(&prepared))
            .map_err(|e| query_parse_error(e.to_string()))?;
        if parsed.len() != 1 {
            return Err(query_parse_error(format!("无法拆分的语句: {}", text)));
        }
        let statement = parsed.remove(0);
        let kind = StmtKind::classify(&statement, &significant);
        debug!(?kind, "parsed statement");

        stmts.push(StmtNode {
            text,
            statement,
            tokens: significant,
            kind,
            tidb_features: metadata.tidb_features
        });
    }

    Ok((
        Audit {
            query: sql.to_string(),
            charset: charset.to_string(),
            collation: collation.to_string(),
            stmts
        },
        warnings
    ))
}

/// Render a chunk from its first to its last significant token.
///
/// Executable comments (`/*!...*/`, `/*T![...]...*/`) belong to the
/// statement; other comments and whitespace at either end do not.
fn trim_to_significant(chunk: &[Token]) -> String {
    let is_significant = |t: &Token| match t {
        Token::Whitespace(Whitespace::MultiLineComment(body)) => {
            body.starts_with('!') || body.starts_with("T![")
        }
        Token::Whitespace(_) | Token::EOF => false,
        _ => true
    };
    let start = chunk.iter().position(is_significant).unwrap_or(0);
    let end = chunk
        .iter()
        .rposition(is_significant)
        .map_or(chunk.len(), |idx| idx + 1);
    tokens::render_raw(&chunk[start..end])
}

/// Message used when a statement does not match the ticket type.
pub fn sql_type_mismatch_message(wanted: SqlCategory, actual: SqlCategory) -> String {
    format!("{}模式下，不允许提交{}语句", wanted, actual)
}

/// Ensure every statement belongs to the `wanted` ticket type.
pub fn check_sql_type(sql: &str, wanted: SqlCategory) -> AppResult<()> {
    let (audit, _) = parse(sql, "", "")?;
    for stmt in &audit.stmts {
        let actual = stmt.kind.category();
        if actual == SqlCategory::Other {
            continue;
        }
        let rejected = match wanted {
            SqlCategory::Dml | SqlCategory::Ddl => actual != wanted,
            SqlCategory::Export | SqlCategory::Other => false
        };
        if rejected {
            return Err(sql_type_error(sql_type_mismatch_message(wanted, actual)));
        }
    }
    Ok(())
}

/// Statement texts, in order.
pub fn split_sql_text(sql: &str) -> AppResult<Vec<String>> {
    let (audit, _) = parse(sql, "", "")?;
    Ok(audit.stmts.into_iter().map(|s| s.text).collect())
}

/// Execution routing tag for single DDL statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlStatementTag {
    AlterTable,
    CreateDatabase,
    CreateIndex,
    CreateTable,
    CreateView,
    DropIndex,
    DropTable,
    RenameTable,
    TruncateTable,
    DropDatabase
}

impl fmt::Display for SqlStatementTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AlterTable => "AlterTable",
            Self::CreateDatabase => "CreateDatabase",
            Self::CreateIndex => "CreateIndex",
            Self::CreateTable => "CreateTable",
            Self::CreateView => "CreateView",
            Self::DropIndex => "DropIndex",
            Self::DropTable => "DropTable",
            Self::RenameTable => "RenameTable",
            Self::TruncateTable => "TruncateTable",
            Self::DropDatabase => "DropDatabase"
        };
        f.write_str(name)
    }
}

/// Routing tag of a single-statement DDL.
pub fn get_sql_statement(sql: &str) -> AppResult<SqlStatementTag> {
    let (audit, _) = parse(sql, "", "")?;
    let [stmt] = audit.stmts.as_slice() else {
        return Err(rule_match_error());
    };
    let tag = match stmt.kind {
        StmtKind::AlterTable => SqlStatementTag::AlterTable,
        StmtKind::CreateDatabase => SqlStatementTag::CreateDatabase,
        StmtKind::CreateIndex => SqlStatementTag::CreateIndex,
        StmtKind::CreateTable => SqlStatementTag::CreateTable,
        StmtKind::CreateView => SqlStatementTag::CreateView,
        StmtKind::DropIndex => SqlStatementTag::DropIndex,
        StmtKind::DropTable => SqlStatementTag::DropTable,
        StmtKind::RenameTable => SqlStatementTag::RenameTable,
        StmtKind::TruncateTable => SqlStatementTag::TruncateTable,
        StmtKind::DropDatabase => SqlStatementTag::DropDatabase,
        _ => return Err(rule_match_error())
    };
    Ok(tag)
}

/// Target of `ALTER [ONLINE|IGNORE] TABLE name ...`.
pub fn alter_target(tokens: &[Token]) -> Option<QualifiedName> {
    let table_kw = tokens
        .iter()
        .take(4)
        .position(|t| tokens::is_keyword(t, "TABLE"))?;
    QualifiedName::read(&tokens[table_kw + 1..]).map(|(name, _)| name)
}

/// `schema.table` or `table` of a single ALTER TABLE statement.
pub fn get_table_name_from_alter_statement(sql: &str) -> AppResult<String> {
    let not_alter = || sql_type_error("未提取到表名，当前SQL不是ALTER TABLE语句");
    let (audit, _) = parse(sql, "", "")?;
    let stmt = audit.stmts.first().ok_or_else(not_alter)?;
    if stmt.kind != StmtKind::AlterTable {
        return Err(not_alter());
    }
    alter_target(&stmt.tokens)
        .map(|name| name.to_string())
        .ok_or_else(not_alter)
}
