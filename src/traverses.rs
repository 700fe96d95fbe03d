//! Fact extraction from single statements.
//!
//! Each `*Facts` value is built from a [`StmtNode`]. Relations, subqueries
//! and column definitions come from the sqlparser AST; the statement's
//! significant tokens cover what the AST folds together or drops, such as
//! key names as written, table options and UPDATE layout. Traversers never
//! touch the cache or the database.
//!
//! [`StmtNode`]: crate::parser::StmtNode

mod alter_table;
mod column;
mod create_table;
mod dml;
mod index;
mod objects;
mod options;

pub use self::{
    alter_table::{AlterOp, AlterTableFacts},
    column::ColumnFacts,
    create_table::CreateTableFacts,
    dml::{DmlFacts, DmlKind},
    index::{IndexFacts, IndexKind},
    objects::{AnalyzeTableFacts, CreateDatabaseFacts, CreateViewFacts, DropTableFacts, RenameTableFacts},
    options::TableOptions
};
