//! # sql-audit
//!
//! SQL review engine for MySQL and TiDB.
//!
//! A block of SQL is parsed into statements, each statement is dispatched
//! to the rule table for its kind, and every rule appends findings to the
//! statement's result. Rules that need the live schema go through an
//! [`introspect::Executor`]; without one the engine runs offline and those
//! lookups stay inconclusive.
//!
//! # Modules
//!
//! - [`checker`] - request entry point and result types
//! - [`parser`] - statement splitting, classification and fingerprints
//! - [`preprocessor`] - TiDB syntax handling ahead of the parser
//! - [`traverses`] - single-pass fact collection over the AST
//! - [`rules`] - per-kind rule tables
//! - [`logics`] - the checks the rules are made of
//! - [`introspect`] - database lookups behind the `Executor` seam
//! - [`cache`] - per-request metadata cache
//! - [`config`] - configuration and audit parameters
//! - [`app`], [`cli`], [`output`], [`logging`] - command-line surface

pub mod app;
pub mod cache;
pub mod checker;
pub mod cli;
pub mod config;
pub mod error;
pub mod introspect;
pub mod logging;
pub mod logics;
pub mod output;
pub mod parser;
pub mod preprocessor;
pub mod rules;
pub mod traverses;
