//! Audit logics.
//!
//! A logic takes extracted facts plus the [`RuleHint`] of the current rule
//! and records what it finds. Logics are the only code that talks to the
//! database, always through [`crate::introspect`], and treat an
//! undetermined lookup as acceptable.
//!
//! [`RuleHint`]: crate::rules::RuleHint

pub mod alter;
pub mod column;
pub mod common;
pub mod dml;
pub mod index;
pub mod objects;
pub mod table;
