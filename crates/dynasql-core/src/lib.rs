//! SQL-subset front end over a key/attribute item store.
//!
//! Statements are parsed into a [`statement::ParsedStatement`], their WHERE
//! predicates split into key conditions and residual filters by the
//! [`classifier`], and executed by the [`planner`] as point gets, indexed
//! queries or filtered scans against an [`store::ItemStore`]. JOINs are
//! simulated with two independent reads and a client-side merge.
#![allow(missing_docs, clippy::doc_markdown, clippy::module_name_repetitions)]

pub mod classifier;
pub mod config;
pub mod error;
pub mod expression;
pub mod join;
pub mod planner;
pub mod projection;
pub mod state;
pub mod statement;
pub mod storage;
pub mod store;

pub use config::SqlConfig;
pub use error::{SqlError, SqlResult};
pub use join::JoinRows;
pub use planner::{ExecuteOutput, ReadPlan, SqlWrapper, Table};
pub use projection::{Projection, Row};
pub use state::{MemoryStore, TableOptions};
pub use store::ItemStore;
