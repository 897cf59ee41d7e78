//! Tally Core Library
//!
//! Shared functionality for the Tally statement categorizer:
//! - Statement date parsing and CSV schema detection
//! - Row normalization for the two supported statement layouts
//! - Regex rule categorization engine
//! - Database access, migrations, and atomic recategorization
//! - Rule mutations that keep stored categories in sync

pub mod categorize;
pub mod dates;
pub mod db;
pub mod error;
pub mod import;
pub mod ingest;
pub mod models;
pub mod rules;

pub use categorize::{plan_recategorization, Categorizer, RecategorizationPlan, Reassignment};
pub use db::Database;
pub use error::{Error, Result};
pub use import::{detect_schema, parse_statement, ParsedStatement, RowFailure};
pub use ingest::{import_csv, import_file, ImportSummary};
pub use models::{
    CategoryRule, CategorySummary, DateRange, NewCategoryRule, NewTransaction, RuleStatus,
    RuleUpdate, SchemaOrigin, Stats, Transaction, TransactionPage, TransactionQuery,
    UNCATEGORIZED,
};
pub use rules::{add_rule, edit_rule, recategorize, remove_rule, RuleChange, RuleTest};
