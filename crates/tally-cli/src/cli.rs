//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Tally - Import bank statements and categorize them with regex rules
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Bank statement importer and rule-based categorizer", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "tally.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set TALLY_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and seed the default category rules
    Init,

    /// Import a statement CSV (layout is auto-detected)
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,
    },

    /// List transactions, newest first
    Transactions {
        /// Filter by transaction type (substring, case-insensitive)
        #[arg(long = "type")]
        transaction_type: Option<String>,

        /// Filter by manual or auto category (substring, case-insensitive)
        #[arg(long)]
        category: Option<String>,

        /// Start date, inclusive (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// End date, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Page number (1-based)
        #[arg(long, default_value = "1")]
        page: i64,

        /// Transactions per page (max 1000)
        #[arg(long, default_value = "20")]
        per_page: i64,
    },

    /// Set or clear the manual category of a transaction
    Categorize {
        /// Transaction ID
        id: i64,

        /// Category to assign
        #[arg(required_unless_present = "clear", conflicts_with = "clear")]
        category: Option<String>,

        /// Remove the manual override
        #[arg(long)]
        clear: bool,
    },

    /// Manage category rules (list, add, update, delete, test)
    Rules {
        #[command(subcommand)]
        action: Option<RulesAction>,
    },

    /// Re-run the active rules over every stored transaction
    Recategorize,

    /// Show totals, date range and per-category summary
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete all transactions (rules are kept)
    Clear {
        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Directory containing static files to serve (e.g., ui/dist)
        #[arg(long)]
        static_dir: Option<PathBuf>,

        /// Allowed CORS origin (repeatable; none means any origin)
        #[arg(long = "allow-origin")]
        allow_origins: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum RulesAction {
    /// List rules in evaluation order
    List {
        /// Include inactive (deleted) rules
        #[arg(long)]
        all: bool,
    },

    /// Add a rule (appended last unless --position is given)
    Add {
        /// Category assigned when the pattern matches
        category: String,

        /// Regex pattern, matched case-insensitively against description and memo
        pattern: String,

        /// Evaluation position (lower runs first)
        #[arg(long)]
        position: Option<i64>,
    },

    /// Update a rule
    Update {
        /// Rule ID
        id: i64,

        /// New category name
        #[arg(long)]
        category: Option<String>,

        /// New regex pattern
        #[arg(long)]
        pattern: Option<String>,

        /// New evaluation position
        #[arg(long)]
        position: Option<i64>,

        /// Reactivate a deleted rule
        #[arg(long, conflicts_with = "deactivate")]
        activate: bool,

        /// Deactivate the rule
        #[arg(long)]
        deactivate: bool,
    },

    /// Delete a rule (it is kept as inactive)
    Delete {
        /// Rule ID
        id: i64,
    },

    /// Show which category a description would get
    Test {
        /// Transaction description to test
        description: String,

        /// Optional memo text
        #[arg(long)]
        memo: Option<String>,
    },
}
