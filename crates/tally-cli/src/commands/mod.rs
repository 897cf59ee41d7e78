//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Database opening and `init`
//! - `import` - Statement CSV import
//! - `transactions` - Transaction listing and manual categories
//! - `rules` - Category rule management
//! - `maintenance` - Recategorize, stats and clear
//! - `serve` - Web server command

pub mod core;
pub mod import;
pub mod maintenance;
pub mod rules;
pub mod serve;
pub mod transactions;

// Re-export command functions for main.rs
pub use core::*;
pub use import::*;
pub use maintenance::*;
pub use rules::*;
pub use serve::*;
pub use transactions::*;

use tally_core::models::Transaction;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Format a transaction amount, red for debits and green for credits
pub fn format_amount(tx: &Transaction) -> String {
    if tx.amount.is_sign_negative() {
        format!("\x1b[31m${:.2}\x1b[0m", tx.amount.abs())
    } else {
        format!("\x1b[32m+${:.2}\x1b[0m", tx.amount)
    }
}
