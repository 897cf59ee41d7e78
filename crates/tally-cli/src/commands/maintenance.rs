//! Recategorize, stats and clear commands

use std::io::{self, Write};

use anyhow::Result;
use tally_core::db::Database;

pub fn cmd_recategorize(db: &Database) -> Result<()> {
    println!("🔄 Re-categorizing all transactions...");

    let updated = tally_core::recategorize(db)?;

    println!("✅ Re-categorized {} transactions", updated);
    Ok(())
}

pub fn cmd_stats(db: &Database, json: bool) -> Result<()> {
    let stats = db.category_stats()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!();
    println!("📊 Statistics");
    println!("   ─────────────────────────────");
    println!("   Transactions: {}", stats.total_transactions);

    if let (Some(earliest), Some(latest)) = (stats.date_range.earliest, stats.date_range.latest) {
        println!("   Date range: {} to {}", earliest, latest);
    }

    if stats.categories.is_empty() {
        return Ok(());
    }

    println!();
    println!("   {:<22} {:>6} {:>14}", "Category", "Count", "Total");
    for summary in &stats.categories {
        println!(
            "   {:<22} {:>6} {:>14.2}",
            summary.category.as_deref().unwrap_or("(none)"),
            summary.count,
            summary.total_amount
        );
    }

    Ok(())
}

pub fn cmd_clear(db: &Database, yes: bool) -> Result<()> {
    if !yes {
        print!("⚠️  This will delete all transactions.\n");
        print!("   Category rules will be preserved.\n\n");
        print!("Are you sure? [y/N] ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let cleared = db.clear_transactions()?;
    println!("✅ Cleared {} transactions from database", cleared);

    Ok(())
}
