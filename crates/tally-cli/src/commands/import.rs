//! Import command implementation

use std::path::Path;

use anyhow::{Context, Result};
use tally_core::{db::Database, import_file};

pub fn cmd_import(db: &Database, file: &Path) -> Result<()> {
    println!("📥 Importing {}...", file.display());

    if db.list_active_rules()?.is_empty() {
        println!("   💡 Tip: No active rules; run 'tally init' to seed the defaults");
    }

    let summary = import_file(db, file)
        .with_context(|| format!("Failed to import {}", file.display()))?;

    println!("   Layout detected: {}", summary.schema);
    println!("   Rows in file: {}", summary.total_rows);
    println!("   ✅ Saved: {}", summary.saved_transactions);
    if summary.skipped_undated > 0 {
        println!("   ⏭️  Skipped (no date): {}", summary.skipped_undated);
    }
    if !summary.failures.is_empty() {
        println!("   ⚠️  Failed rows: {}", summary.failures.len());
        for failure in &summary.failures {
            println!("      row {}: {}", failure.row, failure.reason);
        }
    }

    Ok(())
}
