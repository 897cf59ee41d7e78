//! Statement ingestion: parse, categorize, store

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::categorize::Categorizer;
use crate::db::Database;
use crate::error::Result;
use crate::import::{parse_statement, RowFailure};
use crate::models::SchemaOrigin;

/// Result of importing one statement file
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub schema: SchemaOrigin,
    /// Data rows in the file, excluding the header
    pub total_rows: usize,
    pub saved_transactions: usize,
    /// Rows dropped because they had no parseable transaction date
    pub skipped_undated: usize,
    pub failures: Vec<RowFailure>,
}

/// Import a statement from any reader
///
/// Rows are categorized with the active rules as they stand when the import
/// starts, then stored in a single batch.
pub fn import_csv<R: Read>(db: &Database, reader: R) -> Result<ImportSummary> {
    let parsed = parse_statement(reader)?;

    let rules = db.list_active_rules()?;
    let categorizer = Categorizer::new(&rules);

    let mut transactions = parsed.transactions;
    for tx in &mut transactions {
        let category = categorizer.categorize(&tx.description, tx.memo.as_deref());
        tx.auto_category = Some(category.to_string());
    }

    let ids = db.insert_transactions(&transactions)?;

    info!(
        "Imported {} of {} rows as {} ({} undated, {} failed)",
        ids.len(),
        parsed.total_rows,
        parsed.schema,
        parsed.skipped_undated,
        parsed.failures.len()
    );

    Ok(ImportSummary {
        schema: parsed.schema,
        total_rows: parsed.total_rows,
        saved_transactions: ids.len(),
        skipped_undated: parsed.skipped_undated,
        failures: parsed.failures,
    })
}

/// Import a statement file from disk
pub fn import_file(db: &Database, path: &Path) -> Result<ImportSummary> {
    let file = File::open(path)?;
    import_csv(db, BufReader::new(file))
}
