//! CSV statement parsing for the two supported column layouts

use std::io::Read;
use std::str::FromStr;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

use crate::dates::parse_date;
use crate::error::{Error, Result};
use crate::models::{NewTransaction, SchemaOrigin};

/// Header fragments characteristic of schema 1
const SCHEMA1_INDICATORS: [&str; 7] = [
    "transaction date",
    "post date",
    "description",
    "category",
    "type",
    "amount",
    "memo",
];

/// Header fragments characteristic of schema 2
const SCHEMA2_INDICATORS: [&str; 7] = [
    "details",
    "posting date",
    "description",
    "amount",
    "type",
    "balance",
    "check or slip #",
];

/// Decide which layout a header row uses
///
/// Counts how many indicators of each schema appear as a substring of some
/// normalized header. Ties go to schema 1. Every header list resolves to one
/// of the two schemas, so a misdetection shows up downstream as empty fields.
pub fn detect_schema<S: AsRef<str>>(headers: &[S]) -> SchemaOrigin {
    let columns: Vec<String> = headers
        .iter()
        .map(|h| h.as_ref().trim().to_lowercase())
        .collect();

    let matches = |indicators: &[&str]| {
        indicators
            .iter()
            .filter(|indicator| columns.iter().any(|col| col.contains(**indicator)))
            .count()
    };

    let schema1 = matches(&SCHEMA1_INDICATORS);
    let schema2 = matches(&SCHEMA2_INDICATORS);
    debug!("Schema indicators: schema1={} schema2={}", schema1, schema2);

    if schema1 >= schema2 {
        SchemaOrigin::Schema1
    } else {
        SchemaOrigin::Schema2
    }
}

/// A CSV row addressed by column name
#[derive(Debug, Clone, Copy)]
pub struct RawRow<'a> {
    headers: &'a StringRecord,
    record: &'a StringRecord,
}

impl<'a> RawRow<'a> {
    pub fn new(headers: &'a StringRecord, record: &'a StringRecord) -> Self {
        Self { headers, record }
    }

    /// Value of the named column; `None` when the column is absent
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = self
            .headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(column))?;
        self.record.get(idx)
    }

    /// Trimmed text of the named column, empty when absent
    fn text(&self, column: &str) -> String {
        self.get(column).map(str::trim).unwrap_or_default().to_string()
    }

    /// Trimmed text of the named column, `None` when absent or blank
    fn optional_text(&self, column: &str) -> Option<String> {
        self.get(column)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// A row after normalization, before the dated-record check
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub transaction_date: Option<NaiveDate>,
    pub post_date: Option<NaiveDate>,
    pub description: String,
    pub category: String,
    pub transaction_type: String,
    pub amount: Decimal,
    pub memo: Option<String>,
    pub balance: Option<Decimal>,
    pub check_number: Option<String>,
    pub schema_origin: SchemaOrigin,
}

impl NormalizedRow {
    /// Convert into a storable transaction; rows without a transaction date yield `None`
    pub fn into_new_transaction(self) -> Option<NewTransaction> {
        let transaction_date = self.transaction_date?;
        Some(NewTransaction {
            transaction_date,
            post_date: self.post_date,
            description: self.description,
            category: self.category,
            transaction_type: self.transaction_type,
            amount: self.amount,
            memo: self.memo,
            auto_category: None,
            balance: self.balance,
            check_number: self.check_number,
            schema_origin: self.schema_origin,
        })
    }
}

/// Normalize a schema 1 row
/// Format: Transaction Date,Post Date,Description,Category,Type,Amount,Memo
pub fn normalize_schema1(row: &RawRow<'_>) -> Result<NormalizedRow> {
    Ok(NormalizedRow {
        transaction_date: parse_date(row.get("Transaction Date")),
        post_date: parse_date(row.get("Post Date")),
        description: row.text("Description"),
        category: row.text("Category"),
        transaction_type: row.text("Type"),
        amount: parse_amount_or_zero(row.get("Amount"))?,
        memo: row.optional_text("Memo"),
        balance: None,
        check_number: None,
        schema_origin: SchemaOrigin::Schema1,
    })
}

/// Normalize a schema 2 row
/// Format: Details,Posting Date,Description,Amount,Type,Balance,Check or Slip #
///
/// The posting date fills both dates and `Details` becomes the memo. There is
/// no category column.
pub fn normalize_schema2(row: &RawRow<'_>) -> Result<NormalizedRow> {
    let posting_date = parse_date(row.get("Posting Date"));
    let balance = match row.get("Balance").map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(parse_amount(raw)?),
        _ => None,
    };

    Ok(NormalizedRow {
        transaction_date: posting_date,
        post_date: posting_date,
        description: row.text("Description"),
        category: String::new(),
        transaction_type: row.text("Type"),
        amount: parse_amount_or_zero(row.get("Amount"))?,
        memo: row.optional_text("Details"),
        balance,
        check_number: row.optional_text("Check or Slip #"),
        schema_origin: SchemaOrigin::Schema2,
    })
}

/// Normalize a row with the normalizer for `schema`
pub fn normalize_row(schema: SchemaOrigin, row: &RawRow<'_>) -> Result<NormalizedRow> {
    match schema {
        SchemaOrigin::Schema1 => normalize_schema1(row),
        SchemaOrigin::Schema2 => normalize_schema2(row),
    }
}

/// A row that could not be normalized
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowFailure {
    /// 1-based data row number (the header is not counted)
    pub row: usize,
    pub reason: String,
}

/// Result of parsing a whole statement file
#[derive(Debug, Clone)]
pub struct ParsedStatement {
    pub schema: SchemaOrigin,
    /// Data rows in the file, excluding the header
    pub total_rows: usize,
    /// Normalized rows with a transaction date, ready for categorization
    pub transactions: Vec<NewTransaction>,
    /// Rows dropped because the transaction date was missing or unparseable
    pub skipped_undated: usize,
    pub failures: Vec<RowFailure>,
}

/// Parse a statement CSV: detect the schema, then normalize every row
///
/// Malformed rows are collected as failures instead of aborting the file.
/// A file without data rows is an error.
pub fn parse_statement<R: Read>(reader: R) -> Result<ParsedStatement> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let header_names: Vec<&str> = headers.iter().collect();
    let schema = detect_schema(&header_names);

    let mut total_rows = 0;
    let mut transactions = Vec::new();
    let mut skipped_undated = 0;
    let mut failures = Vec::new();

    for (idx, result) in rdr.records().enumerate() {
        let row_number = idx + 1;
        total_rows += 1;

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("Row {} could not be read: {}", row_number, e);
                failures.push(RowFailure {
                    row: row_number,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        match normalize_row(schema, &RawRow::new(&headers, &record)) {
            Ok(normalized) => match normalized.into_new_transaction() {
                Some(tx) => transactions.push(tx),
                None => {
                    debug!("Row {} has no usable transaction date, skipping", row_number);
                    skipped_undated += 1;
                }
            },
            Err(e) => {
                warn!("Row {} is malformed: {}", row_number, e);
                failures.push(RowFailure {
                    row: row_number,
                    reason: e.to_string(),
                });
            }
        }
    }

    if total_rows == 0 {
        return Err(Error::Import("CSV file is empty".into()));
    }

    debug!(
        "Parsed {} {} transactions ({} undated, {} failed)",
        transactions.len(),
        schema,
        skipped_undated,
        failures.len()
    );

    Ok(ParsedStatement {
        schema,
        total_rows,
        transactions,
        skipped_undated,
        failures,
    })
}

/// Parse an amount, treating a missing or blank value as zero
fn parse_amount_or_zero(raw: Option<&str>) -> Result<Decimal> {
    match raw.map(str::trim) {
        Some(s) if !s.is_empty() => parse_amount(s),
        _ => Ok(Decimal::ZERO),
    }
}

/// Parse an amount string, handling currency symbols, commas, and accounting parentheses
pub fn parse_amount(s: &str) -> Result<Decimal> {
    let trimmed = s.trim();
    let (negative, inner) = match trimmed.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let cleaned = inner.replace(['$', ',', ' '], "");
    let cleaned = cleaned.strip_prefix('+').unwrap_or(&cleaned);

    let amount = Decimal::from_str(cleaned)
        .map_err(|_| Error::InvalidData(format!("Unable to parse amount: {}", s)))?;

    Ok(if negative { -amount } else { amount })
}
