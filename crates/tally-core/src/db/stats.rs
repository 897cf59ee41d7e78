//! Summary statistics

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::Database;
use crate::error::{Error, Result};
use crate::models::{CategorySummary, DateRange, Stats};

impl Database {
    /// Totals, date range and per-category breakdown
    ///
    /// Categories are grouped by display category (manual override, else auto
    /// category). Amounts are summed as decimals in Rust since SQLite stores
    /// them as text.
    pub fn category_stats(&self) -> Result<Stats> {
        let conn = self.conn()?;

        let (total_transactions, earliest, latest): (i64, Option<String>, Option<String>) = conn
            .query_row(
                "SELECT COUNT(*), MIN(transaction_date), MAX(transaction_date) FROM transactions",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;

        let mut stmt = conn.prepare(
            "SELECT COALESCE(manual_category, auto_category), amount FROM transactions",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, Option<String>>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut by_category: BTreeMap<Option<String>, (i64, Decimal)> = BTreeMap::new();
        for (category, amount) in rows {
            let amount = Decimal::from_str(&amount)
                .map_err(|_| Error::InvalidData(format!("Stored amount is not a decimal: {}", amount)))?;
            let entry = by_category.entry(category).or_insert((0, Decimal::ZERO));
            entry.0 += 1;
            entry.1 += amount;
        }

        let categories = by_category
            .into_iter()
            .map(|(category, (count, total_amount))| CategorySummary {
                category,
                count,
                total_amount,
            })
            .collect();

        Ok(Stats {
            total_transactions,
            date_range: DateRange {
                earliest: earliest.as_deref().and_then(parse_stored_date),
                latest: latest.as_deref().and_then(parse_stored_date),
            },
            categories,
        })
    }
}

fn parse_stored_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}
