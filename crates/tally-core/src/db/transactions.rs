//! Transaction operations

use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use tracing::info;

use super::transaction_filter::TransactionFilter;
use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{
    NewTransaction, Transaction, TransactionPage, TransactionQuery, MAX_PER_PAGE,
};

/// Columns selected by `row_to_transaction`, in order
pub(crate) const TRANSACTION_COLUMNS: &str = r#"
    t.id, t.transaction_date, t.post_date, t.description, t.category, t.transaction_type,
    t.amount, t.memo, t.auto_category, t.manual_category, t.balance, t.check_number,
    t.schema_origin, t.created_at
"#;

impl Database {
    /// Insert a single transaction, returning its ID
    pub fn insert_transaction(&self, tx: &NewTransaction) -> Result<i64> {
        let ids = self.insert_transactions(std::slice::from_ref(tx))?;
        Ok(ids[0])
    }

    /// Insert a batch of transactions in one storage transaction
    ///
    /// Either every row is stored or none is.
    pub fn insert_transactions(&self, txs: &[NewTransaction]) -> Result<Vec<i64>> {
        let mut conn = self.conn()?;
        let db_tx = conn.transaction()?;
        let mut ids = Vec::with_capacity(txs.len());

        {
            let mut stmt = db_tx.prepare(
                r#"
                INSERT INTO transactions (transaction_date, post_date, description, category,
                    transaction_type, amount, memo, auto_category, balance, check_number, schema_origin)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )?;

            for tx in txs {
                stmt.execute(params![
                    tx.transaction_date.to_string(),
                    tx.post_date.map(|d| d.to_string()),
                    tx.description,
                    tx.category,
                    tx.transaction_type,
                    tx.amount.to_string(),
                    tx.memo,
                    tx.auto_category,
                    tx.balance.map(|b| b.to_string()),
                    tx.check_number,
                    tx.schema_origin.as_str(),
                ])?;
                ids.push(db_tx.last_insert_rowid());
            }
        }

        db_tx.commit()?;
        Ok(ids)
    }

    /// List one page of transactions, newest first
    pub fn list_transactions(&self, query: &TransactionQuery) -> Result<TransactionPage> {
        let conn = self.conn()?;
        let filter = TransactionFilter::from_query(query).build();

        let total: i64 = conn.query_row(
            &filter.build_count_query(),
            filter.params_refs().as_slice(),
            |row| row.get(0),
        )?;

        let per_page = query.per_page.clamp(1, MAX_PER_PAGE);
        let page = query.page.max(1);
        // Saturates for absurd page numbers; SQLite returns no rows past the end
        let offset = (page - 1).saturating_mul(per_page);

        let sql = format!(
            r#"
            SELECT {}
            FROM transactions t
            {}
            ORDER BY t.transaction_date DESC, t.id DESC
            LIMIT ? OFFSET ?
            "#,
            TRANSACTION_COLUMNS, filter.where_clause
        );

        let mut params = filter.params_refs();
        params.push(&per_page);
        params.push(&offset);

        let mut stmt = conn.prepare(&sql)?;
        let transactions = stmt
            .query_map(params.as_slice(), Self::row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(TransactionPage {
            transactions,
            page,
            pages: (total + per_page - 1) / per_page,
            per_page,
            total,
        })
    }

    /// Get a single transaction by ID
    pub fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM transactions t WHERE t.id = ?",
            TRANSACTION_COLUMNS
        );
        let tx = conn
            .query_row(&sql, params![id], Self::row_to_transaction)
            .optional()?;
        Ok(tx)
    }

    /// All transactions in insertion order
    pub fn all_transactions(&self) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        Self::load_transactions(&conn)
    }

    /// Load all transactions through an existing connection or storage transaction
    pub(crate) fn load_transactions(conn: &Connection) -> Result<Vec<Transaction>> {
        let sql = format!(
            "SELECT {} FROM transactions t ORDER BY t.id",
            TRANSACTION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let transactions = stmt
            .query_map([], Self::row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(transactions)
    }

    /// Count total transactions
    pub fn count_transactions(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Set or clear the manual category override
    ///
    /// A blank category clears the override.
    pub fn set_manual_category(&self, id: i64, category: Option<&str>) -> Result<Transaction> {
        let category = category.map(str::trim).filter(|c| !c.is_empty());

        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE transactions SET manual_category = ? WHERE id = ?",
            params![category, id],
        )?;

        if updated == 0 {
            return Err(Error::NotFound(format!("Transaction {} not found", id)));
        }

        self.get_transaction(id)?
            .ok_or_else(|| Error::NotFound(format!("Transaction {} not found", id)))
    }

    /// Delete every transaction, keeping category rules
    ///
    /// Returns the number of transactions removed.
    pub fn clear_transactions(&self) -> Result<usize> {
        let conn = self.conn()?;
        let cleared = conn.execute("DELETE FROM transactions", [])?;
        info!("Cleared {} transactions from database", cleared);
        Ok(cleared)
    }

    /// Helper to convert a row (selected with `TRANSACTION_COLUMNS`) to a Transaction
    pub(crate) fn row_to_transaction(row: &rusqlite::Row) -> rusqlite::Result<Transaction> {
        let schema_str: String = row.get(12)?;
        let created_at_str: String = row.get(13)?;

        Ok(Transaction {
            id: row.get(0)?,
            transaction_date: date_column(row, 1)?,
            post_date: optional_date_column(row, 2)?,
            description: row.get(3)?,
            category: row.get(4)?,
            transaction_type: row.get(5)?,
            amount: decimal_column(row, 6)?,
            memo: row.get(7)?,
            auto_category: row.get(8)?,
            manual_category: row.get(9)?,
            balance: optional_decimal_column(row, 10)?,
            check_number: row.get(11)?,
            schema_origin: schema_str
                .parse()
                .map_err(|e: String| conversion_error(12, e.into()))?,
            created_at: parse_datetime(&created_at_str),
        })
    }
}

fn conversion_error(
    idx: usize,
    err: Box<dyn std::error::Error + Send + Sync + 'static>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err)
}

fn date_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let s: String = row.get(idx)?;
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|e| conversion_error(idx, Box::new(e)))
}

fn optional_date_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let s: Option<String> = row.get(idx)?;
    s.map(|s| {
        NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|e| conversion_error(idx, Box::new(e)))
    })
    .transpose()
}

fn decimal_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = row.get(idx)?;
    Decimal::from_str(&s).map_err(|e| conversion_error(idx, Box::new(e)))
}

fn optional_decimal_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let s: Option<String> = row.get(idx)?;
    s.map(|s| Decimal::from_str(&s).map_err(|e| conversion_error(idx, Box::new(e))))
        .transpose()
}
