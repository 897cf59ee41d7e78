//! Transaction filter builder for constructing dynamic SQL queries
//!
//! Listing and counting share the same WHERE clause, so both are built here.

use chrono::NaiveDate;

use crate::models::TransactionQuery;

/// Builder for constructing transaction query filters
#[derive(Default)]
pub struct TransactionFilter<'query> {
    pub transaction_type: Option<&'query str>,
    pub category: Option<&'query str>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Result of building a filter - contains SQL components and parameters
pub struct FilterResult {
    /// WHERE clause including "WHERE" keyword (empty if no conditions)
    pub where_clause: String,
    /// Parameters for the query (boxed for rusqlite compatibility)
    pub params: Vec<Box<dyn rusqlite::ToSql>>,
}

impl<'query> TransactionFilter<'query> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters taken from a listing query
    pub fn from_query(query: &'query TransactionQuery) -> Self {
        Self::new()
            .transaction_type(query.transaction_type.as_deref())
            .category(query.category.as_deref())
            .start_date(query.start_date)
            .end_date(query.end_date)
    }

    /// Set transaction type filter (case-insensitive substring)
    pub fn transaction_type(mut self, value: Option<&'query str>) -> Self {
        self.transaction_type = value;
        self
    }

    /// Set category filter (case-insensitive substring of manual or auto category)
    pub fn category(mut self, value: Option<&'query str>) -> Self {
        self.category = value;
        self
    }

    /// Set inclusive lower date bound
    pub fn start_date(mut self, date: Option<NaiveDate>) -> Self {
        self.start_date = date;
        self
    }

    /// Set inclusive upper date bound
    pub fn end_date(mut self, date: Option<NaiveDate>) -> Self {
        self.end_date = date;
        self
    }

    /// Build the filter components
    pub fn build(self) -> FilterResult {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(t) = non_blank(self.transaction_type) {
            conditions.push("t.transaction_type LIKE ? COLLATE NOCASE".to_string());
            params.push(Box::new(format!("%{}%", t)));
        }

        if let Some(c) = non_blank(self.category) {
            conditions.push(
                "(t.manual_category LIKE ? COLLATE NOCASE OR t.auto_category LIKE ? COLLATE NOCASE)"
                    .to_string(),
            );
            let pattern = format!("%{}%", c);
            params.push(Box::new(pattern.clone()));
            params.push(Box::new(pattern));
        }

        if let Some(start) = self.start_date {
            conditions.push("t.transaction_date >= ?".to_string());
            params.push(Box::new(start.to_string()));
        }

        if let Some(end) = self.end_date {
            conditions.push("t.transaction_date <= ?".to_string());
            params.push(Box::new(end.to_string()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        FilterResult {
            where_clause,
            params,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl FilterResult {
    /// Build a COUNT query
    pub fn build_count_query(&self) -> String {
        format!("SELECT COUNT(*) FROM transactions t {}", self.where_clause)
    }

    /// Get parameter references for query execution
    pub fn params_refs(&self) -> Vec<&dyn rusqlite::ToSql> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}
