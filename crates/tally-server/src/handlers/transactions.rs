//! Transaction handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::read_json;
use crate::{AppError, AppState};
use tally_core::models::{
    SchemaOrigin, Transaction, TransactionQuery, DEFAULT_PER_PAGE, MAX_PER_PAGE,
};

/// Query parameters for listing transactions
#[derive(Debug, Deserialize)]
pub struct TransactionParams {
    /// Substring of the transaction type
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    /// Substring of the manual or auto category
    pub category: Option<String>,
    /// Inclusive start date (YYYY-MM-DD)
    pub start_date: Option<String>,
    /// Inclusive end date (YYYY-MM-DD)
    pub end_date: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    DEFAULT_PER_PAGE
}

/// A transaction as shown to API clients
#[derive(Debug, Serialize)]
pub struct TransactionItem {
    pub id: i64,
    pub transaction_date: NaiveDate,
    pub post_date: Option<NaiveDate>,
    pub description: String,
    /// Manual category if set, otherwise the auto category
    pub category: Option<String>,
    pub auto_category: Option<String>,
    pub manual_category: Option<String>,
    /// Category label exported by the bank, if any
    pub bank_category: String,
    pub transaction_type: String,
    pub amount: Decimal,
    pub memo: Option<String>,
    pub balance: Option<Decimal>,
    pub check_number: Option<String>,
    pub csv_format: SchemaOrigin,
}

impl From<Transaction> for TransactionItem {
    fn from(tx: Transaction) -> Self {
        Self {
            category: tx.display_category().map(str::to_string),
            id: tx.id,
            transaction_date: tx.transaction_date,
            post_date: tx.post_date,
            description: tx.description,
            auto_category: tx.auto_category,
            manual_category: tx.manual_category,
            bank_category: tx.category,
            transaction_type: tx.transaction_type,
            amount: tx.amount,
            memo: tx.memo,
            balance: tx.balance,
            check_number: tx.check_number,
            csv_format: tx.schema_origin,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub pages: i64,
    pub per_page: i64,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct TransactionListResponse {
    pub transactions: Vec<TransactionItem>,
    pub pagination: Pagination,
}

fn parse_date_param(name: &str, value: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::bad_request(&format!("Invalid {}, expected YYYY-MM-DD", name))),
    }
}

/// GET /api/transactions - List transactions, newest first
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TransactionParams>,
) -> Result<Json<TransactionListResponse>, AppError> {
    let query = TransactionQuery {
        start_date: parse_date_param("start_date", params.start_date.as_deref())?,
        end_date: parse_date_param("end_date", params.end_date.as_deref())?,
        transaction_type: params.transaction_type,
        category: params.category,
        page: params.page.max(1),
        per_page: params.per_page.clamp(1, MAX_PER_PAGE),
    };

    let page = state.db.list_transactions(&query)?;

    Ok(Json(TransactionListResponse {
        pagination: Pagination {
            page: page.page,
            pages: page.pages,
            per_page: page.per_page,
            total: page.total,
        },
        transactions: page.transactions.into_iter().map(Into::into).collect(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ManualCategoryRequest {
    /// New override; null or blank clears it
    pub category: Option<String>,
}

/// PUT /api/transactions/:id/manual-category - Set or clear the manual override
pub async fn set_manual_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<TransactionItem>, AppError> {
    let req: ManualCategoryRequest = read_json(request).await?;

    let tx = state
        .db
        .set_manual_category(id, req.category.as_deref())
        .map_err(AppError::from_core)?;

    Ok(Json(tx.into()))
}
