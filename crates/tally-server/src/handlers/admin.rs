//! Health, maintenance and statistics handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::{AppError, AppState};
use tally_core::models::Stats;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /api/health - Liveness check
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

#[derive(Serialize)]
pub struct RecategorizeResponse {
    pub message: String,
    pub updated_count: usize,
}

/// POST /api/recategorize-all - Re-run the rules over every transaction
pub async fn recategorize_all(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RecategorizeResponse>, AppError> {
    let updated_count = tally_core::recategorize(&state.db).map_err(AppError::from_core)?;

    Ok(Json(RecategorizeResponse {
        message: format!("Successfully re-categorized {} transactions", updated_count),
        updated_count,
    }))
}

#[derive(Serialize)]
pub struct ClearResponse {
    pub message: String,
    pub cleared_count: usize,
}

/// DELETE /api/clear-database - Remove every transaction, keeping rules
pub async fn clear_database(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ClearResponse>, AppError> {
    let cleared_count = state.db.clear_transactions()?;

    Ok(Json(ClearResponse {
        message: format!(
            "Successfully cleared {} transactions from database",
            cleared_count
        ),
        cleared_count,
    }))
}

/// GET /api/stats - Totals, date range and per-category summary
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Result<Json<Stats>, AppError> {
    Ok(Json(state.db.category_stats()?))
}
