//! Statement upload handler

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::{AppError, AppState, MAX_UPLOAD_SIZE};
use tally_core::{import_csv, models::SchemaOrigin, RowFailure};

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub format_detected: SchemaOrigin,
    pub total_rows: usize,
    pub saved_transactions: usize,
    pub skipped_undated: usize,
    pub failed_rows: Vec<RowFailure>,
}

/// POST /api/upload-csv - Import a statement CSV
///
/// Expects multipart form with:
/// - file: CSV file (required, `.csv` name, max 16MB)
pub async fn upload_csv(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(&format!("Failed to read form field: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|_| AppError::bad_request("Failed to read file data"))?;

        if bytes.len() > MAX_UPLOAD_SIZE {
            return Err(AppError::bad_request(&format!(
                "File too large. Maximum size is {} MB",
                MAX_UPLOAD_SIZE / 1024 / 1024
            )));
        }

        upload = Some((filename, bytes.to_vec()));
    }

    let (filename, data) = upload.ok_or_else(|| AppError::bad_request("No file provided"))?;
    if filename.trim().is_empty() {
        return Err(AppError::bad_request("No file selected"));
    }
    if !filename.to_lowercase().ends_with(".csv") {
        return Err(AppError::bad_request("Only CSV files are allowed"));
    }

    let summary = import_csv(&state.db, data.as_slice()).map_err(AppError::from_core)?;
    info!(
        "Upload {}: {} of {} rows saved",
        filename, summary.saved_transactions, summary.total_rows
    );

    Ok(Json(UploadResponse {
        message: format!(
            "Successfully imported {} transactions",
            summary.saved_transactions
        ),
        format_detected: summary.schema,
        total_rows: summary.total_rows,
        saved_transactions: summary.saved_transactions,
        skipped_undated: summary.skipped_undated,
        failed_rows: summary.failures,
    }))
}
