//! Category rule handlers
//!
//! Every mutation recategorizes stored transactions and reports how many
//! effective changes it made.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::read_json;
use crate::{AppError, AppState};
use tally_core::models::{CategoryRule, NewCategoryRule, RuleStatus, RuleUpdate};
use tally_core::{add_rule, edit_rule, remove_rule, RuleChange};

/// A rule as shown to API clients
#[derive(Debug, Serialize)]
pub struct RuleResponse {
    pub id: i64,
    pub category_name: String,
    pub regex_pattern: String,
    pub is_active: bool,
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CategoryRule> for RuleResponse {
    fn from(rule: CategoryRule) -> Self {
        Self {
            is_active: rule.is_active(),
            id: rule.id,
            category_name: rule.category_name,
            regex_pattern: rule.pattern,
            position: rule.position,
            created_at: rule.created_at,
            updated_at: rule.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RuleChangeResponse {
    #[serde(flatten)]
    pub rule: RuleResponse,
    pub updated_transactions: usize,
}

impl From<RuleChange> for RuleChangeResponse {
    fn from(change: RuleChange) -> Self {
        Self {
            rule: change.rule.into(),
            updated_transactions: change.updated_transactions,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RuleListQuery {
    /// Include soft-deleted rules
    #[serde(default)]
    pub include_inactive: bool,
}

/// GET /api/category-rules - List rules in evaluation order
pub async fn list_rules(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RuleListQuery>,
) -> Result<Json<Vec<RuleResponse>>, AppError> {
    let rules = state.db.list_rules(params.include_inactive)?;
    Ok(Json(rules.into_iter().map(Into::into).collect()))
}

#[derive(Debug, Deserialize)]
pub struct CreateRuleRequest {
    pub category_name: Option<String>,
    pub regex_pattern: Option<String>,
    pub is_active: Option<bool>,
    pub position: Option<i64>,
}

/// POST /api/category-rules - Create a rule and recategorize
pub async fn create_rule(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, Json<RuleChangeResponse>), AppError> {
    let req: CreateRuleRequest = read_json(request).await?;

    let (Some(category_name), Some(pattern)) = (req.category_name, req.regex_pattern) else {
        return Err(AppError::bad_request(
            "Category name and regex pattern are required",
        ));
    };

    let rule = NewCategoryRule {
        category_name,
        pattern,
        status: RuleStatus::from_active(req.is_active.unwrap_or(true)),
        position: req.position,
    };
    let change = add_rule(&state.db, rule).map_err(AppError::from_core)?;

    Ok((StatusCode::CREATED, Json(change.into())))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRuleRequest {
    pub category_name: Option<String>,
    pub regex_pattern: Option<String>,
    pub is_active: Option<bool>,
    pub position: Option<i64>,
}

/// PUT /api/category-rules/:id - Partially update a rule and recategorize
pub async fn update_rule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<RuleChangeResponse>, AppError> {
    let req: UpdateRuleRequest = read_json(request).await?;

    let update = RuleUpdate {
        category_name: req.category_name,
        pattern: req.regex_pattern,
        status: req.is_active.map(RuleStatus::from_active),
        position: req.position,
    };
    if update.is_empty() {
        return Err(AppError::bad_request("No data provided"));
    }

    let change = edit_rule(&state.db, id, update).map_err(AppError::from_core)?;
    Ok(Json(change.into()))
}

#[derive(Debug, Serialize)]
pub struct DeleteRuleResponse {
    pub message: String,
    pub updated_transactions: usize,
}

/// DELETE /api/category-rules/:id - Soft delete a rule and recategorize
pub async fn delete_rule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteRuleResponse>, AppError> {
    let change = remove_rule(&state.db, id).map_err(AppError::from_core)?;

    Ok(Json(DeleteRuleResponse {
        message: "Category rule deleted successfully".to_string(),
        updated_transactions: change.updated_transactions,
    }))
}
