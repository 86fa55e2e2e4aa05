//! Budget handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{AppError, AppState};
use budgetwise_core::categories::Category;
use budgetwise_core::models::{BudgetInput, BudgetWithSpent};
use budgetwise_core::{reports, ScheduledWrite, Session};

#[derive(Debug, Deserialize)]
pub struct SetBudgetRequest {
    pub amount: Decimal,
}

/// GET /api/budgets - Budgets with spending so far
pub async fn list_budgets(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<BudgetWithSpent>>, AppError> {
    let user_id = session.require_user()?;
    Ok(Json(reports::budgets(&state.store, &session, user_id)?))
}

/// PUT /api/budgets/:category - Create or replace a category budget
pub async fn set_budget(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(category): Path<String>,
    Json(body): Json<SetBudgetRequest>,
) -> Result<(StatusCode, Json<ScheduledWrite>), AppError> {
    let user_id = session.require_user()?;
    let category: Category = category.parse()?;
    let ticket = state.store.upsert_budget(
        &session,
        user_id,
        BudgetInput {
            category,
            amount: body.amount,
        },
    )?;
    Ok((StatusCode::ACCEPTED, Json(ScheduledWrite::from(&ticket))))
}
