//! Admin handlers (cross-user, read-only)

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::{AppError, AppState, MAX_PAGE_LIMIT};
use budgetwise_core::admin::{self, UserDetail};
use budgetwise_core::models::{AdminOverview, Transaction, UserSummary};
use budgetwise_core::Session;

#[derive(Debug, Deserialize)]
pub struct LatestQuery {
    pub limit: Option<usize>,
}

/// GET /api/admin/overview - Platform KPIs
pub async fn admin_overview(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<AdminOverview>, AppError> {
    Ok(Json(admin::overview(&state.store, &session)?))
}

/// GET /api/admin/users - One summary row per user
pub async fn admin_list_users(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    Ok(Json(admin::user_summaries(&state.store, &session)?))
}

/// GET /api/admin/users/:id - A user's transactions and budgets
pub async fn admin_get_user(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<UserDetail>, AppError> {
    Ok(Json(admin::user_detail(&state.store, &session, &id)?))
}

/// GET /api/admin/transactions - Latest transactions across users
pub async fn admin_latest_transactions(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Query(params): Query<LatestQuery>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    let limit = params
        .limit
        .unwrap_or(state.settings.admin_transactions_limit)
        .clamp(1, MAX_PAGE_LIMIT);
    Ok(Json(admin::latest_transactions(&state.store, &session, limit)?))
}
