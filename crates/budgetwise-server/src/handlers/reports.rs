//! Dashboard and report handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::{AppError, AppState};
use budgetwise_core::models::{CategorySpending, DashboardSummary, MonthlyTrendBucket};
use budgetwise_core::{reports, Session};

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    /// Number of recent transactions to include
    pub recent: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct TrendQuery {
    pub months: Option<usize>,
}

/// GET /api/dashboard - Totals, spending, budgets and recent activity
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Query(params): Query<DashboardQuery>,
) -> Result<Json<DashboardSummary>, AppError> {
    let user_id = session.require_user()?;
    let recent = params
        .recent
        .unwrap_or(state.settings.recent_transactions)
        .min(crate::MAX_PAGE_LIMIT);
    Ok(Json(reports::dashboard(
        &state.store,
        &session,
        user_id,
        recent,
    )?))
}

/// GET /api/reports/trend - Monthly income and expenses
pub async fn report_trend(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Query(params): Query<TrendQuery>,
) -> Result<Json<Vec<MonthlyTrendBucket>>, AppError> {
    let user_id = session.require_user()?;
    let months = state.settings.trend_months_or_default(params.months);
    Ok(Json(reports::trend(&state.store, &session, user_id, months)?))
}

/// GET /api/reports/spending - Spending by category with shares
pub async fn report_spending(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<CategorySpending>>, AppError> {
    let user_id = session.require_user()?;
    Ok(Json(reports::spending(&state.store, &session, user_id)?))
}
