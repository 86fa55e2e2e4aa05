//! Transaction handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState, MAX_PAGE_LIMIT};
use budgetwise_core::models::{Transaction, TransactionInput};
use budgetwise_core::{ScheduledWrite, Session};

/// Query parameters for listing transactions
#[derive(Debug, Deserialize)]
pub struct TransactionQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct TransactionResponse {
    pub transactions: Vec<Transaction>,
    pub limit: Option<usize>,
}

/// GET /api/transactions - The caller's transactions, newest first
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Query(params): Query<TransactionQuery>,
) -> Result<Json<TransactionResponse>, AppError> {
    let user_id = session.require_user()?;
    let limit = params.limit.map(|l| l.clamp(1, MAX_PAGE_LIMIT));
    let transactions = state.store.transactions(&session, user_id, limit)?;

    Ok(Json(TransactionResponse {
        transactions,
        limit,
    }))
}

/// POST /api/transactions - Record a transaction
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(input): Json<TransactionInput>,
) -> Result<(StatusCode, Json<ScheduledWrite>), AppError> {
    let user_id = session.require_user()?;
    let ticket = state.store.add_transaction(&session, user_id, input)?;
    Ok((StatusCode::ACCEPTED, Json(ScheduledWrite::from(&ticket))))
}

/// PUT /api/transactions/:id - Replace a transaction
pub async fn update_transaction(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(input): Json<TransactionInput>,
) -> Result<(StatusCode, Json<ScheduledWrite>), AppError> {
    let user_id = session.require_user()?;
    let ticket = state
        .store
        .update_transaction(&session, user_id, &id, input)?;
    Ok((StatusCode::ACCEPTED, Json(ScheduledWrite::from(&ticket))))
}
