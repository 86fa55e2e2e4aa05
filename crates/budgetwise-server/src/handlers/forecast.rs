//! Forecast handlers

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use serde::Deserialize;

use crate::{AppError, AppState};
use budgetwise_core::models::ForecastResult;
use budgetwise_core::{ForecastState, Session};

/// Longest horizon label passed to the model
const MAX_HORIZON_LEN: usize = 64;

#[derive(Debug, Default, Deserialize)]
pub struct ForecastRequest {
    pub horizon: Option<String>,
}

/// POST /api/forecast - Predict spending from the caller's history
pub async fn request_forecast(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    body: Option<Json<ForecastRequest>>,
) -> Result<Json<ForecastResult>, AppError> {
    let user_id = session.require_user()?;
    let pipeline = state
        .forecasts
        .as_ref()
        .ok_or_else(|| AppError::service_unavailable("AI backend not configured"))?;

    let request = body.map(|Json(r)| r).unwrap_or_default();
    let horizon = request
        .horizon
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| state.settings.forecast_horizon.clone());
    if horizon.len() > MAX_HORIZON_LEN {
        return Err(AppError::bad_request("Horizon label is too long"));
    }

    let history = state.store.transactions(&session, user_id, None)?;
    let result = pipeline.run(user_id, &history, &horizon).await?;
    Ok(Json(result))
}

/// GET /api/forecast/state - Last forecast outcome for the caller
pub async fn get_forecast_state(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<ForecastState>, AppError> {
    let user_id = session.require_user()?;
    let current = state
        .forecasts
        .as_ref()
        .map(|pipeline| pipeline.state(user_id))
        .unwrap_or(ForecastState::Idle);
    Ok(Json(current))
}
