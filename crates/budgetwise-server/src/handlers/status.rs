//! Status, health and category registry handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;
use budgetwise_core::categories::{Category, CategoryInfo};
use budgetwise_core::StatusReport;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /api/health - Liveness probe
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /api/status - Per-service status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusReport> {
    let report = StatusReport::collect(
        state.store.database(),
        state.ai.as_ref(),
        state.config.require_auth,
    )
    .await;
    Json(report)
}

/// GET /api/categories - Category registry with display metadata
pub async fn list_categories() -> Json<Vec<CategoryInfo>> {
    Json(Category::registry())
}
