//! Profile and notification handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Serialize;

use crate::{AppError, AppState};
use budgetwise_core::models::{ProfileInput, UserProfile};
use budgetwise_core::store::StoreFailure;
use budgetwise_core::{ScheduledWrite, Session};

/// Response for the /api/me endpoint
#[derive(Serialize)]
pub struct MeResponse {
    pub user_id: String,
    /// Email from the identity token
    pub email: Option<String>,
    pub is_admin: bool,
    /// Stored profile, if one was ever saved
    pub profile: Option<UserProfile>,
}

/// GET /api/me - The caller's identity and stored profile
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<MeResponse>, AppError> {
    let user_id = session.require_user()?;
    let profile = state.store.profile(&session, user_id)?;

    Ok(Json(MeResponse {
        user_id: user_id.to_string(),
        email: session.email().map(str::to_string),
        is_admin: session.is_admin(),
        profile,
    }))
}

/// PUT /api/me - Create or merge the caller's profile
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(mut input): Json<ProfileInput>,
) -> Result<(StatusCode, Json<ScheduledWrite>), AppError> {
    if input.email.is_none() {
        input.email = session.email().map(str::to_string);
    }
    let ticket = state.store.upsert_user_profile(&session, input)?;
    Ok((StatusCode::ACCEPTED, Json(ScheduledWrite::from(&ticket))))
}

/// DELETE /api/me - Account deletion (not offered)
pub async fn delete_me(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<StatusCode, AppError> {
    state.store.request_account_deletion(&session)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/notifications - Recent write failures for the caller
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<StoreFailure>>, AppError> {
    let user_id = session.require_user()?;
    Ok(Json(state.notifications.for_user(user_id)))
}
