// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile and account routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{DailyIntake, NewProfile, ProfileUpdate, User};
use crate::time_utils::{date_key, format_utc_rfc3339};
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/register", post(register))
        .route("/api/me", get(get_me).patch(update_me))
        .route("/api/account", delete(delete_account))
}

// ─── User Profile ────────────────────────────────────────────

async fn load_user(state: &AppState, user_id: &str) -> Result<User> {
    state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
}

/// Create the profile for a newly signed-in account.
async fn register(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<NewProfile>,
) -> Result<(StatusCode, Json<User>)> {
    request.validate()?;
    if request.name.trim().is_empty() {
        return Err(AppError::BadRequest("name must not be blank".to_string()));
    }

    if state.db.get_user(&user.user_id).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "Profile for {} already exists",
            user.user_id
        )));
    }

    let now = chrono::Utc::now();
    let stamp = format_utc_rfc3339(now);
    let profile = request.into_user(&user.user_id, &stamp);
    let mut today = DailyIntake::empty(&user.user_id, &date_key(now.date_naive()), &stamp);
    today.record_targets(&profile.targets);

    state.db.create_profile(&profile, &today).await?;

    Ok((StatusCode::CREATED, Json(profile)))
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<User>> {
    Ok(Json(load_user(&state, &user.user_id).await?))
}

/// Update profile fields and nutrition targets.
async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<User>> {
    update.validate()?;
    if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::BadRequest("name must not be blank".to_string()));
    }

    let mut profile = load_user(&state, &user.user_id).await?;
    let stamp = format_utc_rfc3339(chrono::Utc::now());

    if update.apply(&mut profile, &stamp) {
        state.db.upsert_user(&profile).await?;
        tracing::info!(user_id = %user.user_id, "Profile updated");
    }

    Ok(Json(profile))
}

// ─── Account Deletion ────────────────────────────────────────

/// Response for account deletion.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteAccountResponse {
    pub success: bool,
    pub deleted_documents: usize,
}

/// Delete the user's profile, entries, intakes and rewards.
async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<DeleteAccountResponse>> {
    tracing::info!(user_id = %user.user_id, "User-initiated account deletion");

    let deleted_documents = state.db.delete_user_data(&user.user_id).await?;

    Ok(Json(DeleteAccountResponse {
        success: true,
        deleted_documents,
    }))
}
