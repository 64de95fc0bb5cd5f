// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Badge and coin reward routes.

use crate::db::ClaimOutcome;
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::BadgeStatus;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/badges", get(get_badges))
        .route("/api/badges/{id}/claim", post(claim_badge))
}

async fn get_badges(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<BadgeStatus>>> {
    Ok(Json(state.rewards.badges(&user.user_id).await?))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ClaimResponse {
    pub badge_id: String,
    /// False if the badge had already been claimed
    pub newly_claimed: bool,
    /// Coin balance after the claim
    pub coins: u32,
}

async fn claim_badge(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(badge_id): Path<String>,
) -> Result<Json<ClaimResponse>> {
    let outcome = state.rewards.claim(&user.user_id, &badge_id).await?;

    let (newly_claimed, coins) = match outcome {
        ClaimOutcome::Claimed { coins } => {
            tracing::info!(user_id = %user.user_id, badge_id = %badge_id, coins, "Badge claimed");
            (true, coins)
        }
        ClaimOutcome::AlreadyClaimed { coins } => (false, coins),
    };

    Ok(Json(ClaimResponse {
        badge_id,
        newly_claimed,
        coins,
    }))
}
