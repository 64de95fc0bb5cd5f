// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Food photo classification route.

use crate::classifier::{ClassifyError, SENTINEL_UNKNOWN};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    routing::post,
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Largest accepted upload.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/classify", post(classify))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES))
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ClassifyResponse {
    /// Food label, or "Unknown" when no class is confident enough
    pub label: String,
    pub confidence: Option<f32>,
}

/// Classify a raw image body (JPEG, PNG, ...).
async fn classify(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: Bytes,
) -> Result<Json<ClassifyResponse>> {
    // Don't bother decoding if nothing can run it.
    if !state.classifier.is_ready() {
        return Err(ClassifyError::ModelUnavailable(format!(
            "classifier is {:?}",
            state.classifier.status()
        ))
        .into());
    }

    if body.is_empty() {
        return Err(ClassifyError::InvalidImage("empty body".to_string()).into());
    }

    let classifier = state.classifier.clone();
    let result = tokio::task::spawn_blocking(move || {
        let image = image::load_from_memory(&body)
            .map_err(|e| ClassifyError::InvalidImage(e.to_string()))?;
        classifier.classify(&image)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Classification task failed: {}", e)))?;

    match result {
        Ok(prediction) => {
            tracing::debug!(
                user_id = %user.user_id,
                label = %prediction.label,
                confidence = prediction.confidence,
                "Image classified"
            );
            Ok(Json(ClassifyResponse {
                label: prediction.label,
                confidence: Some(prediction.confidence),
            }))
        }
        Err(ClassifyError::NoConfidentPrediction) => Ok(Json(ClassifyResponse {
            label: SENTINEL_UNKNOWN.to_string(),
            confidence: None,
        })),
        Err(e) => Err(e.into()),
    }
}
