// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use nutrisnap::classifier::ClassifyError;
use nutrisnap::error::AppError;

mod common;
use common::body_json;

async fn status_and_code(err: AppError) -> (StatusCode, String) {
    let response = err.into_response();
    let status = response.status();
    let body = body_json(response).await;
    (status, body["error"].as_str().unwrap_or_default().to_string())
}

#[tokio::test]
async fn test_classifier_errors_are_distinguishable() {
    let cases = [
        (
            ClassifyError::ModelUnavailable("no file".to_string()),
            StatusCode::SERVICE_UNAVAILABLE,
            "model_unavailable",
        ),
        (
            ClassifyError::Closed,
            StatusCode::SERVICE_UNAVAILABLE,
            "model_unavailable",
        ),
        (
            ClassifyError::InvalidImage("truncated".to_string()),
            StatusCode::BAD_REQUEST,
            "invalid_image",
        ),
        (
            ClassifyError::NoConfidentPrediction,
            StatusCode::UNPROCESSABLE_ENTITY,
            "no_prediction",
        ),
        (
            ClassifyError::Inference("shape mismatch".to_string()),
            StatusCode::INTERNAL_SERVER_ERROR,
            "inference_error",
        ),
    ];

    for (err, status, code) in cases {
        assert_eq!(status_and_code(err.into()).await, (status, code.to_string()));
    }
}

#[tokio::test]
async fn test_internal_details_not_leaked() {
    let response = AppError::Database("connection string with secrets".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["error"], "database_error");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_client_errors_carry_details() {
    let response = AppError::Conflict("Profile exists".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = body_json(response).await;
    assert_eq!(body["details"], "Profile exists");
}

#[test]
fn test_sentinels() {
    assert_eq!(ClassifyError::NoConfidentPrediction.sentinel(), "Unknown");
    assert_eq!(ClassifyError::Closed.sentinel(), "Error");
    assert_eq!(
        ClassifyError::InvalidImage("bad".to_string()).sentinel(),
        "Error"
    );
    assert!(ClassifyError::Closed.is_unavailable());
    assert!(!ClassifyError::NoConfidentPrediction.is_unavailable());
}
