// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::response::Response;
use nutrisnap::classifier::engine::InferenceEngine;
use nutrisnap::classifier::preprocess::InputTensor;
use nutrisnap::classifier::{ClassifierConfig, FoodClassifier};
use nutrisnap::config::Config;
use nutrisnap::db::FirestoreDb;
use nutrisnap::routes::create_router;
use nutrisnap::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Unique account ID for test isolation.
#[allow(dead_code)]
pub fn unique_user_id() -> String {
    format!("test-{}", uuid::Uuid::new_v4())
}

/// Engine that returns fixed logits regardless of input.
#[allow(dead_code)]
pub struct StubEngine(pub Vec<f32>);

impl InferenceEngine for StubEngine {
    fn forward(&mut self, _input: &InputTensor) -> anyhow::Result<Vec<f32>> {
        Ok(self.0.clone())
    }
}

/// Labels matching the stub engine's three outputs.
#[allow(dead_code)]
pub fn stub_labels() -> Vec<String> {
    ["Apple", "Banana", "Pizza"].map(String::from).to_vec()
}

/// A ready classifier backed by `StubEngine`.
#[allow(dead_code)]
pub fn stub_classifier(logits: Vec<f32>, min_confidence: f32) -> FoodClassifier {
    FoodClassifier::with_engine(
        Box::new(StubEngine(logits)),
        stub_labels(),
        ClassifierConfig { min_confidence },
    )
}

/// Create a test app with offline mock dependencies and no model.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with(
        test_db_offline(),
        FoodClassifier::unavailable("no model in tests"),
    )
}

/// Create a test app around the given database and classifier.
#[allow(dead_code)]
pub fn create_test_app_with(
    db: FirestoreDb,
    classifier: FoodClassifier,
) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(Config::test_default(), db, classifier));
    (create_router(state.clone()), state)
}

/// Create a test JWT token.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, signing_key: &[u8]) -> String {
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use serde::Serialize;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[derive(Serialize)]
    struct Claims {
        sub: String,
        exp: usize,
        iat: usize,
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        exp: now + 86400,
        iat: now,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )
    .unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Encode a small solid-color PNG.
#[allow(dead_code)]
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(width, height, image::Rgb([200, 120, 40]));
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(image)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}
