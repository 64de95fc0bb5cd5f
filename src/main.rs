// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! NutriSnap API Server
//!
//! Tracks daily calorie and macronutrient intake and classifies food
//! photos with an in-process ONNX model.

use nutrisnap::{
    classifier::{ClassifierConfig, FoodClassifier},
    config::Config,
    db::FirestoreDb,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting NutriSnap API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id).await?;

    // Load the classifier; a missing model only disables classification
    tracing::info!(
        model = %config.model_path,
        labels = %config.labels_path,
        "Loading food classifier"
    );
    let classifier = FoodClassifier::load(
        &config.model_path,
        &config.labels_path,
        ClassifierConfig {
            min_confidence: config.min_confidence,
        },
    );
    tracing::info!(status = ?classifier.status(), "Food classifier initialized");

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), db, classifier));

    // Build router
    let app = nutrisnap::routes::create_router(state.clone());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.classifier.close();
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("nutrisnap=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
