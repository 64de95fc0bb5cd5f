// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! NutriSnap: calorie and macronutrient tracking with food photo
//! classification.
//!
//! This crate provides the backend API: user profiles, logged food and
//! drink entries folded into daily intake documents, live intake updates,
//! badges and coin rewards, and an in-process image classifier.

pub mod classifier;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use classifier::FoodClassifier;
use config::Config;
use db::FirestoreDb;
use services::{IntakeFeed, RewardService, TrackingService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub classifier: Arc<FoodClassifier>,
    pub tracking: TrackingService,
    pub rewards: RewardService,
}

impl AppState {
    /// Wire services around a database handle and classifier.
    pub fn new(config: Config, db: FirestoreDb, classifier: FoodClassifier) -> Self {
        let feed = IntakeFeed::new();
        Self {
            config,
            tracking: TrackingService::new(db.clone(), feed),
            rewards: RewardService::new(db.clone()),
            db,
            classifier: Arc::new(classifier),
        }
    }
}
