// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Food image classifier.
//!
//! Maps a photo to one label from a fixed, ordered label list:
//! preprocess to a 224x224 normalized tensor, run one forward pass,
//! softmax the logits and pick the most probable label.
//!
//! Lifecycle is `Uninitialized -> Ready -> Closed`. A failed load yields an
//! inert classifier rather than an error so the server can still start;
//! every call on it reports [`ClassifyError::ModelUnavailable`].

pub mod engine;
pub mod labels;
pub mod preprocess;
pub mod softmax;

pub use engine::{InferenceEngine, TractEngine};

use image::DynamicImage;
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Boundary string for "an error occurred".
pub const SENTINEL_ERROR: &str = "Error";
/// Boundary string for "no result".
pub const SENTINEL_UNKNOWN: &str = "Unknown";

/// Classifier tuning.
#[derive(Debug, Clone, Copy)]
pub struct ClassifierConfig {
    /// Minimum top probability for a prediction to count.
    pub min_confidence: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.0,
        }
    }
}

/// Lifecycle state of a classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierStatus {
    Uninitialized,
    Ready,
    Closed,
}

enum State {
    Uninitialized { reason: String },
    Ready { engine: Box<dyn InferenceEngine> },
    Closed,
}

/// A successful classification.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub label: String,
    pub index: usize,
    pub confidence: f32,
    #[serde(skip)]
    pub probabilities: Vec<f32>,
}

/// Classification failures.
///
/// Grouped into three outcomes: the model is unavailable
/// (`ModelUnavailable`, `Closed`), the input was bad (`InvalidImage`), or the
/// model ran but produced nothing usable (`Inference`, `NoConfidentPrediction`).
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClassifyError {
    #[error("Classifier model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Classifier has been closed")]
    Closed,

    #[error("Invalid input image: {0}")]
    InvalidImage(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("No confident prediction")]
    NoConfidentPrediction,
}

impl ClassifyError {
    /// True when no model is loaded (never loaded, or closed).
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ClassifyError::ModelUnavailable(_) | ClassifyError::Closed)
    }

    /// The bare string the mobile client historically displayed.
    pub fn sentinel(&self) -> &'static str {
        match self {
            ClassifyError::NoConfidentPrediction => SENTINEL_UNKNOWN,
            _ => SENTINEL_ERROR,
        }
    }
}

/// Food image classifier with a serialized inference handle.
pub struct FoodClassifier {
    state: Mutex<State>,
    labels: Arc<[String]>,
    config: ClassifierConfig,
}

impl FoodClassifier {
    /// Load the ONNX model and label file.
    ///
    /// Never fails: a missing or corrupt asset yields an uninitialized
    /// classifier and a logged error.
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(
        model_path: P,
        labels_path: Q,
        config: ClassifierConfig,
    ) -> Self {
        let labels = match labels::load_labels(labels_path.as_ref()) {
            Ok(labels) => labels,
            Err(e) => {
                tracing::error!(
                    path = %labels_path.as_ref().display(),
                    error = %e,
                    "Failed to load classifier labels"
                );
                return Self::unavailable(e.to_string());
            }
        };

        match TractEngine::load(model_path.as_ref()) {
            Ok(engine) => {
                tracing::info!(
                    path = %model_path.as_ref().display(),
                    labels = labels.len(),
                    "Classifier model loaded"
                );
                Self::with_engine(Box::new(engine), labels, config)
            }
            Err(e) => {
                tracing::error!(
                    path = %model_path.as_ref().display(),
                    error = %e,
                    "Failed to load classifier model"
                );
                Self::unavailable(format!("model load failed: {}", e))
            }
        }
    }

    /// Build a ready classifier from an already-loaded engine.
    pub fn with_engine(
        engine: Box<dyn InferenceEngine>,
        labels: Vec<String>,
        config: ClassifierConfig,
    ) -> Self {
        if labels.is_empty() {
            return Self::unavailable("label list is empty");
        }
        Self {
            state: Mutex::new(State::Ready { engine }),
            labels: labels.into(),
            config,
        }
    }

    /// An inert classifier; every call reports the model as unavailable.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(State::Uninitialized {
                reason: reason.into(),
            }),
            labels: Arc::from(Vec::new()),
            config: ClassifierConfig::default(),
        }
    }

    pub fn status(&self) -> ClassifierStatus {
        match &*self.lock() {
            State::Uninitialized { .. } => ClassifierStatus::Uninitialized,
            State::Ready { .. } => ClassifierStatus::Ready,
            State::Closed => ClassifierStatus::Closed,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status() == ClassifierStatus::Ready
    }

    /// Labels in model output order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Classify one photo.
    pub fn classify(&self, image: &DynamicImage) -> Result<Prediction, ClassifyError> {
        self.check_ready()?;

        let input = preprocess::preprocess(image)
            .map_err(|e| ClassifyError::InvalidImage(e.to_string()))?;

        let logits = {
            let mut state = self.lock();
            let engine = match &mut *state {
                State::Ready { engine } => engine,
                State::Uninitialized { reason } => {
                    return Err(ClassifyError::ModelUnavailable(reason.clone()))
                }
                State::Closed => return Err(ClassifyError::Closed),
            };
            engine
                .forward(&input)
                .map_err(|e| ClassifyError::Inference(e.to_string()))?
        };

        self.interpret(&logits)
    }

    /// Map raw logits to a prediction.
    fn interpret(&self, logits: &[f32]) -> Result<Prediction, ClassifyError> {
        if logits.len() != self.labels.len() {
            return Err(ClassifyError::Inference(format!(
                "model produced {} logits for {} labels",
                logits.len(),
                self.labels.len()
            )));
        }

        let probabilities = softmax::softmax(logits);
        let index = softmax::argmax(&probabilities).ok_or(ClassifyError::NoConfidentPrediction)?;
        let confidence = probabilities[index];

        if confidence < self.config.min_confidence {
            tracing::debug!(
                label = %self.labels[index],
                confidence,
                min_confidence = self.config.min_confidence,
                "Prediction below confidence threshold"
            );
            return Err(ClassifyError::NoConfidentPrediction);
        }

        Ok(Prediction {
            label: self.labels[index].clone(),
            index,
            confidence,
            probabilities,
        })
    }

    /// Classify and collapse the outcome to the legacy string form.
    pub fn classify_label(&self, image: &DynamicImage) -> String {
        match self.classify(image) {
            Ok(prediction) => prediction.label,
            Err(e) => e.sentinel().to_string(),
        }
    }

    /// Release the model. Safe to call more than once.
    pub fn close(&self) {
        let mut state = self.lock();
        if !matches!(*state, State::Closed) {
            // Dropping the engine releases its resources.
            *state = State::Closed;
            tracing::info!("Classifier closed");
        }
    }

    fn check_ready(&self) -> Result<(), ClassifyError> {
        match &*self.lock() {
            State::Ready { .. } => Ok(()),
            State::Uninitialized { reason } => Err(ClassifyError::ModelUnavailable(reason.clone())),
            State::Closed => Err(ClassifyError::Closed),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panic inside an engine leaves the state intact; keep serving.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
