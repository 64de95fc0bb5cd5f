// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Inference runtime seam.
//!
//! `InferenceEngine` is the one forward pass the classifier needs. The
//! production implementation runs an ONNX network through tract.

use super::preprocess::{InputTensor, CHANNELS, INPUT_SIZE};
use std::path::Path;
use tract_onnx::prelude::*;

/// A loaded network that maps one input tensor to one logit per label.
///
/// Implementations need not be safe for concurrent calls; the classifier
/// serializes access.
pub trait InferenceEngine: Send {
    fn forward(&mut self, input: &InputTensor) -> anyhow::Result<Vec<f32>>;
}

/// ONNX model executed with tract.
pub struct TractEngine {
    plan: TypedRunnableModel<TypedModel>,
}

impl TractEngine {
    /// Read the whole model file into memory and build a runnable plan.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    /// Build a runnable plan from model bytes.
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let size = INPUT_SIZE as usize;
        let plan = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(bytes))?
            .with_input_fact(0, f32::fact([1, size, size, CHANNELS]).into())?
            .into_optimized()?
            .into_runnable()?;

        Ok(Self { plan })
    }
}

impl InferenceEngine for TractEngine {
    fn forward(&mut self, input: &InputTensor) -> anyhow::Result<Vec<f32>> {
        let [n, h, w, c] = input.shape();
        let array = tract_ndarray::Array4::from_shape_vec((n, h, w, c), input.data().to_vec())?;
        let tensor: Tensor = array.into();

        let outputs = self.plan.run(tvec!(tensor.into()))?;
        let first = outputs
            .first()
            .ok_or_else(|| anyhow::anyhow!("Model produced no outputs"))?;
        let logits = first.to_array_view::<f32>()?;

        Ok(logits.iter().copied().collect())
    }
}
