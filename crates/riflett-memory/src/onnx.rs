// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local ONNX sentence encoder (all-MiniLM-L6-v2), enabled by the `onnx` feature.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use ndarray::Array2;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::TensorRef;

use riflett_core::{EmbeddingBackend, RiflettError};

/// Output width of all-MiniLM-L6-v2.
pub const MINILM_DIM: usize = 384;

/// Native encoder reading `model.onnx` and a sibling `tokenizer.json`.
pub struct OnnxEncoder {
    session: Mutex<Session>,
    tokenizer: tokenizers::Tokenizer,
}

// SAFETY: the session is only touched through the mutex and the tokenizer
// is read-only after load.
unsafe impl Send for OnnxEncoder {}
unsafe impl Sync for OnnxEncoder {}

fn encoder_err(context: &str, e: impl std::fmt::Display) -> RiflettError {
    RiflettError::Embedding {
        message: format!("{context}: {e}"),
        source: None,
    }
}

impl OnnxEncoder {
    /// Load the model at `model_path`; the tokenizer must sit beside it.
    pub fn load(model_path: &Path) -> Result<Self, RiflettError> {
        let tokenizer_path = model_path
            .parent()
            .ok_or_else(|| encoder_err("invalid model path", model_path.display()))?
            .join("tokenizer.json");

        let tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| encoder_err("failed to load tokenizer", e))?;

        let session = Session::builder()
            .map_err(|e| encoder_err("session builder", e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| encoder_err("optimization level", e))?
            .with_intra_threads(1)
            .map_err(|e| encoder_err("thread count", e))?
            .commit_from_file(model_path)
            .map_err(|e| encoder_err("failed to load model", e))?;

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>, RiflettError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| encoder_err("tokenization failed", e))?;

        let widen = |xs: &[u32]| xs.iter().map(|&x| i64::from(x)).collect::<Vec<_>>();
        let ids = widen(encoding.get_ids());
        let mask = widen(encoding.get_attention_mask());
        let types = widen(encoding.get_type_ids());
        let seq_len = ids.len();

        let to_array = |v: Vec<i64>| {
            Array2::from_shape_vec((1, seq_len), v).map_err(|e| encoder_err("input tensor", e))
        };
        let ids_array = to_array(ids)?;
        let mask_array = to_array(mask.clone())?;
        let types_array = to_array(types)?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| encoder_err("session lock", e))?;

        let outputs = session
            .run(ort::inputs![
                "input_ids" => TensorRef::from_array_view(&ids_array).map_err(|e| encoder_err("input_ids", e))?,
                "attention_mask" => TensorRef::from_array_view(&mask_array).map_err(|e| encoder_err("attention_mask", e))?,
                "token_type_ids" => TensorRef::from_array_view(&types_array).map_err(|e| encoder_err("token_type_ids", e))?
            ])
            .map_err(|e| encoder_err("inference failed", e))?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| encoder_err("output tensor", e))?;
        let hidden = shape.last().copied().unwrap_or(0) as usize;

        Ok(mean_pool(data, &mask, seq_len, hidden))
    }
}

/// Average token vectors whose attention mask is set.
fn mean_pool(tokens: &[f32], mask: &[i64], seq_len: usize, hidden: usize) -> Vec<f32> {
    let mut sum = vec![0.0f32; hidden];
    let mut count = 0usize;
    for (t, _) in mask.iter().enumerate().take(seq_len).filter(|(_, m)| **m > 0) {
        for (j, slot) in sum.iter_mut().enumerate() {
            *slot += tokens[t * hidden + j];
        }
        count += 1;
    }
    if count > 0 {
        sum.iter_mut().for_each(|v| *v /= count as f32);
    }
    sum
}

#[async_trait]
impl EmbeddingBackend for OnnxEncoder {
    fn name(&self) -> &str {
        "onnx-minilm"
    }

    fn dim(&self) -> usize {
        MINILM_DIM
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RiflettError> {
        self.encode(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_pool_skips_padding() {
        let tokens = [0.0, 0.0, 0.0, 1.0, 2.0, 3.0];
        assert_eq!(mean_pool(&tokens, &[0, 1], 2, 3), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn missing_model_is_an_embedding_error() {
        let err = OnnxEncoder::load(Path::new("/nonexistent/model.onnx")).err();
        assert!(matches!(err, Some(RiflettError::Embedding { .. })));
    }
}
