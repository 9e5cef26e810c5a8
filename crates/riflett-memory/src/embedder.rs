// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding provider: native encoder when configured, hashing otherwise.
//!
//! `embed` never fails. Any native error, or an empty native output, is
//! logged and answered by the deterministic hashing embedder.

use std::sync::Arc;

use tracing::{debug, warn};

use riflett_core::EmbeddingBackend;

/// Dimension of the hashing embedder unless configured otherwise.
pub const DEFAULT_DIM: usize = 384;

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;
const SCATTER_STRIDE: u64 = 31;

/// Text to L2-normalized vector, with a hashing fallback.
#[derive(Clone)]
pub struct EmbeddingProvider {
    native: Option<Arc<dyn EmbeddingBackend>>,
    fallback_dim: usize,
}

impl std::fmt::Debug for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingProvider")
            .field("native", &self.native.as_ref().map(|n| n.name().to_string()))
            .field("fallback_dim", &self.fallback_dim)
            .finish()
    }
}

impl Default for EmbeddingProvider {
    fn default() -> Self {
        Self::hashing(DEFAULT_DIM)
    }
}

impl EmbeddingProvider {
    /// Hashing-only provider of the given dimension.
    pub fn hashing(dim: usize) -> Self {
        Self {
            native: None,
            fallback_dim: dim.max(1),
        }
    }

    /// Provider that prefers `native` and falls back to hashing at `fallback_dim`.
    pub fn with_native(native: Arc<dyn EmbeddingBackend>, fallback_dim: usize) -> Self {
        Self {
            native: Some(native),
            fallback_dim: fallback_dim.max(1),
        }
    }

    /// Dimension of vectors this provider produces on its preferred path.
    pub fn dim(&self) -> usize {
        self.native
            .as_ref()
            .map(|n| n.dim())
            .filter(|d| *d > 0)
            .unwrap_or(self.fallback_dim)
    }

    /// Whether a native encoder is configured.
    pub fn has_native(&self) -> bool {
        self.native.is_some()
    }

    /// Embed `text`. Empty text yields a zero vector of [`dim`](Self::dim).
    pub async fn embed(&self, text: &str) -> Vec<f32> {
        if text.is_empty() {
            return vec![0.0; self.dim()];
        }

        if let Some(native) = &self.native {
            match native.embed(text).await {
                Ok(vector) if !vector.is_empty() => return l2_normalize(vector),
                Ok(_) => {
                    warn!(encoder = native.name(), "native encoder returned an empty vector, using hashing");
                    metrics::counter!("riflett_memory_fallback_total", "stage" => "embedding")
                        .increment(1);
                }
                Err(e) => {
                    warn!(encoder = native.name(), error = %e, "native encoder failed, using hashing");
                    metrics::counter!("riflett_memory_fallback_total", "stage" => "embedding")
                        .increment(1);
                }
            }
        }

        debug!(bytes = text.len(), "hashing embed");
        hash_embed(text, self.fallback_dim)
    }
}

/// Deterministic FNV-1a scatter embedding over the UTF-8 bytes of `text`.
///
/// Each byte contributes `(byte / 255) * 2 - 1` at index
/// `(hash + i * 31) mod dim`, then the accumulator is L2-normalized.
pub fn hash_embed(text: &str, dim: usize) -> Vec<f32> {
    let dim = dim.max(1);
    let mut acc = vec![0.0f32; dim];
    let mut hash = FNV_OFFSET_BASIS;

    for (i, byte) in text.bytes().enumerate() {
        hash = (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME);
        let idx = (u64::from(hash) + i as u64 * SCATTER_STRIDE) % dim as u64;
        acc[idx as usize] += (f32::from(byte) / 255.0) * 2.0 - 1.0;
    }

    l2_normalize(acc)
}

/// Scale to unit Euclidean norm. Zero or non-finite norms yield zeros.
pub fn l2_normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if !norm.is_finite() || norm <= f32::EPSILON {
        vector.iter_mut().for_each(|v| *v = 0.0);
        return vector;
    }
    vector.iter_mut().for_each(|v| *v /= norm);
    vector
}

/// Dot product over the overlapping prefix of two normalized vectors.
///
/// Differing lengths are not an error; only the shared prefix counts.
pub fn cosine_prefix(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
