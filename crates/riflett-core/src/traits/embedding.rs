// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Native embedding encoder trait.

use async_trait::async_trait;

use crate::error::RiflettError;

/// A native text encoder producing fixed-length vectors.
///
/// Output need not be normalized; the embedding provider normalizes it and
/// falls back to hashing whenever this returns an error.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync + 'static {
    /// Human-readable encoder name for logs.
    fn name(&self) -> &str;

    /// Output dimension of this encoder.
    fn dim(&self) -> usize;

    /// Encode a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RiflettError>;
}
