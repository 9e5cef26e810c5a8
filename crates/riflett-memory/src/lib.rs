// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding provider and tiered vector memory store.
//!
//! - **EmbeddingProvider**: native encoder (ONNX with the `onnx` feature)
//!   with a deterministic FNV hashing fallback
//! - **MemoryStore**: in-process map over a SQL or flat-snapshot durable
//!   tier, cosine top-N search, remote search fusion, personalized briefs
//! - **snapshot**: JSON format of the flat tier

pub mod embedder;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod snapshot;
pub mod store;

pub use embedder::{EmbeddingProvider, cosine_prefix, hash_embed, l2_normalize};
pub use store::{
    DurableSpec, MemoryBrief, MemoryHealth, MemoryStore, MemoryStoreBuilder, NewRow, TierKind,
};

use riflett_config::model::MemoryConfig;

/// Build the embedding provider described by `config`.
///
/// A configured model that fails to load is logged and replaced by hashing.
pub fn embedding_provider_from_config(config: &MemoryConfig) -> EmbeddingProvider {
    match &config.model_path {
        Some(path) => native_or_hashing(path, config.embedding_dim),
        None => EmbeddingProvider::hashing(config.embedding_dim),
    }
}

#[cfg(feature = "onnx")]
fn native_or_hashing(path: &str, dim: usize) -> EmbeddingProvider {
    match onnx::OnnxEncoder::load(std::path::Path::new(path)) {
        Ok(encoder) => {
            tracing::info!(model = %path, "native encoder loaded");
            EmbeddingProvider::with_native(std::sync::Arc::new(encoder), dim)
        }
        Err(e) => {
            tracing::warn!(model = %path, error = %e, "native encoder unavailable, using hashing");
            metrics::counter!("riflett_memory_fallback_total", "stage" => "embedding").increment(1);
            EmbeddingProvider::hashing(dim)
        }
    }
}

#[cfg(not(feature = "onnx"))]
fn native_or_hashing(path: &str, dim: usize) -> EmbeddingProvider {
    tracing::warn!(model = %path, "built without the onnx feature, using hashing");
    EmbeddingProvider::hashing(dim)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_yields_hashing_provider() {
        let provider = embedding_provider_from_config(&MemoryConfig::default());
        assert!(!provider.has_native());
        assert_eq!(provider.dim(), 384);
    }

    #[test]
    fn unloadable_model_falls_back_to_hashing() {
        let config = MemoryConfig {
            model_path: Some("/nonexistent/model.onnx".into()),
            embedding_dim: 64,
            ..MemoryConfig::default()
        };
        let provider = embedding_provider_from_config(&config);
        assert!(!provider.has_native());
        assert_eq!(provider.dim(), 64);
    }
}
