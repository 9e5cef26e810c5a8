// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Native encoder stand-ins.

use std::sync::Mutex;

use async_trait::async_trait;

use riflett_core::{EmbeddingBackend, RiflettError};

/// Encoder that always errors.
#[derive(Debug, Clone)]
pub struct FailingEmbedder {
    dim: usize,
}

impl FailingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

#[async_trait]
impl EmbeddingBackend for FailingEmbedder {
    fn name(&self) -> &str {
        "failing"
    }

    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>, RiflettError> {
        Err(RiflettError::Embedding {
            message: "encoder offline".into(),
            source: None,
        })
    }
}

/// Encoder that returns a fixed vector and records every input.
#[derive(Debug, Default)]
pub struct RecordingEmbedder {
    output: Vec<f32>,
    calls: Mutex<Vec<String>>,
}

impl RecordingEmbedder {
    pub fn constant(output: Vec<f32>) -> Self {
        Self {
            output,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EmbeddingBackend for RecordingEmbedder {
    fn name(&self) -> &str {
        "recording"
    }

    fn dim(&self) -> usize {
        self.output.len()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RiflettError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(text.to_string());
        }
        Ok(self.output.clone())
    }
}
