// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory reflection and entry-embedding sources.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use riflett_core::types::GoalReflection;
use riflett_core::{GoalEmbeddingSource, GoalReflectionSource, RiflettError};

/// Serves reflections and embeddings from vectors set up by the test.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGoalSources {
    reflections: Vec<GoalReflection>,
    embeddings: HashMap<String, Vec<f32>>,
    fail: bool,
}

impl InMemoryGoalSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sources whose every call fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_reflection(mut self, reflection: GoalReflection) -> Self {
        self.reflections.push(reflection);
        self
    }

    pub fn with_entry_embedding(mut self, entry_id: impl Into<String>, embedding: Vec<f32>) -> Self {
        self.embeddings.insert(entry_id.into(), embedding);
        self
    }

    fn check(&self) -> Result<(), RiflettError> {
        if self.fail {
            return Err(RiflettError::storage(std::io::Error::other("goal source offline")));
        }
        Ok(())
    }
}

#[async_trait]
impl GoalReflectionSource for InMemoryGoalSources {
    async fn recent_reflections(
        &self,
        goal_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<GoalReflection>, RiflettError> {
        self.check()?;
        Ok(self
            .reflections
            .iter()
            .filter(|r| r.goal_id == goal_id && r.created_at >= since)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl GoalEmbeddingSource for InMemoryGoalSources {
    async fn entry_embedding(&self, entry_id: &str) -> Result<Option<Vec<f32>>, RiflettError> {
        self.check()?;
        Ok(self.embeddings.get(entry_id).cloned())
    }
}
