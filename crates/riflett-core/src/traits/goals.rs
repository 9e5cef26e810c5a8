// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only providers consumed by the goal coherence engine.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::RiflettError;
use crate::types::GoalReflection;

/// Source of reflections linked to a goal.
#[async_trait]
pub trait GoalReflectionSource: Send + Sync + 'static {
    /// Reflections for `goal_id` created at or after `since`.
    async fn recent_reflections(
        &self,
        goal_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<GoalReflection>, RiflettError>;
}

/// Source of embeddings for journal entries linked by reflections.
#[async_trait]
pub trait GoalEmbeddingSource: Send + Sync + 'static {
    async fn entry_embedding(&self, entry_id: &str) -> Result<Option<Vec<f32>>, RiflettError>;
}
