// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Goal coherence engine: pulls reflections and linked-entry embeddings,
//! scores the goal, and labels its life-cycle state.
//!
//! Source failures never escape. A reflection source that errors looks like
//! a goal with no reflections; a missing embedding looks like no evidence.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use riflett_config::model::GoalsConfig;
use riflett_core::types::{Goal, GoalReflection};
use riflett_core::{GoalEmbeddingSource, GoalReflectionSource};

use crate::cache::GoalHealthCache;
use crate::signals::{self, GhiState, GoalSignals};

/// Computed health of one goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalHealth {
    pub goal_id: String,
    pub progress_pct: f64,
    pub coherence_score: f64,
    pub ghi_state: GhiState,
    pub signals: GoalSignals,
    pub last_computed_at: DateTime<Utc>,
}

/// Scores goals against their reflection history.
pub struct GoalCoherenceEngine {
    reflections: Arc<dyn GoalReflectionSource>,
    embeddings: Arc<dyn GoalEmbeddingSource>,
    config: GoalsConfig,
}

impl GoalCoherenceEngine {
    pub fn new(
        reflections: Arc<dyn GoalReflectionSource>,
        embeddings: Arc<dyn GoalEmbeddingSource>,
        config: GoalsConfig,
    ) -> Self {
        Self {
            reflections,
            embeddings,
            config,
        }
    }

    /// Score `goal` as of `now`.
    pub async fn evaluate(&self, goal: &Goal, now: DateTime<Utc>) -> GoalHealth {
        let defaults = GoalsConfig::default();
        let density_window = window(
            "density_window_days",
            self.config.density_window_days,
            defaults.density_window_days,
        );
        let momentum_window = window(
            "momentum_window_days",
            self.config.momentum_window_days,
            defaults.momentum_window_days,
        );
        let since = now.checked_sub_signed(density_window).unwrap_or(DateTime::<Utc>::MIN_UTC);
        let reflections = self.load_reflections(&goal.id, since, now).await;

        let valences: Vec<f64> = reflections
            .iter()
            .filter_map(|r| r.emotion.valence)
            .collect();
        let linked = self.linked_embeddings(&reflections).await;

        let signals = GoalSignals {
            reflection_density: signals::reflection_density(
                reflections.len(),
                self.config.density_target,
            ),
            emotional_consistency: signals::emotional_consistency(&valences),
            momentum: signals::momentum(&goal.micro_steps, now, momentum_window),
            drift: signals::drift(goal.embedding.as_deref(), &linked),
            reflection_count: reflections.len(),
        };

        let progress_pct = signals::progress(goal);
        let coherence_score = signals::coherence(&signals);
        let ghi_state = signals::classify_state(goal.status, progress_pct, &signals);

        debug!(
            goal_id = %goal.id,
            progress_pct,
            coherence_score,
            state = %ghi_state,
            reflections = reflections.len(),
            "goal health computed"
        );

        GoalHealth {
            goal_id: goal.id.clone(),
            progress_pct,
            coherence_score,
            ghi_state,
            signals,
            last_computed_at: now,
        }
    }

    /// Evaluate `goal` and upsert the result into `cache`.
    pub async fn refresh(
        &self,
        goal: &Goal,
        cache: &GoalHealthCache,
        now: DateTime<Utc>,
    ) -> GoalHealth {
        let health = self.evaluate(goal, now).await;
        cache.upsert(health.clone());
        health
    }

    async fn load_reflections(
        &self,
        goal_id: &str,
        since: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Vec<GoalReflection> {
        match self.reflections.recent_reflections(goal_id, since).await {
            // Sources may over-fetch; the window is enforced here.
            Ok(rows) => rows
                .into_iter()
                .filter(|r| r.goal_id == goal_id && r.created_at >= since && r.created_at <= now)
                .collect(),
            Err(e) => {
                warn!(goal_id, error = %e, "reflection source failed, treating as no reflections");
                Vec::new()
            }
        }
    }

    /// Linked-entry embeddings, fetched concurrently. Missing ones are skipped.
    async fn linked_embeddings(&self, reflections: &[GoalReflection]) -> Vec<Vec<f32>> {
        let lookups = reflections.iter().map(|reflection| async move {
            match self.embeddings.entry_embedding(&reflection.entry_id).await {
                Ok(embedding) => embedding.filter(|e| !e.is_empty()),
                Err(e) => {
                    warn!(
                        entry_id = %reflection.entry_id,
                        error = %e,
                        "entry embedding unavailable"
                    );
                    None
                }
            }
        });
        join_all(lookups).await.into_iter().flatten().collect()
    }
}

/// Window of `days`, or of `fallback` days when `days` is out of range.
fn window(name: &str, days: i64, fallback: i64) -> Duration {
    match Duration::try_days(days).filter(|d| *d > Duration::zero()) {
        Some(window) => window,
        None => {
            warn!(setting = name, days, fallback, "goal window out of range, using default");
            Duration::days(fallback)
        }
    }
}
