// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Latest computed health per goal.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::engine::GoalHealth;

/// One [`GoalHealth`] row per goal id, last writer wins.
#[derive(Debug, Default)]
pub struct GoalHealthCache {
    rows: RwLock<HashMap<String, GoalHealth>>,
}

impl GoalHealthCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the row for `health.goal_id`.
    pub fn upsert(&self, health: GoalHealth) {
        self.rows
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(health.goal_id.clone(), health);
    }

    pub fn get(&self, goal_id: &str) -> Option<GoalHealth> {
        self.rows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(goal_id)
            .cloned()
    }

    pub fn remove(&self, goal_id: &str) -> Option<GoalHealth> {
        self.rows
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(goal_id)
    }

    /// All rows, most recently computed first.
    pub fn all(&self) -> Vec<GoalHealth> {
        let mut rows: Vec<GoalHealth> = self
            .rows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.last_computed_at.cmp(&a.last_computed_at));
        rows
    }

    pub fn len(&self) -> usize {
        self.rows.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    use crate::signals::{GhiState, GoalSignals};

    fn health(goal_id: &str, state: GhiState, minutes_ago: i64) -> GoalHealth {
        GoalHealth {
            goal_id: goal_id.into(),
            progress_pct: 0.0,
            coherence_score: 0.0,
            ghi_state: state,
            signals: GoalSignals {
                reflection_density: 0.0,
                emotional_consistency: 0.5,
                momentum: 0.0,
                drift: 1.0,
                reflection_count: 0,
            },
            last_computed_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn upsert_replaces_by_goal_id() {
        let cache = GoalHealthCache::new();
        cache.upsert(health("goal:1", GhiState::Dormant, 10));
        cache.upsert(health("goal:1", GhiState::Alive, 0));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("goal:1").unwrap().ghi_state, GhiState::Alive);
    }

    #[test]
    fn all_lists_newest_first() {
        let cache = GoalHealthCache::new();
        cache.upsert(health("goal:old", GhiState::Unknown, 60));
        cache.upsert(health("goal:new", GhiState::Alive, 1));
        let ids: Vec<_> = cache.all().into_iter().map(|h| h.goal_id).collect();
        assert_eq!(ids, vec!["goal:new", "goal:old"]);
        assert!(cache.remove("goal:old").is_some());
        assert!(cache.get("goal:old").is_none());
        assert!(!cache.is_empty());
    }
}
