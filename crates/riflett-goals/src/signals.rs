// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The four goal signals, the coherence blend, and the life-cycle rules.
//!
//! Every function here is pure and returns a value in [0, 1]. Vector math
//! never panics: mismatched dimensions and zero vectors score 0.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::warn;

use riflett_core::types::{Goal, GoalStatus, MicroStep};

const DENSITY_WEIGHT: f64 = 0.45;
const CONSISTENCY_WEIGHT: f64 = 0.30;
const MOMENTUM_WEIGHT: f64 = 0.25;

/// Consistency reported when fewer than two valences are available.
pub const NEUTRAL_CONSISTENCY: f64 = 0.5;
/// Progress at or above which a goal counts as done.
pub const COMPLETE_PROGRESS: f64 = 0.999;

/// Goal-health life-cycle state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GhiState {
    Alive,
    Dormant,
    Misaligned,
    Complete,
    /// Not enough signal to call it either way.
    Unknown,
}

/// Raw signal values for one goal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalSignals {
    pub reflection_density: f64,
    pub emotional_consistency: f64,
    pub momentum: f64,
    pub drift: f64,
    /// Reflections that fell inside the density window.
    pub reflection_count: usize,
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Reflections per window relative to `target`, capped at 1.
pub fn reflection_density(count: usize, target: f64) -> f64 {
    if target <= 0.0 {
        return if count > 0 { 1.0 } else { 0.0 };
    }
    clamp_unit(count as f64 / target)
}

/// One minus the sample standard deviation of clamped valences.
pub fn emotional_consistency(valences: &[f64]) -> f64 {
    let values: Vec<f64> = valences
        .iter()
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(0.0, 1.0))
        .collect();
    if values.len() < 2 {
        return NEUTRAL_CONSISTENCY;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    clamp_unit(1.0 - variance.sqrt())
}

/// Share of micro-steps completed within `window` before `now`.
pub fn momentum(steps: &[MicroStep], now: DateTime<Utc>, window: Duration) -> f64 {
    if steps.is_empty() {
        return 0.0;
    }
    let since = now.checked_sub_signed(window).unwrap_or(DateTime::<Utc>::MIN_UTC);
    let recent = steps
        .iter()
        .filter(|s| s.completed)
        .filter(|s| s.completed_at.is_some_and(|at| at >= since && at <= now))
        .count();
    clamp_unit(recent as f64 / steps.len() as f64)
}

/// Explicit progress when the goal carries one, else completed ÷ total steps.
pub fn progress(goal: &Goal) -> f64 {
    if let Some(pct) = goal.progress_pct {
        return clamp_unit(pct);
    }
    if goal.micro_steps.is_empty() {
        return 0.0;
    }
    let done = goal.micro_steps.iter().filter(|s| s.completed).count();
    clamp_unit(done as f64 / goal.micro_steps.len() as f64)
}

/// Cosine between the goal embedding and the centroid of linked-entry embeddings.
///
/// 1 when either side has no evidence. Linked vectors whose dimension
/// differs from the first one are left out of the centroid.
pub fn drift(goal_embedding: Option<&[f32]>, linked: &[Vec<f32>]) -> f64 {
    let Some(goal_embedding) = goal_embedding.filter(|e| !e.is_empty()) else {
        return 1.0;
    };
    let Some(first) = linked.iter().find(|v| !v.is_empty()) else {
        return 1.0;
    };

    let dim = first.len();
    let mut centroid = vec![0.0f64; dim];
    let mut used = 0usize;
    for vector in linked.iter().filter(|v| !v.is_empty()) {
        if vector.len() != dim {
            warn!(expected = dim, got = vector.len(), "linked embedding dimension mismatch, skipped");
            continue;
        }
        for (acc, value) in centroid.iter_mut().zip(vector) {
            *acc += f64::from(*value);
        }
        used += 1;
    }
    for acc in &mut centroid {
        *acc /= used as f64;
    }

    let goal: Vec<f64> = goal_embedding.iter().map(|v| f64::from(*v)).collect();
    clamp_unit(cosine(&goal, &centroid))
}

/// Cosine similarity, 0 on dimension mismatch or zero magnitude.
pub fn cosine(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        warn!(left = a.len(), right = b.len(), "vector dimension mismatch");
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 || !norm_a.is_finite() || !norm_b.is_finite() {
        warn!("zero-magnitude vector in cosine");
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Weighted blend of density, consistency, and momentum.
///
/// Consistency only counts when at least one reflection is in the window,
/// so a goal nobody reflects on scores 0 rather than a neutral floor.
pub fn coherence(signals: &GoalSignals) -> f64 {
    let consistency = if signals.reflection_count > 0 {
        signals.emotional_consistency
    } else {
        0.0
    };
    clamp_unit(
        DENSITY_WEIGHT * signals.reflection_density
            + CONSISTENCY_WEIGHT * consistency
            + MOMENTUM_WEIGHT * signals.momentum,
    )
}

/// Life-cycle state. First matching rule wins.
pub fn classify_state(status: GoalStatus, progress: f64, signals: &GoalSignals) -> GhiState {
    let density = signals.reflection_density;
    let momentum = signals.momentum;

    if status == GoalStatus::Completed || progress >= COMPLETE_PROGRESS {
        GhiState::Complete
    } else if signals.drift < 0.70 && density < 0.30 {
        GhiState::Misaligned
    } else if density < 0.20 && momentum < 0.20 {
        GhiState::Dormant
    } else if density > 0.40 || momentum > 0.30 {
        GhiState::Alive
    } else {
        GhiState::Unknown
    }
}
