// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Composite ranking of retrieved memory records.
//!
//! Each record blends recency (logistic of its timestamp z-score within the
//! batch), kind priority, semantic similarity, affect, kind relationship,
//! time-of-day proximity, and the active coaching suggestion.

use chrono::{DateTime, Timelike, Utc};
use serde::Serialize;

use riflett_core::{MemoryKind, MemoryRecord};

const W_RECENCY: f64 = 0.30;
const W_PRIORITY: f64 = 0.25;
const W_SEMANTIC: f64 = 0.15;
const W_AFFECT: f64 = 0.10;
const W_RELATIONSHIP: f64 = 0.10;
const W_TIME_OF_DAY: f64 = 0.05;
const W_COACHING: f64 = 0.05;

const NEUTRAL: f64 = 0.5;

/// Kind of coaching suggestion currently shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoachingKind {
    GoalCheck,
    Reflection,
    Other(String),
}

/// Optional inputs that sharpen the time-of-day and coaching terms.
#[derive(Debug, Clone, Default)]
pub struct ScoringOptions {
    pub user_time_zone: Option<String>,
    pub coaching: Option<CoachingKind>,
}

/// Per-term scores, rounded to three decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub recency: f64,
    pub priority: f64,
    pub semantic: f64,
    pub affect: f64,
    pub relationship: f64,
    pub time_of_day: f64,
    pub coaching: f64,
}

/// A memory record with its composite context score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    #[serde(flatten)]
    pub record: MemoryRecord,
    pub composite_score: f64,
    pub breakdown: ScoreBreakdown,
}

fn priority_weight(kind: MemoryKind) -> f64 {
    match kind {
        MemoryKind::Goal => 1.0,
        MemoryKind::Schedule => 0.75,
        MemoryKind::Entry => 0.55,
        MemoryKind::Event => 0.45,
        MemoryKind::Pref => 0.35,
    }
}

fn relationship_weight(kind: MemoryKind) -> f64 {
    match kind {
        MemoryKind::Goal => 0.85,
        MemoryKind::Schedule => 0.7,
        MemoryKind::Entry => 0.5,
        MemoryKind::Event => 0.4,
        MemoryKind::Pref => 0.35,
    }
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// Rank `records` by composite score, best first. The raw similarity score
/// of each record is preserved.
pub fn score_context_records(
    records: &[MemoryRecord],
    options: &ScoringOptions,
    now: DateTime<Utc>,
) -> Vec<ScoredRecord> {
    if records.is_empty() {
        return Vec::new();
    }

    let n = records.len() as f64;
    let mean = records.iter().map(|r| r.row.ts as f64).sum::<f64>() / n;
    let variance = records
        .iter()
        .map(|r| (r.row.ts as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    let std = match variance.sqrt() {
        s if s > 0.0 => s,
        _ => 1.0,
    };

    let mut scored: Vec<ScoredRecord> = records
        .iter()
        .map(|record| {
            let kind = record.row.kind;
            let recency = logistic((record.row.ts as f64 - mean) / std);
            let priority = priority_weight(kind);
            let semantic = clamp01((f64::from(record.score) + 1.0) / 2.0);
            let affect = NEUTRAL;
            let relationship = relationship_weight(kind);
            let time_of_day = clamp01(time_of_day_score(record.row.ts, options, now));
            let coaching = clamp01(coaching_score(kind, options.coaching.as_ref()));

            let composite = W_RECENCY * recency
                + W_PRIORITY * priority
                + W_SEMANTIC * semantic
                + W_AFFECT * affect
                + W_RELATIONSHIP * relationship
                + W_TIME_OF_DAY * time_of_day
                + W_COACHING * coaching;

            ScoredRecord {
                record: record.clone(),
                composite_score: composite,
                breakdown: ScoreBreakdown {
                    recency: round3(recency),
                    priority: round3(priority),
                    semantic: round3(semantic),
                    affect: round3(affect),
                    relationship: round3(relationship),
                    time_of_day: round3(time_of_day),
                    coaching: round3(coaching),
                },
            }
        })
        .collect();

    scored.sort_by(|a, b| b.composite_score.total_cmp(&a.composite_score));
    scored
}

/// UTC hour proximity between the record and now; neutral without a user zone.
fn time_of_day_score(ts: i64, options: &ScoringOptions, now: DateTime<Utc>) -> f64 {
    if options.user_time_zone.is_none() {
        return NEUTRAL;
    }
    let Some(at) = DateTime::from_timestamp_millis(ts) else {
        return NEUTRAL;
    };
    let diff = at.hour().abs_diff(now.hour());
    let diff = diff.min(24 - diff);
    (1.0 - f64::from(diff) / 12.0).max(0.0)
}

fn coaching_score(kind: MemoryKind, coaching: Option<&CoachingKind>) -> f64 {
    match coaching {
        None => NEUTRAL,
        Some(CoachingKind::GoalCheck) if kind == MemoryKind::Goal => 1.0,
        Some(CoachingKind::Reflection) if kind == MemoryKind::Entry => 1.0,
        Some(CoachingKind::GoalCheck | CoachingKind::Reflection) => 0.35,
        Some(CoachingKind::Other(_)) => 0.6,
    }
}
