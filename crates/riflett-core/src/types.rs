// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the memory store, classifier, and goal engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by store health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Fully operational on the preferred tier.
    Healthy,
    /// Operational on a fallback path.
    Degraded(String),
    /// Not operational.
    Unhealthy(String),
}

/// Category of a cached memory row.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    Entry,
    Goal,
    Event,
    Pref,
    Schedule,
}

impl MemoryKind {
    /// Convert to string for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryKind::Entry => "entry",
            MemoryKind::Goal => "goal",
            MemoryKind::Event => "event",
            MemoryKind::Pref => "pref",
            MemoryKind::Schedule => "schedule",
        }
    }

    /// Parse a kind reported by an external collaborator.
    ///
    /// Unknown kinds collapse to `Entry`, the broadest bucket.
    pub fn from_str_value(s: &str) -> Self {
        s.trim().parse().unwrap_or(MemoryKind::Entry)
    }
}

/// A cached row of text, vector, and metadata owned by the memory store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRow {
    /// Stable caller-assigned identifier, e.g. `"entry:42"`.
    pub id: String,
    pub kind: MemoryKind,
    pub text: String,
    /// Logical recency in epoch milliseconds.
    pub ts: i64,
    /// L2-normalized embedding, or empty when unavailable.
    #[serde(default)]
    pub embedding: Vec<f32>,
}

/// A memory row with a cosine similarity score from search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryRecord {
    #[serde(flatten)]
    pub row: MemoryRow,
    /// Cosine similarity in [-1, 1] (or the remote collaborator's score).
    pub score: f32,
}

/// Scope vocabulary understood by the remote search collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RemoteScope {
    Entry,
    Goal,
    Schedule,
}

/// Scope of a remote search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchScope {
    All,
    Kinds(Vec<RemoteScope>),
}

/// Options passed to the remote search collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub limit: usize,
}

/// A single hit returned by the remote search collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteHit {
    pub id: String,
    pub kind: String,
    pub score: f32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub snippet: String,
}

/// Cadence summary included in the operating picture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CadenceProfile {
    pub cadence: String,
    pub session_length_minutes: u32,
    pub last_message_at: Option<String>,
    pub missed_day_count: u32,
    pub current_streak: u32,
    pub timezone: String,
}

impl Default for CadenceProfile {
    fn default() -> Self {
        Self {
            cadence: "none".to_string(),
            session_length_minutes: 25,
            last_message_at: None,
            missed_day_count: 0,
            current_streak: 0,
            timezone: "UTC".to_string(),
        }
    }
}

/// Server-side summary of the user's current goals, entries, and schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperatingPicture {
    #[serde(default)]
    pub why_model: Option<serde_json::Value>,
    #[serde(default)]
    pub top_goals: Vec<serde_json::Value>,
    #[serde(default)]
    pub hot_entries: Vec<serde_json::Value>,
    #[serde(default)]
    pub next_72h: Vec<serde_json::Value>,
    #[serde(default)]
    pub cadence_profile: CadenceProfile,
    #[serde(default)]
    pub risk_flags: Vec<String>,
}

/// Life-cycle status a goal carries in its source system.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Active,
    Paused,
    Completed,
    Archived,
}

/// One actionable step of a goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicroStep {
    pub id: String,
    pub description: String,
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// A goal as seen by the coherence engine (read-only input).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub title: String,
    pub status: GoalStatus,
    #[serde(default)]
    pub micro_steps: Vec<MicroStep>,
    /// Explicit progress from the source system; derived from steps when absent.
    #[serde(default)]
    pub progress_pct: Option<f64>,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

/// Emotion attached to a reflection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionRecord {
    #[serde(default)]
    pub label: Option<String>,
    /// Valence, nominally in [0, 1].
    #[serde(default)]
    pub valence: Option<f64>,
}

/// A journal reflection linked to a goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalReflection {
    pub id: String,
    pub goal_id: String,
    pub entry_id: String,
    pub alignment_score: f64,
    #[serde(default)]
    pub emotion: EmotionRecord,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_kind_variants() {
        assert_eq!(MemoryKind::Entry.as_str(), "entry");
        assert_eq!(MemoryKind::Schedule.to_string(), "schedule");
        assert_eq!("GOAL".parse::<MemoryKind>().unwrap(), MemoryKind::Goal);
        assert_eq!(MemoryKind::from_str_value("pref"), MemoryKind::Pref);
        assert_eq!(MemoryKind::from_str_value("journal"), MemoryKind::Entry);
    }

    #[test]
    fn memory_row_serializes_kind_lowercase() {
        let row = MemoryRow {
            id: "goal:1".into(),
            kind: MemoryKind::Goal,
            text: "Run a marathon".into(),
            ts: 10,
            embedding: vec![1.0],
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["kind"], "goal");
        let back: MemoryRow = serde_json::from_value(json).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn memory_record_flattens_row() {
        let record = MemoryRecord {
            row: MemoryRow {
                id: "entry:1".into(),
                kind: MemoryKind::Entry,
                text: "hi".into(),
                ts: 1,
                embedding: vec![],
            },
            score: 0.5,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], "entry:1");
        assert_eq!(json["score"], 0.5);
    }

    #[test]
    fn operating_picture_defaults() {
        let picture: OperatingPicture = serde_json::from_str("{}").unwrap();
        assert!(picture.top_goals.is_empty());
        assert_eq!(picture.cadence_profile.cadence, "none");
        assert_eq!(picture.cadence_profile.session_length_minutes, 25);
        assert_eq!(picture.cadence_profile.timezone, "UTC");
    }

    #[test]
    fn goal_status_parses_case_insensitive() {
        assert_eq!("Completed".parse::<GoalStatus>().unwrap(), GoalStatus::Completed);
        assert_eq!(GoalStatus::Active.to_string(), "active");
    }
}
