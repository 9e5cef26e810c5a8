// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is
//! reported at startup instead of silently falling back to a default.

use serde::{Deserialize, Serialize};

/// Top-level Riflett configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RiflettConfig {
    /// Process-level settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Durable tier settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Embedding and memory store settings.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Intent classifier settings.
    #[serde(default)]
    pub intent: IntentConfig,

    /// Confidence routing thresholds.
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Goal coherence windows.
    #[serde(default)]
    pub goals: GoalsConfig,
}

/// Process-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Which SQLite client shape to open the durable tier with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageShape {
    /// Async when a runtime is available, blocking otherwise.
    #[default]
    Auto,
    /// Async prepared-statement client on a dedicated connection thread.
    Modern,
    /// Blocking client, one transaction per call.
    Legacy,
}

/// Durable tier configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Whether to try the on-device SQL tier at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Client shape used to open the database.
    #[serde(default)]
    pub shape: StorageShape,

    /// Directory backing the flat key-value snapshot tier.
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            database_path: default_database_path(),
            shape: StorageShape::default(),
            snapshot_dir: default_snapshot_dir(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("riflett").join("memory.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("riflett-memory.db"))
        .display()
        .to_string()
}

fn default_snapshot_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("riflett").join("snapshot"))
        .unwrap_or_else(|| std::path::PathBuf::from("riflett-snapshot"))
        .display()
        .to_string()
}

/// Embedding provider and memory store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Dimension of the hashing fallback embedder.
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,

    /// Maximum rows kept by the flat snapshot tier.
    #[serde(default = "default_capacity")]
    pub snapshot_capacity: usize,

    /// Most recent rows considered as local search candidates.
    #[serde(default = "default_capacity")]
    pub candidate_limit: usize,

    /// Result count when the caller does not pass one.
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Upper clamp on requested result counts.
    #[serde(default = "default_max_top_k")]
    pub max_top_k: usize,

    /// Upper clamp on remote hits fetched for a personalized brief.
    #[serde(default = "default_brief_limit")]
    pub brief_limit: usize,

    /// Similarity at which a record is surfaced as related to the utterance.
    #[serde(default = "default_link_threshold")]
    pub link_threshold: f32,

    /// Similarity at which new text is treated as already stored.
    #[serde(default = "default_dedupe_threshold")]
    pub dedupe_threshold: f32,

    /// Path to a local ONNX encoder (`model.onnx` beside `tokenizer.json`).
    #[serde(default)]
    pub model_path: Option<String>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            embedding_dim: default_embedding_dim(),
            snapshot_capacity: default_capacity(),
            candidate_limit: default_capacity(),
            default_top_k: default_top_k(),
            max_top_k: default_max_top_k(),
            brief_limit: default_brief_limit(),
            link_threshold: default_link_threshold(),
            dedupe_threshold: default_dedupe_threshold(),
            model_path: None,
        }
    }
}

fn default_embedding_dim() -> usize {
    384
}

fn default_capacity() -> usize {
    512
}

fn default_top_k() -> usize {
    5
}

fn default_max_top_k() -> usize {
    20
}

fn default_brief_limit() -> usize {
    9
}

fn default_link_threshold() -> f32 {
    0.82
}

fn default_dedupe_threshold() -> f32 {
    0.90
}

/// Intent classifier configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IntentConfig {
    /// Similarity at which a retrieved record counts as the same record (inclusive).
    #[serde(default = "default_duplicate_threshold")]
    pub duplicate_threshold: f32,

    /// Prefix length of a duplicate's text matched against recent messages.
    #[serde(default = "default_duplicate_prefix_len")]
    pub duplicate_prefix_len: usize,
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            duplicate_threshold: default_duplicate_threshold(),
            duplicate_prefix_len: default_duplicate_prefix_len(),
        }
    }
}

fn default_duplicate_threshold() -> f32 {
    0.85
}

fn default_duplicate_prefix_len() -> usize {
    20
}

/// Confidence routing thresholds.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Confidence at or above which the primary intent is committed.
    #[serde(default = "default_route_at")]
    pub route_at: f32,

    /// Confidence at or above which (and below `route_at`) the user is asked.
    #[serde(default = "default_clarify_lower")]
    pub clarify_lower: f32,

    /// Confidence at or above which a second-best intent rides along a commit.
    #[serde(default = "default_secondary")]
    pub secondary: f32,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            route_at: default_route_at(),
            clarify_lower: default_clarify_lower(),
            secondary: default_secondary(),
        }
    }
}

fn default_route_at() -> f32 {
    0.75
}

fn default_clarify_lower() -> f32 {
    0.45
}

fn default_secondary() -> f32 {
    0.60
}

/// Goal coherence engine windows.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GoalsConfig {
    /// Trailing window for reflection density, in days.
    #[serde(default = "default_density_window_days")]
    pub density_window_days: i64,

    /// Reflections per window that saturate the density signal.
    #[serde(default = "default_density_target")]
    pub density_target: f64,

    /// Trailing window for micro-step momentum, in days.
    #[serde(default = "default_momentum_window_days")]
    pub momentum_window_days: i64,
}

impl Default for GoalsConfig {
    fn default() -> Self {
        Self {
            density_window_days: default_density_window_days(),
            density_target: default_density_target(),
            momentum_window_days: default_momentum_window_days(),
        }
    }
}

fn default_density_window_days() -> i64 {
    21
}

fn default_density_target() -> f64 {
    3.0
}

fn default_momentum_window_days() -> i64 {
    14
}
