// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One utterance in, one routing decision out.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use riflett_config::RiflettConfig;
use riflett_context::{ContextWindow, ScoredRecord, ScoringOptions, score_context_records};
use riflett_core::{MemoryKind, MemoryRecord, RiflettError};
use riflett_memory::MemoryStore;
use riflett_router::{
    ClassificationMeta, ClassifierInput, IntentClassifier, RouteDecision, RoutedIntent, Router,
};

/// Kinds searched when the caller does not narrow them.
const DEFAULT_KINDS: &[MemoryKind] = &[
    MemoryKind::Entry,
    MemoryKind::Goal,
    MemoryKind::Event,
    MemoryKind::Pref,
];

/// Words that make a turn worth enriching with goal context.
const GOAL_KEYWORDS: &[&str] = &[
    "goal",
    "goals",
    "milestone",
    "milestones",
    "project",
    "habit",
    "plan",
];

/// Per-turn overrides.
#[derive(Debug, Clone, Default)]
pub struct TurnOptions {
    /// Kinds to search; entry, goal, event, and pref when `None`.
    pub kinds: Option<Vec<MemoryKind>>,
    /// Records to retrieve; the memory default when `None`.
    pub top_k: Option<usize>,
    pub scoring: ScoringOptions,
}

/// Everything decided about one utterance.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub decision: RouteDecision,
    pub routed: RoutedIntent,
    pub classification: ClassificationMeta,
    /// Retrieved records ranked by composite context score.
    pub context: Vec<ScoredRecord>,
    /// Retrieved records at or above the link threshold.
    pub linked: Vec<MemoryRecord>,
    pub wants_goal_context: bool,
    pub latency_ms: u64,
}

/// Wires memory retrieval, context scoring, classification, and routing.
pub struct TurnEngine {
    memory: Arc<MemoryStore>,
    window: Arc<ContextWindow>,
    classifier: IntentClassifier,
    router: Router,
    link_threshold: f32,
}

impl TurnEngine {
    pub fn new(memory: Arc<MemoryStore>, window: Arc<ContextWindow>, config: &RiflettConfig) -> Self {
        Self {
            memory,
            window,
            classifier: IntentClassifier::new(config.intent.clone()),
            router: Router::new(config.routing),
            link_threshold: config.memory.link_threshold,
        }
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    pub fn window(&self) -> &ContextWindow {
        &self.window
    }

    /// Handle one user utterance.
    ///
    /// Fails only on empty input. Memory and collaborator failures degrade
    /// inside the memory store and surface as fewer retrieved records.
    pub async fn handle_utterance(
        &self,
        text: &str,
        options: TurnOptions,
    ) -> Result<TurnOutcome, RiflettError> {
        let started = Instant::now();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(RiflettError::InvalidInput("utterance text is empty".into()));
        }

        let kinds = options.kinds.as_deref().unwrap_or(DEFAULT_KINDS);
        let top_k = options
            .top_k
            .unwrap_or(self.memory.config().default_top_k);
        let records = self.memory.search_top_n(trimmed, kinds, top_k).await;
        let context = score_context_records(&records, &options.scoring, Utc::now());

        let snapshot = self.window.snapshot();
        let recent = self.window.recent();
        let classification = self.classifier.classify(
            &ClassifierInput::new(trimmed)
                .with_records(&records)
                .with_window(snapshot.as_ref())
                .with_recent(&recent),
        );
        let routed = RoutedIntent::from_classification(&classification);
        let decision = self.router.route(&routed);

        self.window.record_user_message(trimmed);

        let wants_goal_context = wants_goal_context(trimmed, &classification);
        let linked: Vec<MemoryRecord> = records
            .into_iter()
            .filter(|r| r.score >= self.link_threshold)
            .collect();

        let latency_ms = started.elapsed().as_millis() as u64;
        info!(
            intent = %routed.summarize(),
            retrieved = context.len(),
            linked = linked.len(),
            wants_goal_context,
            latency_ms,
            "turn handled"
        );
        debug!(reasons = ?classification.reasons, "classification evidence");

        Ok(TurnOutcome {
            decision,
            routed,
            classification,
            context,
            linked,
            wants_goal_context,
            latency_ms,
        })
    }
}

/// Whether the turn should be enriched with the user's active goals.
pub fn wants_goal_context(text: &str, classification: &ClassificationMeta) -> bool {
    let lower = text.to_lowercase();
    if GOAL_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return true;
    }
    if classification
        .duplicate_match
        .as_ref()
        .is_some_and(|d| d.kind == MemoryKind::Goal)
    {
        return true;
    }
    classification
        .target_entry_type
        .as_deref()
        .is_some_and(|t| t.eq_ignore_ascii_case("goal"))
}
