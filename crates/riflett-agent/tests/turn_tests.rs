// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Full turns through memory, classification, and routing.

use std::sync::Arc;

use riflett_agent::{TurnEngine, TurnOptions};
use riflett_config::RiflettConfig;
use riflett_context::ContextWindow;
use riflett_core::{MemoryKind, RiflettError};
use riflett_memory::{EmbeddingProvider, MemoryStore, NewRow};
use riflett_router::{IntentLabel, RouteDecision};
use riflett_test_utils::RecordingEmbedder;

/// Engine over a volatile store whose embedder maps every text to one vector,
/// so any stored row is a perfect match for any utterance.
fn engine_with_constant_embedding() -> TurnEngine {
    let config = RiflettConfig::default();
    let embedder = EmbeddingProvider::with_native(
        Arc::new(RecordingEmbedder::constant(vec![1.0, 0.0, 0.0])),
        3,
    );
    let memory = MemoryStore::builder(config.memory.clone())
        .embedder(embedder)
        .build();
    TurnEngine::new(Arc::new(memory), Arc::new(ContextWindow::new()), &config)
}

fn engine() -> TurnEngine {
    let config = RiflettConfig::default();
    let memory = MemoryStore::builder(config.memory.clone()).build();
    TurnEngine::new(Arc::new(memory), Arc::new(ContextWindow::new()), &config)
}

#[tokio::test]
async fn empty_utterance_is_rejected() {
    let err = engine()
        .handle_utterance("   ", TurnOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RiflettError::InvalidInput(_)));
}

#[tokio::test]
async fn command_commits_without_memory() {
    let outcome = engine()
        .handle_utterance("/export data", TurnOptions::default())
        .await
        .unwrap();
    assert_eq!(
        outcome.decision,
        RouteDecision::Commit {
            primary: IntentLabel::Command,
            secondary: None,
        }
    );
    assert!(outcome.context.is_empty());
    assert!(outcome.linked.is_empty());
}

#[tokio::test]
async fn additive_turn_appends_to_matching_goal() {
    let engine = engine_with_constant_embedding();
    engine
        .memory()
        .upsert(NewRow::new("goal:1", MemoryKind::Goal, "Run a half marathon"))
        .await;

    let outcome = engine
        .handle_utterance("also signed up for a 10k", TurnOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.classification.label, IntentLabel::EntryAppend);
    assert_eq!(outcome.classification.target_entry_id.as_deref(), Some("goal:1"));
    assert!(outcome.wants_goal_context);
    assert_eq!(outcome.linked.len(), 1);
    assert_eq!(outcome.context.len(), 1);
    assert!(matches!(outcome.decision, RouteDecision::Commit { .. }));
}

#[tokio::test]
async fn kinds_override_narrows_retrieval() {
    let engine = engine_with_constant_embedding();
    engine
        .memory()
        .upsert(NewRow::new("pref:1", MemoryKind::Pref, "prefers mornings"))
        .await;

    let options = TurnOptions {
        kinds: Some(vec![MemoryKind::Goal]),
        ..TurnOptions::default()
    };
    let outcome = engine.handle_utterance("how am I doing", options).await.unwrap();
    assert!(outcome.context.is_empty());
    assert!(outcome.classification.duplicate_match.is_none());
}

#[tokio::test]
async fn utterances_are_recorded_in_the_window() {
    let engine = engine();
    engine.window().register_entry("entry:5", "journal");

    let outcome = engine
        .handle_utterance("thinking about it again", TurnOptions::default())
        .await
        .unwrap();
    assert_eq!(outcome.classification.label, IntentLabel::EntryDiscuss);
    assert_eq!(outcome.classification.target_entry_id.as_deref(), Some("entry:5"));

    let recent = engine.window().recent();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].text, "thinking about it again");
}

#[tokio::test]
async fn outcome_serializes_for_the_cli() {
    let outcome = engine()
        .handle_utterance("what should I focus on?", TurnOptions::default())
        .await
        .unwrap();
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["decision"]["kind"], "commit");
    assert_eq!(json["routed"]["label"], "conversational");
}
