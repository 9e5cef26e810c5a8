// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `turn`, `remember`, `search`, and `forget` subcommands.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use riflett_agent::{TurnEngine, TurnOptions};
use riflett_config::RiflettConfig;
use riflett_context::{ContextWindow, ScoringOptions};
use riflett_core::{MemoryKind, RiflettError};
use riflett_memory::{MemoryStore, MemoryStoreBuilder, NewRow, embedding_provider_from_config};

/// Memory store wired from config: SQL tier, flat snapshot, configured embedder.
pub fn open_store(config: &RiflettConfig) -> MemoryStore {
    MemoryStoreBuilder::from_config(config)
        .embedder(embedding_provider_from_config(&config.memory))
        .build()
}

pub async fn run_turn(
    config: &RiflettConfig,
    text: &str,
    kinds: Vec<MemoryKind>,
    top_k: Option<usize>,
    time_zone: Option<String>,
) -> Result<(), RiflettError> {
    let engine = TurnEngine::new(
        Arc::new(open_store(config)),
        Arc::new(ContextWindow::new()),
        config,
    );
    let options = TurnOptions {
        kinds: (!kinds.is_empty()).then_some(kinds),
        top_k,
        scoring: ScoringOptions {
            user_time_zone: time_zone,
            coaching: None,
        },
    };
    let outcome = engine.handle_utterance(text, options).await?;
    print_json(&outcome)
}

#[derive(Debug, Serialize)]
struct Remembered {
    id: String,
    kind: MemoryKind,
    ts: i64,
    near_duplicate: Option<NearDuplicate>,
}

#[derive(Debug, Serialize)]
struct NearDuplicate {
    id: String,
    score: f32,
}

pub async fn run_remember(
    config: &RiflettConfig,
    id: Option<String>,
    kind: MemoryKind,
    ts: Option<i64>,
    text: String,
) -> Result<(), RiflettError> {
    if text.trim().is_empty() {
        return Err(RiflettError::InvalidInput("text is empty".into()));
    }
    let id = id.unwrap_or_else(|| format!("{kind}:{}", Uuid::new_v4()));
    let store = open_store(config);

    let near_duplicate = store
        .find_near_duplicate(&text, kind)
        .await
        .filter(|d| d.row.id != id)
        .map(|d| NearDuplicate {
            id: d.row.id,
            score: d.score,
        });
    if let Some(dup) = &near_duplicate {
        warn!(id = %id, duplicate_of = %dup.id, score = dup.score, "storing a near-duplicate");
    }

    let mut new = NewRow::new(id, kind, text);
    if let Some(ts) = ts {
        new = new.at(ts);
    }
    let row = store.upsert(new).await;

    print_json(&Remembered {
        id: row.id,
        kind: row.kind,
        ts: row.ts,
        near_duplicate,
    })
}

pub async fn run_search(
    config: &RiflettConfig,
    query: &str,
    kinds: &[MemoryKind],
    top_k: Option<usize>,
) -> Result<(), RiflettError> {
    let store = open_store(config);
    let top_k = top_k.unwrap_or(config.memory.default_top_k);
    let records = store.search_top_n(query, kinds, top_k).await;
    print_json(&records)
}

pub async fn run_forget(config: &RiflettConfig, id: &str) -> Result<(), RiflettError> {
    let store = open_store(config);
    store.remove(id).await;
    print_json(&serde_json::json!({ "removed": id }))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), RiflettError> {
    let mut value = serde_json::to_value(value)
        .map_err(|e| RiflettError::Internal(format!("failed to serialize output: {e}")))?;
    strip_embeddings(&mut value);
    let text = serde_json::to_string_pretty(&value)
        .map_err(|e| RiflettError::Internal(format!("failed to render output: {e}")))?;
    println!("{text}");
    Ok(())
}

/// Drop raw vectors from CLI output.
fn strip_embeddings(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.remove("embedding");
            map.values_mut().for_each(strip_embeddings);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_embeddings),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config(dir: &std::path::Path) -> RiflettConfig {
        let mut config = RiflettConfig::default();
        config.storage.database_path = dir.join("memory.db").display().to_string();
        config.storage.snapshot_dir = dir.join("snapshot").display().to_string();
        config
    }

    #[test]
    fn embeddings_are_stripped_at_any_depth() {
        let mut value = serde_json::json!({
            "context": [{"id": "a", "embedding": [1.0]}],
            "linked": {"embedding": [], "score": 0.9}
        });
        strip_embeddings(&mut value);
        assert!(value["context"][0].get("embedding").is_none());
        assert!(value["linked"].get("embedding").is_none());
        assert_eq!(value["linked"]["score"], 0.9);
    }

    #[tokio::test]
    async fn remembered_rows_are_searchable_across_invocations() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(dir.path());

        run_remember(
            &config,
            Some("goal:1".into()),
            MemoryKind::Goal,
            None,
            "learn to play the cello".into(),
        )
        .await
        .unwrap();

        let store = open_store(&config);
        let hits = store
            .search_top_n("learn to play the cello", &[MemoryKind::Goal], 3)
            .await;
        assert_eq!(hits.first().map(|r| r.row.id.as_str()), Some("goal:1"));

        run_forget(&config, "goal:1").await.unwrap();
        let store = open_store(&config);
        assert!(store.search_top_n("cello", &[], 3).await.is_empty());
    }

    #[tokio::test]
    async fn remember_without_id_generates_one() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(dir.path());
        run_remember(&config, None, MemoryKind::Pref, None, "prefers tea".into())
            .await
            .unwrap();
        let hits = open_store(&config)
            .search_top_n("prefers tea", &[MemoryKind::Pref], 1)
            .await;
        assert!(hits[0].row.id.starts_with("pref:"));
        assert_eq!(hits[0].row.id.len(), "pref:".len() + 36);
    }

    #[tokio::test]
    async fn empty_remember_text_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_remember(&temp_config(dir.path()), None, MemoryKind::Entry, None, " ".into())
            .await
            .unwrap_err();
        assert!(matches!(err, RiflettError::InvalidInput(_)));
    }
}
