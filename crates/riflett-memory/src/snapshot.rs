// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flat snapshot format: one JSON array of rows, most recent first.

use serde::Deserialize;
use tracing::warn;

use riflett_core::{MemoryKind, MemoryRow, RiflettError};

/// Key under which the snapshot lives in the flat key-value store.
pub const SNAPSHOT_KEY: &str = "riflett.memory.snapshot.v1";

/// Serialize the `capacity` most recent rows.
pub fn encode<'a>(
    rows: impl IntoIterator<Item = &'a MemoryRow>,
    capacity: usize,
) -> Result<String, RiflettError> {
    let mut rows: Vec<&MemoryRow> = rows.into_iter().collect();
    rows.sort_by(|a, b| b.ts.cmp(&a.ts));
    rows.truncate(capacity);
    serde_json::to_string(&rows).map_err(RiflettError::storage)
}

/// Lenient on-disk row shape; bad fields degrade one row, not the snapshot.
#[derive(Deserialize)]
struct StoredRow {
    id: String,
    kind: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    ts: i64,
    #[serde(default)]
    embedding: serde_json::Value,
}

/// Parse a snapshot. A malformed document yields no rows; a malformed
/// embedding yields an empty vector for that row; unknown kinds are skipped.
pub fn decode(json: &str) -> Vec<MemoryRow> {
    let items: Vec<serde_json::Value> = match serde_json::from_str(json) {
        Ok(items) => items,
        Err(e) => {
            warn!(error = %e, "flat snapshot unreadable, starting empty");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .filter_map(|item| {
            let stored: StoredRow = match serde_json::from_value(item) {
                Ok(row) => row,
                Err(e) => {
                    warn!(error = %e, "skipping malformed snapshot row");
                    return None;
                }
            };
            let Ok(kind) = stored.kind.parse::<MemoryKind>() else {
                warn!(id = %stored.id, kind = %stored.kind, "skipping snapshot row with unknown kind");
                return None;
            };
            let embedding = serde_json::from_value::<Vec<f32>>(stored.embedding).unwrap_or_else(|e| {
                warn!(id = %stored.id, error = %e, "malformed snapshot embedding, using empty vector");
                Vec::new()
            });
            Some(MemoryRow {
                id: stored.id,
                kind,
                text: stored.text,
                ts: stored.ts,
                embedding,
            })
        })
        .collect()
}
