// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable rows survive reopening the database under either client shape.

use riflett_config::model::StorageShape;
use riflett_core::{MemoryKind, MemoryRow};
use riflett_storage::RowBackend;
use riflett_storage::queries::memory_rows;

fn goal_row() -> MemoryRow {
    MemoryRow {
        id: "goal:7".into(),
        kind: MemoryKind::Goal,
        text: "Ship the beta".into(),
        ts: 1_700_000_000_000,
        embedding: vec![0.0, 1.0],
    }
}

#[tokio::test]
async fn rows_written_by_one_shape_are_read_by_the_other() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memory.db");
    let path = path.to_str().unwrap();

    {
        let db = RowBackend::open(path, StorageShape::Legacy).await.unwrap();
        memory_rows::upsert_row(&db, &goal_row()).await.unwrap();
    }

    let db = RowBackend::open(path, StorageShape::Modern).await.unwrap();
    let rows = memory_rows::recent_rows(&db, 512).await.unwrap();
    assert_eq!(rows, vec![goal_row()]);
}

#[tokio::test]
async fn migrations_are_idempotent_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memory.db");
    let path = path.to_str().unwrap();

    for _ in 0..3 {
        let db = RowBackend::open(path, StorageShape::Auto).await.unwrap();
        db.ping().await.unwrap();
    }
}
