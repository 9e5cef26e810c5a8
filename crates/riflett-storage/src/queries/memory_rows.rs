// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory row CRUD. Embeddings are stored as JSON arrays of floats.

use rusqlite::types::Value;
use tracing::warn;

use riflett_core::{MemoryKind, MemoryRow, RiflettError};

use crate::database::RowBackend;

/// Insert or overwrite a row (last writer wins on `id`).
pub async fn upsert_row(db: &RowBackend, row: &MemoryRow) -> Result<(), RiflettError> {
    let embedding = serde_json::to_string(&row.embedding).map_err(RiflettError::storage)?;
    db.execute(
        "INSERT OR REPLACE INTO memory_rows (id, kind, text, ts, embedding) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        vec![
            Value::Text(row.id.clone()),
            Value::Text(row.kind.as_str().to_string()),
            Value::Text(row.text.clone()),
            Value::Integer(row.ts),
            Value::Text(embedding),
        ],
    )
    .await?;
    Ok(())
}

/// Delete a row; deleting an absent id is not an error.
pub async fn delete_row(db: &RowBackend, id: &str) -> Result<(), RiflettError> {
    db.execute(
        "DELETE FROM memory_rows WHERE id = ?1",
        vec![Value::Text(id.to_string())],
    )
    .await?;
    Ok(())
}

/// The `limit` most recent rows, newest first.
///
/// Rows with an unknown kind are skipped. A malformed embedding yields an
/// empty vector for that row only.
pub async fn recent_rows(db: &RowBackend, limit: usize) -> Result<Vec<MemoryRow>, RiflettError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = db
        .execute(
            "SELECT id, kind, text, ts, embedding FROM memory_rows ORDER BY ts DESC LIMIT ?1",
            vec![Value::Integer(limit)],
        )
        .await?;
    Ok(rows.into_iter().filter_map(decode_row).collect())
}

/// Number of stored rows.
pub async fn count_rows(db: &RowBackend) -> Result<usize, RiflettError> {
    let rows = db
        .execute("SELECT COUNT(*) FROM memory_rows", Vec::new())
        .await?;
    match rows.first().and_then(|r| r.first()) {
        Some(Value::Integer(n)) => Ok(usize::try_from(*n).unwrap_or(0)),
        _ => Ok(0),
    }
}

fn decode_row(values: Vec<Value>) -> Option<MemoryRow> {
    let mut it = values.into_iter();
    let (Some(Value::Text(id)), Some(Value::Text(kind)), Some(Value::Text(text)), Some(ts)) =
        (it.next(), it.next(), it.next(), it.next())
    else {
        warn!("skipping memory row with unexpected column types");
        return None;
    };

    let Ok(kind) = kind.parse::<MemoryKind>() else {
        warn!(id = %id, kind = %kind, "skipping memory row with unknown kind");
        return None;
    };

    let ts = match ts {
        Value::Integer(n) => n,
        Value::Real(f) => f as i64,
        _ => 0,
    };

    let embedding = match it.next() {
        Some(Value::Text(json)) => parse_embedding(&id, &json),
        _ => Vec::new(),
    };

    Some(MemoryRow {
        id,
        kind,
        text,
        ts,
        embedding,
    })
}

/// Parse a stored embedding; malformed JSON becomes an empty vector.
pub fn parse_embedding(id: &str, json: &str) -> Vec<f32> {
    serde_json::from_str(json).unwrap_or_else(|e| {
        warn!(id, error = %e, "malformed stored embedding, using empty vector");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::IN_MEMORY;
    use riflett_config::model::StorageShape;

    fn row(id: &str, kind: MemoryKind, ts: i64) -> MemoryRow {
        MemoryRow {
            id: id.to_string(),
            kind,
            text: format!("text for {id}"),
            ts,
            embedding: vec![0.6, 0.8],
        }
    }

    async fn setup() -> RowBackend {
        RowBackend::open(IN_MEMORY, StorageShape::Modern).await.unwrap()
    }

    #[tokio::test]
    async fn upsert_overwrites_by_id() {
        let db = setup().await;
        upsert_row(&db, &row("goal:1", MemoryKind::Goal, 1)).await.unwrap();
        let mut updated = row("goal:1", MemoryKind::Goal, 2);
        updated.text = "rewritten".into();
        upsert_row(&db, &updated).await.unwrap();

        let rows = recent_rows(&db, 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text, "rewritten");
        assert_eq!(rows[0].embedding, vec![0.6, 0.8]);
    }

    #[tokio::test]
    async fn recent_rows_newest_first_and_bounded() {
        let db = setup().await;
        for i in 0..5 {
            upsert_row(&db, &row(&format!("entry:{i}"), MemoryKind::Entry, i))
                .await
                .unwrap();
        }
        let rows = recent_rows(&db, 3).await.unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["entry:4", "entry:3", "entry:2"]);
        assert_eq!(count_rows(&db).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn delete_absent_row_is_noop() {
        let db = setup().await;
        delete_row(&db, "entry:missing").await.unwrap();
        upsert_row(&db, &row("entry:1", MemoryKind::Entry, 1)).await.unwrap();
        delete_row(&db, "entry:1").await.unwrap();
        assert_eq!(count_rows(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn malformed_embedding_yields_empty_vector() {
        let db = setup().await;
        db.execute(
            "INSERT INTO memory_rows (id, kind, text, ts, embedding) VALUES ('entry:x', 'entry', 't', 1, 'not json')",
            Vec::new(),
        )
        .await
        .unwrap();
        db.execute(
            "INSERT INTO memory_rows (id, kind, text, ts, embedding) VALUES ('weird:x', 'mystery', 't', 2, '[]')",
            Vec::new(),
        )
        .await
        .unwrap();

        let rows = recent_rows(&db, 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "entry:x");
        assert!(rows[0].embedding.is_empty());
    }
}
