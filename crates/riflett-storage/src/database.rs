// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable row backend with two client shapes behind one `execute` contract.
//!
//! `Modern` serializes every statement through tokio-rusqlite's background
//! thread and reuses prepared statements. `Legacy` drives a plain blocking
//! connection on the blocking pool and wraps each call in its own
//! transaction. The shape is picked once at open time.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::types::Value;
use tracing::{debug, info, warn};

use riflett_config::model::StorageShape;
use riflett_core::RiflettError;

use crate::migrations;

/// Path that opens a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Result rows as positional SQLite values.
pub type Rows = Vec<Vec<Value>>;

/// Opened durable store, normalized to a single statement interface.
#[derive(Clone)]
pub enum RowBackend {
    /// Blocking client, one transaction per call.
    Legacy(Arc<Mutex<rusqlite::Connection>>),
    /// Async prepared-statement client on a dedicated thread.
    Modern(tokio_rusqlite::Connection),
}

impl std::fmt::Debug for RowBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.shape_name())
    }
}

impl RowBackend {
    /// Open `path` with the requested shape and apply migrations.
    ///
    /// `Auto` tries the modern client first and falls back to the legacy one.
    pub async fn open(path: &str, shape: StorageShape) -> Result<Self, RiflettError> {
        ensure_parent_dir(path)?;

        match shape {
            StorageShape::Modern => Self::open_modern(path).await,
            StorageShape::Legacy => Self::open_legacy(path).await,
            StorageShape::Auto => match Self::open_modern(path).await {
                Ok(backend) => Ok(backend),
                Err(e) => {
                    warn!(error = %e, path, "modern sqlite client unavailable, trying legacy");
                    Self::open_legacy(path).await
                }
            },
        }
    }

    async fn open_modern(path: &str) -> Result<Self, RiflettError> {
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(RiflettError::storage)?;

        conn.call(|conn| -> Result<(), std::io::Error> {
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))
                .map_err(std::io::Error::other)?;
            migrations::run_migrations_io(conn)
        })
        .await
        .map_err(RiflettError::storage)?;

        info!(path, shape = "modern", "durable row store opened");
        Ok(RowBackend::Modern(conn))
    }

    async fn open_legacy(path: &str) -> Result<Self, RiflettError> {
        let owned = path.to_string();
        let conn = tokio::task::spawn_blocking(move || -> Result<_, RiflettError> {
            let mut conn = rusqlite::Connection::open(&owned).map_err(RiflettError::storage)?;
            migrations::run_migrations(&mut conn)?;
            Ok(conn)
        })
        .await
        .map_err(|e| RiflettError::Internal(format!("legacy open task failed: {e}")))??;

        info!(path, shape = "legacy", "durable row store opened");
        Ok(RowBackend::Legacy(Arc::new(Mutex::new(conn))))
    }

    /// `"legacy"` or `"modern"`.
    pub fn shape_name(&self) -> &'static str {
        match self {
            RowBackend::Legacy(_) => "legacy",
            RowBackend::Modern(_) => "modern",
        }
    }

    /// Run one statement. Statements without result columns return no rows.
    pub async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<Rows, RiflettError> {
        let sql = sql.to_string();
        match self {
            RowBackend::Modern(conn) => conn
                .call(move |conn| run_statement(conn, &sql, params))
                .await
                .map_err(RiflettError::storage),
            RowBackend::Legacy(handle) => {
                let handle = Arc::clone(handle);
                tokio::task::spawn_blocking(move || -> Result<Rows, RiflettError> {
                    let mut conn = handle
                        .lock()
                        .map_err(|_| RiflettError::Internal("legacy connection poisoned".into()))?;
                    let tx = conn.transaction().map_err(RiflettError::storage)?;
                    let rows = run_statement(&tx, &sql, params).map_err(RiflettError::storage)?;
                    tx.commit().map_err(RiflettError::storage)?;
                    Ok(rows)
                })
                .await
                .map_err(|e| RiflettError::Internal(format!("legacy statement task failed: {e}")))?
            }
        }
    }

    /// Cheap liveness probe.
    pub async fn ping(&self) -> Result<(), RiflettError> {
        self.execute("SELECT 1", Vec::new()).await.map(|_| ())
    }
}

fn run_statement(
    conn: &rusqlite::Connection,
    sql: &str,
    params: Vec<Value>,
) -> Result<Rows, rusqlite::Error> {
    let mut stmt = conn.prepare_cached(sql)?;
    let params = rusqlite::params_from_iter(params);

    let columns = stmt.column_count();
    if columns == 0 {
        stmt.execute(params)?;
        return Ok(Vec::new());
    }

    let mut rows = stmt.query(params)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let values = (0..columns)
            .map(|i| row.get::<_, Value>(i))
            .collect::<Result<Vec<_>, _>>()?;
        out.push(values);
    }
    Ok(out)
}

fn ensure_parent_dir(path: &str) -> Result<(), RiflettError> {
    if path == IN_MEMORY {
        return Ok(());
    }
    if let Some(parent) = Path::new(path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(RiflettError::storage)?;
        debug!(dir = %parent.display(), "ensured database directory");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn roundtrip(shape: StorageShape) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("rows.db");
        let db = RowBackend::open(path.to_str().unwrap(), shape).await.unwrap();

        db.execute(
            "INSERT INTO memory_rows (id, kind, text, ts, embedding) VALUES (?1, ?2, ?3, ?4, ?5)",
            vec![
                Value::Text("entry:1".into()),
                Value::Text("entry".into()),
                Value::Text("hello".into()),
                Value::Integer(7),
                Value::Text("[1.0]".into()),
            ],
        )
        .await
        .unwrap();

        let rows = db
            .execute("SELECT id, ts FROM memory_rows", Vec::new())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], Value::Text("entry:1".into()));
        assert_eq!(rows[0][1], Value::Integer(7));
    }

    #[tokio::test]
    async fn modern_shape_executes_statements() {
        roundtrip(StorageShape::Modern).await;
    }

    #[tokio::test]
    async fn legacy_shape_executes_statements() {
        roundtrip(StorageShape::Legacy).await;
    }

    #[tokio::test]
    async fn auto_shape_prefers_modern() {
        let db = RowBackend::open(IN_MEMORY, StorageShape::Auto).await.unwrap();
        assert_eq!(db.shape_name(), "modern");
        db.ping().await.unwrap();
    }

    #[tokio::test]
    async fn open_under_regular_file_fails() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().join("memory.db");
        let result = RowBackend::open(path.to_str().unwrap(), StorageShape::Auto).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn bad_sql_is_an_error_not_a_panic() {
        let db = RowBackend::open(IN_MEMORY, StorageShape::Legacy).await.unwrap();
        let err = db.execute("SELEC nonsense", Vec::new()).await.unwrap_err();
        assert!(matches!(err, RiflettError::Storage { .. }));
    }
}
