// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File-backed flat key-value store: one file per key inside a directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use riflett_core::{FlatKeyValueStore, RiflettError};

/// Flat store that keeps each value in `<dir>/<key>`.
///
/// Writes go to a sibling temp file and are renamed into place, so a crash
/// mid-write leaves the previous value intact.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(file)
    }
}

#[async_trait]
impl FlatKeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, RiflettError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RiflettError::storage(e)),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), RiflettError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(RiflettError::storage)?;
        let path = self.path_for(key);
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        tokio::fs::write(&tmp, value)
            .await
            .map_err(RiflettError::storage)?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(RiflettError::storage)?;
        debug!(key, "flat value written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), RiflettError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RiflettError::storage(e)),
        }
    }
}
