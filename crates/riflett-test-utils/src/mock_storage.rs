// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory flat key-value store.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use riflett_core::{FlatKeyValueStore, RiflettError};

/// Flat store backed by a `HashMap`. Share it through an `Arc` to simulate
/// a restart with two store instances.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    values: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `set`/`remove` calls fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `set` calls.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn check_writable(&self) -> Result<(), RiflettError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RiflettError::storage(std::io::Error::other("injected write failure")));
        }
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, RiflettError> {
        self.values
            .lock()
            .map_err(|_| RiflettError::Internal("mock store poisoned".into()))
    }
}

#[async_trait]
impl FlatKeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, RiflettError> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), RiflettError> {
        self.check_writable()?;
        self.lock()?.insert(key.to_string(), value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), RiflettError> {
        self.check_writable()?;
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn injected_failure_blocks_writes_only() {
        let store = MemoryKeyValueStore::new();
        store.set("k", "v".into()).await.unwrap();
        store.set_fail_writes(true);
        assert!(store.set("k", "w".into()).await.is_err());
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(store.writes(), 1);
    }
}
