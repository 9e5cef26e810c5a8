// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flat key-value store trait used by the bounded snapshot tier.

use async_trait::async_trait;

use crate::error::RiflettError;

/// A string-to-string store with whole-value reads and writes.
#[async_trait]
pub trait FlatKeyValueStore: Send + Sync + 'static {
    /// Read the value for `key`, if present.
    async fn get(&self, key: &str) -> Result<Option<String>, RiflettError>;

    /// Overwrite the value for `key`.
    async fn set(&self, key: &str, value: String) -> Result<(), RiflettError>;

    /// Delete `key`. Deleting a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), RiflettError>;
}
