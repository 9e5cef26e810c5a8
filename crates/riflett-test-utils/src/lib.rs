// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock collaborators for fast, deterministic Riflett tests.
//!
//! - [`MemoryKeyValueStore`] - in-memory flat store with injectable write failures
//! - [`ScriptedRemoteSearch`] - canned remote hits with call capture
//! - [`StaticIdentity`] - fixed (or absent) user
//! - [`FailingEmbedder`] / [`RecordingEmbedder`] - native encoder stand-ins
//! - [`InMemoryGoalSources`] - reflections and entry embeddings for goal tests

pub mod mock_embedder;
pub mod mock_goals;
pub mod mock_identity;
pub mod mock_remote;
pub mod mock_storage;

pub use mock_embedder::{FailingEmbedder, RecordingEmbedder};
pub use mock_goals::InMemoryGoalSources;
pub use mock_identity::StaticIdentity;
pub use mock_remote::{RemoteCall, ScriptedRemoteSearch};
pub use mock_storage::MemoryKeyValueStore;
