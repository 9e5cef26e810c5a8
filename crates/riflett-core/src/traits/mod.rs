// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! Everything the core talks to across an I/O boundary is expressed here as
//! an `#[async_trait]` object-safe trait so hosts and tests can swap it.

pub mod embedding;
pub mod goals;
pub mod identity;
pub mod search;
pub mod storage;

pub use embedding::EmbeddingBackend;
pub use goals::{GoalEmbeddingSource, GoalReflectionSource};
pub use identity::IdentityResolver;
pub use search::RemoteSearch;
pub use storage::FlatKeyValueStore;
