// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Riflett context and intent core.
//!
//! This crate provides the error type, shared domain types, and the
//! collaborator traits (embedding, flat storage, remote search, identity,
//! goal sources) that the memory store and goal engine depend on.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::RiflettError;
pub use types::{HealthStatus, MemoryKind, MemoryRecord, MemoryRow};

pub use traits::{
    EmbeddingBackend, FlatKeyValueStore, GoalEmbeddingSource, GoalReflectionSource,
    IdentityResolver, RemoteSearch,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn riflett_error_has_all_variants() {
        let _config = RiflettError::Config("test".into());
        let _storage = RiflettError::storage(std::io::Error::other("test"));
        let _embedding = RiflettError::Embedding {
            message: "test".into(),
            source: None,
        };
        let _remote = RiflettError::RemoteSearch {
            message: "test".into(),
            source: None,
        };
        let _auth = RiflettError::NotAuthenticated;
        let _input = RiflettError::InvalidInput("test".into());
        let _internal = RiflettError::Internal("test".into());
    }

    #[test]
    fn not_authenticated_message() {
        assert_eq!(RiflettError::NotAuthenticated.to_string(), "user not authenticated");
    }

    #[test]
    fn all_traits_are_object_safe() {
        fn _embedding(_: &dyn EmbeddingBackend) {}
        fn _flat(_: &dyn FlatKeyValueStore) {}
        fn _remote(_: &dyn RemoteSearch) {}
        fn _identity(_: &dyn IdentityResolver) {}
        fn _reflections(_: &dyn GoalReflectionSource) {}
        fn _embeddings(_: &dyn GoalEmbeddingSource) {}
    }
}
