// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Riflett context and intent core.

use thiserror::Error;

/// The primary error type used across collaborator traits and core operations.
#[derive(Debug, Error)]
pub enum RiflettError {
    /// Configuration errors (invalid TOML, out-of-range thresholds).
    #[error("configuration error: {0}")]
    Config(String),

    /// Durable storage errors (database open, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Native embedding encoder errors.
    #[error("embedding error: {message}")]
    Embedding {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Remote search collaborator errors.
    #[error("remote search error: {message}")]
    RemoteSearch {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An identity-required operation ran without a resolvable user.
    #[error("user not authenticated")]
    NotAuthenticated,

    /// The caller supplied unusable input (e.g. an empty utterance).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RiflettError {
    /// Wrap any error as a storage failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        RiflettError::Storage {
            source: Box::new(err),
        }
    }
}
