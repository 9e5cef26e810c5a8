// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server-side search collaborator trait.

use async_trait::async_trait;

use crate::error::RiflettError;
use crate::types::{OperatingPicture, RemoteHit, SearchOptions, SearchScope};

/// Semantic search over the user's server-side records.
#[async_trait]
pub trait RemoteSearch: Send + Sync + 'static {
    /// Search the user's records, returning hits ordered by relevance.
    async fn search(
        &self,
        user_id: &str,
        query: &str,
        scope: &SearchScope,
        options: SearchOptions,
    ) -> Result<Vec<RemoteHit>, RiflettError>;

    /// Fetch the user's operating picture. Collaborators without one return `None`.
    async fn operating_picture(
        &self,
        _user_id: &str,
    ) -> Result<Option<OperatingPicture>, RiflettError> {
        Ok(None)
    }
}
