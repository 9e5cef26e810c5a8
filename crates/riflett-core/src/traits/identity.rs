// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity resolution trait.

use async_trait::async_trait;

/// Resolves the currently authenticated user, if any.
#[async_trait]
pub trait IdentityResolver: Send + Sync + 'static {
    async fn current_user_id(&self) -> Option<String>;
}
