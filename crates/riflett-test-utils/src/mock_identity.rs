// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed identity resolver.

use async_trait::async_trait;

use riflett_core::IdentityResolver;

/// Always resolves to the same user, or to nobody.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    user_id: Option<String>,
}

impl StaticIdentity {
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            user_id: Some(id.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityResolver for StaticIdentity {
    async fn current_user_id(&self) -> Option<String> {
        self.user_id.clone()
    }
}
