// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote search collaborator returning canned hits.

use std::sync::Mutex;

use async_trait::async_trait;

use riflett_core::types::{OperatingPicture, RemoteHit, SearchOptions, SearchScope};
use riflett_core::{RemoteSearch, RiflettError};

/// One captured `search` call.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCall {
    pub user_id: String,
    pub query: String,
    pub scope: SearchScope,
    pub limit: usize,
}

/// Returns the same hits (truncated to the requested limit) on every call.
#[derive(Default)]
pub struct ScriptedRemoteSearch {
    hits: Vec<RemoteHit>,
    picture: Option<OperatingPicture>,
    fail: bool,
    calls: Mutex<Vec<RemoteCall>>,
}

impl ScriptedRemoteSearch {
    pub fn with_hits(hits: Vec<RemoteHit>) -> Self {
        Self {
            hits,
            ..Self::default()
        }
    }

    /// Every call fails with a remote search error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_picture(mut self, picture: OperatingPicture) -> Self {
        self.picture = Some(picture);
        self
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn fail_if_scripted(&self) -> Result<(), RiflettError> {
        if self.fail {
            return Err(RiflettError::RemoteSearch {
                message: "scripted failure".into(),
                source: None,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteSearch for ScriptedRemoteSearch {
    async fn search(
        &self,
        user_id: &str,
        query: &str,
        scope: &SearchScope,
        options: SearchOptions,
    ) -> Result<Vec<RemoteHit>, RiflettError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RemoteCall {
                user_id: user_id.to_string(),
                query: query.to_string(),
                scope: scope.clone(),
                limit: options.limit,
            });
        }
        self.fail_if_scripted()?;
        Ok(self.hits.iter().take(options.limit).cloned().collect())
    }

    async fn operating_picture(
        &self,
        _user_id: &str,
    ) -> Result<Option<OperatingPicture>, RiflettError> {
        self.fail_if_scripted()?;
        Ok(self.picture.clone())
    }
}
