// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context window: the anchored record and recent user messages.
//!
//! The anchor's decay score starts at 1, shrinks by [`DECAY_FACTOR`] each
//! turn, and is topped up by substantive messages. Below
//! [`MIN_ACTIVE_SCORE`] the anchor is dropped.

use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tracing::debug;

/// Recent messages kept for duplicate-overlap checks.
pub const MAX_SEMANTIC_TURNS: usize = 10;
/// Per-turn multiplicative decay of the anchor.
pub const DECAY_FACTOR: f64 = 0.6;
/// Decay score below which the anchor is inactive.
pub const MIN_ACTIVE_SCORE: f64 = 0.2;

const UNKNOWN_ENTRY_TYPE: &str = "unknown";

/// Read-only view of the anchored record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowSnapshot {
    pub entry_id: String,
    pub entry_type: String,
    pub created_at: i64,
    pub decay_score: f64,
    pub is_active: bool,
}

/// A user message remembered by the window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentMessage {
    pub text: String,
    pub ts: i64,
    pub score: f64,
    pub is_receipt: bool,
}

#[derive(Debug, Clone)]
struct Anchor {
    entry_id: String,
    entry_type: String,
    created_at: i64,
    decay_score: f64,
}

#[derive(Debug, Default)]
struct WindowState {
    anchor: Option<Anchor>,
    messages: Vec<RecentMessage>,
}

/// Per-conversation context window. Cheap to share by reference.
#[derive(Debug, Default)]
pub struct ContextWindow {
    state: Mutex<WindowState>,
}

impl ContextWindow {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, WindowState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Anchor a freshly created record at full strength.
    pub fn register_entry(&self, entry_id: &str, entry_type: &str) {
        self.state().anchor = Some(Anchor {
            entry_id: entry_id.to_string(),
            entry_type: entry_type.to_string(),
            created_at: now_ms(),
            decay_score: 1.0,
        });
        debug!(entry_id, entry_type, "context window anchored");
    }

    /// Re-anchor at full strength, keeping the previous type when none is given.
    pub fn refresh_entry(&self, entry_id: &str, entry_type: Option<&str>) {
        let mut state = self.state();
        let entry_type = entry_type
            .map(str::to_string)
            .or_else(|| state.anchor.as_ref().map(|a| a.entry_type.clone()))
            .unwrap_or_else(|| UNKNOWN_ENTRY_TYPE.to_string());
        state.anchor = Some(Anchor {
            entry_id: entry_id.to_string(),
            entry_type,
            created_at: now_ms(),
            decay_score: 1.0,
        });
    }

    /// Drop the anchor and every remembered message.
    pub fn clear(&self) {
        let mut state = self.state();
        state.anchor = None;
        state.messages.clear();
    }

    pub fn snapshot(&self) -> Option<WindowSnapshot> {
        self.state().anchor.as_ref().map(|a| WindowSnapshot {
            entry_id: a.entry_id.clone(),
            entry_type: a.entry_type.clone(),
            created_at: a.created_at,
            decay_score: a.decay_score,
            is_active: a.decay_score >= MIN_ACTIVE_SCORE,
        })
    }

    /// Remember a user message and let it top up (or decay) the anchor.
    ///
    /// Receipts ("receipt"/"confirmed") score 1, survive pruning
    /// preferentially, and never drop the anchor.
    pub fn record_user_message(&self, text: &str) {
        if text.is_empty() {
            return;
        }
        let is_receipt = is_receipt(text);
        let message = RecentMessage {
            text: text.to_string(),
            ts: now_ms(),
            score: if is_receipt { 1.0 } else { message_score(text) },
            is_receipt,
        };
        let contribution = message.score * 0.5;

        let mut state = self.state();
        state.messages.push(message);
        prune(&mut state.messages);

        if let Some(anchor) = state.anchor.as_mut() {
            anchor.decay_score = (anchor.decay_score * DECAY_FACTOR + contribution).min(1.0);
            if anchor.decay_score < MIN_ACTIVE_SCORE && !is_receipt {
                debug!(entry_id = %anchor.entry_id, "context window anchor expired");
                state.anchor = None;
            }
        }
    }

    /// Up to [`MAX_SEMANTIC_TURNS`] messages, oldest first.
    pub fn recent(&self) -> Vec<RecentMessage> {
        let state = self.state();
        let skip = state.messages.len().saturating_sub(MAX_SEMANTIC_TURNS);
        state.messages[skip..].to_vec()
    }

    /// Close a turn: a created entry restores full strength, anything else decays.
    pub fn advance_turn(&self, created_entry: bool) {
        let mut state = self.state();
        let Some(anchor) = state.anchor.as_mut() else {
            return;
        };
        if created_entry {
            anchor.decay_score = 1.0;
            anchor.created_at = now_ms();
            return;
        }
        anchor.decay_score *= DECAY_FACTOR;
        if anchor.decay_score < MIN_ACTIVE_SCORE {
            state.anchor = None;
        }
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn is_receipt(text: &str) -> bool {
    let lowered = text.to_lowercase();
    lowered.contains("receipt") || lowered.contains("confirmed")
}

/// Substance of a message: token count and average token length.
pub fn message_score(text: &str) -> f64 {
    let lowered = text.trim().to_lowercase();
    let tokens: Vec<&str> = lowered
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        return 0.0;
    }
    let avg_len = tokens.iter().map(|t| t.len()).sum::<usize>() as f64 / tokens.len() as f64;
    let base = (tokens.len() as f64 / 12.0).min(1.0);
    let lexical = (avg_len / 5.0).min(1.0);
    (base * 0.6 + lexical * 0.4).min(1.0)
}

/// Keep receipts plus the newest non-receipts, then cap at the turn limit.
///
/// `messages` is in arrival order, so equal timestamps never reorder.
fn prune(messages: &mut Vec<RecentMessage>) {
    let mut budget = MAX_SEMANTIC_TURNS;
    let mut keep = vec![false; messages.len()];
    for (i, message) in messages.iter().enumerate().rev() {
        if message.is_receipt {
            keep[i] = true;
        } else if budget > 0 {
            budget -= 1;
            keep[i] = true;
        }
    }
    let mut flags = keep.into_iter();
    messages.retain(|_| flags.next().unwrap_or(false));
    let excess = messages.len().saturating_sub(MAX_SEMANTIC_TURNS);
    messages.drain(..excess);
}
