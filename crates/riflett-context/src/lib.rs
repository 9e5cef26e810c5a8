// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversational context for the Riflett turn pipeline.
//!
//! - **ContextWindow**: which record the user is currently discussing, with
//!   per-turn decay, plus a short buffer of recent user messages
//! - **scoring**: composite ranking of retrieved memory records

pub mod scoring;
pub mod window;

pub use scoring::{CoachingKind, ScoreBreakdown, ScoredRecord, ScoringOptions, score_context_records};
pub use window::{ContextWindow, RecentMessage, WindowSnapshot};
