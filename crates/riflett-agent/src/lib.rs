// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turn pipeline for the Riflett assistant.
//!
//! The [`TurnEngine`] handles one user utterance at a time:
//! - retrieves related memory and ranks it for context
//! - classifies the utterance against the context window
//! - routes the classification to commit, clarify, or fallback
//! - records the utterance in the context window

pub mod turn;

pub use turn::{TurnEngine, TurnOptions, TurnOutcome, wants_goal_context};
