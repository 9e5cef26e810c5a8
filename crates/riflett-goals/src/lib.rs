// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Goal coherence for Riflett.
//!
//! A goal is scored from four signals (reflection density, emotional
//! consistency, micro-step momentum, and semantic drift of linked entries)
//! and labelled with a life-cycle [`GhiState`]. Results land in a
//! [`GoalHealthCache`] keyed by goal id.

pub mod cache;
pub mod engine;
pub mod signals;

pub use cache::GoalHealthCache;
pub use engine::{GoalCoherenceEngine, GoalHealth};
pub use signals::{GhiState, GoalSignals};
