// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intent classification and confidence routing for the Riflett turn pipeline.
//!
//! This crate provides:
//! - [`IntentClassifier`]: ordered rule cascade over six intent labels, with
//!   an evidence trail explaining which heuristics fired
//! - [`RoutedIntent`]: a classification normalized into primary and
//!   second-best candidates with display names
//! - [`Router`]: commit / clarify / fallback decision from two thresholds
//!
//! Everything here is pure and total. No I/O, no errors.

pub mod classifier;
pub mod definitions;
pub mod router;

pub use classifier::{
    Candidate, ClassificationMeta, ClassifierInput, DuplicateMatch, IntentClassifier, IntentLabel,
};
pub use definitions::{IntentDefinition, RoutedIntent, Subsystem, definition};
pub use router::{RouteDecision, Router, clarify_question};
