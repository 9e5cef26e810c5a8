// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static intent metadata and the routed view of a classification.

use serde::Serialize;
use strum::Display;

use crate::classifier::{Candidate, ClassificationMeta, IntentLabel};

/// Subsystem that handles an intent downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Subsystem {
    Entries,
    UserConfig,
    Knowledge,
}

/// Display and dispatch metadata for one intent label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IntentDefinition {
    pub label: IntentLabel,
    pub display_name: &'static str,
    pub subsystem: Subsystem,
    pub entry_type: Option<&'static str>,
    /// Whether the intent may run while a single entry is open in chat.
    pub allowed_in_entry_chat: bool,
}

const DEFINITIONS: [IntentDefinition; 6] = [
    IntentDefinition {
        label: IntentLabel::Conversational,
        display_name: "Conversational",
        subsystem: Subsystem::Entries,
        entry_type: Some("journal"),
        allowed_in_entry_chat: true,
    },
    IntentDefinition {
        label: IntentLabel::EntryCreate,
        display_name: "Entry Create",
        subsystem: Subsystem::Entries,
        entry_type: Some("journal"),
        allowed_in_entry_chat: false,
    },
    IntentDefinition {
        label: IntentLabel::EntryDiscuss,
        display_name: "Entry Discuss",
        subsystem: Subsystem::Entries,
        entry_type: Some("journal"),
        allowed_in_entry_chat: true,
    },
    IntentDefinition {
        label: IntentLabel::EntryAppend,
        display_name: "Entry Append",
        subsystem: Subsystem::Entries,
        entry_type: Some("journal"),
        allowed_in_entry_chat: true,
    },
    IntentDefinition {
        label: IntentLabel::Command,
        display_name: "Command",
        subsystem: Subsystem::UserConfig,
        entry_type: None,
        allowed_in_entry_chat: false,
    },
    IntentDefinition {
        label: IntentLabel::SearchQuery,
        display_name: "Search Query",
        subsystem: Subsystem::Knowledge,
        entry_type: None,
        allowed_in_entry_chat: true,
    },
];

/// Metadata for `label`.
pub fn definition(label: IntentLabel) -> &'static IntentDefinition {
    match label {
        IntentLabel::Conversational => &DEFINITIONS[0],
        IntentLabel::EntryCreate => &DEFINITIONS[1],
        IntentLabel::EntryDiscuss => &DEFINITIONS[2],
        IntentLabel::EntryAppend => &DEFINITIONS[3],
        IntentLabel::Command => &DEFINITIONS[4],
        IntentLabel::SearchQuery => &DEFINITIONS[5],
    }
}

/// Labels that may run inside an entry-scoped chat.
pub fn entry_chat_allowed() -> impl Iterator<Item = IntentLabel> {
    DEFINITIONS
        .iter()
        .filter(|d| d.allowed_in_entry_chat)
        .map(|d| d.label)
}

impl IntentLabel {
    /// Title-cased name, e.g. `"Entry Create"`.
    pub fn display_name(&self) -> &'static str {
        definition(*self).display_name
    }
}

/// A classification reduced to what the router and downstream handlers need.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutedIntent {
    pub label: IntentLabel,
    pub confidence: f32,
    pub second_best: Option<IntentLabel>,
    pub second_confidence: Option<f32>,
    /// Deduplicated, clamped, confidence-descending.
    pub top_k: Vec<Candidate>,
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

impl RoutedIntent {
    /// Build from a classification. The classifier's own label and
    /// confidence stand in when it produced no candidates.
    pub fn from_classification(meta: &ClassificationMeta) -> Self {
        let mut top_k: Vec<Candidate> = Vec::with_capacity(meta.top_candidates.len());
        for candidate in &meta.top_candidates {
            if top_k.iter().all(|c| c.label != candidate.label) {
                top_k.push(Candidate {
                    label: candidate.label,
                    confidence: clamp_unit(candidate.confidence),
                });
            }
        }
        top_k.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        if top_k.is_empty() {
            top_k.push(Candidate {
                label: meta.label,
                confidence: clamp_unit(meta.confidence),
            });
        }

        let primary = top_k[0];
        let second = top_k.iter().find(|c| c.label != primary.label).copied();

        Self {
            label: primary.label,
            confidence: primary.confidence,
            second_best: second.map(|c| c.label),
            second_confidence: second.map(|c| c.confidence),
            top_k,
        }
    }

    pub fn definition(&self) -> &'static IntentDefinition {
        definition(self.label)
    }

    /// One-line summary such as `"Entry Create (91%) → Entry Discuss (80%)"`.
    pub fn summarize(&self) -> String {
        let primary = format!(
            "{} ({:.0}%)",
            self.label.display_name(),
            self.confidence * 100.0
        );
        match (self.second_best, self.second_confidence) {
            (Some(label), Some(confidence)) => format!(
                "{primary} → {} ({:.0}%)",
                label.display_name(),
                confidence * 100.0
            ),
            _ => primary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(label: IntentLabel, confidence: f32, candidates: &[(IntentLabel, f32)]) -> ClassificationMeta {
        ClassificationMeta {
            label,
            confidence,
            reasons: vec![],
            target_entry_id: None,
            target_entry_type: None,
            duplicate_match: None,
            top_candidates: candidates
                .iter()
                .map(|&(label, confidence)| Candidate { label, confidence })
                .collect(),
        }
    }

    #[test]
    fn every_label_has_a_definition() {
        assert_eq!(definition(IntentLabel::EntryCreate).display_name, "Entry Create");
        assert_eq!(definition(IntentLabel::Command).subsystem, Subsystem::UserConfig);
        assert_eq!(definition(IntentLabel::SearchQuery).subsystem, Subsystem::Knowledge);
        assert_eq!(definition(IntentLabel::SearchQuery).entry_type, None);
        for def in DEFINITIONS {
            assert_eq!(definition(def.label).label, def.label);
        }
    }

    #[test]
    fn entry_chat_excludes_create_and_command() {
        let allowed: Vec<_> = entry_chat_allowed().collect();
        assert_eq!(allowed.len(), 4);
        assert!(!allowed.contains(&IntentLabel::EntryCreate));
        assert!(!allowed.contains(&IntentLabel::Command));
    }

    #[test]
    fn routed_intent_picks_primary_and_second() {
        let routed = RoutedIntent::from_classification(&meta(
            IntentLabel::EntryCreate,
            0.91,
            &[
                (IntentLabel::EntryDiscuss, 0.8),
                (IntentLabel::EntryCreate, 0.91),
                (IntentLabel::EntryDiscuss, 0.3),
                (IntentLabel::Conversational, 1.4),
            ],
        ));
        assert_eq!(routed.label, IntentLabel::Conversational);
        assert_eq!(routed.confidence, 1.0);
        assert_eq!(routed.second_best, Some(IntentLabel::EntryCreate));
        assert_eq!(routed.top_k.len(), 3);
        assert_eq!(routed.top_k[2].confidence, 0.8);
    }

    #[test]
    fn routed_intent_without_candidates_uses_label() {
        let routed = RoutedIntent::from_classification(&meta(IntentLabel::Command, 0.99, &[]));
        assert_eq!(routed.label, IntentLabel::Command);
        assert_eq!(routed.second_best, None);
        assert_eq!(routed.summarize(), "Command (99%)");
    }

    #[test]
    fn summary_reads_primary_then_second() {
        let routed = RoutedIntent::from_classification(&meta(
            IntentLabel::EntryCreate,
            0.91,
            &[(IntentLabel::EntryCreate, 0.91), (IntentLabel::EntryDiscuss, 0.8)],
        ));
        assert_eq!(routed.summarize(), "Entry Create (91%) → Entry Discuss (80%)");
    }

    #[test]
    fn nan_confidence_clamps_to_zero() {
        let routed = RoutedIntent::from_classification(&meta(
            IntentLabel::Conversational,
            f32::NAN,
            &[],
        ));
        assert_eq!(routed.confidence, 0.0);
    }
}
