// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Confidence routing: commit, ask, or fall back.
//!
//! Priority order: confidence at or above `route_at` commits, at or above
//! `clarify_lower` asks the user, anything lower falls back.

use riflett_config::model::RoutingConfig;
use serde::Serialize;
use tracing::debug;

use crate::classifier::IntentLabel;
use crate::definitions::RoutedIntent;

/// What the turn pipeline should do with a routed intent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouteDecision {
    /// Act on `primary`; `secondary` rides along when it is confident enough.
    Commit {
        primary: IntentLabel,
        secondary: Option<IntentLabel>,
    },
    /// Ask the user to confirm.
    Clarify { question: String },
    /// Too uncertain to act or ask.
    Fallback,
}

/// Stateless threshold router. Safe to share across tasks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Router {
    config: RoutingConfig,
}

impl Router {
    pub fn new(config: RoutingConfig) -> Self {
        Self { config }
    }

    /// Route one intent.
    pub fn route(&self, intent: &RoutedIntent) -> RouteDecision {
        let decision = if intent.confidence >= self.config.route_at {
            let secondary = if self.should_consider_secondary(intent) {
                intent.second_best
            } else {
                None
            };
            RouteDecision::Commit {
                primary: intent.label,
                secondary,
            }
        } else if intent.confidence >= self.config.clarify_lower {
            RouteDecision::Clarify {
                question: clarify_question(intent.label),
            }
        } else {
            RouteDecision::Fallback
        };

        debug!(
            label = %intent.label,
            confidence = intent.confidence,
            decision = ?decision,
            "intent routed"
        );
        decision
    }

    /// Whether the second-best intent clears the secondary threshold.
    pub fn should_consider_secondary(&self, intent: &RoutedIntent) -> bool {
        intent.second_best.is_some()
            && intent.second_confidence.unwrap_or(0.0) >= self.config.secondary
    }
}

/// `"Did you want to entry create?"` for `EntryCreate`.
pub fn clarify_question(label: IntentLabel) -> String {
    format!("Did you want to {}?", label.to_string().replace('_', " "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Candidate;

    fn intent(confidence: f32, second: Option<(IntentLabel, f32)>) -> RoutedIntent {
        let mut top_k = vec![Candidate {
            label: IntentLabel::EntryCreate,
            confidence,
        }];
        if let Some((label, confidence)) = second {
            top_k.push(Candidate { label, confidence });
        }
        RoutedIntent {
            label: IntentLabel::EntryCreate,
            confidence,
            second_best: second.map(|s| s.0),
            second_confidence: second.map(|s| s.1),
            top_k,
        }
    }

    #[test]
    fn boundaries_are_inclusive_at_the_lower_edge() {
        let router = Router::default();
        assert!(matches!(router.route(&intent(0.75, None)), RouteDecision::Commit { .. }));
        assert!(matches!(router.route(&intent(0.749, None)), RouteDecision::Clarify { .. }));
        assert!(matches!(router.route(&intent(0.45, None)), RouteDecision::Clarify { .. }));
        assert_eq!(router.route(&intent(0.449, None)), RouteDecision::Fallback);
    }

    #[test]
    fn secondary_attaches_only_above_threshold() {
        let router = Router::default();
        let with = router.route(&intent(0.9, Some((IntentLabel::EntryDiscuss, 0.6))));
        assert_eq!(
            with,
            RouteDecision::Commit {
                primary: IntentLabel::EntryCreate,
                secondary: Some(IntentLabel::EntryDiscuss),
            }
        );

        let without = router.route(&intent(0.9, Some((IntentLabel::EntryDiscuss, 0.59))));
        assert_eq!(
            without,
            RouteDecision::Commit {
                primary: IntentLabel::EntryCreate,
                secondary: None,
            }
        );
    }

    #[test]
    fn clarify_question_uses_label_words() {
        let router = Router::default();
        assert_eq!(
            router.route(&intent(0.6, None)),
            RouteDecision::Clarify {
                question: "Did you want to entry create?".into()
            }
        );
        assert_eq!(
            clarify_question(IntentLabel::SearchQuery),
            "Did you want to search query?"
        );
    }

    #[test]
    fn custom_thresholds_apply() {
        let router = Router::new(RoutingConfig {
            route_at: 0.5,
            clarify_lower: 0.2,
            secondary: 0.9,
        });
        assert!(matches!(router.route(&intent(0.55, None)), RouteDecision::Commit { .. }));
        assert_eq!(router.route(&intent(0.1, None)), RouteDecision::Fallback);
    }

    #[test]
    fn decision_serializes_with_kind_tag() {
        let json = serde_json::to_value(RouteDecision::Fallback).unwrap();
        assert_eq!(json["kind"], "fallback");
        let json = serde_json::to_value(RouteDecision::Clarify {
            question: "q".into(),
        })
        .unwrap();
        assert_eq!(json["kind"], "clarify");
        assert_eq!(json["question"], "q");
    }
}
