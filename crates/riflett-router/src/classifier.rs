// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rule-cascade intent classification.
//!
//! Rules run in a fixed order and the first one that matches decides the
//! label. Some rules only annotate the evidence trail and never match, so
//! later verdicts still explain what earlier stages noticed. No model, no
//! network, no failure modes.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::debug;

use riflett_config::model::IntentConfig;
use riflett_context::{RecentMessage, WindowSnapshot};
use riflett_core::{MemoryKind, MemoryRecord};

/// The six intents a user utterance can carry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum IntentLabel {
    /// Reflective chat with no structured side effect.
    Conversational,
    /// Capture a new journal entry, goal, or event.
    EntryCreate,
    /// Talk about the record currently in focus.
    EntryDiscuss,
    /// Add to a record that already exists.
    EntryAppend,
    /// Slash command.
    Command,
    /// Look something up in past records.
    SearchQuery,
}

/// One label with its confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candidate {
    pub label: IntentLabel,
    pub confidence: f32,
}

/// A retrieved record similar enough to count as the same record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateMatch {
    pub id: String,
    pub score: f32,
    pub text: String,
    pub kind: MemoryKind,
}

/// Classification result with its evidence trail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationMeta {
    pub label: IntentLabel,
    /// Confidence in [0, 1].
    pub confidence: f32,
    /// Which heuristics fired, in cascade order.
    pub reasons: Vec<String>,
    pub target_entry_id: Option<String>,
    pub target_entry_type: Option<String>,
    pub duplicate_match: Option<DuplicateMatch>,
    /// Label-unique, confidence-descending, chosen label first.
    pub top_candidates: Vec<Candidate>,
}

/// Everything the classifier looks at for one utterance.
#[derive(Debug, Clone, Copy)]
pub struct ClassifierInput<'a> {
    pub text: &'a str,
    /// Retrieved records, best match first.
    pub records: &'a [MemoryRecord],
    pub window: Option<&'a WindowSnapshot>,
    pub recent: &'a [RecentMessage],
}

impl<'a> ClassifierInput<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            records: &[],
            window: None,
            recent: &[],
        }
    }

    pub fn with_records(mut self, records: &'a [MemoryRecord]) -> Self {
        self.records = records;
        self
    }

    pub fn with_window(mut self, window: Option<&'a WindowSnapshot>) -> Self {
        self.window = window;
        self
    }

    pub fn with_recent(mut self, recent: &'a [RecentMessage]) -> Self {
        self.recent = recent;
        self
    }
}

/// Phrases that mark a lookup into past records.
const SEARCH_PHRASES: &[&str] = &[
    "find",
    "show me",
    "search for",
    "when did i",
    "where did i",
    "what did i write",
    "look up",
    "list",
];

/// Phrases that add to something already said.
const ADDITIVE_PHRASES: &[&str] = &[
    "also",
    "update",
    "another",
    "forgot",
    "in addition",
    "plus",
    "adding",
    "one more thing",
];

/// Explicit capture language.
const SAVE_PHRASES: &[&str] = &[
    "save",
    "log",
    "capture",
    "remember",
    "write this down",
    "note that",
    "journal",
    "record",
];

const TEMPORAL_MARKERS: &[&str] = &[
    "today",
    "tonight",
    "this morning",
    "this afternoon",
    "this evening",
    "yesterday",
    "earlier",
    "just now",
    "right now",
    "tomorrow",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Verbs that describe something concrete the user did.
const ACTION_VERBS: &[&str] = &[
    "finished",
    "completed",
    "did",
    "ran",
    "talked",
    "spoke",
    "met",
    "decided",
    "started",
    "launched",
    "sent",
    "emailed",
    "called",
    "worked",
    "wrote",
    "built",
    "shipped",
];

static PRONOUN_ANCHORS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(it|this|that|the goal|the entry|that goal|this entry|that plan|the plan|that project|this project)\b",
    )
    .unwrap()
});

static CLOCK_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2}(:\d{2})?\s?(am|pm))\b").unwrap());

/// Word count above which any declarative text is worth capturing.
const CAPTURE_WORD_COUNT: usize = 25;
/// Word count that earns the long-text capture boost.
const LONG_CAPTURE_WORD_COUNT: usize = 60;
/// Lower-cased length above which a search phrase scores higher.
const LONG_SEARCH_CHARS: usize = 24;

/// Features computed once per utterance and shared by every rule.
struct Signals<'a> {
    trimmed: &'a str,
    lower: String,
    window: Option<&'a WindowSnapshot>,
    recent: &'a [RecentMessage],
    duplicate: Option<&'a MemoryRecord>,
    duplicate_prefix_len: usize,
    in_window: bool,
    has_additive: bool,
    has_pronoun_anchor: bool,
    has_save: bool,
    has_temporal: bool,
    has_action: bool,
    is_question: bool,
    word_count: usize,
}

impl<'a> Signals<'a> {
    fn new(input: &ClassifierInput<'a>, config: &IntentConfig) -> Self {
        let trimmed = input.text.trim();
        let lower = trimmed.to_lowercase();

        let duplicate = input
            .records
            .iter()
            .find(|record| record.score >= config.duplicate_threshold);

        Self {
            trimmed,
            window: input.window,
            recent: input.recent,
            duplicate,
            duplicate_prefix_len: config.duplicate_prefix_len,
            in_window: input.window.is_some_and(|w| w.is_active),
            has_additive: contains_any(&lower, ADDITIVE_PHRASES),
            has_pronoun_anchor: PRONOUN_ANCHORS.is_match(trimmed),
            has_save: contains_any(&lower, SAVE_PHRASES),
            has_temporal: contains_any(&lower, TEMPORAL_MARKERS) || CLOCK_TIME.is_match(&lower),
            has_action: contains_any(&lower, ACTION_VERBS),
            is_question: trimmed.contains('?'),
            word_count: trimmed.split_whitespace().count(),
            lower,
        }
    }

    fn window_target(&self) -> (Option<String>, Option<String>) {
        match self.window {
            Some(w) => (Some(w.entry_id.clone()), Some(w.entry_type.clone())),
            None => (None, None),
        }
    }

    fn duplicate_target(&self) -> (Option<String>, Option<String>) {
        match self.duplicate {
            Some(d) => (
                Some(d.row.id.clone()),
                entry_type_for(d.row.kind).map(str::to_string),
            ),
            None => (None, None),
        }
    }
}

fn contains_any(text: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| text.contains(p))
}

/// Entry type a duplicate's kind targets, if any.
pub fn entry_type_for(kind: MemoryKind) -> Option<&'static str> {
    match kind {
        MemoryKind::Goal => Some("goal"),
        MemoryKind::Event | MemoryKind::Schedule => Some("schedule"),
        MemoryKind::Entry => Some("journal"),
        MemoryKind::Pref => None,
    }
}

/// A matched rule's decision before the shared fields are attached.
struct Verdict {
    label: IntentLabel,
    confidence: f32,
    target: (Option<String>, Option<String>),
    candidates: Vec<(IntentLabel, f32)>,
}

impl Verdict {
    fn new(label: IntentLabel, confidence: f32, alternatives: &[(IntentLabel, f32)]) -> Self {
        let mut candidates = vec![(label, confidence)];
        candidates.extend_from_slice(alternatives);
        Self {
            label,
            confidence,
            target: (None, None),
            candidates,
        }
    }

    fn targeting(mut self, target: (Option<String>, Option<String>)) -> Self {
        self.target = target;
        self
    }
}

type RuleFn = fn(&Signals<'_>, &mut Vec<String>) -> Option<Verdict>;

/// One step of the cascade.
struct Rule {
    name: &'static str,
    /// Whether a verdict from this rule reports the duplicate match.
    reports_duplicate: bool,
    apply: RuleFn,
}

/// Cascade order. First match wins; `conversational` closes it.
const RULES: &[Rule] = &[
    Rule { name: "empty", reports_duplicate: false, apply: empty_text },
    Rule { name: "command", reports_duplicate: false, apply: slash_command },
    Rule { name: "search", reports_duplicate: false, apply: search_phrase },
    Rule { name: "duplicate_additive", reports_duplicate: true, apply: duplicate_with_additive },
    Rule { name: "pronoun_anchor", reports_duplicate: true, apply: anchored_pronoun },
    Rule { name: "duplicate_note", reports_duplicate: true, apply: note_unconsumed_duplicate },
    Rule { name: "declarative_capture", reports_duplicate: true, apply: declarative_capture },
    Rule { name: "additive_followup", reports_duplicate: true, apply: additive_followup },
    Rule { name: "window_followup", reports_duplicate: true, apply: window_followup },
    Rule { name: "recent_overlap", reports_duplicate: true, apply: recent_overlap },
];

fn empty_text(s: &Signals<'_>, reasons: &mut Vec<String>) -> Option<Verdict> {
    if !s.trimmed.is_empty() {
        return None;
    }
    reasons.push("Empty message defaults to conversational".into());
    Some(Verdict::new(IntentLabel::Conversational, 0.6, &[]))
}

fn slash_command(s: &Signals<'_>, reasons: &mut Vec<String>) -> Option<Verdict> {
    if !s.trimmed.starts_with('/') {
        return None;
    }
    reasons.push("Slash-prefixed command detected".into());
    Some(Verdict::new(IntentLabel::Command, 0.99, &[]))
}

fn search_phrase(s: &Signals<'_>, reasons: &mut Vec<String>) -> Option<Verdict> {
    if !contains_any(&s.lower, SEARCH_PHRASES) {
        return None;
    }
    reasons.push("Search verb detected".into());
    let confidence = if s.lower.chars().count() > LONG_SEARCH_CHARS {
        0.94
    } else {
        0.9
    };
    Some(Verdict::new(
        IntentLabel::SearchQuery,
        confidence,
        &[(IntentLabel::Conversational, 0.7)],
    ))
}

fn duplicate_with_additive(s: &Signals<'_>, reasons: &mut Vec<String>) -> Option<Verdict> {
    if s.duplicate.is_none() || !s.has_additive {
        return None;
    }
    reasons.push("High-similarity memory match with additive language".into());
    Some(
        Verdict::new(
            IntentLabel::EntryAppend,
            0.91,
            &[(IntentLabel::EntryDiscuss, 0.8), (IntentLabel::EntryCreate, 0.6)],
        )
        .targeting(s.duplicate_target()),
    )
}

fn anchored_pronoun(s: &Signals<'_>, reasons: &mut Vec<String>) -> Option<Verdict> {
    if !s.in_window || !s.has_pronoun_anchor {
        return None;
    }
    reasons.push("Within entry context window with pronoun reference".into());
    let append = if s.has_additive { 0.82 } else { 0.7 };
    Some(
        Verdict::new(
            IntentLabel::EntryDiscuss,
            0.96,
            &[(IntentLabel::EntryAppend, append), (IntentLabel::EntryCreate, 0.6)],
        )
        .targeting(s.window_target()),
    )
}

/// Annotates a duplicate that had no additive cue. Never matches.
fn note_unconsumed_duplicate(s: &Signals<'_>, reasons: &mut Vec<String>) -> Option<Verdict> {
    if s.duplicate.is_some() && !s.has_additive {
        reasons.push("High-similarity memory match without clear additive cue".into());
    }
    None
}

fn declarative_capture(s: &Signals<'_>, reasons: &mut Vec<String>) -> Option<Verdict> {
    let capturable =
        s.has_save || (s.has_temporal && s.has_action) || s.word_count > CAPTURE_WORD_COUNT;
    if s.is_question || !capturable {
        return None;
    }

    let mut confidence: f32 = 0.86;
    if s.has_save {
        confidence += 0.08;
    }
    if s.has_temporal {
        confidence += 0.03;
    }
    if s.word_count > LONG_CAPTURE_WORD_COUNT {
        confidence += 0.03;
    }
    let confidence = confidence.min(0.97);

    reasons.push("Declarative content suitable for structured capture".into());
    if s.has_save {
        reasons.push("Explicit save/log intent detected".into());
    }
    if s.has_temporal {
        reasons.push("Temporal marker detected".into());
    }
    if s.has_action {
        reasons.push("Concrete action verb detected".into());
    }

    let append = if s.duplicate.is_some() { 0.78 } else { 0.62 };
    Some(Verdict::new(
        IntentLabel::EntryCreate,
        confidence,
        &[(IntentLabel::EntryAppend, append), (IntentLabel::Conversational, 0.6)],
    ))
}

fn additive_followup(s: &Signals<'_>, reasons: &mut Vec<String>) -> Option<Verdict> {
    if !s.has_additive || s.duplicate.is_none() {
        return None;
    }
    reasons.push("Additive phrasing referencing prior context".into());
    Some(
        Verdict::new(
            IntentLabel::EntryAppend,
            0.88,
            &[(IntentLabel::EntryDiscuss, 0.72), (IntentLabel::Conversational, 0.65)],
        )
        .targeting(s.duplicate_target()),
    )
}

fn window_followup(s: &Signals<'_>, reasons: &mut Vec<String>) -> Option<Verdict> {
    if !s.in_window || s.is_question {
        return None;
    }
    reasons.push("Context window active; defaulting follow-up to discuss".into());
    Some(
        Verdict::new(
            IntentLabel::EntryDiscuss,
            0.78,
            &[(IntentLabel::EntryCreate, 0.6), (IntentLabel::Conversational, 0.58)],
        )
        .targeting(s.window_target()),
    )
}

fn recent_overlap(s: &Signals<'_>, reasons: &mut Vec<String>) -> Option<Verdict> {
    let duplicate = s.duplicate?;
    let text = &duplicate.row.text;
    if text.chars().count() < s.duplicate_prefix_len {
        return None;
    }

    let prefix: String = text
        .chars()
        .take(s.duplicate_prefix_len)
        .collect::<String>()
        .to_lowercase();
    let overlaps = s
        .recent
        .iter()
        .any(|message| message.text.to_lowercase().contains(&prefix));
    if !overlaps {
        return None;
    }

    reasons.push("Recent message references similar content; favour append".into());
    Some(
        Verdict::new(
            IntentLabel::EntryAppend,
            0.8,
            &[(IntentLabel::EntryDiscuss, 0.7), (IntentLabel::Conversational, 0.65)],
        )
        .targeting(s.duplicate_target()),
    )
}

fn conversational(s: &Signals<'_>, reasons: &mut Vec<String>) -> Verdict {
    let (confidence, search) = if s.is_question {
        reasons.push("Question format leaning conversational".into());
        (0.9, 0.58)
    } else {
        reasons.push("Defaulting to reflective conversational mode".into());
        (0.82, 0.4)
    };

    let target_id = s
        .window
        .filter(|w| w.is_active)
        .map(|w| w.entry_id.clone());
    let target_type = s.window.map(|w| w.entry_type.clone());

    Verdict::new(
        IntentLabel::Conversational,
        confidence,
        &[(IntentLabel::SearchQuery, search), (IntentLabel::EntryCreate, 0.35)],
    )
    .targeting((target_id, target_type))
}

/// Orders candidates by confidence and drops repeated labels.
///
/// The sort is stable, so on a tie the rule's own label (listed first) stays
/// ahead of its alternatives.
fn rank_candidates(mut raw: Vec<(IntentLabel, f32)>) -> Vec<Candidate> {
    raw.sort_by(|a, b| b.1.total_cmp(&a.1));
    let mut out: Vec<Candidate> = Vec::with_capacity(raw.len());
    for (label, confidence) in raw {
        if out.iter().all(|c| c.label != label) {
            out.push(Candidate { label, confidence });
        }
    }
    out
}

/// Heuristic intent classifier.
#[derive(Debug, Clone, Default)]
pub struct IntentClassifier {
    config: IntentConfig,
}

impl IntentClassifier {
    /// Create a classifier with explicit duplicate settings.
    pub fn new(config: IntentConfig) -> Self {
        Self { config }
    }

    /// Classify one utterance against retrieved records and the context window.
    pub fn classify(&self, input: &ClassifierInput<'_>) -> ClassificationMeta {
        let signals = Signals::new(input, &self.config);
        let mut reasons = Vec::new();

        let mut matched = None;
        for rule in RULES {
            if let Some(verdict) = (rule.apply)(&signals, &mut reasons) {
                matched = Some((rule.name, rule.reports_duplicate, verdict));
                break;
            }
        }
        let (rule, reports_duplicate, verdict) = match matched {
            Some(found) => found,
            None => ("conversational", true, conversational(&signals, &mut reasons)),
        };

        let duplicate_match = signals
            .duplicate
            .filter(|_| reports_duplicate)
            .map(|d| DuplicateMatch {
                id: d.row.id.clone(),
                score: d.score,
                text: d.row.text.clone(),
                kind: d.row.kind,
            });

        debug!(
            rule,
            label = %verdict.label,
            confidence = verdict.confidence,
            duplicate = duplicate_match.is_some(),
            "intent classified"
        );

        let (target_entry_id, target_entry_type) = verdict.target;
        ClassificationMeta {
            label: verdict.label,
            confidence: verdict.confidence,
            reasons,
            target_entry_id,
            target_entry_type,
            duplicate_match,
            top_candidates: rank_candidates(verdict.candidates),
        }
    }
}
