//! Candidate selection.
//!
//! The preference order is an explicit list of rules, evaluated in order until
//! one of them produces a selection:
//!
//! 1. a generated transcript in the preferred language
//! 2. a manual transcript in the preferred language
//! 3. the first translatable transcript in listing order, translated to the
//!    preferred language
//!
//! Only the first translatable candidate is ever considered.

use crate::sources::{Origin, SelectedTranscript, SelectionRule, TranscriptCandidate};
use crate::TranscriptError;

/// Rules in evaluation order
pub const SELECTION_ORDER: [SelectionRule; 3] = [
    SelectionRule::GeneratedInPreferred,
    SelectionRule::ManualInPreferred,
    SelectionRule::FirstTranslatable,
];

impl SelectionRule {
    /// Try this rule against the listed candidates
    pub fn apply(
        self,
        candidates: &[TranscriptCandidate],
        preferred_language: &str,
    ) -> Option<SelectedTranscript> {
        let native = |origin: Origin| {
            candidates
                .iter()
                .find(|c| c.origin == origin && c.language_code == preferred_language)
                .map(|c| SelectedTranscript {
                    candidate: c.clone(),
                    target_language: None,
                    rule: self,
                })
        };

        match self {
            SelectionRule::GeneratedInPreferred => native(Origin::Generated),
            SelectionRule::ManualInPreferred => native(Origin::Manual),
            SelectionRule::FirstTranslatable => candidates
                .iter()
                .find(|c| c.is_translatable)
                .map(|c| SelectedTranscript {
                    candidate: c.clone(),
                    target_language: Some(preferred_language.to_string()),
                    rule: self,
                }),
        }
    }
}

/// Pick the transcript to fetch for `preferred_language`
pub fn select(
    candidates: &[TranscriptCandidate],
    preferred_language: &str,
) -> Result<SelectedTranscript, TranscriptError> {
    SELECTION_ORDER
        .iter()
        .find_map(|rule| rule.apply(candidates, preferred_language))
        .ok_or_else(|| TranscriptError::NoSuitableTranscript {
            language: preferred_language.to_string(),
            available: describe(candidates),
        })
}

fn describe(candidates: &[TranscriptCandidate]) -> String {
    if candidates.is_empty() {
        return "none".to_string();
    }

    candidates
        .iter()
        .map(|c| {
            let translatable = if c.is_translatable { ", translatable" } else { "" };
            format!("{} ({}{})", c.language_code, c.origin, translatable)
        })
        .collect::<Vec<_>>()
        .join(", ")
}
