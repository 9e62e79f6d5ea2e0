//! Mood classification for chat messages
//!
//! A pure, total function over arbitrary text: every input maps to exactly
//! one mood, with `Motivational` as the default. The outgoing user message
//! is tagged with the detected mood at submission time; a profile-derived
//! mood from the dashboard refresh may later overwrite the ambient value.

use serde::{Deserialize, Serialize};

/// Words that suggest financial anxiety
const STRESSED_WORDS: &[&str] = &[
    "stress", "worried", "worry", "anxious", "debt", "broke", "overspent", "overdue",
];

/// Words that suggest a win worth celebrating
const CELEBRATORY_WORDS: &[&str] = &[
    "saved", "achieved", "reached", "bonus", "congrats", "yay", "finally",
];

/// Words that suggest a plain informational request
const NEUTRAL_WORDS: &[&str] = &[
    "show", "list", "balance", "analyze", "analyse", "summary", "report",
];

/// Mood tag attached to chat messages and the ambient coach state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    #[default]
    Motivational,
    Stressed,
    Celebratory,
    Neutral,
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mood::Motivational => write!(f, "motivational"),
            Mood::Stressed => write!(f, "stressed"),
            Mood::Celebratory => write!(f, "celebratory"),
            Mood::Neutral => write!(f, "neutral"),
        }
    }
}

/// Classify the mood of a user utterance
///
/// Case-insensitive keyword scan; unmatched input yields the default mood.
/// No side effects and no failure mode.
pub fn classify_mood(text: &str) -> Mood {
    let lowered = text.to_lowercase();

    if contains_any(&lowered, STRESSED_WORDS) {
        Mood::Stressed
    } else if contains_any(&lowered, CELEBRATORY_WORDS) {
        Mood::Celebratory
    } else if contains_any(&lowered, NEUTRAL_WORDS) {
        Mood::Neutral
    } else {
        Mood::Motivational
    }
}

fn contains_any(lowered: &str, words: &[&str]) -> bool {
    words.iter().any(|w| lowered.contains(w))
}
