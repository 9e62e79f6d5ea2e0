//! Intent routing for user commands
//!
//! Deterministic, rule-based classification of surface text into exactly one
//! [`Intent`]. Rules are evaluated against the trimmed input, first match
//! wins: expense shape, then the goal grammar, then the advice fallback.

use once_cell::sync::Lazy;
use regex::Regex;

/// Currency marker followed by digits, e.g. "Rs 500", "rs.120"
static CURRENCY_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)rs\.?\s?\d+").expect("valid currency pattern"));

/// The classified purpose of a user utterance
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    /// Free-form expense text to hand to the remote transaction parser
    ExpenseFromText { raw_text: String },

    /// Well-formed "add goal" command
    GoalCreation { title: String, target: String },

    /// "add goal" with too few tokens; answered with a usage hint, no
    /// capability call is made
    GoalUsageHint,

    /// Fallback for everything else
    GenericAdvice,
}

/// Classify one user utterance
pub fn classify_intent(input: &str) -> Intent {
    let text = input.trim();

    if has_expense_shape(text) {
        return Intent::ExpenseFromText {
            raw_text: text.to_string(),
        };
    }

    if starts_with_add_goal(text) {
        return classify_goal(text);
    }

    Intent::GenericAdvice
}

/// Expense shape: an "at" token plus a currency-amount pattern
///
/// Token equality, not substring: "what" must not count as "at".
fn has_expense_shape(text: &str) -> bool {
    let has_at = text
        .split_whitespace()
        .any(|token| token.eq_ignore_ascii_case("at"));
    has_at && CURRENCY_AMOUNT.is_match(text)
}

fn starts_with_add_goal(text: &str) -> bool {
    text.get(..8)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("add goal"))
}

/// Tokenize an "add goal" command
///
/// With at least 4 whitespace tokens, the last token is the target amount
/// and the middle tokens form the title. Anything shorter degrades to the
/// usage hint.
fn classify_goal(text: &str) -> Intent {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() < 4 {
        return Intent::GoalUsageHint;
    }

    let target = tokens[tokens.len() - 1].to_string();
    let title = tokens[2..tokens.len() - 1].join(" ");
    Intent::GoalCreation { title, target }
}
