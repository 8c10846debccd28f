//! Per-submission review and decision aggregation.
//!
//! Every function here is pure over already-fetched notes: replies are
//! partitioned into reviews and meta-decisions, a numeric score is pulled
//! out of each review, the newest meta-decision supplies the decision text,
//! and accepted submissions with a low average score get flagged.
//!
//! Field extraction degrades to `None`/empty on any miss; nothing in this
//! module errors.

use crate::models::{AggregatedResult, Note};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Score fields tried per review, in priority order.
const SCORE_FIELDS: &[&str] = &[
    "rating",
    "overall_assessment",
    "overall recommendation",
    "overall_recommendation",
    "recommendation",
    "overall",
    "overall_score",
];

/// Decision fields tried on a meta-decision, in priority order.
const DECISION_FIELDS: &[&str] = &[
    "recommendation",
    "final_recommendation",
    "final decision",
    "decision",
];

/// Leading integer or decimal token, e.g. the `6` in `"6: Weak Accept"`.
static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([0-9]+(\.[0-9]+)?)").unwrap());

/// Policy knobs for the low-score-accept flag.
#[derive(Debug, Clone)]
pub struct DecisionPolicy {
    /// Decision prefix (case-insensitive) that counts as accepted.
    pub accept_prefix: String,
    /// Average score below which an accepted submission is flagged.
    pub low_score_threshold: f64,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            accept_prefix: "accept".to_string(),
            low_score_threshold: 4.0,
        }
    }
}

/// Partition a thread's replies into reviews and meta-decisions.
///
/// Classification is a case-insensitive substring test on the invitation
/// label. The meta pattern is checked first: a meta-review label also
/// contains "review" and must not be counted as a review. Input order is
/// preserved within each partition.
pub fn classify_replies(replies: &[Note]) -> (Vec<&Note>, Vec<&Note>) {
    let mut reviews = Vec::new();
    let mut meta_decisions = Vec::new();

    for note in replies {
        let label = note.invitation_label();
        if label.contains("meta_review") || label.contains("meta-review") {
            meta_decisions.push(note);
        } else if label.contains("review") {
            reviews.push(note);
        }
    }

    (reviews, meta_decisions)
}

/// Parse a numeric score from a rating value.
///
/// Plain JSON numbers pass through; strings contribute their leading
/// numeric token (`"6: Weak Accept"` -> 6.0). Anything else is no score.
pub fn parse_numeric_score(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => LEADING_NUMBER
            .captures(s)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok()),
        _ => None,
    }
}

/// Extract the review's score from the first candidate field that parses.
///
/// Fields are tried in [`SCORE_FIELDS`] order, exact key first then
/// case-and-whitespace-insensitive. A field that exists but doesn't parse
/// does not stop the search; the first parsed field wins.
pub fn extract_score(review: &Note) -> Option<f64> {
    for &field in SCORE_FIELDS {
        if let Some(value) = review.content.first_match(&[field]) {
            if let Some(score) = parse_numeric_score(value) {
                return Some(score);
            }
        }
    }
    None
}

/// Arithmetic mean of the parseable review scores.
///
/// Reviews without a parseable score are ignored; `None` when no review
/// yields one.
pub fn average_score(reviews: &[&Note]) -> Option<f64> {
    let scores: Vec<f64> = reviews.iter().filter_map(|r| extract_score(r)).collect();
    if scores.is_empty() {
        return None;
    }
    Some(scores.iter().sum::<f64>() / scores.len() as f64)
}

/// Select the decision text from the newest meta-decision.
///
/// The meta-decision with the maximum creation timestamp wins; ties keep
/// the earliest in input order. The decision is read with the same
/// priority-field strategy as scores and trimmed. Empty or absent text
/// yields `None`.
pub fn select_decision(meta_decisions: &[&Note]) -> Option<String> {
    let newest = meta_decisions
        .iter()
        .enumerate()
        .max_by_key(|(idx, note)| (note.cdate.unwrap_or(0), std::cmp::Reverse(*idx)))
        .map(|(_, note)| note)?;

    let value = newest.content.first_match(DECISION_FIELDS)?;
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    };

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Whether a decided submission is an accept with a low average score.
///
/// True iff the decision starts with the accept prefix (case-insensitive),
/// a score average exists, and it is strictly below the threshold.
pub fn classify_low_score_accept(
    decision: &str,
    average_score: Option<f64>,
    policy: &DecisionPolicy,
) -> bool {
    let accepted = decision
        .to_lowercase()
        .starts_with(&policy.accept_prefix.to_lowercase());

    match average_score {
        Some(avg) => accepted && avg < policy.low_score_threshold,
        None => false,
    }
}

/// Aggregate one submission thread into its derived result.
pub fn aggregate_submission(replies: &[Note], policy: &DecisionPolicy) -> AggregatedResult {
    let (reviews, meta_decisions) = classify_replies(replies);

    let decision = select_decision(&meta_decisions).unwrap_or_default();
    let average_score = average_score(&reviews);
    let low_score_accept = classify_low_score_accept(&decision, average_score, policy);

    AggregatedResult {
        decision,
        average_score,
        low_score_accept,
    }
}
