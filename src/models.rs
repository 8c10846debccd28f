//! Data models for OpenReview records.
//!
//! This module contains the core data structures used throughout the
//! application for representing notes, groups, profiles, and derived rows.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// A single content field on a note.
///
/// OpenReview API v2 stores most fields as `{"value": ...}` while older
/// records carry the plain scalar. Both forms deserialize here and are
/// normalized by [`ContentField::value`] so the rest of the code never sees
/// the wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentField {
    /// The API v2 `{"value": ...}` form.
    Wrapped { value: Value },
    /// A bare scalar, list, or object.
    Plain(Value),
}

impl ContentField {
    /// Returns the inner value with the `{value: ...}` wrapper removed.
    pub fn value(&self) -> &Value {
        match self {
            ContentField::Wrapped { value } => value,
            ContentField::Plain(value) => value,
        }
    }
}

/// The content map of a note.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteContent(pub HashMap<String, ContentField>);

/// Normalize a field name for fuzzy matching: strip spaces, lowercase.
/// Underscores are significant; `"overall recommendation"` and
/// `"overall_recommendation"` are distinct candidates.
fn canonical_key(key: &str) -> String {
    key.replace(' ', "").to_lowercase()
}

impl NoteContent {
    /// Look up a field by exact name, unwrapped.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).map(ContentField::value)
    }

    /// Look up the first candidate field that exists.
    ///
    /// For each candidate in priority order, an exact key match is tried
    /// first, then a case-and-whitespace-insensitive match. Venues name the
    /// same field a dozen different ways; callers pass the full candidate
    /// list once instead of re-implementing the fallback chain.
    pub fn first_match(&self, candidates: &[&str]) -> Option<&Value> {
        for candidate in candidates {
            if let Some(field) = self.0.get(*candidate) {
                return Some(field.value());
            }
            let wanted = canonical_key(candidate);
            if let Some(field) = self
                .0
                .iter()
                .find(|(key, _)| canonical_key(key) == wanted)
                .map(|(_, field)| field)
            {
                return Some(field.value());
            }
        }
        None
    }

    /// Look up a field and render it as a trimmed string.
    ///
    /// Missing fields and non-scalar values yield an empty string.
    pub fn text(&self, key: &str) -> String {
        match self.get(key) {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }
}

/// An OpenReview note: a submission, review, meta-review, or comment.
///
/// Only the handful of fields the extraction pipelines consume are modeled;
/// everything else the API returns is ignored on deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Note {
    /// Unique note id.
    #[serde(default)]
    pub id: String,
    /// Forum (thread) id grouping a submission with its replies.
    #[serde(default)]
    pub forum: Option<String>,
    /// Paper number assigned by the venue, when present.
    #[serde(default)]
    pub number: Option<u64>,
    /// Invitation labels classifying the note.
    #[serde(default)]
    pub invitations: Vec<String>,
    /// Creation timestamp (epoch milliseconds).
    #[serde(default)]
    pub cdate: Option<i64>,
    /// Named content fields.
    #[serde(default)]
    pub content: NoteContent,
}

/// Content keys that may carry the paper number when `number` is unset.
const NUMBER_FIELDS: &[&str] = &["number", "paper_number", "submission_number"];

impl Note {
    /// The first invitation label, lowercased, or empty.
    pub fn invitation_label(&self) -> String {
        self.invitations
            .first()
            .map(|inv| inv.to_lowercase())
            .unwrap_or_default()
    }

    /// The thread id: the forum when set, otherwise the note's own id.
    pub fn thread_id(&self) -> &str {
        self.forum.as_deref().unwrap_or(&self.id)
    }

    /// Extract the paper number, falling back through content fields.
    ///
    /// Returns `-1` when no usable number is found, so rows for malformed
    /// notes still sort to the front instead of being dropped.
    pub fn paper_number(&self) -> i64 {
        if let Some(n) = self.number {
            return n as i64;
        }
        for key in NUMBER_FIELDS {
            match self.content.get(key) {
                Some(Value::Number(n)) => {
                    if let Some(n) = n.as_i64() {
                        return n;
                    }
                }
                Some(Value::String(s)) => {
                    if let Ok(n) = s.trim().parse::<i64>() {
                        return n;
                    }
                }
                _ => {}
            }
        }
        -1
    }

    /// The submission title, trimmed.
    pub fn title(&self) -> String {
        self.content.text("title")
    }

    /// The author list joined with `", "`.
    ///
    /// Venues store this as either a list of names or a single string.
    pub fn authors(&self) -> String {
        match self.content.get("authors") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", "),
            Some(Value::String(s)) => s.trim().to_string(),
            _ => String::new(),
        }
    }

    /// The free-text venue tag (e.g. `"SEA @ NeurIPS 2025 Poster"`).
    pub fn venue_tag(&self) -> String {
        self.content.text("venue")
    }
}

/// An OpenReview group and its member list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Group {
    pub id: String,
    #[serde(default)]
    pub members: Vec<String>,
}

/// A resolved user profile.
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub id: String,
}

/// Presentation type derived from the venue tag of an accepted paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresentationType {
    Oral,
    Poster,
    /// The venue tag named neither format.
    #[serde(rename = "")]
    Unspecified,
}

impl PresentationType {
    /// Classify a venue tag by case-insensitive substring, "oral" first.
    pub fn from_venue_tag(tag: &str) -> Self {
        let lower = tag.to_lowercase();
        if lower.contains("oral") {
            PresentationType::Oral
        } else if lower.contains("poster") {
            PresentationType::Poster
        } else {
            PresentationType::Unspecified
        }
    }

    /// The CSV cell text for this presentation type.
    pub fn as_str(&self) -> &'static str {
        match self {
            PresentationType::Oral => "Oral",
            PresentationType::Poster => "Poster",
            PresentationType::Unspecified => "",
        }
    }
}

impl fmt::Display for PresentationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of the accepted-papers CSV.
#[derive(Debug, Clone, Serialize)]
pub struct AcceptedPaper {
    pub paper_number: i64,
    pub title: String,
    pub authors: String,
    pub presentation_type: PresentationType,
}

impl AcceptedPaper {
    /// Build a row from an accepted-submission note.
    pub fn from_note(note: &Note) -> Self {
        Self {
            paper_number: note.paper_number(),
            title: note.title(),
            authors: note.authors(),
            presentation_type: PresentationType::from_venue_tag(&note.venue_tag()),
        }
    }
}

/// One row of the decisions CSV.
///
/// `comment` is always empty; the column is kept so downstream spreadsheets
/// built against earlier exports keep working.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionRow {
    pub paper_number: i64,
    pub decision: String,
    pub comment: String,
}

/// Per-submission aggregation of decision and review scores.
///
/// At most one of these is produced per submission id.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedResult {
    /// The selected meta-review decision text, possibly empty.
    pub decision: String,
    /// Mean of the parseable review scores, absent when none parse.
    pub average_score: Option<f64>,
    /// Accepted with an average score below the configured threshold.
    pub low_score_accept: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn content_from(value: serde_json::Value) -> NoteContent {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_content_field_unwrap() {
        let content = content_from(json!({
            "title": {"value": "Wrapped Title"},
            "venue": "Plain Venue",
        }));
        assert_eq!(content.get("title"), Some(&json!("Wrapped Title")));
        assert_eq!(content.get("venue"), Some(&json!("Plain Venue")));
        assert_eq!(content.get("missing"), None);
    }

    #[test]
    fn test_first_match_prefers_exact() {
        let content = content_from(json!({
            "Overall Score": {"value": "3"},
            "rating": {"value": "7: Accept"},
        }));
        let value = content.first_match(&["rating", "overall_score"]).unwrap();
        assert_eq!(value, &json!("7: Accept"));
    }

    #[test]
    fn test_first_match_case_and_whitespace_insensitive() {
        let content = content_from(json!({
            "Overall Recommendation": {"value": "6"},
        }));
        let value = content.first_match(&["overall recommendation"]).unwrap();
        assert_eq!(value, &json!("6"));
    }

    #[test]
    fn test_first_match_underscores_are_significant() {
        let content = content_from(json!({
            "overall_recommendation": {"value": "5"},
        }));
        assert!(content.first_match(&["overall recommendation"]).is_none());
        assert!(content.first_match(&["overall_recommendation"]).is_some());
    }

    #[test]
    fn test_paper_number_prefers_note_field() {
        let note = Note {
            number: Some(12),
            content: content_from(json!({"paper_number": {"value": 99}})),
            ..Default::default()
        };
        assert_eq!(note.paper_number(), 12);
    }

    #[test]
    fn test_paper_number_content_fallback() {
        let note = Note {
            content: content_from(json!({"submission_number": {"value": "42"}})),
            ..Default::default()
        };
        assert_eq!(note.paper_number(), 42);

        let empty = Note::default();
        assert_eq!(empty.paper_number(), -1);
    }

    #[test]
    fn test_authors_list_and_string_forms() {
        let listed = Note {
            content: content_from(json!({"authors": {"value": ["Ada Lovelace", "Alan Turing"]}})),
            ..Default::default()
        };
        assert_eq!(listed.authors(), "Ada Lovelace, Alan Turing");

        let flat = Note {
            content: content_from(json!({"authors": " Grace Hopper "})),
            ..Default::default()
        };
        assert_eq!(flat.authors(), "Grace Hopper");
    }

    #[test]
    fn test_presentation_type_classification() {
        assert_eq!(
            PresentationType::from_venue_tag("SEA @ NeurIPS 2025 Oral"),
            PresentationType::Oral
        );
        assert_eq!(
            PresentationType::from_venue_tag("SEA @ NeurIPS 2025 Poster"),
            PresentationType::Poster
        );
        assert_eq!(
            PresentationType::from_venue_tag("Workshop Accept"),
            PresentationType::Unspecified
        );
    }

    #[test]
    fn test_presentation_type_oral_checked_before_poster() {
        assert_eq!(
            PresentationType::from_venue_tag("Oral and Poster Session"),
            PresentationType::Oral
        );
    }

    #[test]
    fn test_thread_id_falls_back_to_note_id() {
        let note = Note {
            id: "abc".to_string(),
            forum: None,
            ..Default::default()
        };
        assert_eq!(note.thread_id(), "abc");

        let reply = Note {
            id: "def".to_string(),
            forum: Some("abc".to_string()),
            ..Default::default()
        };
        assert_eq!(reply.thread_id(), "abc");
    }
}
