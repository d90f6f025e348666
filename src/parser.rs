//! Output parsing for free-text model responses.
//!
//! The evaluator and comparator prompts ask the model to emit `Score:` and
//! `Recommendation:` labels, but the collaborator is a free-text generation
//! API with no structured-output contract. Parsing is therefore lenient
//! pattern matching: a missing label is a data-quality signal (logged), never
//! a pipeline failure, so one row's malformed output cannot abort a batch.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Score returned when no `Score:` label is found in the model output.
pub const DEFAULT_SCORE: u8 = 50;

/// Final decision for a translated row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    /// The row is fit for inclusion in the gold-standard output set.
    #[serde(rename = "ACCEPT")]
    Accept,
    /// The row needs revision before inclusion.
    #[serde(rename = "REVISE")]
    Revise,
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Recommendation::Accept => write!(f, "ACCEPT"),
            Recommendation::Revise => write!(f, "REVISE"),
        }
    }
}

fn score_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)Score:\s*(\d+)").expect("valid score pattern"))
}

fn recommendation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)Recommendation:\s*(ACCEPT|REVISE)").expect("valid recommendation pattern")
    })
}

/// Extracts a quality score from model output.
///
/// Scans the entire text for the first `Score: <integer>` label
/// (case-insensitive) and clamps the value to 0..=100. Returns
/// [`DEFAULT_SCORE`] when no label is found.
pub fn extract_score(text: &str) -> u8 {
    if let Some(captures) = score_regex().captures(text) {
        let raw: u64 = captures[1].parse().unwrap_or(u64::from(u8::MAX));
        return raw.min(100) as u8;
    }
    tracing::warn!(
        default = DEFAULT_SCORE,
        "No score label found in model output, using default"
    );
    DEFAULT_SCORE
}

/// Extracts an accept/revise decision from model output.
///
/// Scans the entire text for the first `Recommendation: ACCEPT|REVISE` label
/// (case-insensitive). Defaults to [`Recommendation::Accept`] when no label
/// is found: an optimistic default, since the score and feedback still allow
/// downstream review.
pub fn extract_recommendation(text: &str) -> Recommendation {
    if let Some(captures) = recommendation_regex().captures(text) {
        if captures[1].eq_ignore_ascii_case("REVISE") {
            return Recommendation::Revise;
        }
        return Recommendation::Accept;
    }
    tracing::warn!("No recommendation label found in model output, defaulting to ACCEPT");
    Recommendation::Accept
}
