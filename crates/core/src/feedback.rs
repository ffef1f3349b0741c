//! Normalized Feedback
//!
//! The canonical per-utterance analysis produced from a model response.

use serde::{Deserialize, Serialize};

/// Lowest score a single answer can receive.
pub const MIN_SCORE: u8 = 0;
/// Highest score a single answer can receive.
pub const MAX_SCORE: u8 = 100;

/// Message used when an answer could not be analyzed.
pub const UNANALYZED_FEEDBACK: &str = "Could not analyze this answer";

/// Clamp an arbitrary model-provided score into `0..=100`.
///
/// Fractional scores are rounded to the nearest integer. Non-finite
/// values are treated as zero.
pub fn clamp_score(raw: f64) -> u8 {
    if !raw.is_finite() {
        return MIN_SCORE;
    }
    raw.round().clamp(MIN_SCORE as f64, MAX_SCORE as f64) as u8
}

/// Analysis of a single user utterance.
///
/// `overall_score` is always within `0..=100`; the only constructors clamp it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedFeedback {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    #[serde(deserialize_with = "deserialize_clamped_score")]
    pub overall_score: u8,
    pub feedback: String,
}

impl NormalizedFeedback {
    /// Build feedback from raw model values, clamping the score.
    pub fn new(
        strengths: Vec<String>,
        weaknesses: Vec<String>,
        raw_score: f64,
        feedback: impl Into<String>,
    ) -> Self {
        Self {
            strengths,
            weaknesses,
            overall_score: clamp_score(raw_score),
            feedback: feedback.into(),
        }
    }

    /// Degraded feedback for an answer the model could not analyze.
    pub fn empty() -> Self {
        Self {
            strengths: Vec::new(),
            weaknesses: Vec::new(),
            overall_score: MIN_SCORE,
            feedback: UNANALYZED_FEEDBACK.to_string(),
        }
    }

    /// Whether this is the degraded placeholder rather than a real analysis.
    pub fn is_empty(&self) -> bool {
        self.strengths.is_empty()
            && self.weaknesses.is_empty()
            && self.overall_score == MIN_SCORE
            && self.feedback == UNANALYZED_FEEDBACK
    }
}

fn deserialize_clamped_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(clamp_score(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_score_bounds() {
        assert_eq!(clamp_score(-12.0), 0);
        assert_eq!(clamp_score(150.0), 100);
        assert_eq!(clamp_score(77.4), 77);
        assert_eq!(clamp_score(77.5), 78);
        assert_eq!(clamp_score(f64::NAN), 0);
        assert_eq!(clamp_score(f64::INFINITY), 0);
    }

    #[test]
    fn test_new_clamps_score() {
        let fb = NormalizedFeedback::new(vec![], vec![], 240.0, "great");
        assert_eq!(fb.overall_score, 100);
    }

    #[test]
    fn test_empty_feedback() {
        let fb = NormalizedFeedback::empty();
        assert!(fb.is_empty());
        assert_eq!(fb.overall_score, 0);
        assert!(!NormalizedFeedback::new(vec!["ok".into()], vec![], 50.0, "x").is_empty());
    }

    #[test]
    fn test_serde_uses_camel_case() {
        let fb = NormalizedFeedback::new(vec!["clear".into()], vec!["short".into()], 81.0, "Good");
        let json = serde_json::to_value(&fb).unwrap();
        assert_eq!(json["overallScore"], 81);
        assert_eq!(json["strengths"][0], "clear");
    }

    #[test]
    fn test_deserialize_clamps_stored_score() {
        let fb: NormalizedFeedback = serde_json::from_str(
            r#"{"strengths":[],"weaknesses":[],"overallScore":130.6,"feedback":"x"}"#,
        )
        .unwrap();
        assert_eq!(fb.overall_score, 100);
    }
}
