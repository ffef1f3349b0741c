//! Response Normalizer
//!
//! Converts loosely structured model output into canonical shapes. Models
//! asked for JSON still wrap it in code fences, return one-element arrays,
//! pick their own key for the spoken text, or answer in plain prose. The
//! normalizer tries, in order:
//!
//! 1. parse the text directly as JSON
//! 2. strip code fences and parse again
//! 3. slice from the first `{`/`[` to the last `}`/`]` and parse again
//! 4. unwrap a top-level array to its first element
//! 5. for utterances, probe the configured key list
//! 6. for utterances, fall back to literal cleanup of the raw text
//!
//! Feedback additionally gets a field-level regex salvage when no JSON can
//! be parsed at all. All functions are pure.

use std::sync::OnceLock;

use interview_arena_core::NormalizedFeedback;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

/// Keys probed, in order, for the spoken text of an utterance.
pub const DEFAULT_UTTERANCE_KEYS: &[&str] = &[
    "openingLine",
    "response",
    "utterance",
    "speech",
    "text",
    "message",
    "phanHoi",
];

/// Normalization failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("Malformed AI response: {0}")]
    MalformedResponse(String),
}

impl NormalizeError {
    fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse(reason.into())
    }
}

/// Normalizer parameterized by the utterance key list.
#[derive(Debug, Clone)]
pub struct ResponseNormalizer {
    utterance_keys: Vec<String>,
}

impl Default for ResponseNormalizer {
    fn default() -> Self {
        Self::with_keys(DEFAULT_UTTERANCE_KEYS.iter().copied())
    }
}

impl ResponseNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom ordered key list for utterance extraction.
    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            utterance_keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn utterance_keys(&self) -> &[String] {
        &self.utterance_keys
    }

    /// Extract the spoken text from a model response.
    ///
    /// Fails only when nothing non-empty survives literal cleanup.
    pub fn normalize_utterance(&self, raw: &str) -> Result<String, NormalizeError> {
        if let Some(value) = parse_json_candidates(raw) {
            match first_element(value) {
                Value::String(text) if !text.trim().is_empty() => {
                    return Ok(text.trim().to_string());
                }
                Value::Object(map) => {
                    if let Some(text) = self.probe_keys(&map) {
                        return Ok(text);
                    }
                }
                _ => {}
            }
        }

        let cleaned = self.literal_cleanup(raw);
        if cleaned.is_empty() {
            return Err(NormalizeError::malformed("no text left after cleanup"));
        }
        Ok(cleaned)
    }

    /// Coerce a model response into `NormalizedFeedback`.
    ///
    /// Accepts `overallScore` or `score` (number or numeric string) and
    /// clamps it to `0..=100`.
    pub fn normalize_feedback(&self, raw: &str) -> Result<NormalizedFeedback, NormalizeError> {
        match parse_json_candidates(raw) {
            Some(value) => match first_element(value) {
                Value::Object(map) => feedback_from_map(&map),
                other => Err(NormalizeError::malformed(format!(
                    "expected a feedback object, got {}",
                    json_kind(&other)
                ))),
            },
            None => salvage_feedback(raw)
                .ok_or_else(|| NormalizeError::malformed("feedback fields not found")),
        }
    }

    /// Parse the JSON payload of a response without reshaping it.
    pub fn extract_json(&self, raw: &str) -> Result<Value, NormalizeError> {
        parse_json_candidates(raw).ok_or_else(|| NormalizeError::malformed("no JSON payload found"))
    }

    /// Deserialize a single object, unwrapping a top-level array first.
    pub fn normalize_object<T: DeserializeOwned>(&self, raw: &str) -> Result<T, NormalizeError> {
        let value = first_element(self.extract_json(raw)?);
        serde_json::from_value(value).map_err(|e| NormalizeError::malformed(e.to_string()))
    }

    fn probe_keys(&self, map: &Map<String, Value>) -> Option<String> {
        self.utterance_keys.iter().find_map(|key| match map.get(key) {
            Some(Value::String(text)) if !text.trim().is_empty() => Some(text.trim().to_string()),
            _ => None,
        })
    }

    /// Remove fences, JSON punctuation and known key labels from prose.
    fn literal_cleanup(&self, raw: &str) -> String {
        let mut text: String = strip_code_fences(raw)
            .chars()
            .filter(|c| !matches!(c, '{' | '}' | '[' | ']'))
            .collect();

        text = text.trim().to_string();
        for key in &self.utterance_keys {
            for label in [format!("\"{}\":", key), format!("{}:", key)] {
                if let Some(rest) = text.strip_prefix(label.as_str()) {
                    text = rest.trim().to_string();
                }
            }
        }

        text.trim()
            .trim_end_matches(',')
            .trim()
            .trim_matches('"')
            .replace("\\n", "\n")
            .replace("\\\"", "\"")
            .trim()
            .to_string()
    }
}

/// Strip a surrounding markdown code fence, keeping only its content.
///
/// The language tag after the opening fence is dropped. Text without a
/// fence is returned trimmed.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();

    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        let content_start = match after_fence.find('\n') {
            Some(nl) => nl + 1,
            None => after_fence
                .find(|c: char| !c.is_ascii_alphanumeric())
                .unwrap_or(after_fence.len()),
        };
        let content = &after_fence[content_start..];
        return match content.find("```") {
            Some(end) => content[..end].trim().to_string(),
            None => content.trim().to_string(),
        };
    }

    trimmed.to_string()
}

/// Slice from the first JSON opener to the last matching closer.
fn slice_json(text: &str) -> Option<&str> {
    let start = text.find(|c: char| c == '{' || c == '[')?;
    let closer = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(closer)?;
    (start < end).then(|| &text[start..=end])
}

/// Try the direct, fence-stripped and sliced forms of the text in order.
fn parse_json_candidates(raw: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(raw.trim()) {
        return Some(value);
    }

    let stripped = strip_code_fences(raw);
    if let Ok(value) = serde_json::from_str::<Value>(&stripped) {
        return Some(value);
    }

    slice_json(&stripped).and_then(|slice| serde_json::from_str::<Value>(slice).ok())
}

fn first_element(value: Value) -> Value {
    match value {
        Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
        other => other,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn feedback_from_map(map: &Map<String, Value>) -> Result<NormalizedFeedback, NormalizeError> {
    let strengths = map
        .get("strengths")
        .and_then(string_list)
        .ok_or_else(|| NormalizeError::malformed("missing strengths"))?;
    let weaknesses = map
        .get("weaknesses")
        .and_then(string_list)
        .ok_or_else(|| NormalizeError::malformed("missing weaknesses"))?;
    let score = map
        .get("overallScore")
        .or_else(|| map.get("score"))
        .and_then(number_value)
        .ok_or_else(|| NormalizeError::malformed("missing overallScore"))?;
    let feedback = match map.get("feedback") {
        Some(Value::String(text)) => text.trim().to_string(),
        _ => return Err(NormalizeError::malformed("missing feedback")),
    };

    Ok(NormalizedFeedback::new(strengths, weaknesses, score, feedback))
}

/// A list of strings; a lone string counts as a one-element list.
fn string_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
                .collect(),
        ),
        Value::String(s) if s.trim().is_empty() => Some(Vec::new()),
        Value::String(s) => Some(vec![s.trim().to_string()]),
        _ => None,
    }
}

fn number_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}

struct SalvagePatterns {
    score: Regex,
    strengths: Regex,
    weaknesses: Regex,
    feedback: Regex,
    quoted: Regex,
}

fn salvage_patterns() -> Option<&'static SalvagePatterns> {
    static PATTERNS: OnceLock<Option<SalvagePatterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            Some(SalvagePatterns {
                score: Regex::new(r#""(?:overallScore|score)"\s*:\s*"?(-?\d+(?:\.\d+)?)"#).ok()?,
                strengths: Regex::new(r#"(?s)"strengths"\s*:\s*\[(.*?)\]"#).ok()?,
                weaknesses: Regex::new(r#"(?s)"weaknesses"\s*:\s*\[(.*?)\]"#).ok()?,
                feedback: Regex::new(r#""feedback"\s*:\s*"((?:[^"\\]|\\.)*)""#).ok()?,
                quoted: Regex::new(r#""((?:[^"\\]|\\.)*)""#).ok()?,
            })
        })
        .as_ref()
}

/// Recover feedback fields from text that is not valid JSON, e.g. a
/// truncated response. Every field must be found.
fn salvage_feedback(raw: &str) -> Option<NormalizedFeedback> {
    let patterns = salvage_patterns()?;

    let quoted_items = |body: &str| -> Vec<String> {
        patterns
            .quoted
            .captures_iter(body)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().replace("\\\"", "\"").trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    };

    let score: f64 = patterns.score.captures(raw)?.get(1)?.as_str().parse().ok()?;
    let strengths = quoted_items(patterns.strengths.captures(raw)?.get(1)?.as_str());
    let weaknesses = quoted_items(patterns.weaknesses.captures(raw)?.get(1)?.as_str());
    let feedback = patterns
        .feedback
        .captures(raw)?
        .get(1)?
        .as_str()
        .replace("\\\"", "\"")
        .replace("\\n", "\n");

    Some(NormalizedFeedback::new(strengths, weaknesses, score, feedback.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    const FEEDBACK_JSON: &str = r#"{"strengths":["Clear structure","Good example"],"weaknesses":["Too long"],"overallScore":78,"feedback":"Solid answer."}"#;

    fn normalizer() -> ResponseNormalizer {
        ResponseNormalizer::default()
    }

    #[test]
    fn test_feedback_round_trips_well_formed_json() {
        let fb = normalizer().normalize_feedback(FEEDBACK_JSON).unwrap();
        assert_eq!(fb.strengths, vec!["Clear structure", "Good example"]);
        assert_eq!(fb.weaknesses, vec!["Too long"]);
        assert_eq!(fb.overall_score, 78);
        assert_eq!(fb.feedback, "Solid answer.");
    }

    #[test]
    fn test_fenced_feedback_matches_unfenced() {
        let fenced = format!("```json\n{}\n```", FEEDBACK_JSON);
        let plain = normalizer().normalize_feedback(FEEDBACK_JSON).unwrap();
        let from_fence = normalizer().normalize_feedback(&fenced).unwrap();
        assert_eq!(plain, from_fence);

        let bare_fence = format!("```\n{}\n```", FEEDBACK_JSON);
        assert_eq!(normalizer().normalize_feedback(&bare_fence).unwrap(), plain);
    }

    #[test]
    fn test_feedback_with_surrounding_prose() {
        let raw = format!("Here is my analysis:\n{}\nHope it helps!", FEEDBACK_JSON);
        let fb = normalizer().normalize_feedback(&raw).unwrap();
        assert_eq!(fb.overall_score, 78);
    }

    #[test]
    fn test_feedback_accepts_score_alias_and_clamps() {
        let raw = r#"{"strengths":[],"weaknesses":["Vague"],"score":"135","feedback":"x"}"#;
        let fb = normalizer().normalize_feedback(raw).unwrap();
        assert_eq!(fb.overall_score, 100);

        let raw = r#"{"strengths":[],"weaknesses":[],"overallScore":-4.2,"feedback":"x"}"#;
        assert_eq!(normalizer().normalize_feedback(raw).unwrap().overall_score, 0);

        let raw = r#"{"strengths":[],"weaknesses":[],"overallScore":72.6,"feedback":"x"}"#;
        assert_eq!(normalizer().normalize_feedback(raw).unwrap().overall_score, 73);
    }

    #[test]
    fn test_feedback_from_array_first_element() {
        let raw = format!("[{}]", FEEDBACK_JSON);
        let fb = normalizer().normalize_feedback(&raw).unwrap();
        assert_eq!(fb.feedback, "Solid answer.");
    }

    #[test]
    fn test_feedback_single_string_lists() {
        let raw = r#"{"strengths":"Confident","weaknesses":"","overallScore":60,"feedback":"ok"}"#;
        let fb = normalizer().normalize_feedback(raw).unwrap();
        assert_eq!(fb.strengths, vec!["Confident"]);
        assert!(fb.weaknesses.is_empty());
    }

    #[test]
    fn test_feedback_missing_fields_is_malformed() {
        let err = normalizer().normalize_feedback(r#"{"foo": 1}"#).unwrap_err();
        assert!(matches!(err, NormalizeError::MalformedResponse(_)));

        let err = normalizer()
            .normalize_feedback(r#"{"strengths":[],"weaknesses":[],"feedback":"no score"}"#)
            .unwrap_err();
        assert_eq!(err, NormalizeError::MalformedResponse("missing overallScore".into()));

        assert!(normalizer().normalize_feedback("I cannot rate this.").is_err());
        assert!(normalizer().normalize_feedback("\"just a string\"").is_err());
    }

    #[test]
    fn test_feedback_salvaged_from_truncated_json() {
        let raw = r#"{"strengths": ["Polite", "Calm tone"], "weaknesses": ["No follow-up"], "overallScore": 64, "feedback": "Decent start", "extra": "cut of"#;
        let fb = normalizer().normalize_feedback(raw).unwrap();
        assert_eq!(fb.strengths, vec!["Polite", "Calm tone"]);
        assert_eq!(fb.weaknesses, vec!["No follow-up"]);
        assert_eq!(fb.overall_score, 64);
        assert_eq!(fb.feedback, "Decent start");
    }

    #[test]
    fn test_salvage_requires_every_field() {
        let raw = r#"{"strengths": ["Polite"], "overallScore": 64, "feedback": "cut"#;
        assert!(normalizer().normalize_feedback(raw).is_err());
    }

    #[test]
    fn test_utterance_from_array() {
        assert_eq!(
            normalizer().normalize_utterance(r#"["hello there"]"#).unwrap(),
            "hello there"
        );
    }

    #[test]
    fn test_utterance_key_probe() {
        let n = normalizer();
        assert_eq!(n.normalize_utterance(r#"{"openingLine":"hi"}"#).unwrap(), "hi");
        assert_eq!(n.normalize_utterance(r#"{"response":"hi"}"#).unwrap(), "hi");
        assert_eq!(n.normalize_utterance(r#"{"phanHoi":"xin chào"}"#).unwrap(), "xin chào");
        // Earlier keys in the list win.
        assert_eq!(
            n.normalize_utterance(r#"{"text":"second","openingLine":"first"}"#).unwrap(),
            "first"
        );
    }

    #[test]
    fn test_fenced_opening_line() {
        let raw = "```json\n{\"openingLine\":\"Welcome!\"}\n```";
        assert_eq!(normalizer().normalize_utterance(raw).unwrap(), "Welcome!");
    }

    #[test]
    fn test_utterance_plain_text_passes_through() {
        let raw = "Hello, thanks for calling. How can I help?";
        assert_eq!(normalizer().normalize_utterance(raw).unwrap(), raw);
    }

    #[test]
    fn test_utterance_literal_cleanup_of_broken_json() {
        let raw = "{\"response\": \"I need a refund today\",";
        assert_eq!(
            normalizer().normalize_utterance(raw).unwrap(),
            "I need a refund today"
        );
    }

    #[test]
    fn test_utterance_empty_is_malformed() {
        assert!(normalizer().normalize_utterance("```json\n{}\n```").is_err());
        assert!(normalizer().normalize_utterance("   ").is_err());
    }

    #[test]
    fn test_custom_key_list() {
        let n = ResponseNormalizer::with_keys(["suggestion"]);
        assert_eq!(
            n.normalize_utterance(r#"{"suggestion":"Give a concrete example."}"#).unwrap(),
            "Give a concrete example."
        );
        assert_eq!(n.utterance_keys(), &["suggestion".to_string()]);
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json {\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  no fence  "), "no fence");
    }

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Draft {
        scenario: String,
        customer_query: String,
    }

    #[test]
    fn test_normalize_object() {
        let raw = "```json\n[{\"scenario\":\"s\",\"customerQuery\":\"q\"}]\n```";
        let draft: Draft = normalizer().normalize_object(raw).unwrap();
        assert_eq!(
            draft,
            Draft {
                scenario: "s".into(),
                customer_query: "q".into()
            }
        );

        let err = normalizer().normalize_object::<Draft>("{\"scenario\":\"s\"}").unwrap_err();
        assert!(matches!(err, NormalizeError::MalformedResponse(_)));
    }

    #[test]
    fn test_extract_json_keeps_arrays() {
        let value = normalizer()
            .extract_json("Sure!\n[{\"question\":\"Q1\"},{\"question\":\"Q2\"}]")
            .unwrap();
        assert_eq!(value.as_array().map(|a| a.len()), Some(2));
    }
}
