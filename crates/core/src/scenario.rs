//! Interview Scenarios
//!
//! Scenario data authored by a user or designed by the model, plus the
//! taxonomy (difficulty, focus area, language) that shapes the prompts.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{CoreError, CoreResult};

/// Seniority level of the practice scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Difficulty {
    Intern,
    Fresher,
    Junior,
    Senior,
    Other(String),
}

impl Difficulty {
    pub fn as_str(&self) -> &str {
        match self {
            Difficulty::Intern => "Intern",
            Difficulty::Fresher => "Fresher",
            Difficulty::Junior => "Junior",
            Difficulty::Senior => "Senior",
            Difficulty::Other(label) => label,
        }
    }

    /// Number of coaching prompts requested for `expectedResponse`.
    ///
    /// Less experienced candidates get more guidance.
    pub fn coaching_prompt_count(&self) -> usize {
        match self {
            Difficulty::Intern => 5,
            Difficulty::Fresher => 4,
            Difficulty::Junior => 3,
            Difficulty::Senior => 2,
            Difficulty::Other(_) => 4,
        }
    }

    /// Tone instruction for the coaching prompts.
    pub fn coaching_style(&self) -> &'static str {
        match self {
            Difficulty::Intern => {
                "Phrase every prompt as a gentle reflective question that walks the candidate \
                 through the situation step by step. Do not give direct instructions."
            }
            Difficulty::Fresher => {
                "Ask questions that make the candidate weigh options and consequences, with a \
                 little guidance. Do not give direct instructions."
            }
            Difficulty::Junior => {
                "Keep prompts short and open-ended so the candidate analyses the problem and \
                 decides independently."
            }
            Difficulty::Senior => {
                "Pose strategic, challenging questions that push critical thinking and \
                 autonomy. No step-by-step guidance."
            }
            Difficulty::Other(_) => {
                "Offer reflective coaching questions that help the candidate think the \
                 situation through."
            }
        }
    }
}

impl From<String> for Difficulty {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "intern" => Difficulty::Intern,
            "fresher" => Difficulty::Fresher,
            "junior" => Difficulty::Junior,
            "senior" => Difficulty::Senior,
            _ => Difficulty::Other(value.trim().to_string()),
        }
    }
}

impl From<Difficulty> for String {
    fn from(value: Difficulty) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which aspect of the candidate the scenario should test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FocusArea {
    #[serde(alias = "Kiến thức")]
    Knowledge,
    #[serde(alias = "Hành vi")]
    Behavioral,
    #[serde(alias = "Tình huống")]
    Situational,
    #[default]
    #[serde(alias = "Khác")]
    Other,
}

impl FocusArea {
    pub fn as_str(&self) -> &'static str {
        match self {
            FocusArea::Knowledge => "knowledge",
            FocusArea::Behavioral => "behavioral",
            FocusArea::Situational => "situational",
            FocusArea::Other => "other",
        }
    }

    /// Instruction paragraph inserted into the scenario design prompt.
    pub fn instructions(&self) -> &'static str {
        match self {
            FocusArea::Knowledge => {
                "This is a technical knowledge interview. The scenario and customerQuery must \
                 test what the candidate knows about their field, e.g. a tester is asked about \
                 testing types, strategies or tools. customerQuery is a direct technical \
                 question, not a soft-skill situation."
            }
            FocusArea::Behavioral => {
                "This is a behavioral interview. The scenario and customerQuery must ask about \
                 the candidate's past behaviour, attitude or soft skills at work, e.g. how they \
                 handled a disagreement with a colleague."
            }
            FocusArea::Situational => {
                "This is a situational interview. The scenario and customerQuery must present a \
                 hypothetical problem that tests problem solving or decision making, e.g. an \
                 angry customer calling about a faulty product."
            }
            FocusArea::Other => {
                "Use the provided context to build a relevant scenario and customerQuery."
            }
        }
    }
}

/// Conversation language for the practice session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "en-US", alias = "en")]
    EnglishUs,
    #[serde(rename = "vi-VN", alias = "vi")]
    Vietnamese,
    #[serde(rename = "ja-JP", alias = "ja")]
    Japanese,
    #[serde(rename = "ko-KR", alias = "ko")]
    Korean,
    #[serde(rename = "zh-CN", alias = "zh")]
    ChineseSimplified,
    #[serde(rename = "es-ES", alias = "es")]
    Spanish,
    #[serde(rename = "fr-FR", alias = "fr")]
    French,
    #[serde(rename = "de-DE", alias = "de")]
    German,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::EnglishUs => "en-US",
            Language::Vietnamese => "vi-VN",
            Language::Japanese => "ja-JP",
            Language::Korean => "ko-KR",
            Language::ChineseSimplified => "zh-CN",
            Language::Spanish => "es-ES",
            Language::French => "fr-FR",
            Language::German => "de-DE",
        }
    }

    /// Human readable name used inside prompts.
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::EnglishUs => "English (US)",
            Language::Vietnamese => "Vietnamese",
            Language::Japanese => "Japanese",
            Language::Korean => "Korean",
            Language::ChineseSimplified => "Chinese (Simplified)",
            Language::Spanish => "Spanish",
            Language::French => "French",
            Language::German => "German",
        }
    }

    /// Parse a language code such as `vi-VN` or `vi`.
    pub fn from_code(code: &str) -> CoreResult<Self> {
        serde_json::from_value(serde_json::Value::String(code.trim().to_string()))
            .map_err(|_| CoreError::parse(format!("Unsupported language: {}", code)))
    }
}

/// A complete practice scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewScenario {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub difficulty: Difficulty,
    pub scenario: String,
    pub customer_query: String,
    #[serde(deserialize_with = "string_or_list")]
    pub expected_response: String,
    #[serde(default)]
    pub language: Language,
    pub industry: String,
    pub role: String,
}

impl InterviewScenario {
    /// Check that every field a practice session relies on is present.
    pub fn validate(&self) -> CoreResult<()> {
        require_non_empty("title", &self.title)?;
        require_non_empty("scenario", &self.scenario)?;
        require_non_empty("customerQuery", &self.customer_query)?;
        require_non_empty("expectedResponse", &self.expected_response)?;
        require_non_empty("industry", &self.industry)?;
        require_non_empty("role", &self.role)?;
        Ok(())
    }
}

/// The model-designed part of a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDraft {
    pub scenario: String,
    pub customer_query: String,
    #[serde(deserialize_with = "string_or_list")]
    pub expected_response: String,
}

impl ScenarioDraft {
    pub fn validate(&self) -> CoreResult<()> {
        require_non_empty("scenario", &self.scenario)?;
        require_non_empty("customerQuery", &self.customer_query)?;
        require_non_empty("expectedResponse", &self.expected_response)?;
        Ok(())
    }
}

/// Parameters for designing a scenario with the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub difficulty: Difficulty,
    pub industry: String,
    pub role: String,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub focus_area: FocusArea,
}

impl ScenarioRequest {
    pub fn validate(&self) -> CoreResult<()> {
        require_non_empty("title", &self.title)?;
        require_non_empty("industry", &self.industry)?;
        require_non_empty("role", &self.role)?;
        Ok(())
    }

    /// Combine the request with a validated draft into a full scenario.
    pub fn into_scenario(self, draft: ScenarioDraft) -> InterviewScenario {
        InterviewScenario {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            difficulty: self.difficulty,
            scenario: draft.scenario.trim().to_string(),
            customer_query: draft.customer_query.trim().to_string(),
            expected_response: draft.expected_response.trim().to_string(),
            language: self.language,
            industry: self.industry.trim().to_string(),
            role: self.role.trim().to_string(),
        }
    }
}

fn require_non_empty(field: &str, value: &str) -> CoreResult<()> {
    if value.trim().is_empty() {
        return Err(CoreError::validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// Accept either a string or a list of strings; lists are joined line by line.
fn string_or_list<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrList {
        Single(String),
        Many(Vec<String>),
    }

    Ok(match StringOrList::deserialize(deserializer)? {
        StringOrList::Single(s) => s,
        StringOrList::Many(items) => items.join("\n"),
    })
}
