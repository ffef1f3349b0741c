//! Prompt Builders
//!
//! Every prompt asks for JSON; the normalizer copes when the model ignores that.

use interview_arena_core::{ConversationMessage, InterviewScenario, Language, ScenarioRequest, Speaker};

/// Messages of history included in a reply prompt.
const HISTORY_WINDOW: usize = 10;

/// Design the AI-authored part of a practice scenario.
pub fn scenario_prompt(request: &ScenarioRequest) -> String {
    let count = request.difficulty.coaching_prompt_count();
    format!(
        r#"You are an API that generates interview scenarios.
{focus}

Respond ONLY with a valid JSON object, and nothing else. Do not include explanations or markdown.

The JSON object must have these keys (all values must be strings):
- scenario: the situation and context for the user (the interviewee)
- customerQuery: a direct quote from the customer or interviewer, written in their voice, never in the user's voice
- expectedResponse: a numbered list of exactly {count} coaching prompts or reflective questions (not instructions) that help the user think through how to handle the situation

The scenario, customerQuery and coaching prompts MUST focus on the aspect '{focus_area}'.
{style}
Do not provide a sample answer or script and do not tell the user exactly what to do.

Generate the entire response in {language}. Keep the JSON keys in English.

Return ONLY the JSON object, e.g.
{{"scenario": "...", "customerQuery": "...", "expectedResponse": "1. ...\n2. ...\n3. ..."}}

Parameters for this scenario:
Industry: {industry}
Role: {role}
Difficulty: {difficulty}
Focus: {focus_area}
Context: {context}"#,
        focus = request.focus_area.instructions(),
        count = count,
        focus_area = request.focus_area.as_str(),
        style = request.difficulty.coaching_style(),
        language = request.language.display_name(),
        industry = request.industry.trim(),
        role = request.role.trim(),
        difficulty = request.difficulty,
        context = request.description.trim(),
    )
}

/// First line the interlocutor says when a session starts.
pub fn opening_prompt(scenario: &InterviewScenario, language: Language) -> String {
    format!(
        r#"You are the customer or interviewer in the following scenario. Give a short, natural welcome message that opens the conversation, in {language}.

Scenario: {scenario}
Your opening concern: {query}

Respond ONLY with JSON: {{"openingLine": "..."}}"#,
        language = language.display_name(),
        scenario = scenario.scenario.trim(),
        query = scenario.customer_query.trim(),
    )
}

/// Next reply of the interlocutor given the conversation so far.
pub fn reply_prompt(
    scenario: &InterviewScenario,
    history: &[ConversationMessage],
    user_message: &str,
    language: Language,
) -> String {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    let transcript = history[start..]
        .iter()
        .map(|m| {
            let who = match m.speaker {
                Speaker::Ai => "You",
                Speaker::User => "Candidate",
            };
            format!("{}: {}", who, m.content.trim())
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Based on the scenario: "{scenario}", continue the conversation as the customer or interviewer in {language}. Keep the response concise and conversational.

Conversation so far:
{transcript}

Candidate's latest message: "{user_message}"

Respond ONLY with JSON: {{"response": "..."}}"#,
        scenario = scenario.scenario.trim(),
        language = language.display_name(),
        transcript = transcript,
        user_message = user_message.trim(),
    )
}

/// Score one candidate answer within its scenario.
pub fn analysis_prompt(scenario: &str, answer: &str, language: Language) -> String {
    format!(
        r#"You are an interview expert. Analyze the interview answer below in the context of the scenario. Return the result as JSON with this structure:
{{
  "strengths": ["list of strengths"],
  "weaknesses": ["list of points to improve"],
  "overallScore": number from 0 to 100,
  "feedback": "short comment that refers specifically to the answer"
}}

Score as follows:
- 0-30: weak answer, missing ideas or off topic.
- 31-60: average answer, correct ideas but shallow.
- 61-85: good answer, complete with examples.
- 86-100: excellent, convincing and professional.

Write strengths, weaknesses and feedback in {language}; keep the JSON field names in English.

Scenario: {scenario}
Answer: {answer}"#,
        language = language.display_name(),
        scenario = scenario.trim(),
        answer = answer.trim(),
    )
}

/// One or two sentence suggestion for improving a weakness.
pub fn suggestion_prompt(weakness: &str, language: Language) -> String {
    format!(
        r#"You are an interview coach. Give one short, concrete and practical suggestion (1-2 sentences) that helps improve this weakness in an interview answer: "{weakness}". Write it in {language} and focus on a clear way to improve, not generic advice.

Respond ONLY with JSON: {{"suggestion": "..."}}"#,
        weakness = weakness.trim(),
        language = language.display_name(),
    )
}

/// Quick landing-page feedback for a question and answer.
pub fn demo_feedback_prompt(question: &str, answer: &str) -> String {
    format!(
        r#"As an interview coach, provide brief, constructive feedback for this interview question and answer. Return the feedback in the following JSON format:
{{
  "strengths": "Key strengths of the answer (1-2 points)",
  "improvement": "One specific area for improvement"
}}

Question: {question}
Answer: {answer}"#,
        question = question.trim(),
        answer = answer.trim(),
    )
}

/// Classic question set for a job position.
pub fn question_set_prompt(
    job_position: &str,
    job_desc: &str,
    job_experience: &str,
    count: u32,
) -> String {
    format!(
        r#"Job Position: {position}, Job Description: {desc}, Years of Experience: {experience}.
Based on the job position, job description and years of experience, give {count} interview questions with suggested answers.

Respond ONLY with a JSON array: [{{"question": "...", "answer": "..."}}]"#,
        position = job_position.trim(),
        desc = job_desc.trim(),
        experience = job_experience.trim(),
        count = count,
    )
}

/// Rate a recorded answer to a question-set question.
pub fn answer_rating_prompt(question: &str, suggested_answer: &str, user_answer: &str) -> String {
    format!(
        r#"Question: {question}
Suggested answer: {suggested}
Candidate's answer: {answer}

You are an interview coach. Rate the candidate's answer from 1 to 10 and give constructive feedback in 3 to 5 lines covering content relevance, clarity and structure, and areas for improvement.

Respond ONLY with JSON: {{"rating": number, "feedback": "..."}}"#,
        question = question.trim(),
        suggested = suggested_answer.trim(),
        answer = user_answer.trim(),
    )
}
