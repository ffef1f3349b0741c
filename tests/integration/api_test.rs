//! HTTP API Integration Tests
//!
//! Drive the full router with `oneshot` requests against an in-memory
//! database and a stub provider. No network calls are made.

use axum::http::StatusCode;
use serde_json::json;

use crate::common::TestApp;

// ============================================================================
// Health and settings
// ============================================================================

#[tokio::test]
async fn test_health_reports_components() {
    let app = TestApp::new();
    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["database"], true);
    assert_eq!(body["data"]["config"], true);
    assert_eq!(body["data"]["activeSessions"], 0);
}

#[tokio::test]
async fn test_settings_patch_validates_and_masks_key() {
    let app = TestApp::new();

    let (status, body) = app
        .send(
            "PATCH",
            "/api/settings",
            Some(json!({ "api_key": "sk-test-12345678", "question_count": 8 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["api_key"], "****5678");
    assert_eq!(body["data"]["question_count"], 8);

    let (status, body) = app
        .send("PATCH", "/api/settings", Some(json!({ "question_count": 0 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (_, body) = app.get("/api/settings").await;
    assert_eq!(body["data"]["question_count"], 8);
    assert_eq!(body["data"]["api_key"], "****5678");
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_generate_scenario_normalizes_draft() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/api/scenarios/generate",
            json!({
                "title": "Billing dispute",
                "description": "Customer charged twice",
                "difficulty": "junior",
                "industry": "Banking",
                "role": "Support agent",
                "language": "en-US",
                "focusArea": "situational"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    let scenario = &body["data"];
    assert_eq!(scenario["title"], "Billing dispute");
    assert_eq!(scenario["difficulty"], "Junior");
    assert_eq!(scenario["customerQuery"], "Why was I charged twice?");
    let expected = scenario["expectedResponse"].as_str().unwrap();
    assert!(expected.contains("How do you reassure them?"));
}

#[tokio::test]
async fn test_generate_scenario_rejects_missing_fields() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/api/scenarios/generate",
            json!({ "title": " ", "difficulty": "Junior", "industry": "Banking", "role": "Agent" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(app.provider.calls(), 0);
}

#[tokio::test]
async fn test_generate_scenario_provider_down() {
    let app = TestApp::with_routes(&[]);
    let (status, body) = app
        .post(
            "/api/scenarios/generate",
            json!({ "title": "T", "difficulty": "Senior", "industry": "Retail", "role": "Manager" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("try again"));
}

#[tokio::test]
async fn test_scenario_crud_and_listing() {
    let app = TestApp::new();
    let mock_id = app.create_scenario("ana@example.com").await;

    let (status, body) = app.get(&format!("/api/mock-interview/{}", mock_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Billing dispute");
    assert_eq!(body["data"]["focusArea"], "situational");

    let (_, body) = app.get("/api/interview-list?userEmail=ana@example.com").await;
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["mockId"], mock_id.as_str());
    assert!(items[0]["latestScore"].is_null());

    let (_, body) = app.get("/api/interview-list?userEmail=other@example.com").await;
    assert!(body["data"].as_array().unwrap().is_empty());

    // Only the owner can delete
    let (status, _) = app
        .delete(&format!("/api/interview-list/{}?userEmail=other@example.com", mock_id))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .delete(&format!("/api/interview-list/{}?userEmail=ana@example.com", mock_id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], 1);

    let (status, _) = app.get(&format!("/api/mock-interview/{}", mock_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_scenario_requires_owner() {
    let app = TestApp::new();
    let (status, _) = app
        .post("/api/mock-interview", crate::common::scenario_body(" "))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Feedback and coaching
// ============================================================================

#[tokio::test]
async fn test_feedback_store_list_and_highest_score() {
    let app = TestApp::new();
    let mock_id = app.create_scenario("ana@example.com").await;

    let feedback = json!({
        "mockIdRef": mock_id,
        "userEmail": "ana@example.com",
        "durationSeconds": 240,
        "totalMessages": 4,
        "averageScore": 72,
        "conversation": [],
        "strengths": ["Calm tone"],
        "weaknesses": ["No follow-up"],
        "detailedFeedback": "Good start",
        "messageAnalysis": [],
        "createdAt": "2024-05-01T10:00:00Z"
    });
    let (status, body) = app.post("/api/interview-feedback", feedback.clone()).await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let mut out_of_range = feedback;
    out_of_range["averageScore"] = json!(140);
    let (status, _) = app.post("/api/interview-feedback", out_of_range).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.get("/api/interview-feedback").await;
    let records = body["data"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["title"], "Billing dispute");
    assert_eq!(records[0]["averageScore"], 72);

    let (_, body) = app.get("/api/highest-score?userEmail=ana@example.com").await;
    assert_eq!(body["data"]["highestScore"], 72);
    let (_, body) = app.get("/api/highest-score?userEmail=nobody@example.com").await;
    assert_eq!(body["data"]["highestScore"], 0);

    let (status, body) = app
        .delete(&format!("/api/interview-feedback?mockId={}", mock_id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], 1);
}

#[tokio::test]
async fn test_generate_suggestion() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/api/interview-feedback/generate-suggestion",
            json!({ "weakness": "No metrics", "language": "en-US" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["suggestion"], "Quantify the result of your work.");

    let (status, _) = app
        .post("/api/interview-feedback/generate-suggestion", json!({ "weakness": "" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_suggestions_batch() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/api/interview-feedback/generate-suggestions",
            json!({ "weaknesses": ["No metrics", "Rambling", "No metrics"] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["weakness"], "No metrics");
    assert_eq!(entries[1]["weakness"], "Rambling");
    assert_eq!(entries[1]["suggestion"], "Quantify the result of your work.");
    assert!(entries[1].get("error").is_none());
    assert_eq!(app.provider.calls(), 2);
}

#[tokio::test]
async fn test_demo_feedback_formats_list_improvements() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/api/demo/feedback",
            json!({ "question": "Tell me about yourself", "answer": "I build APIs" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["strengths"], "Concise");
    assert_eq!(body["data"]["improvement"], "Add an example");
    assert_eq!(
        body["data"]["formatted"],
        "Strengths: Concise\n\nArea for Improvement: Add an example"
    );
}

// ============================================================================
// Question sets
// ============================================================================

#[tokio::test]
async fn test_question_set_and_answers() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/api/question-sets",
            json!({
                "jobPosition": "Rust developer",
                "jobDesc": "Backend services",
                "jobExperience": "3",
                "createdBy": "ana@example.com",
                "questionCount": 2
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let mock_id = body["data"]["mockId"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["questions"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["questions"][1]["answer"], "Temporary access by reference.");

    let (status, body) = app.get(&format!("/api/question-sets/{}", mock_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["jobPosition"], "Rust developer");

    let (status, body) = app
        .post(
            &format!("/api/question-sets/{}/answers", mock_id),
            json!({ "questionIndex": 0, "userAnswer": "One owner per value", "userEmail": "ana@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["rating"], "7");
    assert_eq!(body["data"]["question"], "What is ownership?");

    let (status, _) = app
        .post(
            &format!("/api/question-sets/{}/answers", mock_id),
            json!({ "questionIndex": 9, "userAnswer": "x", "userEmail": "ana@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app
        .get(&format!("/api/question-sets/{}/answers?userEmail=ana@example.com", mock_id))
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = app.get("/api/question-sets/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
