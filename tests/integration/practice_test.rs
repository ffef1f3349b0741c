//! Live Practice Integration Tests
//!
//! A complete session over HTTP: start, answer, finish. Also covers
//! abandoning a session and the failure paths that must leave the
//! conversation untouched.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use crate::common::{StubProvider, TestApp, ANALYSIS_JSON, DEFAULT_ROUTES};

async fn start(app: &TestApp, mock_id: &str) -> String {
    let (status, body) = app
        .post(
            "/api/practice/sessions",
            json!({ "mockId": mock_id, "userEmail": "ana@example.com", "timeLimit": 5 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["opening"]["type"], "ai");
    assert_eq!(
        body["data"]["opening"]["content"],
        "Hello, thanks for calling. How can I help?"
    );
    assert_eq!(body["data"]["timeLimit"], 5);
    body["data"]["sessionId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_full_practice_session() {
    let app = TestApp::new();
    let mock_id = app.create_scenario("ana@example.com").await;
    let session_id = start(&app, &mock_id).await;
    assert_eq!(app.state.active_sessions().await, 1);

    let (status, body) = app
        .post(
            &format!("/api/practice/sessions/{}/messages", session_id),
            json!({ "content": "Let me check the transaction for you." }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["reply"]["content"], "Sure, I'd like a refund please.");
    assert_eq!(body["data"]["analysis"]["overallScore"], 80);
    assert_eq!(body["data"]["userMessage"]["analysis"]["overallScore"], 80);

    let (status, body) = app
        .post(&format!("/api/practice/sessions/{}/finish", session_id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let report = &body["data"];
    assert_eq!(report["mockIdRef"], mock_id.as_str());
    assert_eq!(report["totalMessages"], 3);
    // 80 scaled by the minimum time and answer-count factors
    assert_eq!(report["averageScore"], 39);
    assert_eq!(report["strengths"], json!(["Clear structure"]));
    assert_eq!(app.state.active_sessions().await, 0);

    let (_, body) = app.get("/api/interview-list?userEmail=ana@example.com").await;
    assert_eq!(body["data"][0]["latestScore"], 39);

    // Finished sessions are gone
    let (status, _) = app
        .post(
            &format!("/api/practice/sessions/{}/messages", session_id),
            json!({ "content": "Hello?" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_finishing_twice_keeps_one_report() {
    let app = TestApp::new();
    let mock_id = app.create_scenario("ana@example.com").await;

    for _ in 0..2 {
        let session_id = start(&app, &mock_id).await;
        let (status, _) = app
            .post(&format!("/api/practice/sessions/{}/finish", session_id), json!({}))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = app.get("/api/interview-feedback").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["averageScore"], 0);
}

#[tokio::test]
async fn test_start_unknown_scenario() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/api/practice/sessions",
            json!({ "mockId": "missing", "userEmail": "ana@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(app.provider.calls(), 0);
}

#[tokio::test]
async fn test_empty_turn_rejected() {
    let app = TestApp::new();
    let mock_id = app.create_scenario("ana@example.com").await;
    let session_id = start(&app, &mock_id).await;
    let calls = app.provider.calls();

    let (status, _) = app
        .post(
            &format!("/api/practice/sessions/{}/messages", session_id),
            json!({ "content": "   " }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.provider.calls(), calls);
}

#[tokio::test]
async fn test_reply_failure_leaves_conversation_unchanged() {
    // Analysis succeeds but no reply route exists
    let app = TestApp::with_routes(&[
        ("overallScore", ANALYSIS_JSON),
        ("openingLine", r#"{"openingLine":"Hi"}"#),
    ]);
    let mock_id = app.create_scenario("ana@example.com").await;

    let (_, body) = app
        .post(
            "/api/practice/sessions",
            json!({ "mockId": mock_id, "userEmail": "ana@example.com" }),
        )
        .await;
    let session_id = body["data"]["sessionId"].as_str().unwrap().to_string();

    let (status, _) = app
        .post(
            &format!("/api/practice/sessions/{}/messages", session_id),
            json!({ "content": "Let me check." }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (_, body) = app
        .post(&format!("/api/practice/sessions/{}/finish", session_id), json!({}))
        .await;
    assert_eq!(body["data"]["totalMessages"], 1);
}

#[tokio::test]
async fn test_abandon_session() {
    let app = TestApp::new();
    let mock_id = app.create_scenario("ana@example.com").await;
    let session_id = start(&app, &mock_id).await;
    let handle = app.state.session(&session_id).await.unwrap();

    let (status, body) = app
        .delete(&format!("/api/practice/sessions/{}", session_id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], 1);
    assert!(handle.cancel.is_cancelled());

    let (status, _) = app
        .delete(&format!("/api/practice/sessions/{}", session_id))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.get("/api/interview-feedback").await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_report_write_keeps_session() {
    let app = TestApp::new();
    let mock_id = app.create_scenario("ana@example.com").await;
    let session_id = start(&app, &mock_id).await;
    let (status, _) = app
        .post(
            &format!("/api/practice/sessions/{}/messages", session_id),
            json!({ "content": "Let me check the transaction for you." }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let rename = |from: &str, to: &str| {
        app.state
            .db
            .get_connection()
            .unwrap()
            .execute_batch(&format!("ALTER TABLE {} RENAME TO {}", from, to))
            .unwrap();
    };

    rename("interview_feedback", "interview_feedback_offline");
    let (status, body) = app
        .post(&format!("/api/practice/sessions/{}/finish", session_id), json!({}))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(app.state.active_sessions().await, 1);
    let handle = app.state.session(&session_id).await.unwrap();
    assert!(!handle.cancel.is_cancelled());

    rename("interview_feedback_offline", "interview_feedback");
    let (status, body) = app
        .post(&format!("/api/practice/sessions/{}/finish", session_id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["totalMessages"], 3);
    assert_eq!(app.state.active_sessions().await, 0);
    assert!(handle.cancel.is_cancelled());
}

#[tokio::test]
async fn test_abandon_while_opening_generates() {
    let app = Arc::new(TestApp::with_provider(StubProvider::stalling(
        DEFAULT_ROUTES,
        "openingLine",
    )));
    let mock_id = app.create_scenario("ana@example.com").await;

    let starting = {
        let app = app.clone();
        tokio::spawn(async move {
            app.post(
                "/api/practice/sessions",
                json!({ "mockId": mock_id, "userEmail": "ana@example.com", "sessionId": "call-1" }),
            )
            .await
        })
    };

    for _ in 0..200 {
        if app.state.active_sessions().await == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(app.state.active_sessions().await, 1);

    let (status, _) = app.delete("/api/practice/sessions/call-1").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = starting.await.unwrap();
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(app.state.active_sessions().await, 0);
}

#[tokio::test]
async fn test_caller_session_id() {
    let app = TestApp::new();
    let mock_id = app.create_scenario("ana@example.com").await;
    let request = json!({ "mockId": mock_id, "userEmail": "ana@example.com", "sessionId": "call-7" });

    let (status, body) = app.post("/api/practice/sessions", request.clone()).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["sessionId"], "call-7");

    let (status, _) = app.post("/api/practice/sessions", request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.state.active_sessions().await, 1);

    let (status, _) = app
        .post(
            "/api/practice/sessions",
            json!({ "mockId": mock_id, "userEmail": "ana@example.com", "sessionId": "../x" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
