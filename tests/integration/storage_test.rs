//! Storage Integration Tests
//!
//! File-backed database and configuration round trips through a temp dir.

use interview_arena::models::interview::StoredScenario;
use interview_arena::storage::{ConfigService, Database};
use interview_arena::SettingsUpdate;
use interview_arena_core::{
    Difficulty, FocusArea, InterviewScenario, Language, SessionFeedback,
};
use tempfile::TempDir;

fn stored(mock_id: &str, owner: &str) -> StoredScenario {
    StoredScenario {
        mock_id: mock_id.to_string(),
        scenario: InterviewScenario {
            title: "Escalation call".to_string(),
            description: "Angry customer".to_string(),
            difficulty: Difficulty::Senior,
            scenario: "A key account threatens to leave.".to_string(),
            customer_query: "Give me one reason to stay.".to_string(),
            expected_response: "1. Listen\n2. Own it".to_string(),
            language: Language::Japanese,
            industry: "SaaS".to_string(),
            role: "Account manager".to_string(),
        },
        focus_area: FocusArea::Behavioral,
        created_by: owner.to_string(),
        created_at: "2024-05-01T10:00:00Z".to_string(),
    }
}

#[test]
fn test_database_file_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("data.db");

    {
        let db = Database::open(&path).unwrap();
        db.insert_mock_interview(&stored("m1", "ken@example.com")).unwrap();
        let feedback = SessionFeedback::aggregate(
            "m1",
            "ken@example.com",
            Vec::new(),
            60,
            300,
            "2024-05-01T10:05:00Z",
        );
        db.insert_feedback(&feedback).unwrap();
    }

    let db = Database::open(&path).unwrap();
    assert!(db.is_healthy());
    let loaded = db.get_mock_interview("m1").unwrap().unwrap();
    assert_eq!(loaded, stored("m1", "ken@example.com"));

    let latest = db.get_latest_feedback("m1").unwrap().unwrap();
    assert_eq!(latest.average_score, 0);
    assert_eq!(latest.duration_seconds, 60);

    let list = db.list_interviews_for_user("ken@example.com").unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].difficulty, "Senior");
    assert_eq!(list[0].language, "ja-JP");
    assert_eq!(list[0].latest_score, Some(0));
}

#[test]
fn test_config_update_persists() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    let mut config = ConfigService::load_or_create(&path).unwrap();
    assert!(path.exists());
    config
        .update_config(SettingsUpdate {
            language: Some("ko-KR".to_string()),
            attempts_per_model: Some(2),
            ..Default::default()
        })
        .unwrap();

    let reloaded = ConfigService::load_or_create(&path).unwrap();
    assert_eq!(reloaded.get_config().language, "ko-KR");
    assert_eq!(reloaded.get_config().attempts_per_model, 2);
    assert_eq!(reloaded.get_config().default_language(), Language::Korean);
}

#[test]
fn test_corrupt_config_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(ConfigService::load_or_create(&path).is_err());
}
