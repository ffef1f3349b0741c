//! SQLite Database
//!
//! Embedded database for persistent storage using rusqlite with r2d2 connection pooling.
//! List-valued columns (conversation, strengths, questions, ...) are stored as JSON text.

use std::path::Path;

use interview_arena_core::{Difficulty, InterviewScenario, SessionFeedback};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::models::interview::{
    FeedbackRecord, InterviewListItem, QuestionSet, StoredScenario, UserAnswer,
};
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::ensure_parent_dir;

/// Type alias for the connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

const FEEDBACK_COLUMNS: &str = "f.id, f.mock_id_ref, f.user_email, f.duration_seconds, f.total_messages,
     f.average_score, f.conversation, f.strengths, f.weaknesses, f.detailed_feedback,
     f.message_analysis, f.created_at";

/// Database service for managing SQLite operations
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Create an in-memory database for testing.
    ///
    /// Uses an in-memory SQLite database with the same schema as the
    /// production database.
    pub fn new_in_memory() -> AppResult<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| AppError::database(format!("Failed to create connection pool: {}", e)))?;

        let db = Self { pool };
        db.init_schema()?;
        Ok(db)
    }

    /// Open (or create) the database file with connection pooling
    pub fn open(path: &Path) -> AppResult<Self> {
        ensure_parent_dir(path)?;

        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .max_size(10)
            .build(manager)
            .map_err(|e| AppError::database(format!("Failed to create connection pool: {}", e)))?;

        let db = Self { pool };
        db.init_schema()?;

        tracing::info!(path = %path.display(), "Database opened");
        Ok(db)
    }

    /// Initialize the database schema
    fn init_schema(&self) -> AppResult<()> {
        let conn = self.get_connection()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS mock_interviews (
                mock_id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                difficulty TEXT NOT NULL,
                scenario TEXT NOT NULL,
                customer_query TEXT NOT NULL,
                expected_response TEXT NOT NULL,
                language TEXT NOT NULL,
                industry TEXT NOT NULL,
                role TEXT NOT NULL,
                focus_area TEXT NOT NULL DEFAULT 'other',
                created_by TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_mock_interviews_created_by ON mock_interviews(created_by)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS interview_feedback (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                mock_id_ref TEXT NOT NULL,
                user_email TEXT NOT NULL,
                duration_seconds INTEGER NOT NULL DEFAULT 0,
                total_messages INTEGER NOT NULL DEFAULT 0,
                average_score INTEGER NOT NULL DEFAULT 0,
                conversation TEXT NOT NULL DEFAULT '[]',
                strengths TEXT NOT NULL DEFAULT '[]',
                weaknesses TEXT NOT NULL DEFAULT '[]',
                detailed_feedback TEXT NOT NULL DEFAULT '',
                message_analysis TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_interview_feedback_mock ON interview_feedback(mock_id_ref)",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_interview_feedback_user ON interview_feedback(user_email)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS question_sets (
                mock_id TEXT PRIMARY KEY,
                job_position TEXT NOT NULL,
                job_desc TEXT NOT NULL,
                job_experience TEXT NOT NULL,
                questions TEXT NOT NULL DEFAULT '[]',
                created_by TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS user_answers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                mock_id_ref TEXT NOT NULL,
                question TEXT NOT NULL,
                suggested_answer TEXT NOT NULL,
                user_answer TEXT NOT NULL,
                feedback TEXT NOT NULL,
                rating TEXT NOT NULL,
                user_email TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_user_answers_mock ON user_answers(mock_id_ref, user_email)",
            [],
        )?;

        Ok(())
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> AppResult<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| AppError::database(format!("Failed to get connection: {}", e)))
    }

    /// Check if the database is healthy
    pub fn is_healthy(&self) -> bool {
        if let Ok(conn) = self.pool.get() {
            conn.query_row("SELECT 1", [], |_| Ok(())).is_ok()
        } else {
            false
        }
    }

    // ========================================================================
    // Mock interviews (practice scenarios)
    // ========================================================================

    /// Insert a scenario
    pub fn insert_mock_interview(&self, stored: &StoredScenario) -> AppResult<()> {
        let conn = self.get_connection()?;
        let s = &stored.scenario;
        conn.execute(
            "INSERT INTO mock_interviews (mock_id, title, description, difficulty, scenario,
                customer_query, expected_response, language, industry, role, focus_area,
                created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                stored.mock_id,
                s.title,
                s.description,
                s.difficulty.as_str(),
                s.scenario,
                s.customer_query,
                s.expected_response,
                s.language.code(),
                s.industry,
                s.role,
                stored.focus_area.as_str(),
                stored.created_by,
                stored.created_at,
            ],
        )?;
        Ok(())
    }

    /// Get a scenario by mock id
    pub fn get_mock_interview(&self, mock_id: &str) -> AppResult<Option<StoredScenario>> {
        let conn = self.get_connection()?;
        let result = conn.query_row(
            "SELECT mock_id, title, description, difficulty, scenario, customer_query,
                    expected_response, language, industry, role, focus_area, created_by, created_at
             FROM mock_interviews WHERE mock_id = ?1",
            params![mock_id],
            |row| {
                let language: String = row.get(7)?;
                let focus_area: String = row.get(10)?;
                Ok(StoredScenario {
                    mock_id: row.get(0)?,
                    scenario: InterviewScenario {
                        title: row.get(1)?,
                        description: row.get(2)?,
                        difficulty: Difficulty::from(row.get::<_, String>(3)?),
                        scenario: row.get(4)?,
                        customer_query: row.get(5)?,
                        expected_response: row.get(6)?,
                        language: parse_label(language),
                        industry: row.get(8)?,
                        role: row.get(9)?,
                    },
                    focus_area: parse_label(focus_area),
                    created_by: row.get(11)?,
                    created_at: row.get(12)?,
                })
            },
        );

        match result {
            Ok(stored) => Ok(Some(stored)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::database(e.to_string())),
        }
    }

    /// List a user's scenarios, newest first, with their latest session score
    pub fn list_interviews_for_user(&self, user_email: &str) -> AppResult<Vec<InterviewListItem>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(
            "SELECT m.mock_id, m.title, m.description, m.difficulty, m.industry, m.role,
                    m.language, m.created_at,
                    (SELECT f.average_score FROM interview_feedback f
                      WHERE f.mock_id_ref = m.mock_id ORDER BY f.created_at DESC, f.id DESC LIMIT 1),
                    (SELECT f.created_at FROM interview_feedback f
                      WHERE f.mock_id_ref = m.mock_id ORDER BY f.created_at DESC, f.id DESC LIMIT 1)
             FROM mock_interviews m
             WHERE m.created_by = ?1
             ORDER BY m.created_at DESC",
        )?;

        let rows = stmt
            .query_map(params![user_email], |row| {
                Ok(InterviewListItem {
                    mock_id: row.get(0)?,
                    title: row.get(1)?,
                    description: row.get(2)?,
                    difficulty: row.get(3)?,
                    industry: row.get(4)?,
                    role: row.get(5)?,
                    language: row.get(6)?,
                    created_at: row.get(7)?,
                    latest_score: row.get(8)?,
                    feedback_at: row.get(9)?,
                })
            })?
            .filter_map(readable("mock_interviews"))
            .collect();

        Ok(rows)
    }

    /// Delete a user's scenario together with its session feedback.
    ///
    /// Returns the number of scenarios removed (0 when the scenario does not
    /// exist or belongs to someone else).
    pub fn delete_mock_interview(&self, mock_id: &str, user_email: &str) -> AppResult<usize> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;
        let owned: i64 = tx.query_row(
            "SELECT COUNT(*) FROM mock_interviews WHERE mock_id = ?1 AND created_by = ?2",
            params![mock_id, user_email],
            |row| row.get(0),
        )?;
        if owned == 0 {
            return Ok(0);
        }
        tx.execute(
            "DELETE FROM interview_feedback WHERE mock_id_ref = ?1",
            params![mock_id],
        )?;
        let deleted = tx.execute(
            "DELETE FROM mock_interviews WHERE mock_id = ?1 AND created_by = ?2",
            params![mock_id, user_email],
        )?;
        tx.commit()?;
        Ok(deleted)
    }

    // ========================================================================
    // Session feedback
    // ========================================================================

    /// Insert a session feedback record, returning its row id
    pub fn insert_feedback(&self, feedback: &SessionFeedback) -> AppResult<i64> {
        let conn = self.get_connection()?;
        insert_feedback_row(&conn, feedback)?;
        Ok(conn.last_insert_rowid())
    }

    /// Replace any previous feedback of the same scenario and user
    pub fn replace_feedback(&self, feedback: &SessionFeedback) -> AppResult<i64> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM interview_feedback WHERE mock_id_ref = ?1 AND user_email = ?2",
            params![feedback.mock_id_ref, feedback.user_email],
        )?;
        insert_feedback_row(&tx, feedback)?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(id)
    }

    /// All feedback records joined with their scenario, newest first
    pub fn list_feedback_with_scenarios(&self) -> AppResult<Vec<FeedbackRecord>> {
        let conn = self.get_connection()?;
        let sql = format!(
            "SELECT {}, m.title, m.difficulty, m.industry, m.role
             FROM interview_feedback f
             LEFT JOIN mock_interviews m ON m.mock_id = f.mock_id_ref
             ORDER BY f.created_at DESC, f.id DESC",
            FEEDBACK_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let rows = stmt
            .query_map([], |row| {
                Ok(FeedbackRecord {
                    id: row.get(0)?,
                    feedback: feedback_from_row(row)?,
                    title: row.get(12)?,
                    difficulty: row.get(13)?,
                    industry: row.get(14)?,
                    role: row.get(15)?,
                })
            })?
            .filter_map(readable("interview_feedback"))
            .collect();

        Ok(rows)
    }

    /// Latest feedback of a scenario
    pub fn get_latest_feedback(&self, mock_id: &str) -> AppResult<Option<SessionFeedback>> {
        let conn = self.get_connection()?;
        let sql = format!(
            "SELECT {} FROM interview_feedback f WHERE f.mock_id_ref = ?1
             ORDER BY f.created_at DESC, f.id DESC LIMIT 1",
            FEEDBACK_COLUMNS
        );
        let result = conn.query_row(&sql, params![mock_id], feedback_from_row);

        match result {
            Ok(feedback) => Ok(Some(feedback)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::database(e.to_string())),
        }
    }

    /// Delete all feedback of a scenario, returning the number of rows removed
    pub fn delete_feedback(&self, mock_id: &str) -> AppResult<usize> {
        let conn = self.get_connection()?;
        let deleted = conn.execute(
            "DELETE FROM interview_feedback WHERE mock_id_ref = ?1",
            params![mock_id],
        )?;
        Ok(deleted)
    }

    /// Highest session score of a user, 0 when they have none
    pub fn highest_score(&self, user_email: &str) -> AppResult<u8> {
        let conn = self.get_connection()?;
        let score: i64 = conn.query_row(
            "SELECT COALESCE(MAX(average_score), 0) FROM interview_feedback WHERE user_email = ?1",
            params![user_email],
            |row| row.get(0),
        )?;
        Ok(score.clamp(0, 100) as u8)
    }

    // ========================================================================
    // Question sets
    // ========================================================================

    /// Insert a question set
    pub fn insert_question_set(&self, set: &QuestionSet) -> AppResult<()> {
        let conn = self.get_connection()?;
        conn.execute(
            "INSERT INTO question_sets (mock_id, job_position, job_desc, job_experience,
                questions, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                set.mock_id,
                set.job_position,
                set.job_desc,
                set.job_experience,
                to_json(&set.questions)?,
                set.created_by,
                set.created_at,
            ],
        )?;
        Ok(())
    }

    /// Get a question set by mock id
    pub fn get_question_set(&self, mock_id: &str) -> AppResult<Option<QuestionSet>> {
        let conn = self.get_connection()?;
        let result = conn.query_row(
            "SELECT mock_id, job_position, job_desc, job_experience, questions, created_by, created_at
             FROM question_sets WHERE mock_id = ?1",
            params![mock_id],
            |row| {
                Ok(QuestionSet {
                    mock_id: row.get(0)?,
                    job_position: row.get(1)?,
                    job_desc: row.get(2)?,
                    job_experience: row.get(3)?,
                    questions: json_column(row, 4)?,
                    created_by: row.get(5)?,
                    created_at: row.get(6)?,
                })
            },
        );

        match result {
            Ok(set) => Ok(Some(set)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::database(e.to_string())),
        }
    }

    /// Insert a rated answer, returning it with its row id
    pub fn insert_user_answer(&self, answer: &UserAnswer) -> AppResult<UserAnswer> {
        let conn = self.get_connection()?;
        conn.execute(
            "INSERT INTO user_answers (mock_id_ref, question, suggested_answer, user_answer,
                feedback, rating, user_email, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                answer.mock_id_ref,
                answer.question,
                answer.suggested_answer,
                answer.user_answer,
                answer.feedback,
                answer.rating,
                answer.user_email,
                answer.created_at,
            ],
        )?;
        Ok(UserAnswer {
            id: conn.last_insert_rowid(),
            ..answer.clone()
        })
    }

    /// Answers of a user for one question set, in submission order
    pub fn list_user_answers(&self, mock_id: &str, user_email: &str) -> AppResult<Vec<UserAnswer>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(
            "SELECT id, mock_id_ref, question, suggested_answer, user_answer, feedback, rating,
                    user_email, created_at
             FROM user_answers
             WHERE mock_id_ref = ?1 AND user_email = ?2
             ORDER BY id ASC",
        )?;

        let rows = stmt
            .query_map(params![mock_id, user_email], |row| {
                Ok(UserAnswer {
                    id: row.get(0)?,
                    mock_id_ref: row.get(1)?,
                    question: row.get(2)?,
                    suggested_answer: row.get(3)?,
                    user_answer: row.get(4)?,
                    feedback: row.get(5)?,
                    rating: row.get(6)?,
                    user_email: row.get(7)?,
                    created_at: row.get(8)?,
                })
            })?
            .filter_map(readable("user_answers"))
            .collect();

        Ok(rows)
    }
}

fn insert_feedback_row(conn: &rusqlite::Connection, feedback: &SessionFeedback) -> AppResult<()> {
    conn.execute(
        "INSERT INTO interview_feedback (mock_id_ref, user_email, duration_seconds, total_messages,
            average_score, conversation, strengths, weaknesses, detailed_feedback,
            message_analysis, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            feedback.mock_id_ref,
            feedback.user_email,
            feedback.duration_seconds as i64,
            feedback.total_messages as i64,
            feedback.average_score,
            to_json(&feedback.conversation)?,
            to_json(&feedback.strengths)?,
            to_json(&feedback.weaknesses)?,
            feedback.detailed_feedback,
            to_json(&feedback.message_analysis)?,
            feedback.created_at,
        ],
    )?;
    Ok(())
}

/// Map a row selected with `FEEDBACK_COLUMNS` (column 0 is the row id).
fn feedback_from_row(row: &Row<'_>) -> rusqlite::Result<SessionFeedback> {
    let duration: i64 = row.get(3)?;
    let total: i64 = row.get(4)?;
    let score: i64 = row.get(5)?;
    Ok(SessionFeedback {
        mock_id_ref: row.get(1)?,
        user_email: row.get(2)?,
        duration_seconds: duration.max(0) as u64,
        total_messages: total.max(0) as usize,
        average_score: score.clamp(0, 100) as u8,
        conversation: json_column(row, 6)?,
        strengths: json_column(row, 7)?,
        weaknesses: json_column(row, 8)?,
        detailed_feedback: row.get(9)?,
        message_analysis: json_column(row, 10)?,
        created_at: row.get(11)?,
    })
}

/// Keep rows that decode; log and skip the rest.
fn readable<T>(table: &'static str) -> impl FnMut(rusqlite::Result<T>) -> Option<T> {
    move |row| match row {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(table, error = %e, "Skipping unreadable row");
            None
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> AppResult<String> {
    Ok(serde_json::to_string(value)?)
}

fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Parse a stored enum label, falling back to the default for unknown values.
fn parse_label<T: DeserializeOwned + Default>(label: String) -> T {
    serde_json::from_value(serde_json::Value::String(label)).unwrap_or_default()
}
