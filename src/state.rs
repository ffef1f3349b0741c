//! Application State
//!
//! Shared state handed to every HTTP handler: database, configuration, the
//! current Generation Client and the table of live practice sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use interview_arena_llm::{create_provider, GenerationClient};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::models::settings::{AppConfig, SettingsUpdate};
use crate::services::practice::PracticeSession;
use crate::storage::{ConfigService, Database};
use crate::utils::error::{AppError, AppResult};

/// Minutes a timed-out session can still be finished before it is evicted.
pub const SESSION_GRACE_MINUTES: i64 = 15;

/// A live session plus its cancellation token.
///
/// The token and deadline are kept outside the mutex so a session can be
/// abandoned or evicted while a turn is still holding the lock.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    pub session: Arc<Mutex<PracticeSession>>,
    pub cancel: CancellationToken,
    /// End of the session's time limit
    pub expires_at: DateTime<Utc>,
}

impl SessionHandle {
    /// Whether the session is past its time limit and the grace period.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at + chrono::Duration::minutes(SESSION_GRACE_MINUTES)
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// SQLite database with connection pool
    pub db: Database,
    /// Configuration service for app settings
    config: Arc<RwLock<ConfigService>>,
    /// Client rebuilt whenever provider settings change
    generation: Arc<RwLock<Arc<GenerationClient>>>,
    /// Live practice sessions by session id
    sessions: Arc<RwLock<HashMap<String, SessionHandle>>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

/// Build the Generation Client described by the configuration.
pub fn build_generation_client(config: &AppConfig) -> AppResult<GenerationClient> {
    let provider = create_provider(config.provider_config())?;
    Ok(GenerationClient::new(provider, config.models.clone())
        .with_retry_policy(config.retry_policy())
        .with_attempt_timeout(config.attempt_timeout()))
}

impl AppState {
    /// Assemble state from already constructed parts (tests inject a stub client here).
    pub fn new(db: Database, config: ConfigService, client: GenerationClient) -> Self {
        Self {
            db,
            config: Arc::new(RwLock::new(config)),
            generation: Arc::new(RwLock::new(Arc::new(client))),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            startup_time: Utc::now(),
        }
    }

    /// Build state with the provider named by the configuration.
    pub fn from_config(db: Database, config: ConfigService) -> AppResult<Self> {
        let client = build_generation_client(config.get_config())?;
        Ok(Self::new(db, config, client))
    }

    /// Current Generation Client
    pub async fn generation_client(&self) -> Arc<GenerationClient> {
        self.generation.read().await.clone()
    }

    /// Snapshot of the current configuration
    pub async fn config(&self) -> AppConfig {
        self.config.read().await.get_config_clone()
    }

    pub async fn config_healthy(&self) -> bool {
        self.config.read().await.is_healthy()
    }

    /// Apply a settings update, persist it and rebuild the Generation Client.
    ///
    /// Nothing changes when the update is invalid or the client cannot be built.
    pub async fn update_settings(&self, update: SettingsUpdate) -> AppResult<AppConfig> {
        let mut config = self.config.write().await;

        let mut candidate = config.get_config_clone();
        candidate.apply_update(update.clone());
        candidate.validate().map_err(AppError::validation)?;
        let client = build_generation_client(&candidate)?;

        let updated = config.update_config(update)?;
        *self.generation.write().await = Arc::new(client);

        tracing::info!(
            provider = %updated.provider,
            models = ?updated.models,
            "Settings updated, generation client rebuilt"
        );
        Ok(updated)
    }

    // ========================================================================
    // Live sessions
    // ========================================================================

    /// Register a session.
    ///
    /// Stale sessions are evicted first. Fails when the id is already live.
    pub async fn insert_session(&self, session: PracticeSession) -> AppResult<SessionHandle> {
        let id = session.id.clone();
        let expires_at =
            session.started_at + chrono::Duration::seconds(session.time_limit.seconds() as i64);
        let handle = SessionHandle {
            cancel: session.cancellation_token(),
            session: Arc::new(Mutex::new(session)),
            expires_at,
        };

        let mut sessions = self.sessions.write().await;
        evict_stale(&mut sessions, Utc::now());
        if sessions.contains_key(&id) {
            return Err(AppError::validation(format!(
                "Practice session already exists: {}",
                id
            )));
        }
        sessions.insert(id, handle.clone());
        Ok(handle)
    }

    /// Look up a live session
    pub async fn session(&self, id: &str) -> AppResult<SessionHandle> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Practice session not found: {}", id)))
    }

    /// Remove a session, cancelling anything still in flight for it
    pub async fn remove_session(&self, id: &str) -> AppResult<SessionHandle> {
        let handle = self
            .sessions
            .write()
            .await
            .remove(id)
            .ok_or_else(|| AppError::not_found(format!("Practice session not found: {}", id)))?;
        handle.cancel.cancel();
        Ok(handle)
    }

    /// Drop every stale session, cancelling its token. Returns how many went.
    pub async fn evict_stale_sessions(&self, now: DateTime<Utc>) -> usize {
        let evicted = evict_stale(&mut *self.sessions.write().await, now);
        if evicted > 0 {
            info!(evicted, "Stale practice sessions evicted");
        }
        evicted
    }

    /// Evict stale sessions every `period` until `shutdown` is cancelled.
    pub fn spawn_session_sweeper(
        &self,
        period: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let state = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        state.evict_stale_sessions(Utc::now()).await;
                    }
                }
            }
            debug!("Session sweeper stopped");
        })
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }
}

fn evict_stale(sessions: &mut HashMap<String, SessionHandle>, now: DateTime<Utc>) -> usize {
    let before = sessions.len();
    sessions.retain(|id, handle| {
        if handle.is_stale(now) {
            handle.cancel.cancel();
            debug!(session_id = %id, "Evicting stale practice session");
            false
        } else {
            true
        }
    });
    before - sessions.len()
}
