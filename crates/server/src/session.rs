//! Session Management
//!
//! One [`KioskAgent`] per kiosk session, kept in memory. Sessions idle for
//! longer than the configured timeout are dropped by a background task;
//! the reception store lives in the shared engine and outlives them.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

use kiosk_agent::{Agent, DialogueEngine, KioskAgent, TurnReply};
use kiosk_core::{ConversationState, SubState};

use crate::ServerError;

/// Serializable view of a session
///
/// Carries dialogue progress only; the visitor's personal details stay
/// inside the agent.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub idle_secs: u64,
    pub turn_count: u64,
    pub state: ConversationState,
    pub sub_state: Option<SubState>,
    pub retry_count: u32,
}

/// Session state
pub struct Session {
    pub id: String,
    pub agent: Arc<KioskAgent>,
    pub created_at: DateTime<Utc>,
    last_activity: RwLock<Instant>,
    turn_count: AtomicU64,
}

impl Session {
    pub fn new(id: impl Into<String>, engine: Arc<DialogueEngine>) -> Self {
        let id = id.into();
        Self {
            agent: Arc::new(KioskAgent::new(id.clone(), engine)),
            id,
            created_at: Utc::now(),
            last_activity: RwLock::new(Instant::now()),
            turn_count: AtomicU64::new(0),
        }
    }

    /// Run one turn and mark the session active
    pub async fn process(&self, utterance: &str) -> TurnReply {
        self.touch();
        let reply = self.agent.process(utterance).await;
        self.turn_count.fetch_add(1, Ordering::Relaxed);
        self.touch();
        reply
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let ctx = self.agent.snapshot().await;
        SessionSnapshot {
            session_id: self.id.clone(),
            created_at: self.created_at,
            idle_secs: self.last_activity.read().elapsed().as_secs(),
            turn_count: self.turn_count(),
            state: ctx.state,
            sub_state: ctx.sub_state,
            retry_count: ctx.retry_count,
        }
    }

    pub fn turn_count(&self) -> u64 {
        self.turn_count.load(Ordering::Relaxed)
    }

    /// Update last activity
    pub fn touch(&self) {
        *self.last_activity.write() = Instant::now();
    }

    /// Check if session is expired
    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.last_activity.read().elapsed() > timeout
    }
}

/// Session manager
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    engine: Arc<DialogueEngine>,
    max_sessions: usize,
    session_timeout: Duration,
    cleanup_interval: Duration,
}

impl SessionManager {
    pub fn new(engine: Arc<DialogueEngine>, max_sessions: usize, session_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            engine,
            max_sessions,
            session_timeout,
            cleanup_interval: (session_timeout / 4).max(Duration::from_secs(1)),
        }
    }

    /// Start a background task that periodically removes expired sessions.
    ///
    /// Send `true` on the returned channel to stop it.
    pub fn start_cleanup_task(self: &Arc<Self>) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let manager = Arc::clone(self);
        let interval = manager.cleanup_interval;

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);
            interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let removed = manager.cleanup_expired();
                        if removed > 0 {
                            tracing::info!(
                                removed,
                                remaining = manager.count(),
                                "Session cleanup"
                            );
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("Session cleanup task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }

    /// Create a session with a fresh id
    pub fn create(&self) -> Result<Arc<Session>, ServerError> {
        self.insert(uuid::Uuid::new_v4().to_string())
    }

    /// Get a session, creating it under `id` when unknown
    pub fn get_or_create(&self, id: &str) -> Result<Arc<Session>, ServerError> {
        if let Some(session) = self.get(id) {
            return Ok(session);
        }
        self.insert(id.to_string())
    }

    fn insert(&self, id: String) -> Result<Arc<Session>, ServerError> {
        let mut sessions = self.sessions.write();

        // lost a race with another creator
        if let Some(existing) = sessions.get(&id) {
            return Ok(Arc::clone(existing));
        }

        if sessions.len() >= self.max_sessions {
            self.cleanup_expired_internal(&mut sessions);

            if sessions.len() >= self.max_sessions {
                return Err(ServerError::SessionLimit(self.max_sessions));
            }
        }

        let session = Arc::new(Session::new(id.clone(), Arc::clone(&self.engine)));
        sessions.insert(id.clone(), Arc::clone(&session));
        crate::metrics::set_active_sessions(sessions.len());

        tracing::info!(session_id = %id, "Created session");
        Ok(session)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().get(id).cloned()
    }

    /// Remove a session, returning whether it existed
    pub fn remove(&self, id: &str) -> bool {
        let mut sessions = self.sessions.write();
        let removed = sessions.remove(id).is_some();
        if removed {
            crate::metrics::set_active_sessions(sessions.len());
            tracing::info!(session_id = %id, "Removed session");
        }
        removed
    }

    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    /// Remove expired sessions, returning how many were dropped
    pub fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write();
        self.cleanup_expired_internal(&mut sessions)
    }

    fn cleanup_expired_internal(&self, sessions: &mut HashMap<String, Arc<Session>>) -> usize {
        let timeout = self.session_timeout;
        let before = sessions.len();

        sessions.retain(|id, session| {
            let keep = !session.is_expired(timeout);
            if !keep {
                tracing::info!(session_id = %id, "Expired session");
            }
            keep
        });

        let removed = before - sessions.len();
        if removed > 0 {
            crate::metrics::set_active_sessions(sessions.len());
        }
        removed
    }
}
