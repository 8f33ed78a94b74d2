//! Session store for per-conversation turn history.
//!
//! Sessions live for the process lifetime and are keyed by an opaque
//! session identifier. The store is the only holder of conversation
//! state; the pipeline reads a history snapshot at the start of a run
//! and appends the new turns at the end, never mutating history
//! directly. A durable backend can replace [`MemorySessionStore`]
//! behind the same trait without changing pipeline behavior.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::SessionResult;

/// A conversation grouping an ordered sequence of turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque session identifier supplied by the caller.
    pub id: String,
    /// Ordered turn history, oldest first.
    pub turns: Vec<Turn>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A single conversation turn. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Unique turn identifier.
    pub id: String,
    /// Who produced the turn.
    pub role: Role,
    /// Turn text content.
    pub content: String,
    /// Source labels backing an assistant turn; empty for user turns
    /// and out-of-scope replies.
    pub sources: Vec<String>,
    /// When the turn was created.
    pub created_at: DateTime<Utc>,
}

/// Turn author role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// End-user utterance.
    User,
    /// Pipeline-produced answer.
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "User"),
            Role::Assistant => write!(f, "Assistant"),
        }
    }
}

impl Session {
    /// Create a new empty session with the given identifier
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            turns: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Turn {
    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::User,
            content: content.into(),
            sources: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Create an assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::Assistant,
            content: content.into(),
            sources: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Attach source labels
    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = sources;
        self
    }
}

/// Persistence seam for conversation history.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Snapshot the turn history for a session. Unknown sessions yield
    /// an empty history rather than an error.
    async fn history(&self, session_id: &str) -> SessionResult<Vec<Turn>>;

    /// Append a turn, creating the session if it does not exist.
    async fn append(&self, session_id: &str, turn: Turn) -> SessionResult<()>;

    /// Clear a session's history. Clearing also resets the context
    /// rewriter's view, since it reads only from this store.
    async fn clear(&self, session_id: &str) -> SessionResult<()>;
}

/// In-memory session store. Process-lifetime state, no persistence.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn history(&self, session_id: &str) -> SessionResult<Vec<Turn>> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(session_id)
            .map(|s| s.turns.clone())
            .unwrap_or_default())
    }

    async fn append(&self, session_id: &str, turn: Turn) -> SessionResult<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Session::new(session_id));
        session.turns.push(turn);
        session.updated_at = Utc::now();
        Ok(())
    }

    async fn clear(&self, session_id: &str) -> SessionResult<()> {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(session_id) {
            session.turns.clear();
            session.updated_at = Utc::now();
        }
        Ok(())
    }
}
