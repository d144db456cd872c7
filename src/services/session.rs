//! Live session registry: who is on which board, and their outbound channels.
//!
//! DESIGN
//! ======
//! One table keyed by connection id holds each socket's current
//! [`BoardSession`]; a second groups outbound senders by board for fan-out.
//! Both sit behind a single `RwLock` so membership and broadcast targets
//! never disagree. A connection holds at most one session.
//!
//! Broadcast is best-effort `try_send`: a slow or closed client is skipped
//! and logged, never awaited.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use protocol::{BoardId, Point, ServerMessage, SessionId, now_ms};
use rand::seq::IndexedRandom;
use serde::Serialize;
use tokio::sync::{RwLock, mpsc};
use tracing::warn;
use uuid::Uuid;

/// Colors handed to joiners that do not bring their own.
pub const SESSION_PALETTE: [&str; 15] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FECA57", "#FF9FF3", "#54A0FF", "#5F27CD", "#00D2D3", "#FF9F43",
    "#10AC84", "#EE5A24", "#0984E3", "#6C5CE7", "#A29BFE",
];

/// One participant's presence on one board.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSession {
    #[serde(rename = "sessionId")]
    pub id: SessionId,
    #[serde(skip)]
    pub board_id: BoardId,
    #[serde(skip)]
    pub connection_id: Uuid,
    pub session_color: String,
    pub joined_at: i64,
    pub last_seen: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<Point>,
}

/// Result of registering a connection on a board.
#[derive(Debug)]
pub struct Joined {
    pub session: BoardSession,
    /// Session the connection held before, already removed.
    pub previous: Option<BoardSession>,
}

#[derive(Default)]
struct Registry {
    sessions: HashMap<Uuid, BoardSession>,
    members: HashMap<BoardId, HashMap<Uuid, mpsc::Sender<ServerMessage>>>,
}

impl Registry {
    fn remove(&mut self, connection_id: Uuid) -> Option<BoardSession> {
        let session = self.sessions.remove(&connection_id)?;
        if let Some(group) = self.members.get_mut(&session.board_id) {
            group.remove(&connection_id);
            if group.is_empty() {
                self.members.remove(&session.board_id);
            }
        }
        Some(session)
    }
}

#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<RwLock<Registry>>,
    idle: Duration,
}

impl SessionRegistry {
    #[must_use]
    pub fn new(idle: Duration) -> Self {
        Self { inner: Arc::new(RwLock::new(Registry::default())), idle }
    }

    /// Register `connection_id` on `board_id`, leaving any board it was on.
    /// Board existence is the caller's concern.
    pub async fn join(
        &self,
        board_id: &BoardId,
        connection_id: Uuid,
        tx: mpsc::Sender<ServerMessage>,
        color: Option<String>,
    ) -> Joined {
        let now = now_ms();
        let session = BoardSession {
            id: SessionId::random(),
            board_id: board_id.clone(),
            connection_id,
            session_color: color.filter(|c| !c.trim().is_empty()).unwrap_or_else(pick_color),
            joined_at: now,
            last_seen: now,
            cursor: None,
        };

        let mut registry = self.inner.write().await;
        let previous = registry.remove(connection_id);
        registry.sessions.insert(connection_id, session.clone());
        registry.members.entry(board_id.clone()).or_default().insert(connection_id, tx);

        Joined { session, previous }
    }

    /// Drop the connection's session. Idempotent.
    pub async fn leave(&self, connection_id: Uuid) -> Option<BoardSession> {
        self.inner.write().await.remove(connection_id)
    }

    /// Refresh `last_seen`, and the cursor when one is given.
    pub async fn touch(&self, connection_id: Uuid, cursor: Option<Point>) -> Option<BoardSession> {
        let mut registry = self.inner.write().await;
        let session = registry.sessions.get_mut(&connection_id)?;
        session.last_seen = now_ms();
        if cursor.is_some() {
            session.cursor = cursor;
        }
        Some(session.clone())
    }

    pub async fn get(&self, connection_id: Uuid) -> Option<BoardSession> {
        self.inner.read().await.sessions.get(&connection_id).cloned()
    }

    /// Sessions on `board_id` seen within the idle horizon, oldest join first.
    pub async fn active_members(&self, board_id: &BoardId) -> Vec<BoardSession> {
        let horizon = now_ms() - i64::try_from(self.idle.as_millis()).unwrap_or(i64::MAX);
        let registry = self.inner.read().await;
        let mut members: Vec<BoardSession> = registry
            .sessions
            .values()
            .filter(|s| &s.board_id == board_id && s.last_seen >= horizon)
            .cloned()
            .collect();
        members.sort_by(|a, b| {
            a.joined_at
                .cmp(&b.joined_at)
                .then_with(|| a.id.as_uuid().cmp(&b.id.as_uuid()))
        });
        members
    }

    /// Number of connections currently on `board_id`, idle or not.
    pub async fn member_count(&self, board_id: &BoardId) -> usize {
        self.inner.read().await.members.get(board_id).map_or(0, HashMap::len)
    }

    /// Queue `message` for every member of `board_id` except `exclude`.
    /// Returns how many channels accepted it.
    pub async fn broadcast(&self, board_id: &BoardId, message: &ServerMessage, exclude: Option<Uuid>) -> usize {
        let registry = self.inner.read().await;
        let Some(group) = registry.members.get(board_id) else {
            return 0;
        };

        let mut delivered = 0;
        for (connection_id, tx) in group {
            if exclude == Some(*connection_id) {
                continue;
            }
            match tx.try_send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => warn!(%board_id, %connection_id, error = %e, "broadcast: dropped message"),
            }
        }
        delivered
    }
}

fn pick_color() -> String {
    SESSION_PALETTE.choose(&mut rand::rng()).copied().unwrap_or(SESSION_PALETTE[0]).to_owned()
}
