//! In-process store used when no database is configured, and by tests.

#[cfg(test)]
#[path = "memory_test.rs"]
mod memory_test;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use protocol::{BoardId, DrawingEvent, SessionId};
use tokio::sync::RwLock;

use super::session::BoardSession;
use super::store::{BoardDirectory, EventStore, SessionLog, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    events: RwLock<HashMap<BoardId, Vec<DrawingEvent>>>,
    boards: RwLock<HashSet<BoardId>>,
    sessions: RwLock<HashMap<SessionId, BoardSession>>,
    /// Accept any board id instead of consulting `boards`.
    open: bool,
    unavailable: AtomicBool,
}

impl MemoryStore {
    /// Store whose directory accepts every board id.
    #[must_use]
    pub fn open() -> Self {
        Self { open: true, ..Self::default() }
    }

    /// Store whose directory knows only `boards`.
    #[must_use]
    pub fn with_boards(boards: impl IntoIterator<Item = BoardId>) -> Self {
        Self { boards: RwLock::new(boards.into_iter().collect()), ..Self::default() }
    }

    #[cfg(test)]
    pub async fn add_board(&self, board_id: BoardId) {
        self.boards.write().await.insert(board_id);
    }

    /// Make every operation fail with [`StoreError::Unavailable`].
    #[cfg(test)]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    #[cfg(test)]
    pub async fn event_count(&self, board_id: &BoardId) -> usize {
        self.events.read().await.get(board_id).map_or(0, Vec::len)
    }

    #[cfg(test)]
    pub async fn recorded_session(&self, session_id: SessionId) -> Option<BoardSession> {
        self.sessions.read().await.get(&session_id).cloned()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) { Err(StoreError::Unavailable) } else { Ok(()) }
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn max_sequence(&self, board_id: &BoardId) -> Result<i64, StoreError> {
        self.check()?;
        let events = self.events.read().await;
        Ok(events
            .get(board_id)
            .and_then(|log| log.iter().map(|e| e.sequence).max())
            .unwrap_or(0))
    }

    async fn append(&self, event: &DrawingEvent) -> Result<(), StoreError> {
        self.check()?;
        let mut events = self.events.write().await;
        let log = events.entry(event.board_id.clone()).or_default();
        if log.iter().any(|e| e.sequence == event.sequence) {
            return Err(StoreError::Conflict { board_id: event.board_id.clone(), sequence: event.sequence });
        }
        log.push(event.clone());
        log.sort_by_key(|e| e.sequence);
        Ok(())
    }

    async fn query_by_sequence(
        &self,
        board_id: &BoardId,
        from: Option<i64>,
    ) -> Result<Vec<DrawingEvent>, StoreError> {
        self.check()?;
        let floor = from.unwrap_or(0);
        let events = self.events.read().await;
        Ok(events
            .get(board_id)
            .map(|log| log.iter().filter(|e| e.sequence > floor).cloned().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl BoardDirectory for MemoryStore {
    async fn board_exists(&self, board_id: &BoardId) -> Result<bool, StoreError> {
        self.check()?;
        Ok(self.open || self.boards.read().await.contains(board_id))
    }
}

#[async_trait]
impl SessionLog for MemoryStore {
    async fn record_join(&self, session: &BoardSession) -> Result<(), StoreError> {
        self.check()?;
        self.sessions.write().await.insert(session.id, session.clone());
        Ok(())
    }

    async fn record_leave(&self, session_id: SessionId) -> Result<(), StoreError> {
        self.check()?;
        self.sessions.write().await.remove(&session_id);
        Ok(())
    }
}
