//! Per-board sequence assignment.
//!
//! DESIGN
//! ======
//! Each board gets its own async mutex around the last assigned sequence.
//! Producers on one board serialize through it; different boards never
//! contend. The counter is seeded lazily from the store's maximum and only
//! advances once the append succeeds, so a failed write never leaves a gap.
//! Any store error drops the cached counter and the next producer reseeds.
//!
//! Work that must observe sequence order, such as relaying to peers, runs
//! through [`Sequencer::stamp_append_then`] while the board's turn is still
//! held. Counters for boards with no members are dropped via
//! [`Sequencer::forget`] and reseeded on the next write.

#[cfg(test)]
#[path = "sequencer_test.rs"]
mod sequencer_test;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use protocol::{BoardId, DrawingEvent, EventData, EventId, SessionId, now_ms};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::store::{EventStore, StoreError};

type Counter = Arc<Mutex<Option<i64>>>;

#[derive(Clone)]
pub struct Sequencer {
    store: Arc<dyn EventStore>,
    counters: Arc<Mutex<HashMap<BoardId, Counter>>>,
}

impl Sequencer {
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store, counters: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Assign the next sequence on `board_id`, stamp server-owned fields and
    /// append. The returned event is exactly what was stored.
    ///
    /// # Errors
    ///
    /// Propagates the store failure; nothing is stored and the sequence is
    /// not consumed.
    pub async fn stamp_and_append(
        &self,
        board_id: &BoardId,
        session_id: SessionId,
        data: EventData,
    ) -> Result<DrawingEvent, StoreError> {
        self.stamp_append_then(board_id, session_id, data, |_| async {}).await
    }

    /// Like [`Sequencer::stamp_and_append`], then run `then` with a copy of
    /// the stored event before the board's next producer may proceed.
    ///
    /// # Errors
    ///
    /// Propagates the store failure; `then` does not run.
    pub async fn stamp_append_then<F, Fut>(
        &self,
        board_id: &BoardId,
        session_id: SessionId,
        data: EventData,
        then: F,
    ) -> Result<DrawingEvent, StoreError>
    where
        F: FnOnce(DrawingEvent) -> Fut,
        Fut: Future<Output = ()>,
    {
        let counter = self.counter(board_id).await;
        let mut last = counter.lock().await;

        let current = match *last {
            Some(n) => n,
            None => self.store.max_sequence(board_id).await?,
        };

        let event = DrawingEvent {
            id: EventId::random(),
            board_id: board_id.clone(),
            session_id,
            data,
            timestamp: now_ms(),
            sequence: current + 1,
        };

        match self.store.append(&event).await {
            Ok(()) => {
                *last = Some(event.sequence);
                debug!(%board_id, sequence = event.sequence, "sequencer: appended");
                then(event.clone()).await;
                Ok(event)
            }
            Err(e) => {
                *last = None;
                warn!(%board_id, sequence = event.sequence, error = %e, "sequencer: append failed");
                Err(e)
            }
        }
    }

    /// Stored events with `sequence > from`, ascending.
    ///
    /// # Errors
    ///
    /// Propagates the store failure.
    pub async fn replay(&self, board_id: &BoardId, from: Option<i64>) -> Result<Vec<DrawingEvent>, StoreError> {
        let mut events = self.store.query_by_sequence(board_id, from).await?;
        events.sort_by_key(|e| e.sequence);
        Ok(events)
    }

    /// Drop the cached counter for `board_id` unless a producer holds it.
    pub async fn forget(&self, board_id: &BoardId) {
        let mut counters = self.counters.lock().await;
        if counters.get(board_id).is_some_and(|counter| Arc::strong_count(counter) == 1) {
            counters.remove(board_id);
            debug!(%board_id, "sequencer: counter released");
        }
    }

    #[cfg(test)]
    pub async fn tracked_boards(&self) -> usize {
        self.counters.lock().await.len()
    }

    async fn counter(&self, board_id: &BoardId) -> Counter {
        let mut counters = self.counters.lock().await;
        counters.entry(board_id.clone()).or_default().clone()
    }
}
