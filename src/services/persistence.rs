//! Postgres-backed event log, board directory and session rows.
//!
//! DESIGN
//! ======
//! `drawing_events` carries `UNIQUE (board_id, sequence)`, so a second
//! writer racing the in-process sequencer (another server instance, a stale
//! counter) surfaces as [`StoreError::Conflict`] instead of a silent fork.
//! Event payloads are stored as JSONB keyed by `event_type` and decoded
//! through the protocol's raw wire form on the way out.

#[cfg(test)]
#[path = "persistence_test.rs"]
mod persistence_test;

use async_trait::async_trait;
use protocol::event::RawDrawingEvent;
use protocol::{BoardId, DrawingEvent, EventId, SessionId};
use sqlx::PgPool;
use uuid::Uuid;

use super::session::BoardSession;
use super::store::{BoardDirectory, EventStore, SessionLog, StoreError};

type EventRow = (Uuid, String, Uuid, String, serde_json::Value, i64, i64);

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for PgStore {
    async fn max_sequence(&self, board_id: &BoardId) -> Result<i64, StoreError> {
        let max = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(MAX(sequence), 0)::BIGINT FROM drawing_events WHERE board_id = $1",
        )
        .bind(board_id.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(max)
    }

    async fn append(&self, event: &DrawingEvent) -> Result<(), StoreError> {
        let result = sqlx::query(
            "INSERT INTO drawing_events (id, board_id, session_id, event_type, event_data, sequence, event_timestamp)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(event.id.as_uuid())
        .bind(event.board_id.as_str())
        .bind(event.session_id.as_uuid())
        .bind(event.kind().as_str())
        .bind(event.data.to_value())
        .bind(event.sequence)
        .bind(event.timestamp)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::Conflict { board_id: event.board_id.clone(), sequence: event.sequence })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn query_by_sequence(
        &self,
        board_id: &BoardId,
        from: Option<i64>,
    ) -> Result<Vec<DrawingEvent>, StoreError> {
        let rows = sqlx::query_as::<_, EventRow>(
            "SELECT id, board_id, session_id, event_type, event_data, sequence, event_timestamp
             FROM drawing_events
             WHERE board_id = $1 AND sequence > $2
             ORDER BY sequence ASC",
        )
        .bind(board_id.as_str())
        .bind(from.unwrap_or(0))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_event).collect()
    }
}

#[async_trait]
impl BoardDirectory for PgStore {
    async fn board_exists(&self, board_id: &BoardId) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM boards WHERE id = $1)")
            .bind(board_id.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

#[async_trait]
impl SessionLog for PgStore {
    async fn record_join(&self, session: &BoardSession) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO board_sessions (id, board_id, session_color, joined_at, last_seen)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (id) DO UPDATE SET last_seen = EXCLUDED.last_seen",
        )
        .bind(session.id.as_uuid())
        .bind(session.board_id.as_str())
        .bind(&session.session_color)
        .bind(session.joined_at)
        .bind(session.last_seen)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn record_leave(&self, session_id: SessionId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM board_sessions WHERE id = $1")
            .bind(session_id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn row_to_event(row: EventRow) -> Result<DrawingEvent, StoreError> {
    let (id, board_id, session_id, kind, data, sequence, timestamp) = row;
    let raw = RawDrawingEvent {
        id: EventId::from_uuid(id),
        board_id: BoardId::new(board_id),
        session_id: SessionId::from_uuid(session_id),
        kind,
        data,
        timestamp,
        sequence,
    };
    DrawingEvent::try_from(raw).map_err(|e| StoreError::Corrupt(format!("event {id}: {e}")))
}
