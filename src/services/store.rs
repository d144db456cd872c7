//! Storage seams.
//!
//! The sequencer and socket handlers only see these traits. `PgStore`
//! backs them with Postgres; `MemoryStore` backs them with process memory
//! for development and tests.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use async_trait::async_trait;
use protocol::{BoardId, DrawingEvent, SessionId};

use crate::services::session::BoardSession;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("event store unavailable")]
    Unavailable,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("stored event is corrupt: {0}")]
    Corrupt(String),
    #[error("sequence {sequence} already taken on board {board_id}")]
    Conflict { board_id: BoardId, sequence: i64 },
}

impl protocol::ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unavailable | Self::Database(_) => "E_STORE_UNAVAILABLE",
            Self::Corrupt(_) => "E_STORE_CORRUPT",
            Self::Conflict { .. } => "E_SEQUENCE_CONFLICT",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Unavailable | Self::Database(_) | Self::Conflict { .. })
    }
}

/// Append-only event log, ordered per board by `sequence`.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Highest stored sequence for the board, `0` when it has none.
    async fn max_sequence(&self, board_id: &BoardId) -> Result<i64, StoreError>;

    /// Durably store a stamped event. Fails with [`StoreError::Conflict`] if
    /// the board already holds that sequence.
    async fn append(&self, event: &DrawingEvent) -> Result<(), StoreError>;

    /// Events with `sequence > from` (all events when `from` is `None`).
    /// Implementations should return ascending order; callers re-sort anyway.
    async fn query_by_sequence(&self, board_id: &BoardId, from: Option<i64>)
    -> Result<Vec<DrawingEvent>, StoreError>;
}

/// Which board ids exist.
#[async_trait]
pub trait BoardDirectory: Send + Sync {
    async fn board_exists(&self, board_id: &BoardId) -> Result<bool, StoreError>;
}

/// Durable record of who joined which board. Writes are best-effort.
#[async_trait]
pub trait SessionLog: Send + Sync {
    async fn record_join(&self, session: &BoardSession) -> Result<(), StoreError>;

    async fn record_leave(&self, session_id: SessionId) -> Result<(), StoreError>;
}
