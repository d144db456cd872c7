//! Board membership and event flow on top of the registry and sequencer.
//!
//! These functions own the side effects of joining, leaving and producing:
//! registry updates, departure notices and best-effort session rows. Stored
//! events are relayed here, inside the board's sequencing turn, so every
//! peer receives them in sequence order. Presence relays are returned to the
//! socket layer, which owns the rest of fan-out.

#[cfg(test)]
#[path = "board_test.rs"]
mod board_test;

use protocol::{BoardId, Collaborator, DrawingEvent, ErrorCode, EventData, Point, RemoteCursor, ServerMessage};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use super::session::{BoardSession, Joined};
use super::store::StoreError;
use crate::state::AppState;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum JoinError {
    #[error("Board not found: {0}")]
    NotFound(BoardId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ErrorCode for JoinError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_BOARD_NOT_FOUND",
            Self::Store(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::NotFound(_) => false,
            Self::Store(e) => e.retryable(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("no active session; join a board first")]
    NoActiveSession,
    #[error("event targets board {event} but the session is on {session}")]
    BoardMismatch { event: BoardId, session: BoardId },
    #[error("invalid message: {0}")]
    InvalidMessage(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ErrorCode for SyncError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NoActiveSession => "E_NO_ACTIVE_SESSION",
            Self::BoardMismatch { .. } => "E_BOARD_MISMATCH",
            Self::InvalidMessage(_) => "E_INVALID_MESSAGE",
            Self::Store(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Store(e) if e.retryable())
    }
}

// =============================================================================
// MEMBERSHIP
// =============================================================================

/// Validate `board_id` and register the connection on it.
///
/// If the connection was on another board it leaves that board first, and
/// that board's peers hear `collaborator_left`. Announcing the arrival is
/// left to the caller.
///
/// # Errors
///
/// [`JoinError::NotFound`] for an unknown board; the connection's previous
/// membership is untouched in that case.
pub async fn join_board(
    state: &AppState,
    board_id: &BoardId,
    connection_id: Uuid,
    tx: mpsc::Sender<ServerMessage>,
    color: Option<String>,
) -> Result<BoardSession, JoinError> {
    if !state.boards.board_exists(board_id).await? {
        return Err(JoinError::NotFound(board_id.clone()));
    }

    let Joined { session, previous } = state.sessions.join(board_id, connection_id, tx, color).await;
    if let Some(previous) = previous {
        announce_left(state, &previous).await;
    }
    state.session_rows.joined(&session).await;

    info!(%board_id, session_id = %session.id, %connection_id, "board: joined");
    Ok(session)
}

/// Remove the connection's session, if any, and tell the board's peers.
pub async fn part_board(state: &AppState, connection_id: Uuid) -> Option<BoardSession> {
    let session = state.sessions.leave(connection_id).await?;
    announce_left(state, &session).await;
    Some(session)
}

async fn announce_left(state: &AppState, session: &BoardSession) {
    let left = ServerMessage::CollaboratorLeft(Collaborator { session_id: session.id, session_color: None });
    state.sessions.broadcast(&session.board_id, &left, Some(session.connection_id)).await;
    state.session_rows.left(session.id).await;
    if state.sessions.member_count(&session.board_id).await == 0 {
        state.sequencer.forget(&session.board_id).await;
    }
    info!(board_id = %session.board_id, session_id = %session.id, "board: left");
}

// =============================================================================
// EVENTS
// =============================================================================

/// What a submitted event turned into.
#[derive(Debug, Clone, PartialEq)]
pub enum Submitted {
    /// Sequenced, stored and already relayed to peers.
    Stored(DrawingEvent),
    /// Presence only; the caller relays it as `cursor_move`.
    Cursor(RemoteCursor),
}

/// Sequence, persist and relay one event from a joined connection.
///
/// Peers other than the sender receive the stamped event before the next
/// event on the board is sequenced. Cursor payloads are presence, not history: they refresh the session's
/// cursor and never reach the store.
///
/// # Errors
///
/// Fails without storing anything when the connection has no session, the
/// event names another board, or the store rejects the append.
pub async fn submit_event(state: &AppState, connection_id: Uuid, proposed: DrawingEvent) -> Result<Submitted, SyncError> {
    let Some(session) = state.sessions.get(connection_id).await else {
        return Err(SyncError::NoActiveSession);
    };
    if proposed.board_id != session.board_id {
        return Err(SyncError::BoardMismatch { event: proposed.board_id, session: session.board_id });
    }

    if let EventData::Cursor(point) = proposed.data {
        return move_cursor(state, connection_id, point)
            .await
            .map(Submitted::Cursor)
            .ok_or(SyncError::NoActiveSession);
    }

    state.sessions.touch(connection_id, None).await;
    let sessions = state.sessions.clone();
    let event = state
        .sequencer
        .stamp_append_then(&session.board_id, session.id, proposed.data, |stored| async move {
            let board_id = stored.board_id.clone();
            sessions.broadcast(&board_id, &ServerMessage::DrawingEvent(stored), Some(connection_id)).await;
        })
        .await?;
    info!(
        board_id = %event.board_id,
        session_id = %event.session_id,
        sequence = event.sequence,
        kind = %event.kind(),
        "board: event sequenced and relayed"
    );
    Ok(Submitted::Stored(event))
}

/// Record the session's cursor. `None` without a session.
pub async fn move_cursor(state: &AppState, connection_id: Uuid, point: Point) -> Option<RemoteCursor> {
    let session = state.sessions.touch(connection_id, Some(point)).await?;
    Some(RemoteCursor { session_id: session.id, session_color: session.session_color, cursor: point })
}
