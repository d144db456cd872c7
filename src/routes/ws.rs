//! WebSocket handler: the realtime sync channel.
//!
//! DESIGN
//! ======
//! On upgrade, assigns a connection id and enters a `select!` loop:
//! - Incoming client messages → decode + dispatch by message type
//! - Messages queued by board peers → forward to the client
//!
//! Handler functions validate, call into `services`, and return an
//! `Outcome`. The dispatch layer owns outbound concerns: reply to sender
//! and fan-out of presence to peers. Stored drawing events are relayed by
//! the board service inside the sequencing turn so peers see them in
//! sequence order. The sender never receives its own relayed event; it
//! already applied it optimistically. Errors answering a request name it.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → idle until `join_board`
//! 2. `join_board` → `session_joined` + `sync_events` to sender, `collaborator_joined` to peers
//! 3. `drawing_event` / `cursor_move` → sequenced and relayed to peers
//! 4. Close → `collaborator_left` to peers → cleanup

#[cfg(test)]
#[path = "ws_test.rs"]
mod ws_test;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use protocol::{
    BoardId, ClientMessage, Collaborator, CursorMove, DrawingEvent, ErrorCode, ErrorPayload, JoinBoard, Point,
    RequestKind, ServerMessage, SessionJoined, SyncRequest, decode_client, encode_server,
};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::services;
use crate::services::board::{Submitted, SyncError};
use crate::state::AppState;

// =============================================================================
// OUTCOME
// =============================================================================

/// Result returned by handler functions. The dispatch layer uses this to
/// decide who receives what.
#[derive(Debug)]
enum Outcome {
    /// Send to the sender only, in order.
    Reply(Vec<ServerMessage>),
    /// Send to every other member of `board_id`. Nothing to the sender.
    Broadcast { board_id: BoardId, message: ServerMessage },
    /// Reply to the sender and send something different to its peers.
    ReplyAndBroadcast { reply: Vec<ServerMessage>, board_id: BoardId, broadcast: ServerMessage },
    /// Nothing to send.
    Done,
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let connection_id = Uuid::new_v4();

    // Per-connection channel for messages from board peers.
    let (client_tx, mut client_rx) = mpsc::channel::<ServerMessage>(state.config.client_channel_capacity);

    info!(%connection_id, "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let Ok(msg) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        dispatch_message(&state, &mut socket, connection_id, &client_tx, text.as_str()).await;
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(message) = client_rx.recv() => {
                if send_message(&mut socket, connection_id, &message).await.is_err() {
                    break;
                }
            }
        }
    }

    // Peers hear `collaborator_left` before the session is forgotten.
    services::board::part_board(&state, connection_id).await;
    info!(%connection_id, "ws: client disconnected");
}

// =============================================================================
// DISPATCH
// =============================================================================

async fn dispatch_message(
    state: &AppState,
    socket: &mut WebSocket,
    connection_id: Uuid,
    client_tx: &mpsc::Sender<ServerMessage>,
    text: &str,
) {
    let replies = process_inbound_text(state, connection_id, client_tx, text).await;
    for reply in replies {
        if send_message(socket, connection_id, &reply).await.is_err() {
            break;
        }
    }
}

/// Decode and handle one inbound text message and return messages for the sender.
///
/// Keeps socket I/O out of message handling so tests can drive the whole
/// protocol with plain channels.
async fn process_inbound_text(
    state: &AppState,
    connection_id: Uuid,
    client_tx: &mpsc::Sender<ServerMessage>,
    text: &str,
) -> Vec<ServerMessage> {
    let message = match decode_client(text) {
        Ok(m) => m,
        Err(e) => {
            warn!(%connection_id, error = %e, "ws: invalid inbound message");
            return vec![error_message(&SyncError::InvalidMessage(e.to_string()))];
        }
    };

    let result = match message {
        ClientMessage::JoinBoard(req) => handle_join(state, connection_id, client_tx, req).await,
        ClientMessage::LeaveBoard => Ok(handle_leave(state, connection_id).await),
        ClientMessage::DrawingEvent(event) => handle_drawing_event(state, connection_id, event).await,
        ClientMessage::CursorMove(cursor) => Ok(handle_cursor(state, connection_id, cursor).await),
        ClientMessage::SyncRequest(req) => handle_sync_request(state, connection_id, req).await,
    };

    match result {
        Ok(Outcome::Reply(replies)) => replies,
        Ok(Outcome::Broadcast { board_id, message }) => {
            state.sessions.broadcast(&board_id, &message, Some(connection_id)).await;
            Vec::new()
        }
        Ok(Outcome::ReplyAndBroadcast { reply, board_id, broadcast }) => {
            state.sessions.broadcast(&board_id, &broadcast, Some(connection_id)).await;
            reply
        }
        Ok(Outcome::Done) => Vec::new(),
        Err(err) => vec![err],
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

async fn handle_join(
    state: &AppState,
    connection_id: Uuid,
    client_tx: &mpsc::Sender<ServerMessage>,
    req: JoinBoard,
) -> Result<Outcome, ServerMessage> {
    let session = services::board::join_board(
        state,
        &req.board_id,
        connection_id,
        client_tx.clone(),
        req.session_color,
    )
    .await
    .map_err(|e| {
        warn!(%connection_id, board_id = %req.board_id, error = %e, "ws: join rejected");
        request_error(&e, RequestKind::JoinBoard)
    })?;

    let mut reply = vec![ServerMessage::SessionJoined(SessionJoined {
        session_id: session.id,
        session_color: session.session_color.clone(),
        board_id: session.board_id.clone(),
    })];

    // Replay after registering so nothing sequenced in between is missed;
    // the client drops anything it sees twice by sequence.
    match state.sequencer.replay(&session.board_id, None).await {
        Ok(events) => {
            info!(%connection_id, board_id = %session.board_id, count = events.len(), "ws: initial sync");
            reply.push(ServerMessage::SyncEvents(events));
        }
        Err(e) => {
            warn!(%connection_id, board_id = %session.board_id, error = %e, "ws: initial sync failed");
            reply.push(request_error(&e, RequestKind::JoinBoard));
        }
    }

    Ok(Outcome::ReplyAndBroadcast {
        reply,
        board_id: session.board_id,
        broadcast: ServerMessage::CollaboratorJoined(Collaborator {
            session_id: session.id,
            session_color: Some(session.session_color),
        }),
    })
}

async fn handle_leave(state: &AppState, connection_id: Uuid) -> Outcome {
    services::board::part_board(state, connection_id).await;
    Outcome::Done
}

async fn handle_drawing_event(
    state: &AppState,
    connection_id: Uuid,
    event: DrawingEvent,
) -> Result<Outcome, ServerMessage> {
    let board_id = event.board_id.clone();
    let kind = event.kind();
    match services::board::submit_event(state, connection_id, event).await {
        Ok(Submitted::Stored(_)) => Ok(Outcome::Done),
        Ok(Submitted::Cursor(remote)) => Ok(Outcome::Broadcast { board_id, message: ServerMessage::CursorMove(remote) }),
        Err(e) => {
            warn!(%connection_id, %board_id, %kind, error = %e, "ws: drawing event rejected");
            Err(request_error(&e, RequestKind::DrawingEvent))
        }
    }
}

async fn handle_cursor(state: &AppState, connection_id: Uuid, cursor: CursorMove) -> Outcome {
    let Some(session) = state.sessions.get(connection_id).await else {
        return Outcome::Done;
    };
    let point = Point::new(cursor.x, cursor.y);
    match services::board::move_cursor(state, connection_id, point).await {
        Some(remote) => Outcome::Broadcast { board_id: session.board_id, message: ServerMessage::CursorMove(remote) },
        None => Outcome::Done,
    }
}

async fn handle_sync_request(
    state: &AppState,
    connection_id: Uuid,
    req: SyncRequest,
) -> Result<Outcome, ServerMessage> {
    match state.sequencer.replay(&req.board_id, req.from_sequence).await {
        Ok(events) => {
            info!(
                %connection_id,
                board_id = %req.board_id,
                from = ?req.from_sequence,
                count = events.len(),
                "ws: sync request"
            );
            Ok(Outcome::Reply(vec![ServerMessage::SyncEvents(events)]))
        }
        Err(e) => {
            warn!(%connection_id, board_id = %req.board_id, error = %e, "ws: sync request failed");
            Err(request_error(&e, RequestKind::SyncRequest))
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn error_message(err: &impl ErrorCode) -> ServerMessage {
    ServerMessage::Error(ErrorPayload::from_error(err))
}

fn request_error(err: &impl ErrorCode, request: RequestKind) -> ServerMessage {
    ServerMessage::Error(ErrorPayload::from_error(err).for_request(request))
}

async fn send_message(socket: &mut WebSocket, connection_id: Uuid, message: &ServerMessage) -> Result<(), ()> {
    let text = match encode_server(message) {
        Ok(text) => text,
        Err(e) => {
            warn!(%connection_id, error = %e, "ws: failed to encode outbound message");
            return Ok(());
        }
    };
    socket.send(Message::Text(text.into())).await.map_err(|e| {
        warn!(%connection_id, error = %e, "ws: send failed");
    })
}
