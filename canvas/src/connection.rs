//! Sync protocol state machine, independent of any transport.
//!
//! DESIGN
//! ======
//! `SyncClient` tracks the socket lifecycle
//! (`Disconnected → Connecting → Connected → Joined`) and translates between
//! wire messages and engine calls. The host owns the actual socket: it
//! performs [`Effect::Connect`] and [`Effect::Send`], reports
//! `on_connected` / `on_disconnected`, and feeds every decoded
//! [`ServerMessage`] into [`SyncClient::handle`].
//!
//! - A join requested before the socket is up is queued; only the latest
//!   request survives, and it is sent as soon as the connection opens.
//! - After a reconnect the last board is joined again, which replays its
//!   full history.
//! - Outgoing drawing events are dropped unless the board is joined.
//! - Replays are answered in request order. An error tagged as answering a
//!   join or sync request stands in for that replay and is not retried.
//! - Any other server error while joined triggers one full resync, unless
//!   a full replay is already outstanding.
//! - A `sync_events` nobody asked for is applied as a tail, never as a
//!   replacement of local content.

#[cfg(test)]
#[path = "connection_test.rs"]
mod connection_test;

use std::collections::VecDeque;

use protocol::{BoardId, ClientMessage, CursorMove, ErrorPayload, JoinBoard, ServerMessage, SyncRequest};

use crate::camera::Point;
use crate::engine::{Action, EngineCore};
use crate::presence::Presence;

/// Lifecycle of the server connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    /// Joined a board; drawing traffic flows.
    Joined,
}

/// Work for the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Open the transport.
    Connect,
    /// Send this message over the open transport.
    Send(ClientMessage),
    /// Engine output to paint.
    Render(Action),
    /// Roster or remote cursors changed.
    PresenceChanged,
    /// Server-reported failure. Any recovery has already been scheduled.
    Error(ErrorPayload),
}

/// How an outstanding `sync_events` reply is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncScope {
    Full,
    Tail,
}

#[derive(Debug, Clone, Default)]
pub struct SyncClient {
    status: ConnectionStatus,
    target: Option<JoinBoard>,
    pending_syncs: VecDeque<SyncScope>,
    pub presence: Presence,
}

impl SyncClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Board this client is on or trying to get onto.
    #[must_use]
    pub fn board_id(&self) -> Option<&BoardId> {
        self.target.as_ref().map(|join| &join.board_id)
    }

    // --- Transport lifecycle ---

    pub fn connect(&mut self) -> Vec<Effect> {
        if self.status != ConnectionStatus::Disconnected {
            return Vec::new();
        }
        self.status = ConnectionStatus::Connecting;
        vec![Effect::Connect]
    }

    /// The transport is open. Sends the queued (or previous) join.
    pub fn on_connected(&mut self) -> Vec<Effect> {
        self.status = ConnectionStatus::Connected;
        self.pending_syncs.clear();
        self.send_join()
    }

    /// The transport closed. The target board is kept for the next connect.
    pub fn on_disconnected(&mut self) -> Vec<Effect> {
        self.status = ConnectionStatus::Disconnected;
        self.pending_syncs.clear();
        let had_peers = !self.presence.is_empty();
        self.presence.clear();
        if had_peers { vec![Effect::PresenceChanged] } else { Vec::new() }
    }

    // --- Board membership ---

    /// Join `board_id`, replacing any earlier target.
    pub fn join_board(&mut self, board_id: BoardId, session_color: Option<String>) -> Vec<Effect> {
        self.target = Some(JoinBoard { board_id, session_color });
        match self.status {
            ConnectionStatus::Disconnected => self.connect(),
            ConnectionStatus::Connecting => Vec::new(),
            ConnectionStatus::Connected | ConnectionStatus::Joined => self.send_join(),
        }
    }

    pub fn leave_board(&mut self) -> Vec<Effect> {
        if self.target.take().is_none() {
            return Vec::new();
        }
        self.pending_syncs.clear();
        self.presence.clear();
        match self.status {
            ConnectionStatus::Connected | ConnectionStatus::Joined => {
                self.status = ConnectionStatus::Connected;
                vec![Effect::Send(ClientMessage::LeaveBoard), Effect::PresenceChanged]
            }
            ConnectionStatus::Disconnected | ConnectionStatus::Connecting => vec![Effect::PresenceChanged],
        }
    }

    fn send_join(&mut self) -> Vec<Effect> {
        let Some(join) = self.target.clone() else {
            return Vec::new();
        };
        self.status = ConnectionStatus::Connected;
        self.presence.clear();
        self.pending_syncs.clear();
        self.pending_syncs.push_back(SyncScope::Full);
        vec![Effect::Send(ClientMessage::JoinBoard(join))]
    }

    // --- Outgoing ---

    /// Forward engine actions: events go on the wire (only while joined),
    /// everything else goes to the renderer.
    pub fn route(&mut self, actions: Vec<Action>) -> Vec<Effect> {
        let joined = self.status == ConnectionStatus::Joined;
        actions
            .into_iter()
            .filter_map(|action| match action {
                Action::Send(event) if joined => Some(Effect::Send(ClientMessage::DrawingEvent(event))),
                Action::Send(_) => None,
                other => Some(Effect::Render(other)),
            })
            .collect()
    }

    /// Share the local pointer position, in canvas space.
    pub fn send_cursor(&self, canvas: Point) -> Vec<Effect> {
        if self.status != ConnectionStatus::Joined {
            return Vec::new();
        }
        vec![Effect::Send(ClientMessage::CursorMove(CursorMove { x: canvas.x, y: canvas.y }))]
    }

    /// Ask for a replay. `from_sequence` of `None` replays everything and
    /// replaces local content; `Some(n)` replays only events after `n`.
    pub fn request_sync(&mut self, from_sequence: Option<i64>) -> Vec<Effect> {
        if self.status != ConnectionStatus::Joined {
            return Vec::new();
        }
        let Some(board_id) = self.board_id().cloned() else {
            return Vec::new();
        };
        self.pending_syncs.push_back(if from_sequence.is_some() { SyncScope::Tail } else { SyncScope::Full });
        vec![Effect::Send(ClientMessage::SyncRequest(SyncRequest { board_id, from_sequence }))]
    }

    /// Replay whatever the engine has not seen yet.
    pub fn catch_up(&mut self, engine: &EngineCore) -> Vec<Effect> {
        self.request_sync(Some(engine.applied_through()))
    }

    // --- Incoming ---

    pub fn handle(&mut self, engine: &mut EngineCore, message: ServerMessage) -> Vec<Effect> {
        match message {
            ServerMessage::SessionJoined(joined) => {
                engine.set_board(joined.board_id);
                engine.set_session(joined.session_id, joined.session_color);
                self.presence.clear();
                self.presence.set_own(joined.session_id);
                self.status = ConnectionStatus::Joined;
                vec![Effect::PresenceChanged]
            }
            ServerMessage::SyncEvents(events) => {
                let actions = match self.pending_syncs.pop_front().unwrap_or(SyncScope::Tail) {
                    SyncScope::Full => engine.handle_sync_events(&events),
                    SyncScope::Tail => engine.handle_sync_tail(&events),
                };
                self.route(actions)
            }
            ServerMessage::CollaboratorJoined(peer) => {
                if self.presence.join(peer.session_id, peer.session_color) {
                    vec![Effect::PresenceChanged]
                } else {
                    Vec::new()
                }
            }
            ServerMessage::CollaboratorLeft(peer) => {
                if self.presence.leave(peer.session_id) {
                    vec![Effect::PresenceChanged]
                } else {
                    Vec::new()
                }
            }
            ServerMessage::DrawingEvent(event) => {
                if engine.board_id.as_ref() != Some(&event.board_id) {
                    return Vec::new();
                }
                let actions = engine.handle_drawing_event(&event);
                self.route(actions)
            }
            ServerMessage::CursorMove(remote) => {
                self.presence.move_cursor(remote.session_id, &remote.session_color, remote.cursor);
                vec![Effect::PresenceChanged]
            }
            ServerMessage::Error(payload) => self.handle_error(payload),
        }
    }

    fn handle_error(&mut self, payload: ErrorPayload) -> Vec<Effect> {
        match self.status {
            ConnectionStatus::Joined => {
                if payload.answers_replay() {
                    self.pending_syncs.pop_front();
                    return vec![Effect::Error(payload)];
                }
                if self.pending_syncs.contains(&SyncScope::Full) {
                    return vec![Effect::Error(payload)];
                }
                let mut effects = self.request_sync(None);
                effects.push(Effect::Error(payload));
                effects
            }
            ConnectionStatus::Connected => {
                // Join rejected.
                self.target = None;
                self.pending_syncs.clear();
                vec![Effect::Error(payload)]
            }
            ConnectionStatus::Disconnected | ConnectionStatus::Connecting => vec![Effect::Error(payload)],
        }
    }
}
