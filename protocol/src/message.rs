//! Client and server messages.
//!
//! Every socket message is a JSON envelope `{ "type": <name>, "payload": <payload> }`.
//! Payload field names are camelCase. Presence, sync and relay all share
//! this one envelope; there is no separate control channel.

#[cfg(test)]
#[path = "message_test.rs"]
mod message_test;

use serde::{Deserialize, Serialize};

use crate::CodecError;
use crate::event::{DrawingEvent, Point};
use crate::ids::{BoardId, SessionId};

// =============================================================================
// CLIENT → SERVER
// =============================================================================

/// Messages a client sends to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Enter a board's broadcast group.
    JoinBoard(JoinBoard),
    /// Leave the current board without closing the connection.
    LeaveBoard,
    /// Propose an event. `id`, `timestamp` and `sequence` are overwritten server-side.
    DrawingEvent(DrawingEvent),
    /// Pointer position in canvas space.
    CursorMove(CursorMove),
    /// Explicit resync.
    SyncRequest(SyncRequest),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinBoard {
    pub board_id: BoardId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_color: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CursorMove {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub board_id: BoardId,
    /// Only events with a strictly greater sequence are returned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_sequence: Option<i64>,
}

// =============================================================================
// SERVER → CLIENT
// =============================================================================

/// Messages the server sends to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Private acknowledgement to the joiner.
    SessionJoined(SessionJoined),
    /// Full or partial history replay, ascending by sequence.
    SyncEvents(Vec<DrawingEvent>),
    CollaboratorJoined(Collaborator),
    CollaboratorLeft(Collaborator),
    /// A stamped event relayed from another member of the board.
    DrawingEvent(DrawingEvent),
    CursorMove(RemoteCursor),
    Error(ErrorPayload),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionJoined {
    pub session_id: SessionId,
    pub session_color: String,
    pub board_id: BoardId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collaborator {
    pub session_id: SessionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCursor {
    pub session_id: SessionId,
    pub session_color: String,
    pub cursor: Point,
}

/// Client request an `error` answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    JoinBoard,
    DrawingEvent,
    CursorMove,
    SyncRequest,
}

/// Operation failure notice. Clients respond by requesting a full resync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// The request that failed, when the error answers one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestKind>,
}

impl ErrorPayload {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), code: None, request: None }
    }

    /// Build a structured payload from a typed error.
    #[must_use]
    pub fn from_error(err: &(impl ErrorCode + ?Sized)) -> Self {
        Self { message: err.to_string(), code: Some(err.error_code().to_owned()), request: None }
    }

    /// Tag the payload with the request it answers.
    #[must_use]
    pub fn for_request(mut self, request: RequestKind) -> Self {
        self.request = Some(request);
        self
    }

    /// True when this error stands in for a requested replay.
    #[must_use]
    pub fn answers_replay(&self) -> bool {
        matches!(self.request, Some(RequestKind::JoinBoard | RequestKind::SyncRequest))
    }
}

// =============================================================================
// ERROR CODES
// =============================================================================

/// Grepable error code and retryable flag for structured error messages.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

// =============================================================================
// CODEC
// =============================================================================

/// Encode a client message as JSON text.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_client(message: &ClientMessage) -> Result<String, CodecError> {
    Ok(serde_json::to_string(message)?)
}

/// Decode a client message from JSON text.
///
/// # Errors
///
/// Returns an error if the text is not a well-formed client message.
pub fn decode_client(text: &str) -> Result<ClientMessage, CodecError> {
    Ok(serde_json::from_str(text)?)
}

/// Encode a server message as JSON text.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_server(message: &ServerMessage) -> Result<String, CodecError> {
    Ok(serde_json::to_string(message)?)
}

/// Decode a server message from JSON text.
///
/// # Errors
///
/// Returns an error if the text is not a well-formed server message.
pub fn decode_server(text: &str) -> Result<ServerMessage, CodecError> {
    Ok(serde_json::from_str(text)?)
}
