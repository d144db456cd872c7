//! Shared wire contract for realtime board synchronization.
//!
//! This crate owns the message shapes exchanged between the `inkboard`
//! server and the `canvas` client engine. Everything crossing the socket is
//! JSON: a `{ "type", "payload" }` envelope around one of the
//! [`ClientMessage`] / [`ServerMessage`] variants.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`ids`] | Opaque identifier newtypes (`BoardId`, `SessionId`, `EventId`, `StrokeId`) |
//! | [`event`] | `DrawingEvent`, its typed payload `EventData`, strokes and points |
//! | [`message`] | Client/server message enums and the JSON codec |

pub mod event;
pub mod ids;
pub mod message;

pub use event::{
    DrawingEvent, DrawingStroke, DrawingTool, EventData, EventKind, Point, RedoData, StrokeDeletedData, ToolKind,
    UndoData, now_ms,
};
pub use ids::{BoardId, EventId, SessionId, StrokeId};
pub use message::{
    ClientMessage, Collaborator, CursorMove, ErrorCode, ErrorPayload, JoinBoard, RemoteCursor, RequestKind,
    ServerMessage, SessionJoined, SyncRequest, decode_client, decode_server, encode_client, encode_server,
};

/// Error returned by the JSON codec.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The text is not valid JSON or does not match the envelope shape.
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    /// The event `type` string is not one of the known event kinds.
    #[error("unknown event type: {0}")]
    UnknownType(String),
    /// The event `data` does not match the payload shape required by its `type`.
    #[error("invalid {kind} payload: {source}")]
    Payload {
        kind: EventKind,
        #[source]
        source: serde_json::Error,
    },
}
