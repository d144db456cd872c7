//! Drawing events: the unit of synchronization.
//!
//! DESIGN
//! ======
//! On the wire an event is a flat JSON object whose `type` selects the shape
//! of `data`. In memory that pair is a single [`EventData`] sum type, so
//! every consumer matches exhaustively instead of probing an untyped bag.
//! Conversion goes through [`RawDrawingEvent`], which keeps `data` as a
//! `serde_json::Value` until `type` is known.
//!
//! `sequence` is the only ordering key. `timestamp` is informational.

#[cfg(test)]
#[path = "event_test.rs"]
mod event_test;

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::CodecError;
use crate::ids::{BoardId, EventId, SessionId, StrokeId};

/// Current time as milliseconds since Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

// =============================================================================
// POINTS AND STROKES
// =============================================================================

/// A sampled pointer position in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, pressure: None }
    }

    #[must_use]
    pub fn with_pressure(x: f64, y: f64, pressure: f64) -> Self {
        Self { x, y, pressure: Some(pressure) }
    }

    /// Euclidean distance to `other`, ignoring pressure.
    #[must_use]
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Which instrument produced a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    #[default]
    Pen,
    /// Paints with destination-out compositing.
    Eraser,
    /// Deletes whole strokes it touches; never produces a stroke itself.
    StrokeEraser,
    /// Paints with multiply compositing.
    Highlighter,
    Text,
    /// Pans the view; never draws.
    Hand,
}

/// Tool descriptor carried on every stroke.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawingTool {
    #[serde(rename = "type")]
    pub kind: ToolKind,
    pub size: f64,
    pub opacity: f64,
}

impl DrawingTool {
    #[must_use]
    pub fn new(kind: ToolKind, size: f64) -> Self {
        Self { kind, size, opacity: 1.0 }
    }
}

impl Default for DrawingTool {
    fn default() -> Self {
        Self { kind: ToolKind::Pen, size: 2.0, opacity: 1.0 }
    }
}

/// One finished drawing gesture. Immutable once created: corrections are
/// new events, never edits to `points`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingStroke {
    pub id: StrokeId,
    /// Path order. Never reordered.
    pub points: Vec<Point>,
    pub color: String,
    pub width: f64,
    pub tool: DrawingTool,
    pub session_id: SessionId,
    pub timestamp: i64,
}

// =============================================================================
// EVENT PAYLOADS
// =============================================================================

/// Discriminant of [`EventData`], as spelled in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Stroke,
    StrokeDeleted,
    Clear,
    Undo,
    Redo,
    Cursor,
}

impl EventKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stroke => "stroke",
            Self::StrokeDeleted => "stroke_deleted",
            Self::Clear => "clear",
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::Cursor => "cursor",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stroke" => Ok(Self::Stroke),
            "stroke_deleted" => Ok(Self::StrokeDeleted),
            "clear" => Ok(Self::Clear),
            "undo" => Ok(Self::Undo),
            "redo" => Ok(Self::Redo),
            "cursor" => Ok(Self::Cursor),
            other => Err(CodecError::UnknownType(other.to_owned())),
        }
    }
}

/// Strokes removed by a stroke-eraser gesture.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokeDeletedData {
    pub stroke_ids: Vec<StrokeId>,
}

/// Snapshot descriptor sent when a session undoes locally.
///
/// Receivers only approximate it (they drop their own last stroke); the
/// descriptor is kept for replay fidelity and diagnostics.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_index: Option<i64>,
    #[serde(default)]
    pub removed_strokes: Vec<DrawingStroke>,
}

/// Strokes restored by a redo.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RedoData {
    #[serde(default)]
    pub strokes: Vec<DrawingStroke>,
}

/// Typed event payload, keyed by [`EventKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum EventData {
    Stroke(DrawingStroke),
    StrokeDeleted(StrokeDeletedData),
    Clear,
    Undo(UndoData),
    Redo(RedoData),
    Cursor(Point),
}

impl EventData {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Stroke(_) => EventKind::Stroke,
            Self::StrokeDeleted(_) => EventKind::StrokeDeleted,
            Self::Clear => EventKind::Clear,
            Self::Undo(_) => EventKind::Undo,
            Self::Redo(_) => EventKind::Redo,
            Self::Cursor(_) => EventKind::Cursor,
        }
    }

    /// Parse a `data` value according to its declared `type`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Payload`] if `value` does not fit the shape of `kind`.
    pub fn from_parts(kind: EventKind, value: Value) -> Result<Self, CodecError> {
        let wrap = |source| CodecError::Payload { kind, source };
        let data = match kind {
            EventKind::Stroke => Self::Stroke(serde_json::from_value(value).map_err(wrap)?),
            EventKind::StrokeDeleted => Self::StrokeDeleted(serde_json::from_value(value).map_err(wrap)?),
            EventKind::Clear => Self::Clear,
            EventKind::Undo => Self::Undo(serde_json::from_value(object_or_empty(value)).map_err(wrap)?),
            EventKind::Redo => Self::Redo(serde_json::from_value(object_or_empty(value)).map_err(wrap)?),
            EventKind::Cursor => Self::Cursor(serde_json::from_value(value).map_err(wrap)?),
        };
        Ok(data)
    }

    /// Render the payload as the JSON stored in `data`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let value = match self {
            Self::Stroke(stroke) => serde_json::to_value(stroke),
            Self::StrokeDeleted(data) => serde_json::to_value(data),
            Self::Clear => Ok(Value::Object(serde_json::Map::new())),
            Self::Undo(data) => serde_json::to_value(data),
            Self::Redo(data) => serde_json::to_value(data),
            Self::Cursor(point) => serde_json::to_value(point),
        };
        value.unwrap_or_default()
    }
}

fn object_or_empty(value: Value) -> Value {
    if value.is_null() { Value::Object(serde_json::Map::new()) } else { value }
}

// =============================================================================
// DRAWING EVENT
// =============================================================================

/// A sequenced, attributed drawing operation on one board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDrawingEvent", into = "RawDrawingEvent")]
pub struct DrawingEvent {
    pub id: EventId,
    pub board_id: BoardId,
    pub session_id: SessionId,
    pub data: EventData,
    /// Producer wall-clock capture time in ms. Never used for ordering.
    pub timestamp: i64,
    /// Server-assigned, strictly increasing per board.
    pub sequence: i64,
}

impl DrawingEvent {
    /// Build an unsequenced event stamped with a fresh id and the current time.
    #[must_use]
    pub fn new(board_id: BoardId, session_id: SessionId, data: EventData) -> Self {
        Self { id: EventId::random(), board_id, session_id, data, timestamp: now_ms(), sequence: 0 }
    }

    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.data.kind()
    }

    #[must_use]
    pub fn with_sequence(mut self, sequence: i64) -> Self {
        self.sequence = sequence;
        self
    }
}

/// Wire form of [`DrawingEvent`] with `data` left untyped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDrawingEvent {
    pub id: EventId,
    pub board_id: BoardId,
    pub session_id: SessionId,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub sequence: i64,
}

impl TryFrom<RawDrawingEvent> for DrawingEvent {
    type Error = CodecError;

    fn try_from(raw: RawDrawingEvent) -> Result<Self, Self::Error> {
        let kind: EventKind = raw.kind.parse()?;
        Ok(Self {
            id: raw.id,
            board_id: raw.board_id,
            session_id: raw.session_id,
            data: EventData::from_parts(kind, raw.data)?,
            timestamp: raw.timestamp,
            sequence: raw.sequence,
        })
    }
}

impl From<DrawingEvent> for RawDrawingEvent {
    fn from(event: DrawingEvent) -> Self {
        Self {
            id: event.id,
            board_id: event.board_id,
            session_id: event.session_id,
            kind: event.data.kind().as_str().to_owned(),
            data: event.data.to_value(),
            timestamp: event.timestamp,
            sequence: event.sequence,
        }
    }
}
