//! Input model: tool selection, pointer buttons, and the gesture state machine.
//!
//! `UiState` captures the user's drawing intent (tool, color, preferences).
//! `InputState` is the gesture tracked between pointer-down and pointer-up,
//! carrying what the engine needs to emit a finished stroke or deletion on
//! release.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use protocol::{DrawingStroke, DrawingTool, SessionId, StrokeId, ToolKind, now_ms};
use serde::{Deserialize, Serialize};

use crate::camera::Point;
use crate::consts::DEFAULT_COLOR;
use crate::smooth::StrokeBuilder;

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button, pen contact, or single-finger touch.
    Primary,
    /// Middle mouse button. Always pans.
    Middle,
    /// Right mouse button. Ignored.
    Secondary,
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down = zoom out).
    pub dy: f64,
}

/// User drawing preferences. Hosts persist these between sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DrawingSettings {
    /// Run the smoothing pipeline on captured strokes and curve rendered paths.
    pub smooth_strokes: bool,
}

impl Default for DrawingSettings {
    fn default() -> Self {
        Self { smooth_strokes: true }
    }
}

/// Persistent UI state visible to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    pub tool: DrawingTool,
    pub color: String,
    pub settings: DrawingSettings,
}

impl Default for UiState {
    fn default() -> Self {
        Self { tool: DrawingTool::default(), color: DEFAULT_COLOR.to_owned(), settings: DrawingSettings::default() }
    }
}

impl UiState {
    /// Whether the active tool produces strokes.
    #[must_use]
    pub fn draws(&self) -> bool {
        !matches!(self.tool.kind, ToolKind::StrokeEraser | ToolKind::Hand)
    }
}

/// A stroke being captured. Tool, color and width are fixed at pointer-down.
#[derive(Debug, Clone)]
pub struct PendingStroke {
    pub id: StrokeId,
    pub builder: StrokeBuilder,
    pub color: String,
    pub tool: DrawingTool,
    pub session_id: SessionId,
    pub started_at: i64,
}

impl PendingStroke {
    #[must_use]
    pub fn start(first: Point, ui: &UiState, session_id: SessionId) -> Self {
        Self {
            id: StrokeId::random(),
            builder: StrokeBuilder::new(first, ui.settings.smooth_strokes),
            color: ui.color.clone(),
            tool: ui.tool,
            session_id,
            started_at: now_ms(),
        }
    }

    /// The in-progress stroke as it should be previewed.
    #[must_use]
    pub fn preview(&self) -> DrawingStroke {
        self.stroke_with(self.builder.points().to_vec())
    }

    /// Finish capture and produce the stroke to publish.
    #[must_use]
    pub fn finish(self) -> DrawingStroke {
        let points = self.builder.clone().finish();
        self.stroke_with(points)
    }

    fn stroke_with(&self, points: Vec<Point>) -> DrawingStroke {
        DrawingStroke {
            id: self.id,
            points,
            color: self.color.clone(),
            width: self.tool.size,
            tool: self.tool,
            session_id: self.session_id,
            timestamp: self.started_at,
        }
    }
}

/// Internal state for the input state machine.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// Dragging the view.
    Panning {
        /// Screen-space position of the previous pointer event.
        last_screen: Point,
    },
    /// Capturing a stroke.
    Drawing(PendingStroke),
    /// Dragging the stroke eraser.
    Erasing,
}
