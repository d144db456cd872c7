//! Rendering: turns engine state into a backend-neutral display list.
//!
//! This module produces screen-space [`DrawCommand`]s from read-only views
//! of the stroke set, camera and UI state. It paints nothing itself; a host
//! replays the list on a 2D context (the blend names match canvas
//! `globalCompositeOperation` values). Commands derive `Serialize` so a
//! host across an FFI boundary can ship the list in its own format.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use serde::Serialize;

use protocol::{DrawingStroke, ToolKind};

use crate::camera::{Camera, Point};
use crate::consts::{HIGHLIGHT_ALPHA, HIGHLIGHT_COLOR};
use crate::engine::EngineCore;
use crate::presence::Presence;

/// Compositing mode for one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Blend {
    SourceOver,
    Multiply,
    DestinationOut,
}

impl Blend {
    #[must_use]
    pub fn for_tool(kind: ToolKind) -> Self {
        match kind {
            ToolKind::Highlighter => Self::Multiply,
            ToolKind::Eraser => Self::DestinationOut,
            _ => Self::SourceOver,
        }
    }
}

/// One path segment after the path start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Segment {
    LineTo { x: f64, y: f64 },
    QuadTo { cx: f64, cy: f64, x: f64, y: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawCommand {
    /// Filled circle; single-point strokes.
    Disc { x: f64, y: f64, radius: f64, color: String, alpha: f64, blend: Blend },
    /// Round-capped, round-joined stroked path.
    Path { start: Point, segments: Vec<Segment>, width: f64, color: String, alpha: f64, blend: Blend },
    /// Remote pointer marker.
    Cursor { x: f64, y: f64, color: String },
}

/// Screen-space command for one stroke, or `None` for an empty stroke.
///
/// With `smooth` set and more than two points, the path runs through
/// quadratic curves with each point as control and the midpoint to the next
/// point as end, finishing with a straight segment to the last point.
#[must_use]
pub fn stroke_command(stroke: &DrawingStroke, camera: &Camera, smooth: bool, highlighted: bool) -> Option<DrawCommand> {
    let (color, alpha) = if highlighted {
        (HIGHLIGHT_COLOR.to_owned(), HIGHLIGHT_ALPHA)
    } else {
        (stroke.color.clone(), stroke.tool.opacity)
    };
    let blend = Blend::for_tool(stroke.tool.kind);
    let width = stroke.width * camera.zoom;
    let points: Vec<Point> = stroke.points.iter().map(|p| camera.canvas_to_screen(*p)).collect();

    match points.as_slice() {
        [] => None,
        [only] => Some(DrawCommand::Disc { x: only.x, y: only.y, radius: width / 2.0, color, alpha, blend }),
        [start, rest @ ..] => {
            let segments = if smooth && points.len() > 2 {
                curved_segments(&points)
            } else {
                rest.iter().map(|p| Segment::LineTo { x: p.x, y: p.y }).collect()
            };
            Some(DrawCommand::Path { start: Point::new(start.x, start.y), segments, width, color, alpha, blend })
        }
    }
}

fn curved_segments(points: &[Point]) -> Vec<Segment> {
    let mut segments = Vec::with_capacity(points.len());
    for pair in points[1..].windows(2) {
        let (current, next) = (pair[0], pair[1]);
        segments.push(Segment::QuadTo {
            cx: current.x,
            cy: current.y,
            x: (current.x + next.x) / 2.0,
            y: (current.y + next.y) / 2.0,
        });
    }
    if let Some(last) = points.last() {
        segments.push(Segment::LineTo { x: last.x, y: last.y });
    }
    segments
}

/// Full stroke layer: committed strokes in order, then the in-progress stroke.
#[must_use]
pub fn scene(engine: &EngineCore) -> Vec<DrawCommand> {
    let smooth = engine.ui.settings.smooth_strokes;
    let highlighted = engine.highlighted();
    let mut commands: Vec<DrawCommand> = engine
        .strokes
        .iter()
        .filter_map(|stroke| stroke_command(stroke, &engine.camera, smooth, highlighted.contains(&stroke.id)))
        .collect();
    if let Some(pending) = engine.pending_stroke() {
        commands.extend(stroke_command(&pending, &engine.camera, smooth, false));
    }
    commands
}

/// Remote cursor overlay.
#[must_use]
pub fn cursor_layer(presence: &Presence, camera: &Camera) -> Vec<DrawCommand> {
    presence
        .cursors()
        .map(|(peer, cursor)| {
            let at = camera.canvas_to_screen(cursor);
            DrawCommand::Cursor { x: at.x, y: at.y, color: peer.color.clone().unwrap_or_default() }
        })
        .collect()
}
