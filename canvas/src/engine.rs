//! Client engine: local-first editing plus remote reconciliation.
//!
//! ARCHITECTURE
//! ============
//! `EngineCore` owns the stroke set, camera, history and gesture state. Input
//! handlers and remote-event handlers mutate that state and return
//! [`Action`]s; they never paint or send anything themselves. The host paints
//! via [`crate::render`] and forwards [`Action::Send`] through the
//! connection layer.
//!
//! Local operations apply immediately and are published afterwards; the
//! server sequences them but never sends them back to their author. Remote
//! events from other sessions are folded in with the rules in
//! [`crate::doc`], and a full resync rebuilds everything from the log.
//!
//! Relays may arrive out of sequence order, and a replay may overlap live
//! relays. The engine therefore tracks exactly which server sequences it has
//! applied and skips only true duplicates. Sequences of this session's own
//! events are learned from replays; until then they show up as gaps, which
//! [`crate::connection::SyncClient::catch_up`] fills.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::collections::BTreeSet;

use protocol::{
    BoardId, DrawingEvent, DrawingStroke, DrawingTool, EventData, RedoData, SessionId, StrokeDeletedData, StrokeId,
    ToolKind, UndoData,
};

use crate::camera::{Camera, Point};
use crate::consts::{SESSION_PALETTE, WHEEL_ZOOM_STEP};
use crate::doc::{Applied, StrokeSet};
use crate::history::History;
use crate::hit::strokes_at_point;
use crate::input::{Button, DrawingSettings, InputState, PendingStroke, UiState, WheelDelta};

/// Board id stamped on events produced before any board is joined.
const UNKNOWN_BOARD: &str = "unknown";

/// Actions returned from engine handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Publish this event.
    Send(DrawingEvent),
    /// Repaint every stroke.
    RenderNeeded,
    /// Paint one newly appended stroke on top of the current frame.
    DrawStroke(StrokeId),
    /// Repaint the in-progress stroke preview.
    DrawPending,
}

/// Core engine state. Free of any I/O so it can be driven from tests.
#[derive(Debug, Clone)]
pub struct EngineCore {
    pub strokes: StrokeSet,
    pub camera: Camera,
    pub history: History,
    pub ui: UiState,
    pub input: InputState,
    pub session_id: SessionId,
    pub session_color: String,
    pub board_id: Option<BoardId>,
    highlighted: Vec<StrokeId>,
    next_sequence: i64,
    seen: SeenSequences,
}

/// Server sequences already applied: every one up to `through`, plus later
/// ones that arrived ahead of a gap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SeenSequences {
    through: i64,
    ahead: BTreeSet<i64>,
}

impl SeenSequences {
    fn up_to(through: i64) -> Self {
        Self { through, ahead: BTreeSet::new() }
    }

    /// Mark `sequence` applied. False if it already was.
    fn insert(&mut self, sequence: i64) -> bool {
        if sequence <= self.through || !self.ahead.insert(sequence) {
            return false;
        }
        while self.ahead.remove(&(self.through + 1)) {
            self.through += 1;
        }
        true
    }

    fn highest(&self) -> i64 {
        self.ahead.last().copied().unwrap_or(self.through)
    }
}

impl Default for EngineCore {
    fn default() -> Self {
        let session_id = SessionId::random();
        Self {
            strokes: StrokeSet::new(),
            camera: Camera::default(),
            history: History::new(),
            ui: UiState::default(),
            input: InputState::default(),
            session_id,
            session_color: palette_color(session_id),
            board_id: None,
            highlighted: Vec::new(),
            next_sequence: 1,
            seen: SeenSequences::default(),
        }
    }
}

fn palette_color(session_id: SessionId) -> String {
    let byte = session_id.as_uuid().as_bytes()[0];
    SESSION_PALETTE[usize::from(byte) % SESSION_PALETTE.len()].to_owned()
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Session / preferences ---

    /// Adopt the identity assigned by the server on join.
    pub fn set_session(&mut self, session_id: SessionId, color: impl Into<String>) {
        self.session_id = session_id;
        self.session_color = color.into();
    }

    /// Switch boards. Local content is dropped when the board changes.
    pub fn set_board(&mut self, board_id: BoardId) {
        if self.board_id.as_ref() == Some(&board_id) {
            return;
        }
        self.board_id = Some(board_id);
        self.strokes.clear();
        self.history.reset(&[]);
        self.highlighted.clear();
        self.input = InputState::Idle;
        self.next_sequence = 1;
        self.seen = SeenSequences::default();
    }

    pub fn set_tool(&mut self, tool: DrawingTool) -> Vec<Action> {
        self.ui.tool = tool;
        if tool.kind != ToolKind::StrokeEraser && !self.highlighted.is_empty() {
            self.highlighted.clear();
            return vec![Action::RenderNeeded];
        }
        Vec::new()
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        self.ui.color = color.into();
    }

    pub fn set_settings(&mut self, settings: DrawingSettings) -> Vec<Action> {
        let changed = self.ui.settings != settings;
        self.ui.settings = settings;
        if changed { vec![Action::RenderNeeded] } else { Vec::new() }
    }

    // --- Pointer input ---

    pub fn on_pointer_down(&mut self, screen: Point, button: Button) -> Vec<Action> {
        match button {
            Button::Secondary => Vec::new(),
            Button::Middle => {
                self.input = InputState::Panning { last_screen: screen };
                Vec::new()
            }
            Button::Primary => match self.ui.tool.kind {
                ToolKind::Hand => {
                    self.input = InputState::Panning { last_screen: screen };
                    Vec::new()
                }
                ToolKind::StrokeEraser => {
                    self.input = InputState::Erasing;
                    self.erase_at(screen)
                }
                _ => {
                    let first = self.camera.screen_to_canvas(screen);
                    self.input = InputState::Drawing(PendingStroke::start(first, &self.ui, self.session_id));
                    vec![Action::DrawPending]
                }
            },
        }
    }

    pub fn on_pointer_move(&mut self, screen: Point) -> Vec<Action> {
        match &mut self.input {
            InputState::Idle => {}
            InputState::Erasing => return self.erase_at(screen),
            InputState::Panning { last_screen } => {
                let (dx, dy) = (screen.x - last_screen.x, screen.y - last_screen.y);
                *last_screen = screen;
                self.camera.pan(dx, dy);
                return vec![Action::RenderNeeded];
            }
            InputState::Drawing(pending) => {
                pending.builder.push(self.camera.screen_to_canvas(screen));
                // Multiply compositing can't be painted over itself.
                let action =
                    if pending.tool.kind == ToolKind::Highlighter { Action::RenderNeeded } else { Action::DrawPending };
                return vec![action];
            }
        }
        self.hover(screen)
    }

    /// End the current gesture. Also used for pointer-leave and cancel.
    pub fn on_pointer_up(&mut self) -> Vec<Action> {
        match std::mem::take(&mut self.input) {
            InputState::Drawing(pending) => self.commit_stroke(pending.finish()),
            InputState::Idle | InputState::Panning { .. } | InputState::Erasing => Vec::new(),
        }
    }

    pub fn on_wheel(&mut self, screen: Point, delta: WheelDelta) -> Vec<Action> {
        if delta.dy.abs() < f64::EPSILON {
            return Vec::new();
        }
        let factor = if delta.dy < 0.0 { WHEEL_ZOOM_STEP } else { 1.0 / WHEEL_ZOOM_STEP };
        self.zoom_at(screen, factor)
    }

    fn hover(&mut self, screen: Point) -> Vec<Action> {
        let hits = if self.ui.tool.kind == ToolKind::StrokeEraser {
            strokes_at_point(&self.strokes, self.camera.screen_to_canvas(screen), self.ui.tool.size)
        } else {
            Vec::new()
        };
        if hits == self.highlighted {
            return Vec::new();
        }
        self.highlighted = hits;
        vec![Action::RenderNeeded]
    }

    fn erase_at(&mut self, screen: Point) -> Vec<Action> {
        let at = self.camera.screen_to_canvas(screen);
        let ids = strokes_at_point(&self.strokes, at, self.ui.tool.size);
        if ids.is_empty() {
            return Vec::new();
        }
        self.strokes.remove_ids(&ids);
        self.history.record(self.strokes.as_slice());
        self.prune_highlight();
        vec![Action::RenderNeeded, self.publish(EventData::StrokeDeleted(StrokeDeletedData { stroke_ids: ids }))]
    }

    fn commit_stroke(&mut self, stroke: DrawingStroke) -> Vec<Action> {
        self.strokes.push(stroke.clone());
        self.history.record(self.strokes.as_slice());
        vec![Action::RenderNeeded, self.publish(EventData::Stroke(stroke))]
    }

    // --- Commands ---

    pub fn undo(&mut self) -> Vec<Action> {
        let Some(step) = self.history.undo() else {
            return Vec::new();
        };
        self.strokes.replace(step.strokes);
        self.prune_highlight();
        let data = UndoData {
            history_index: Some(i64::try_from(step.index).unwrap_or(i64::MAX)),
            removed_strokes: step.removed,
        };
        vec![Action::RenderNeeded, self.publish(EventData::Undo(data))]
    }

    pub fn redo(&mut self) -> Vec<Action> {
        let Some(step) = self.history.redo() else {
            return Vec::new();
        };
        self.strokes.replace(step.strokes);
        self.prune_highlight();
        vec![Action::RenderNeeded, self.publish(EventData::Redo(RedoData { strokes: step.restored }))]
    }

    pub fn clear(&mut self) -> Vec<Action> {
        self.strokes.clear();
        self.highlighted.clear();
        self.history.record(&[]);
        vec![Action::RenderNeeded, self.publish(EventData::Clear)]
    }

    pub fn pan(&mut self, dx: f64, dy: f64) -> Vec<Action> {
        self.camera.pan(dx, dy);
        vec![Action::RenderNeeded]
    }

    pub fn zoom_at(&mut self, screen: Point, factor: f64) -> Vec<Action> {
        if self.camera.zoom_at(screen, factor) { vec![Action::RenderNeeded] } else { Vec::new() }
    }

    pub fn reset_view(&mut self) -> Vec<Action> {
        self.camera.reset();
        vec![Action::RenderNeeded]
    }

    // --- Remote events ---

    /// Fold in one relayed event from another session.
    ///
    /// Echoes of this session's own events and sequences already applied
    /// are ignored. Anything else is applied in arrival order.
    pub fn handle_drawing_event(&mut self, event: &DrawingEvent) -> Vec<Action> {
        if event.session_id == self.session_id {
            return Vec::new();
        }
        if event.sequence > 0 && !self.seen.insert(event.sequence) {
            return Vec::new();
        }

        match self.strokes.apply(&event.data) {
            Applied::Unchanged => Vec::new(),
            Applied::Appended(ids) => {
                self.history.record(self.strokes.as_slice());
                ids.into_iter().map(Action::DrawStroke).collect()
            }
            Applied::Repaint => {
                self.history.record(self.strokes.as_slice());
                self.prune_highlight();
                vec![Action::RenderNeeded]
            }
        }
    }

    /// Replace local content with the fold of a full history replay.
    ///
    /// History restarts from the replayed state, and the outgoing counter
    /// moves past the highest replayed sequence.
    pub fn handle_sync_events(&mut self, events: &[DrawingEvent]) -> Vec<Action> {
        self.strokes = StrokeSet::fold(events);
        self.history.reset(self.strokes.as_slice());
        self.prune_highlight();

        let max = events.iter().map(|event| event.sequence).max();
        if let Some(max) = max {
            self.next_sequence = max + 1;
        }
        self.seen = SeenSequences::up_to(max.unwrap_or(0));
        vec![Action::RenderNeeded]
    }

    /// Apply a partial replay on top of local content.
    ///
    /// Used for catch-up requests with a `fromSequence`. Sequences already
    /// applied are skipped; own-session events are only marked seen since
    /// they were applied when drawn.
    pub fn handle_sync_tail(&mut self, events: &[DrawingEvent]) -> Vec<Action> {
        let mut ordered: Vec<&DrawingEvent> = events.iter().collect();
        ordered.sort_by_key(|event| event.sequence);

        let mut changed = false;
        for event in ordered {
            if !self.seen.insert(event.sequence) {
                continue;
            }
            if event.session_id == self.session_id {
                continue;
            }
            changed |= self.strokes.apply(&event.data) != Applied::Unchanged;
        }
        if let Some(max) = events.iter().map(|event| event.sequence).max() {
            self.next_sequence = self.next_sequence.max(max + 1);
        }
        if !changed {
            return Vec::new();
        }
        self.history.record(self.strokes.as_slice());
        self.prune_highlight();
        vec![Action::RenderNeeded]
    }

    // --- Queries ---

    /// Strokes currently under the stroke eraser.
    #[must_use]
    pub fn highlighted(&self) -> &[StrokeId] {
        &self.highlighted
    }

    /// Preview of the stroke being captured, if any.
    #[must_use]
    pub fn pending_stroke(&self) -> Option<DrawingStroke> {
        match &self.input {
            InputState::Drawing(pending) => Some(pending.preview()),
            _ => None,
        }
    }

    /// Provisional sequence for the next published event.
    #[must_use]
    pub fn next_sequence(&self) -> i64 {
        self.next_sequence
    }

    /// Every server sequence up to and including this one has been applied.
    /// Catch-up replays start here.
    #[must_use]
    pub fn applied_through(&self) -> i64 {
        self.seen.through
    }

    /// Highest server sequence applied so far, possibly past a gap.
    #[must_use]
    pub fn highest_seen_sequence(&self) -> i64 {
        self.seen.highest()
    }

    // --- Internals ---

    fn publish(&mut self, data: EventData) -> Action {
        let board_id = self.board_id.clone().unwrap_or_else(|| BoardId::new(UNKNOWN_BOARD));
        let event = DrawingEvent::new(board_id, self.session_id, data).with_sequence(self.next_sequence);
        self.next_sequence += 1;
        Action::Send(event)
    }

    fn prune_highlight(&mut self) {
        let strokes = &self.strokes;
        self.highlighted.retain(|id| strokes.contains(*id));
    }
}
