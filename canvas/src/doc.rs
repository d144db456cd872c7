//! Stroke set: the visible content of a board on this client.
//!
//! Strokes are kept in application order, which is also paint order. Data
//! flows into this layer from local gestures (the engine pushes finished
//! strokes) and from the network via [`StrokeSet::apply`], which implements
//! the per-event fold rules shared by live relay and replay.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::HashSet;

use protocol::{DrawingEvent, DrawingStroke, EventData, StrokeId};

/// What an applied event did to the stroke set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// Nothing visible changed.
    Unchanged,
    /// These strokes were appended and can be painted incrementally.
    Appended(Vec<StrokeId>),
    /// Existing strokes changed; repaint everything.
    Repaint,
}

/// Ordered, in-memory stroke list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrokeSet {
    strokes: Vec<DrawingStroke>,
}

impl StrokeSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_strokes(strokes: Vec<DrawingStroke>) -> Self {
        Self { strokes }
    }

    /// Rebuild from events. Events are applied in ascending sequence
    /// regardless of input order; equal sequences keep their input order.
    #[must_use]
    pub fn fold(events: &[DrawingEvent]) -> Self {
        let mut ordered: Vec<&DrawingEvent> = events.iter().collect();
        ordered.sort_by_key(|event| event.sequence);

        let mut set = Self::new();
        for event in ordered {
            set.apply(&event.data);
        }
        set
    }

    /// Apply one event payload.
    ///
    /// - `stroke`: append.
    /// - `stroke_deleted`: drop every listed id that is present.
    /// - `clear`: empty the set.
    /// - `undo`: drop the last stroke, if any.
    /// - `redo`: append the carried strokes in order.
    /// - `cursor`: no effect.
    pub fn apply(&mut self, data: &EventData) -> Applied {
        match data {
            EventData::Stroke(stroke) => {
                self.strokes.push(stroke.clone());
                Applied::Appended(vec![stroke.id])
            }
            EventData::StrokeDeleted(deleted) => {
                if self.remove_ids(&deleted.stroke_ids) > 0 { Applied::Repaint } else { Applied::Unchanged }
            }
            EventData::Clear => {
                if self.strokes.is_empty() {
                    return Applied::Unchanged;
                }
                self.strokes.clear();
                Applied::Repaint
            }
            EventData::Undo(_) => {
                if self.strokes.pop().is_some() { Applied::Repaint } else { Applied::Unchanged }
            }
            EventData::Redo(redo) => {
                if redo.strokes.is_empty() {
                    return Applied::Unchanged;
                }
                self.strokes.extend(redo.strokes.iter().cloned());
                Applied::Appended(redo.strokes.iter().map(|s| s.id).collect())
            }
            EventData::Cursor(_) => Applied::Unchanged,
        }
    }

    pub fn push(&mut self, stroke: DrawingStroke) {
        self.strokes.push(stroke);
    }

    /// Remove every stroke whose id is listed. Returns how many were removed.
    pub fn remove_ids(&mut self, ids: &[StrokeId]) -> usize {
        let doomed: HashSet<&StrokeId> = ids.iter().collect();
        let before = self.strokes.len();
        self.strokes.retain(|stroke| !doomed.contains(&stroke.id));
        before - self.strokes.len()
    }

    /// Swap in a whole new stroke list.
    pub fn replace(&mut self, strokes: Vec<DrawingStroke>) {
        self.strokes = strokes;
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
    }

    #[must_use]
    pub fn get(&self, id: StrokeId) -> Option<&DrawingStroke> {
        self.strokes.iter().find(|stroke| stroke.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: StrokeId) -> bool {
        self.get(id).is_some()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[DrawingStroke] {
        &self.strokes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DrawingStroke> {
        self.strokes.iter()
    }

    #[must_use]
    pub fn ids(&self) -> Vec<StrokeId> {
        self.strokes.iter().map(|stroke| stroke.id).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }
}

impl<'a> IntoIterator for &'a StrokeSet {
    type Item = &'a DrawingStroke;
    type IntoIter = std::slice::Iter<'a, DrawingStroke>;

    fn into_iter(self) -> Self::IntoIter {
        self.strokes.iter()
    }
}
