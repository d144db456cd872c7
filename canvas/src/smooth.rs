//! Stroke smoothing.
//!
//! DESIGN
//! ======
//! Three passes, applied in order when a stroke is finished:
//!
//! 1. [`smooth_points`]: centered moving average, endpoints pinned.
//! 2. [`interpolate_points`]: fill long gaps with evenly spaced points.
//! 3. [`bezier_smooth`]: resample through quadratic curves, only for strokes
//!    longer than [`BEZIER_MIN_POINTS`].
//!
//! While the pointer is still down only the moving average runs, so the
//! preview stays cheap. Every pass keeps point order and never reorders.

#[cfg(test)]
#[path = "smooth_test.rs"]
mod smooth_test;

use crate::camera::Point;
use crate::consts::{BEZIER_MIN_POINTS, BEZIER_STEPS, INTERPOLATE_SPACING, INTERPOLATE_THRESHOLD, SMOOTH_WINDOW};

// =============================================================================
// PASSES
// =============================================================================

/// Centered moving average over [`SMOOTH_WINDOW`] samples.
///
/// First and last points are kept exactly. Inputs shorter than three points
/// come back unchanged. Each smoothed point keeps its own pressure.
#[must_use]
pub fn smooth_points(points: &[Point]) -> Vec<Point> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let window = SMOOTH_WINDOW.min(n);
    let before = window / 2;
    let after = window.div_ceil(2);

    let mut out = Vec::with_capacity(n);
    out.push(points[0]);
    for i in 1..n - 1 {
        let start = i.saturating_sub(before);
        let end = (i + after).min(n);
        let span = &points[start..end];
        #[allow(clippy::cast_precision_loss)]
        let count = span.len() as f64;
        let x = span.iter().map(|p| p.x).sum::<f64>() / count;
        let y = span.iter().map(|p| p.y).sum::<f64>() / count;
        out.push(Point { x, y, pressure: points[i].pressure });
    }
    out.push(points[n - 1]);
    out
}

/// Insert evenly spaced points across gaps wider than [`INTERPOLATE_THRESHOLD`].
///
/// Pressure is interpolated only when both neighbours carry it. Inputs shorter
/// than two points come back unchanged.
#[must_use]
pub fn interpolate_points(points: &[Point]) -> Vec<Point> {
    let Some(last) = points.last() else {
        return Vec::new();
    };
    if points.len() < 2 {
        return points.to_vec();
    }

    let mut out = Vec::with_capacity(points.len());
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        out.push(a);

        let gap = a.distance(&b);
        if gap <= INTERPOLATE_THRESHOLD {
            continue;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let steps = (gap / INTERPOLATE_SPACING).floor() as usize;
        for step in 1..steps {
            #[allow(clippy::cast_precision_loss)]
            let t = step as f64 / steps as f64;
            out.push(lerp(a, b, t));
        }
    }
    out.push(*last);
    out
}

/// Resample through quadratic Bezier segments.
///
/// For each interior point, the control point is the midpoint of its
/// neighbours and the curve runs from the previous point to the current one.
/// Inputs shorter than three points come back unchanged.
#[must_use]
pub fn bezier_smooth(points: &[Point]) -> Vec<Point> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let mut out = Vec::with_capacity(n * BEZIER_STEPS);
    out.push(points[0]);
    for i in 1..n - 1 {
        let prev = points[i - 1];
        let current = points[i];
        let next = points[i + 1];
        let cx = (prev.x + next.x) / 2.0;
        let cy = (prev.y + next.y) / 2.0;

        for step in 0..=BEZIER_STEPS {
            if step == 0 && i != 1 {
                continue;
            }
            #[allow(clippy::cast_precision_loss)]
            let t = step as f64 / BEZIER_STEPS as f64;
            let u = 1.0 - t;
            out.push(Point {
                x: u * u * prev.x + 2.0 * u * t * cx + t * t * current.x,
                y: u * u * prev.y + 2.0 * u * t * cy + t * t * current.y,
                pressure: current.pressure,
            });
        }
    }
    out.push(points[n - 1]);
    out
}

/// Full finishing pipeline for a captured stroke.
///
/// With smoothing off, or for strokes of two points or fewer, the raw points
/// are returned as captured.
#[must_use]
pub fn finalize(raw: &[Point], smoothing: bool) -> Vec<Point> {
    if !smoothing || raw.len() <= 2 {
        return raw.to_vec();
    }
    let filled = interpolate_points(&smooth_points(raw));
    if filled.len() > BEZIER_MIN_POINTS { bezier_smooth(&filled) } else { filled }
}

fn lerp(a: Point, b: Point, t: f64) -> Point {
    let pressure = match (a.pressure, b.pressure) {
        (Some(pa), Some(pb)) => Some(pa + (pb - pa) * t),
        _ => None,
    };
    Point { x: a.x + (b.x - a.x) * t, y: a.y + (b.y - a.y) * t, pressure }
}

// =============================================================================
// PROGRESSIVE CAPTURE
// =============================================================================

/// Accumulates raw samples for one in-progress stroke.
///
/// `points()` is the live preview; `finish()` runs the full pipeline.
#[derive(Debug, Clone)]
pub struct StrokeBuilder {
    raw: Vec<Point>,
    preview: Vec<Point>,
    smoothing: bool,
}

impl StrokeBuilder {
    #[must_use]
    pub fn new(first: Point, smoothing: bool) -> Self {
        Self { raw: vec![first], preview: vec![first], smoothing }
    }

    /// Append a raw sample and refresh the preview.
    pub fn push(&mut self, point: Point) {
        self.raw.push(point);
        if self.smoothing && self.raw.len() > 2 {
            self.preview = smooth_points(&self.raw);
        } else {
            self.preview.push(point);
        }
    }

    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.preview
    }

    #[must_use]
    pub fn raw(&self) -> &[Point] {
        &self.raw
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Consume the builder and return the finished point list.
    #[must_use]
    pub fn finish(self) -> Vec<Point> {
        if self.smoothing { finalize(&self.raw, true) } else { self.preview }
    }
}
