//! Hit-testing for the stroke eraser.
//!
//! A stroke is hit when the pointer circle touches its painted body: the
//! distance from the pointer to the stroke path is at most the pointer radius
//! plus half the stroke width. Single-point strokes are discs.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use protocol::{DrawingStroke, StrokeId};

use crate::camera::Point;
use crate::consts::HIT_EPSILON;

/// Distance from `p` to the segment `a`-`b`, projecting onto the segment and
/// clamping to its endpoints.
#[must_use]
pub fn point_to_segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq <= f64::EPSILON {
        return p.distance(&a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    let closest = Point::new(a.x + t * dx, a.y + t * dy);
    p.distance(&closest)
}

/// Whether a pointer circle at `p` with `radius` touches `stroke`.
#[must_use]
pub fn stroke_hit(stroke: &DrawingStroke, p: Point, radius: f64) -> bool {
    let reach = radius + stroke.width / 2.0 + HIT_EPSILON;
    match stroke.points.as_slice() {
        [] => false,
        [only] => p.distance(only) <= reach,
        points => points
            .windows(2)
            .any(|seg| point_to_segment_distance(p, seg[0], seg[1]) <= reach),
    }
}

/// Ids of every stroke touched by the pointer circle, in stroke-set order.
#[must_use]
pub fn strokes_at_point<'a, I>(strokes: I, p: Point, radius: f64) -> Vec<StrokeId>
where
    I: IntoIterator<Item = &'a DrawingStroke>,
{
    strokes
        .into_iter()
        .filter(|stroke| stroke_hit(stroke, p, radius))
        .map(|stroke| stroke.id)
        .collect()
}
