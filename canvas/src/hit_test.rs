use super::*;
use protocol::{DrawingTool, SessionId};

const EPSILON: f64 = 1e-10;

fn stroke(points: Vec<Point>, width: f64) -> DrawingStroke {
    DrawingStroke {
        id: StrokeId::random(),
        points,
        color: "#000000".into(),
        width,
        tool: DrawingTool::default(),
        session_id: SessionId::random(),
        timestamp: 0,
    }
}

// --- point_to_segment_distance ---

#[test]
fn segment_distance_perpendicular() {
    let d = point_to_segment_distance(Point::new(5.0, 3.0), Point::new(0.0, 0.0), Point::new(10.0, 0.0));
    assert!((d - 3.0).abs() < EPSILON);
}

#[test]
fn segment_distance_clamps_past_endpoint() {
    let d = point_to_segment_distance(Point::new(13.0, 4.0), Point::new(0.0, 0.0), Point::new(10.0, 0.0));
    assert!((d - 5.0).abs() < EPSILON);
}

#[test]
fn segment_distance_degenerate_segment() {
    let d = point_to_segment_distance(Point::new(3.0, 4.0), Point::new(0.0, 0.0), Point::new(0.0, 0.0));
    assert!((d - 5.0).abs() < EPSILON);
}

// --- stroke_hit ---

#[test]
fn hit_within_radius_plus_half_width() {
    let s = stroke(vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)], 4.0);
    assert!(stroke_hit(&s, Point::new(50.0, 6.9), 5.0));
    assert!(!stroke_hit(&s, Point::new(50.0, 7.1), 5.0));
}

#[test]
fn point_on_path_hits_with_zero_radius() {
    let s = stroke(vec![Point::new(0.0, 0.0), Point::new(3.0, 7.0), Point::new(11.0, -2.0)], 0.0);
    let on_path = Point::new(1.5, 3.5);
    assert!(stroke_hit(&s, on_path, 0.0));
    assert!(stroke_hit(&s, Point::new(11.0, -2.0), 0.0));
}

#[test]
fn single_point_stroke_is_a_disc() {
    let s = stroke(vec![Point::new(10.0, 10.0)], 6.0);
    assert!(stroke_hit(&s, Point::new(14.0, 10.0), 1.0));
    assert!(!stroke_hit(&s, Point::new(14.1, 10.0), 1.0));
}

#[test]
fn empty_stroke_never_hits() {
    let s = stroke(Vec::new(), 50.0);
    assert!(!stroke_hit(&s, Point::new(0.0, 0.0), 50.0));
}

// --- strokes_at_point ---

#[test]
fn strokes_at_point_returns_all_overlapping() {
    let a = stroke(vec![Point::new(0.0, 0.0), Point::new(20.0, 0.0)], 2.0);
    let b = stroke(vec![Point::new(10.0, -10.0), Point::new(10.0, 10.0)], 2.0);
    let far = stroke(vec![Point::new(500.0, 500.0), Point::new(600.0, 500.0)], 2.0);
    let strokes = vec![a.clone(), b.clone(), far];

    let hits = strokes_at_point(&strokes, Point::new(10.0, 0.0), 1.0);
    assert_eq!(hits, vec![a.id, b.id]);
}

#[test]
fn strokes_at_point_misses_empty_space() {
    let a = stroke(vec![Point::new(0.0, 0.0), Point::new(20.0, 0.0)], 2.0);
    assert!(strokes_at_point([&a], Point::new(10.0, 50.0), 5.0).is_empty());
}
