use super::*;
use serde_json::json;

fn sample_stroke() -> DrawingStroke {
    DrawingStroke {
        id: StrokeId::random(),
        points: vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(20.0, 0.0)],
        color: "#000000".into(),
        width: 2.0,
        tool: DrawingTool::default(),
        session_id: SessionId::random(),
        timestamp: 1_700_000_000_000,
    }
}

// =============================================================================
// Point
// =============================================================================

#[test]
fn point_without_pressure_omits_field() {
    let json = serde_json::to_value(Point::new(1.0, 2.0)).expect("serialize");
    assert_eq!(json, json!({"x": 1.0, "y": 2.0}));
}

#[test]
fn point_with_pressure_keeps_field() {
    let json = serde_json::to_value(Point::with_pressure(1.0, 2.0, 0.5)).expect("serialize");
    assert_eq!(json, json!({"x": 1.0, "y": 2.0, "pressure": 0.5}));
}

#[test]
fn point_distance_is_euclidean() {
    let d = Point::new(0.0, 0.0).distance(&Point::new(3.0, 4.0));
    assert!((d - 5.0).abs() < 1e-12);
}

// =============================================================================
// Strokes and tools
// =============================================================================

#[test]
fn tool_serializes_type_field_in_snake_case() {
    let tool = DrawingTool::new(ToolKind::StrokeEraser, 8.0);
    let json = serde_json::to_value(tool).expect("serialize");
    assert_eq!(json["type"], "stroke_eraser");
    assert_eq!(json["size"], 8.0);
    assert_eq!(json["opacity"], 1.0);
}

#[test]
fn stroke_uses_camel_case_session_id() {
    let stroke = sample_stroke();
    let json = serde_json::to_value(&stroke).expect("serialize");
    assert!(json.get("sessionId").is_some());
    assert!(json.get("session_id").is_none());
}

#[test]
fn stroke_preserves_point_order() {
    let stroke = sample_stroke();
    let text = serde_json::to_string(&stroke).expect("serialize");
    let back: DrawingStroke = serde_json::from_str(&text).expect("deserialize");
    let xs: Vec<f64> = back.points.iter().map(|p| p.x).collect();
    assert_eq!(xs, vec![0.0, 10.0, 20.0]);
}

// =============================================================================
// EventKind
// =============================================================================

#[test]
fn event_kind_parses_every_wire_name() {
    for kind in [
        EventKind::Stroke,
        EventKind::StrokeDeleted,
        EventKind::Clear,
        EventKind::Undo,
        EventKind::Redo,
        EventKind::Cursor,
    ] {
        assert_eq!(kind.as_str().parse::<EventKind>().expect("parse"), kind);
    }
}

#[test]
fn event_kind_rejects_unknown_name() {
    let err = "erase".parse::<EventKind>().expect_err("should reject");
    assert!(matches!(err, CodecError::UnknownType(ref t) if t == "erase"));
}

// =============================================================================
// DrawingEvent wire form
// =============================================================================

#[test]
fn stroke_event_has_sibling_type_and_data() {
    let stroke = sample_stroke();
    let event = DrawingEvent::new(BoardId::new("X"), stroke.session_id, EventData::Stroke(stroke.clone()));
    let json = serde_json::to_value(&event).expect("serialize");

    assert_eq!(json["type"], "stroke");
    assert_eq!(json["boardId"], "X");
    assert_eq!(json["data"]["color"], "#000000");
    assert_eq!(json["data"]["points"][2]["x"], 20.0);
}

#[test]
fn clear_event_data_is_empty_object() {
    let event = DrawingEvent::new(BoardId::new("X"), SessionId::random(), EventData::Clear);
    let json = serde_json::to_value(&event).expect("serialize");
    assert_eq!(json["data"], json!({}));
}

#[test]
fn stroke_deleted_event_parses_from_wire() {
    let a = StrokeId::random();
    let b = StrokeId::random();
    let text = json!({
        "id": EventId::random(),
        "boardId": "X",
        "sessionId": SessionId::random(),
        "type": "stroke_deleted",
        "data": {"strokeIds": [a, b]},
        "timestamp": 5,
        "sequence": 9
    })
    .to_string();

    let event: DrawingEvent = serde_json::from_str(&text).expect("deserialize");
    assert_eq!(event.sequence, 9);
    match event.data {
        EventData::StrokeDeleted(data) => assert_eq!(data.stroke_ids, vec![a, b]),
        other => panic!("unexpected payload: {other:?}"),
    }
}

#[test]
fn undo_event_accepts_missing_data() {
    let text = json!({
        "id": EventId::random(),
        "boardId": "X",
        "sessionId": SessionId::random(),
        "type": "undo"
    })
    .to_string();

    let event: DrawingEvent = serde_json::from_str(&text).expect("deserialize");
    assert_eq!(event.data, EventData::Undo(UndoData::default()));
    assert_eq!(event.sequence, 0);
}

#[test]
fn mismatched_payload_is_rejected() {
    let text = json!({
        "id": EventId::random(),
        "boardId": "X",
        "sessionId": SessionId::random(),
        "type": "stroke",
        "data": {"strokeIds": []}
    })
    .to_string();

    assert!(serde_json::from_str::<DrawingEvent>(&text).is_err());
}

#[test]
fn unknown_type_is_rejected() {
    let text = json!({
        "id": EventId::random(),
        "boardId": "X",
        "sessionId": SessionId::random(),
        "type": "teleport",
        "data": {}
    })
    .to_string();

    let err = serde_json::from_str::<DrawingEvent>(&text).expect_err("should reject");
    assert!(err.to_string().contains("teleport"));
}

#[test]
fn redo_event_survives_wire_trip() {
    let stroke = sample_stroke();
    let event = DrawingEvent::new(
        BoardId::new("X"),
        stroke.session_id,
        EventData::Redo(RedoData { strokes: vec![stroke] }),
    )
    .with_sequence(3);

    let text = serde_json::to_string(&event).expect("serialize");
    let back: DrawingEvent = serde_json::from_str(&text).expect("deserialize");
    assert_eq!(back, event);
}

#[test]
fn new_event_is_unsequenced_and_timestamped() {
    let event = DrawingEvent::new(BoardId::new("X"), SessionId::random(), EventData::Clear);
    assert_eq!(event.sequence, 0);
    assert!(event.timestamp > 0);
    assert_eq!(event.kind(), EventKind::Clear);
}
