use super::*;
use protocol::{
    Collaborator, DrawingEvent, DrawingStroke, DrawingTool, EventData, RemoteCursor, RequestKind, SessionId,
    SessionJoined, StrokeId,
};

// =============================================================================
// Helpers
// =============================================================================

fn joined(client: &mut SyncClient, engine: &mut EngineCore, board: &str) -> SessionId {
    client.join_board(BoardId::new(board), None);
    client.on_connected();
    let session_id = SessionId::random();
    client.handle(
        engine,
        ServerMessage::SessionJoined(SessionJoined {
            session_id,
            session_color: "#FF6B6B".into(),
            board_id: BoardId::new(board),
        }),
    );
    client.handle(engine, ServerMessage::SyncEvents(Vec::new()));
    session_id
}

fn stroke_event(board: &str, session_id: SessionId, sequence: i64) -> DrawingEvent {
    let stroke = DrawingStroke {
        id: StrokeId::random(),
        points: vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0)],
        color: "#000000".into(),
        width: 2.0,
        tool: DrawingTool::default(),
        session_id,
        timestamp: 0,
    };
    DrawingEvent::new(BoardId::new(board), session_id, EventData::Stroke(stroke)).with_sequence(sequence)
}

fn sent_messages(effects: &[Effect]) -> Vec<ClientMessage> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Send(message) => Some(message.clone()),
            _ => None,
        })
        .collect()
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn join_before_connect_opens_transport_and_queues() {
    let mut client = SyncClient::new();
    assert_eq!(client.join_board(BoardId::new("A"), None), vec![Effect::Connect]);
    assert_eq!(client.status(), ConnectionStatus::Connecting);
    assert!(client.join_board(BoardId::new("B"), Some("#4ECDC4".into())).is_empty());

    let effects = client.on_connected();
    assert_eq!(
        sent_messages(&effects),
        vec![ClientMessage::JoinBoard(JoinBoard {
            board_id: BoardId::new("B"),
            session_color: Some("#4ECDC4".into()),
        })]
    );
}

#[test]
fn connect_is_idempotent() {
    let mut client = SyncClient::new();
    assert_eq!(client.connect(), vec![Effect::Connect]);
    assert!(client.connect().is_empty());
}

#[test]
fn session_joined_adopts_identity_and_board() {
    let mut client = SyncClient::new();
    let mut engine = EngineCore::new();
    let session_id = joined(&mut client, &mut engine, "A");

    assert_eq!(client.status(), ConnectionStatus::Joined);
    assert_eq!(engine.session_id, session_id);
    assert_eq!(engine.session_color, "#FF6B6B");
    assert_eq!(engine.board_id, Some(BoardId::new("A")));
}

#[test]
fn join_replay_replaces_content() {
    let mut client = SyncClient::new();
    let mut engine = EngineCore::new();
    client.join_board(BoardId::new("A"), None);
    client.on_connected();
    client.handle(
        &mut engine,
        ServerMessage::SessionJoined(SessionJoined {
            session_id: SessionId::random(),
            session_color: "#FF6B6B".into(),
            board_id: BoardId::new("A"),
        }),
    );

    let peer = SessionId::random();
    let effects = client.handle(&mut engine, ServerMessage::SyncEvents(vec![stroke_event("A", peer, 1)]));
    assert_eq!(effects, vec![Effect::Render(Action::RenderNeeded)]);
    assert_eq!(engine.strokes.len(), 1);
    assert_eq!(engine.next_sequence(), 2);
}

#[test]
fn reconnect_rejoins_last_board() {
    let mut client = SyncClient::new();
    let mut engine = EngineCore::new();
    joined(&mut client, &mut engine, "A");

    client.on_disconnected();
    assert_eq!(client.status(), ConnectionStatus::Disconnected);
    assert_eq!(client.connect(), vec![Effect::Connect]);

    let effects = client.on_connected();
    assert!(matches!(
        sent_messages(&effects).as_slice(),
        [ClientMessage::JoinBoard(JoinBoard { board_id, .. })] if board_id == &BoardId::new("A")
    ));
}

#[test]
fn leave_board_sends_leave_and_forgets_target() {
    let mut client = SyncClient::new();
    let mut engine = EngineCore::new();
    joined(&mut client, &mut engine, "A");

    let effects = client.leave_board();
    assert_eq!(sent_messages(&effects), vec![ClientMessage::LeaveBoard]);
    assert_eq!(client.status(), ConnectionStatus::Connected);
    assert!(client.board_id().is_none());
    assert!(client.leave_board().is_empty());
}

// =============================================================================
// Outgoing
// =============================================================================

#[test]
fn events_are_dropped_until_joined() {
    let mut client = SyncClient::new();
    let mut engine = EngineCore::new();
    engine.on_pointer_down(Point::new(0.0, 0.0), crate::input::Button::Primary);
    let actions = engine.on_pointer_up();

    let effects = client.route(actions);
    assert!(sent_messages(&effects).is_empty());
    assert_eq!(effects, vec![Effect::Render(Action::RenderNeeded)]);
}

#[test]
fn events_are_sent_once_joined() {
    let mut client = SyncClient::new();
    let mut engine = EngineCore::new();
    joined(&mut client, &mut engine, "A");
    engine.on_pointer_down(Point::new(0.0, 0.0), crate::input::Button::Primary);
    let actions = engine.on_pointer_up();

    let messages = sent_messages(&client.route(actions));
    assert!(matches!(
        messages.as_slice(),
        [ClientMessage::DrawingEvent(event)] if event.session_id == engine.session_id
    ));
}

#[test]
fn cursor_is_sent_only_while_joined() {
    let mut client = SyncClient::new();
    let mut engine = EngineCore::new();
    assert!(client.send_cursor(Point::new(1.0, 2.0)).is_empty());

    joined(&mut client, &mut engine, "A");
    assert_eq!(
        sent_messages(&client.send_cursor(Point::new(1.0, 2.0))),
        vec![ClientMessage::CursorMove(CursorMove { x: 1.0, y: 2.0 })]
    );
}

// =============================================================================
// Incoming
// =============================================================================

#[test]
fn relayed_event_for_other_board_is_ignored() {
    let mut client = SyncClient::new();
    let mut engine = EngineCore::new();
    joined(&mut client, &mut engine, "A");

    let effects = client.handle(&mut engine, ServerMessage::DrawingEvent(stroke_event("B", SessionId::random(), 1)));
    assert!(effects.is_empty());
    assert!(engine.strokes.is_empty());
}

#[test]
fn relayed_event_is_applied() {
    let mut client = SyncClient::new();
    let mut engine = EngineCore::new();
    joined(&mut client, &mut engine, "A");

    let event = stroke_event("A", SessionId::random(), 1);
    let effects = client.handle(&mut engine, ServerMessage::DrawingEvent(event));
    assert!(matches!(effects.as_slice(), [Effect::Render(Action::DrawStroke(_))]));
    assert_eq!(engine.strokes.len(), 1);
}

#[test]
fn roster_tracks_collaborators_and_cursors() {
    let mut client = SyncClient::new();
    let mut engine = EngineCore::new();
    let me = joined(&mut client, &mut engine, "A");
    let peer = SessionId::random();

    let effects = client.handle(
        &mut engine,
        ServerMessage::CollaboratorJoined(Collaborator { session_id: peer, session_color: Some("#45B7D1".into()) }),
    );
    assert_eq!(effects, vec![Effect::PresenceChanged]);
    client.handle(
        &mut engine,
        ServerMessage::CursorMove(RemoteCursor {
            session_id: peer,
            session_color: "#45B7D1".into(),
            cursor: Point::new(9.0, 9.0),
        }),
    );
    assert_eq!(client.presence.get(peer).and_then(|p| p.cursor), Some(Point::new(9.0, 9.0)));
    assert!(client.presence.get(me).is_none());

    client.handle(&mut engine, ServerMessage::CollaboratorLeft(Collaborator { session_id: peer, session_color: None }));
    assert!(client.presence.is_empty());
}

#[test]
fn error_while_joined_requests_full_resync() {
    let mut client = SyncClient::new();
    let mut engine = EngineCore::new();
    joined(&mut client, &mut engine, "A");

    let effects = client.handle(&mut engine, ServerMessage::Error(ErrorPayload::new("store unavailable")));
    assert_eq!(
        sent_messages(&effects),
        vec![ClientMessage::SyncRequest(SyncRequest { board_id: BoardId::new("A"), from_sequence: None })]
    );
    assert!(matches!(effects.last(), Some(Effect::Error(_))));

    let peer = SessionId::random();
    client.handle(&mut engine, ServerMessage::SyncEvents(vec![stroke_event("A", peer, 1), stroke_event("A", peer, 2)]));
    assert_eq!(engine.strokes.len(), 2);
}

#[test]
fn failed_resync_is_not_retried() {
    let mut client = SyncClient::new();
    let mut engine = EngineCore::new();
    joined(&mut client, &mut engine, "A");
    client.handle(&mut engine, ServerMessage::Error(ErrorPayload::new("first")));

    let failed = ErrorPayload::new("second").for_request(RequestKind::SyncRequest);
    let effects = client.handle(&mut engine, ServerMessage::Error(failed));
    assert!(sent_messages(&effects).is_empty());
}

#[test]
fn error_while_full_resync_outstanding_sends_nothing_more() {
    let mut client = SyncClient::new();
    let mut engine = EngineCore::new();
    joined(&mut client, &mut engine, "A");
    client.handle(&mut engine, ServerMessage::Error(ErrorPayload::new("first")));

    let effects = client.handle(&mut engine, ServerMessage::Error(ErrorPayload::new("second")));
    assert!(sent_messages(&effects).is_empty());
    assert!(matches!(effects.last(), Some(Effect::Error(_))));
}

#[test]
fn failed_event_does_not_consume_pending_tail() {
    let mut client = SyncClient::new();
    let mut engine = EngineCore::new();
    joined(&mut client, &mut engine, "A");
    let peer = SessionId::random();
    client.handle(&mut engine, ServerMessage::DrawingEvent(stroke_event("A", peer, 1)));
    client.handle(&mut engine, ServerMessage::DrawingEvent(stroke_event("A", peer, 2)));
    client.catch_up(&engine);

    let failed = ErrorPayload::new("Failed to process drawing event").for_request(RequestKind::DrawingEvent);
    let effects = client.handle(&mut engine, ServerMessage::Error(failed));
    assert_eq!(
        sent_messages(&effects),
        vec![ClientMessage::SyncRequest(SyncRequest { board_id: BoardId::new("A"), from_sequence: None })]
    );

    client.handle(&mut engine, ServerMessage::SyncEvents(vec![stroke_event("A", peer, 3)]));
    assert_eq!(engine.strokes.len(), 3, "tail answer applied on top of local strokes");
}

#[test]
fn unsolicited_sync_events_apply_as_tail() {
    let mut client = SyncClient::new();
    let mut engine = EngineCore::new();
    joined(&mut client, &mut engine, "A");
    let peer = SessionId::random();
    client.handle(&mut engine, ServerMessage::DrawingEvent(stroke_event("A", peer, 1)));
    client.handle(&mut engine, ServerMessage::DrawingEvent(stroke_event("A", peer, 2)));

    client.handle(&mut engine, ServerMessage::SyncEvents(vec![stroke_event("A", peer, 3)]));
    assert_eq!(engine.strokes.len(), 3);
}

#[test]
fn join_replay_failure_is_reported_without_retry() {
    let mut client = SyncClient::new();
    let mut engine = EngineCore::new();
    client.join_board(BoardId::new("A"), None);
    client.on_connected();
    client.handle(
        &mut engine,
        ServerMessage::SessionJoined(SessionJoined {
            session_id: SessionId::random(),
            session_color: "#FF6B6B".into(),
            board_id: BoardId::new("A"),
        }),
    );

    let failed = ErrorPayload::new("store unavailable").for_request(RequestKind::JoinBoard);
    let effects = client.handle(&mut engine, ServerMessage::Error(failed.clone()));
    assert_eq!(effects, vec![Effect::Error(failed)]);
    assert_eq!(client.status(), ConnectionStatus::Joined);

    let effects = client.handle(&mut engine, ServerMessage::Error(ErrorPayload::new("later")));
    assert_eq!(
        sent_messages(&effects),
        vec![ClientMessage::SyncRequest(SyncRequest { board_id: BoardId::new("A"), from_sequence: None })],
        "the failed join replay no longer blocks recovery"
    );
}

#[test]
fn rejected_join_clears_target() {
    let mut client = SyncClient::new();
    let mut engine = EngineCore::new();
    client.join_board(BoardId::new("missing"), None);
    client.on_connected();

    let effects = client.handle(&mut engine, ServerMessage::Error(ErrorPayload::new("Board not found")));
    assert_eq!(effects, vec![Effect::Error(ErrorPayload::new("Board not found"))]);
    assert!(client.board_id().is_none());
    assert_eq!(client.status(), ConnectionStatus::Connected);
}

#[test]
fn catch_up_applies_tail_only() {
    let mut client = SyncClient::new();
    let mut engine = EngineCore::new();
    joined(&mut client, &mut engine, "A");
    let peer = SessionId::random();
    client.handle(&mut engine, ServerMessage::DrawingEvent(stroke_event("A", peer, 1)));

    let effects = client.catch_up(&engine);
    assert_eq!(
        sent_messages(&effects),
        vec![ClientMessage::SyncRequest(SyncRequest { board_id: BoardId::new("A"), from_sequence: Some(1) })]
    );

    client.handle(&mut engine, ServerMessage::SyncEvents(vec![stroke_event("A", peer, 2)]));
    assert_eq!(engine.strokes.len(), 2);
}
