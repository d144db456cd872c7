use super::*;

#[test]
fn join_adds_in_arrival_order() {
    let mut presence = Presence::new();
    let a = SessionId::random();
    let b = SessionId::random();
    assert!(presence.join(a, Some("#FF6B6B".into())));
    assert!(presence.join(b, None));

    let ids: Vec<SessionId> = presence.peers().iter().map(|peer| peer.session_id).collect();
    assert_eq!(ids, vec![a, b]);
}

#[test]
fn duplicate_join_is_not_a_change() {
    let mut presence = Presence::new();
    let a = SessionId::random();
    presence.join(a, Some("#FF6B6B".into()));
    assert!(!presence.join(a, Some("#FF6B6B".into())));
    assert!(!presence.join(a, None));
    assert_eq!(presence.len(), 1);
}

#[test]
fn own_session_is_never_listed() {
    let mut presence = Presence::new();
    let me = SessionId::random();
    presence.join(me, None);
    presence.set_own(me);
    assert!(presence.is_empty());
    assert!(!presence.join(me, None));

    presence.move_cursor(me, "#000000", Point::new(1.0, 1.0));
    assert!(presence.is_empty());
}

#[test]
fn leave_removes_peer() {
    let mut presence = Presence::new();
    let a = SessionId::random();
    presence.join(a, None);
    assert!(presence.leave(a));
    assert!(!presence.leave(a));
    assert!(presence.get(a).is_none());
}

#[test]
fn cursor_updates_known_peer() {
    let mut presence = Presence::new();
    let a = SessionId::random();
    presence.join(a, None);
    presence.move_cursor(a, "#4ECDC4", Point::new(3.0, 4.0));

    let peer = presence.get(a).unwrap_or_else(|| panic!("peer"));
    assert_eq!(peer.cursor, Some(Point::new(3.0, 4.0)));
    assert_eq!(peer.color.as_deref(), Some("#4ECDC4"));
}

#[test]
fn cursor_from_unknown_session_adds_peer() {
    let mut presence = Presence::new();
    let a = SessionId::random();
    presence.move_cursor(a, "#4ECDC4", Point::new(3.0, 4.0));
    assert_eq!(presence.cursors().count(), 1);
}

#[test]
fn clear_forgets_everyone() {
    let mut presence = Presence::new();
    presence.set_own(SessionId::random());
    presence.join(SessionId::random(), None);
    presence.clear();
    assert!(presence.is_empty());
}
