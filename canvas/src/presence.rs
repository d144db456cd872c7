//! Collaborator roster and remote cursors for the joined board.

#[cfg(test)]
#[path = "presence_test.rs"]
mod presence_test;

use protocol::{Point, SessionId};

/// One other participant as seen by this client.
#[derive(Debug, Clone, PartialEq)]
pub struct Peer {
    pub session_id: SessionId,
    pub color: Option<String>,
    /// Last reported position in canvas space.
    pub cursor: Option<Point>,
}

/// Roster in arrival order. This client's own session is never listed.
#[derive(Debug, Clone, Default)]
pub struct Presence {
    own: Option<SessionId>,
    peers: Vec<Peer>,
}

impl Presence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set this client's session; any roster entry for it is dropped.
    pub fn set_own(&mut self, session_id: SessionId) {
        self.own = Some(session_id);
        self.peers.retain(|peer| peer.session_id != session_id);
    }

    /// Add or refresh a collaborator. Returns `true` if the roster changed.
    pub fn join(&mut self, session_id: SessionId, color: Option<String>) -> bool {
        if self.own == Some(session_id) {
            return false;
        }
        if let Some(peer) = self.peers.iter_mut().find(|peer| peer.session_id == session_id) {
            if color.is_some() && peer.color != color {
                peer.color = color;
                return true;
            }
            return false;
        }
        self.peers.push(Peer { session_id, color, cursor: None });
        true
    }

    /// Remove a collaborator. Returns `true` if it was present.
    pub fn leave(&mut self, session_id: SessionId) -> bool {
        let before = self.peers.len();
        self.peers.retain(|peer| peer.session_id != session_id);
        before != self.peers.len()
    }

    /// Record a cursor position. Unknown sessions are added, since cursor
    /// traffic can race ahead of the join notice.
    pub fn move_cursor(&mut self, session_id: SessionId, color: &str, cursor: Point) {
        if self.own == Some(session_id) {
            return;
        }
        if let Some(peer) = self.peers.iter_mut().find(|peer| peer.session_id == session_id) {
            peer.cursor = Some(cursor);
            if peer.color.is_none() {
                peer.color = Some(color.to_owned());
            }
            return;
        }
        self.peers.push(Peer { session_id, color: Some(color.to_owned()), cursor: Some(cursor) });
    }

    #[must_use]
    pub fn get(&self, session_id: SessionId) -> Option<&Peer> {
        self.peers.iter().find(|peer| peer.session_id == session_id)
    }

    #[must_use]
    pub fn peers(&self) -> &[Peer] {
        &self.peers
    }

    /// Peers that have reported a cursor.
    pub fn cursors(&self) -> impl Iterator<Item = (&Peer, Point)> {
        self.peers.iter().filter_map(|peer| peer.cursor.map(|cursor| (peer, cursor)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Forget everyone, including this client's own session.
    pub fn clear(&mut self) {
        self.own = None;
        self.peers.clear();
    }
}
