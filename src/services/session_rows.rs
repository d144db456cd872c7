//! Durable session rows, written in the background.
//!
//! Writes never block the socket and failures only log. A session's delete
//! waits for its insert so a quick join/leave never leaves an orphan row.

#[cfg(test)]
#[path = "session_rows_test.rs"]
mod session_rows_test;

use std::collections::HashMap;
use std::sync::Arc;

use protocol::SessionId;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::warn;

use super::session::BoardSession;
use super::store::SessionLog;

#[derive(Clone)]
pub struct SessionRows {
    log: Arc<dyn SessionLog>,
    inserts: Arc<Mutex<HashMap<SessionId, JoinHandle<()>>>>,
}

impl SessionRows {
    #[must_use]
    pub fn new(log: Arc<dyn SessionLog>) -> Self {
        Self { log, inserts: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Insert the row for `session` in the background.
    pub async fn joined(&self, session: &BoardSession) {
        let log = self.log.clone();
        let session = session.clone();
        let session_id = session.id;
        let insert = tokio::spawn(async move {
            if let Err(e) = log.record_join(&session).await {
                warn!(error = %e, session_id = %session.id, "session row insert failed");
            }
        });
        self.inserts.lock().await.insert(session_id, insert);
    }

    /// Delete the row for `session_id` once its insert has finished.
    pub async fn left(&self, session_id: SessionId) -> JoinHandle<()> {
        let insert = self.inserts.lock().await.remove(&session_id);
        let log = self.log.clone();
        tokio::spawn(async move {
            if let Some(insert) = insert {
                let _ = insert.await;
            }
            if let Err(e) = log.record_leave(session_id).await {
                warn!(error = %e, %session_id, "session row delete failed");
            }
        })
    }

    #[cfg(test)]
    pub async fn pending_inserts(&self) -> usize {
        self.inserts.lock().await.len()
    }
}
