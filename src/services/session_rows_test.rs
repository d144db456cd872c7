use super::*;
use crate::services::store::StoreError;
use async_trait::async_trait;
use protocol::{BoardId, now_ms};
use tokio::time::{Duration, sleep};
use uuid::Uuid;

/// Session log whose inserts are slow and which records call order.
#[derive(Default)]
struct SlowInsertLog {
    calls: Mutex<Vec<&'static str>>,
    rows: Mutex<HashMap<SessionId, BoardSession>>,
}

#[async_trait]
impl SessionLog for SlowInsertLog {
    async fn record_join(&self, session: &BoardSession) -> Result<(), StoreError> {
        sleep(Duration::from_millis(50)).await;
        self.calls.lock().await.push("insert");
        self.rows.lock().await.insert(session.id, session.clone());
        Ok(())
    }

    async fn record_leave(&self, session_id: SessionId) -> Result<(), StoreError> {
        self.calls.lock().await.push("delete");
        self.rows.lock().await.remove(&session_id);
        Ok(())
    }
}

fn session() -> BoardSession {
    let now = now_ms();
    BoardSession {
        id: SessionId::random(),
        board_id: BoardId::new("X"),
        connection_id: Uuid::new_v4(),
        session_color: "#FF6B6B".into(),
        joined_at: now,
        last_seen: now,
        cursor: None,
    }
}

#[tokio::test]
async fn quick_leave_deletes_after_insert() {
    let log = Arc::new(SlowInsertLog::default());
    let rows = SessionRows::new(log.clone());
    let session = session();

    rows.joined(&session).await;
    rows.left(session.id).await.await.expect("delete task");

    assert_eq!(*log.calls.lock().await, vec!["insert", "delete"]);
    assert!(log.rows.lock().await.is_empty(), "no orphan row");
}

#[tokio::test]
async fn leave_forgets_the_pending_insert() {
    let log = Arc::new(SlowInsertLog::default());
    let rows = SessionRows::new(log.clone());
    let session = session();

    rows.joined(&session).await;
    assert_eq!(rows.pending_inserts().await, 1);
    rows.left(session.id).await.await.expect("delete task");
    assert_eq!(rows.pending_inserts().await, 0);
}

#[tokio::test]
async fn leave_without_join_still_deletes() {
    let log = Arc::new(SlowInsertLog::default());
    let rows = SessionRows::new(log.clone());

    rows.left(SessionId::random()).await.await.expect("delete task");
    assert_eq!(*log.calls.lock().await, vec!["delete"]);
}
