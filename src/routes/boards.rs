//! Board HTTP endpoints.

#[cfg(test)]
#[path = "boards_test.rs"]
mod boards_test;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use protocol::{BoardId, ErrorCode, ErrorPayload};
use tracing::error;

use crate::services::board::JoinError;
use crate::services::session::BoardSession;
use crate::state::AppState;

/// `GET /api/boards/{id}/sessions`: members active within the idle horizon.
pub async fn list_sessions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<BoardSession>>, (StatusCode, Json<ErrorPayload>)> {
    let board_id = BoardId::new(id);
    match state.boards.board_exists(&board_id).await {
        Ok(true) => Ok(Json(state.sessions.active_members(&board_id).await)),
        Ok(false) => Err(error_response(StatusCode::NOT_FOUND, &JoinError::NotFound(board_id))),
        Err(e) => {
            error!(%board_id, error = %e, "list sessions: board lookup failed");
            Err(error_response(StatusCode::SERVICE_UNAVAILABLE, &e))
        }
    }
}

fn error_response(status: StatusCode, err: &impl ErrorCode) -> (StatusCode, Json<ErrorPayload>) {
    (status, Json(ErrorPayload::from_error(err)))
}
