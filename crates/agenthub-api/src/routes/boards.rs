//! Kanban boards. Reads are open to every principal; changes need an admin or an agent.

use std::sync::Arc;

use agenthub_common::{
    error::{HubError, HubResult},
    ids,
    models::{Board, BoardDetail, CreateBoardRequest, DeleteQuery, MessageResponse, UpdateBoardRequest},
    validation::{validate_columns, validate_name, validate_request},
};
use agenthub_db::repository::{boards, tasks};
use axum::{
    Json, Router,
    extract::{Extension, Path, Query, State},
    middleware,
    routing::get,
};

use crate::{AppState, middleware::AuthContext};

pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/boards", get(list_boards).post(create_board))
        .route(
            "/boards/{board_id}",
            get(get_board).put(update_board).delete(delete_board),
        )
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth_middleware,
        ))
}

/// GET /boards
async fn list_boards(State(state): State<Arc<AppState>>) -> HubResult<Json<Vec<Board>>> {
    Ok(Json(boards::list_boards(&state.db.pool).await?))
}

/// POST /boards
async fn create_board(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateBoardRequest>,
) -> HubResult<Json<Board>> {
    auth.require_admin_or_agent()?;
    validate_request(&body)?;
    validate_name(&body.name)?;
    validate_columns(&body.columns)?;

    let board = boards::create_board(
        &state.db.pool,
        &ids::generate(ids::BOARD),
        body.name.trim(),
        &body.columns,
    )
    .await?;
    tracing::info!(board_id = %board.id, columns = board.columns.len(), "Board created");
    Ok(Json(board))
}

/// GET /boards/{board_id} — the board with its tasks
async fn get_board(
    State(state): State<Arc<AppState>>,
    Path(board_id): Path<String>,
) -> HubResult<Json<BoardDetail>> {
    let board = boards::find_by_id(&state.db.pool, &board_id)
        .await?
        .ok_or_else(|| HubError::not_found("Board"))?;
    let tasks = tasks::list_tasks(&state.db.pool, Some(&board_id)).await?;
    Ok(Json(BoardDetail { board, tasks }))
}

/// PUT /boards/{board_id}
async fn update_board(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(board_id): Path<String>,
    Json(body): Json<UpdateBoardRequest>,
) -> HubResult<Json<Board>> {
    auth.require_admin_or_agent()?;
    validate_request(&body)?;
    if let Some(name) = &body.name {
        validate_name(name)?;
    }
    if let Some(columns) = &body.columns {
        validate_columns(columns)?;
    }

    let board = boards::update_board(
        &state.db.pool,
        &board_id,
        body.name.as_deref().map(str::trim),
        body.columns.as_deref(),
    )
    .await?
    .ok_or_else(|| HubError::not_found("Board"))?;
    Ok(Json(board))
}

/// DELETE /boards/{board_id}?hard=
async fn delete_board(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(board_id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> HubResult<Json<MessageResponse>> {
    auth.require_admin_or_agent()?;

    let (deleted, message) = if query.hard {
        (
            boards::hard_delete(&state.db.pool, &board_id).await?,
            "Board hard-deleted successfully",
        )
    } else {
        (
            boards::soft_delete(&state.db.pool, &board_id).await?,
            "Board soft-deleted successfully",
        )
    };
    if !deleted {
        return Err(HubError::not_found("Board"));
    }

    tracing::info!(%board_id, hard = query.hard, "Board deleted");
    Ok(Json(MessageResponse::new(message)))
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};

    #[tokio::test]
    async fn test_board_delete_requires_auth() {
        let req = Request::delete("/boards/board_abc?hard=true")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app(), req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], 401);
    }
}
