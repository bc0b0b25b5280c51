//! Task routes. Any authenticated principal may work with tasks.

use std::sync::Arc;

use agenthub_common::{
    error::{HubError, HubResult},
    ids,
    models::{
        AttachDocumentRequest, CreateNoteRequest, CreateTaskRequest, DeleteQuery, Document,
        MessageResponse, Note, Task, TaskDeleteResponse, TaskDetail, UpdateTaskRequest,
    },
    validation::validate_request,
};
use agenthub_db::repository::{
    boards, chats,
    documents::{self, DocumentOwner},
    notes::{self, NoteOwner},
    tasks,
};
use axum::{
    Json, Router,
    extract::{Extension, Path, Query, State},
    middleware,
    routing::{delete, get, post},
};
use serde::Deserialize;

use crate::{AppState, middleware::AuthContext, routes::resolve_mime_type};

pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/{task_id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/tasks/{task_id}/notes", post(add_note))
        .route("/tasks/{task_id}/notes/{note_id}", delete(remove_note))
        .route("/tasks/{task_id}/documents", post(attach_document))
        .route(
            "/tasks/{task_id}/documents/{document_id}",
            delete(remove_document),
        )
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth_middleware,
        ))
}

#[derive(Debug, Default, Deserialize)]
struct TaskListQuery {
    board_id: Option<String>,
}

/// Check that referenced board and chat exist. A task on a board must sit in
/// one of the board's columns.
async fn check_references(
    state: &AppState,
    board_id: Option<&str>,
    chat_id: Option<&str>,
    column: Option<&str>,
) -> HubResult<()> {
    if let Some(board_id) = board_id {
        let board = boards::find_by_id(&state.db.pool, board_id)
            .await?
            .ok_or_else(|| HubError::not_found("Board"))?;
        if let Some(column) = column {
            ensure_column(&board.columns, column)?;
        }
    }
    if let Some(chat_id) = chat_id {
        chats::find_by_id(&state.db.pool, chat_id)
            .await?
            .ok_or_else(|| HubError::not_found("Chat"))?;
    }
    Ok(())
}

fn ensure_column(columns: &[String], column: &str) -> HubResult<()> {
    if columns.iter().any(|c| c == column) {
        Ok(())
    } else {
        Err(HubError::Validation {
            message: format!("Column '{column}' does not exist on this board"),
        })
    }
}

async fn load_task(state: &AppState, task_id: &str) -> HubResult<Task> {
    tasks::find_by_id(&state.db.pool, task_id)
        .await?
        .ok_or_else(|| HubError::not_found("Task"))
}

/// GET /tasks — summaries, optionally for one board
async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TaskListQuery>,
) -> HubResult<Json<Vec<Task>>> {
    Ok(Json(
        tasks::list_tasks(&state.db.pool, query.board_id.as_deref()).await?,
    ))
}

/// POST /tasks
async fn create_task(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTaskRequest>,
) -> HubResult<Json<Task>> {
    validate_request(&body)?;
    check_references(
        &state,
        body.board_id.as_deref(),
        body.chat_id.as_deref(),
        Some(&body.column),
    )
    .await?;

    let task = tasks::create_task(
        &state.db.pool,
        &ids::generate(ids::TASK),
        body.board_id.as_deref(),
        &body.column,
        body.chat_id.as_deref(),
        body.title.trim(),
        body.description.as_deref(),
    )
    .await?;
    tracing::info!(task_id = %task.id, board_id = ?task.board_id, "Task created");
    Ok(Json(task))
}

/// GET /tasks/{task_id} — with notes and documents
async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> HubResult<Json<TaskDetail>> {
    let task = load_task(&state, &task_id).await?;
    let notes = notes::list_notes(&state.db.pool, NoteOwner::Task, &task_id).await?;
    let documents =
        documents::list_documents(&state.db.pool, DocumentOwner::Task, &task_id).await?;
    Ok(Json(TaskDetail {
        task,
        notes,
        documents,
    }))
}

/// PUT /tasks/{task_id} — partial update
async fn update_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
    Json(body): Json<UpdateTaskRequest>,
) -> HubResult<Json<Task>> {
    validate_request(&body)?;
    let current = load_task(&state, &task_id).await?;

    // A column change is checked against the board the task ends up on.
    let board_id = body.board_id.as_deref().or(current.board_id.as_deref());
    let column = body
        .column
        .as_deref()
        .or(body.board_id.as_ref().map(|_| current.column.as_str()));
    check_references(&state, board_id, body.chat_id.as_deref(), column).await?;

    let task = tasks::update_task(
        &state.db.pool,
        &task_id,
        body.board_id.as_deref(),
        body.column.as_deref(),
        body.chat_id.as_deref(),
        body.title.as_deref().map(str::trim),
        body.description.as_deref(),
    )
    .await?
    .ok_or_else(|| HubError::not_found("Task"))?;
    Ok(Json(task))
}

/// DELETE /tasks/{task_id}?hard=
async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> HubResult<Json<TaskDeleteResponse>> {
    let message = if query.hard {
        // Hard delete also clears tasks that were soft-deleted earlier.
        if !tasks::exists_any(&state.db.pool, &task_id).await? {
            return Err(HubError::not_found("Task"));
        }
        tasks::hard_delete(&state.db.pool, &task_id).await?;
        format!("Task {task_id} permanently deleted")
    } else {
        load_task(&state, &task_id).await?;
        tasks::soft_delete(&state.db.pool, &task_id).await?;
        format!("Task {task_id} soft deleted")
    };

    tracing::info!(%task_id, hard = query.hard, "Task deleted");
    Ok(Json(TaskDeleteResponse {
        success: true,
        message,
    }))
}

/// POST /tasks/{task_id}/notes
async fn add_note(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
    Json(body): Json<CreateNoteRequest>,
) -> HubResult<Json<Note>> {
    validate_request(&body)?;
    load_task(&state, &task_id).await?;

    let note = notes::create_note(
        &state.db.pool,
        NoteOwner::Task,
        &task_id,
        &ids::generate(ids::NOTE),
        &body.content,
        auth.user_id(),
    )
    .await?;
    Ok(Json(note))
}

/// DELETE /tasks/{task_id}/notes/{note_id}
async fn remove_note(
    State(state): State<Arc<AppState>>,
    Path((task_id, note_id)): Path<(String, String)>,
) -> HubResult<Json<MessageResponse>> {
    load_task(&state, &task_id).await?;
    if !notes::delete_linked_note(&state.db.pool, NoteOwner::Task, &task_id, &note_id).await? {
        return Err(HubError::NotFoundDetail(
            "Note not found on this task".into(),
        ));
    }
    Ok(Json(MessageResponse::new("Note deleted successfully")))
}

/// POST /tasks/{task_id}/documents
async fn attach_document(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
    Json(body): Json<AttachDocumentRequest>,
) -> HubResult<Json<Document>> {
    validate_request(&body)?;
    load_task(&state, &task_id).await?;

    let mime_type = resolve_mime_type(body.mime_type.as_deref(), &body.file_name);
    let document = documents::attach_document(
        &state.db.pool,
        DocumentOwner::Task,
        &task_id,
        &ids::generate(ids::DOCUMENT),
        &body.file_url,
        &body.file_name,
        &mime_type,
        auth.user_id(),
    )
    .await?;
    Ok(Json(document))
}

/// DELETE /tasks/{task_id}/documents/{document_id}
async fn remove_document(
    State(state): State<Arc<AppState>>,
    Path((task_id, document_id)): Path<(String, String)>,
) -> HubResult<Json<MessageResponse>> {
    load_task(&state, &task_id).await?;
    let removed = documents::delete_linked_document(
        &state.db.pool,
        DocumentOwner::Task,
        &task_id,
        &document_id,
    )
    .await?;
    if !removed {
        return Err(HubError::NotFoundDetail(
            "Document not found on this task".into(),
        ));
    }
    Ok(Json(MessageResponse::new("Document deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::ensure_column;
    use crate::test_support::{app, get};
    use axum::http::StatusCode;

    #[test]
    fn test_column_must_exist_on_board() {
        let columns = vec!["To Do".to_string(), "Done".to_string()];
        assert!(ensure_column(&columns, "Done").is_ok());
        let err = ensure_column(&columns, "Blocked").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_task_detail_requires_auth() {
        let (status, _) = get(app(), "/tasks/task_abc").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
