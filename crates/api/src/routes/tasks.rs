use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use tasklane_tasks::{NewTask, Task, TaskPatch};
use utoipa::ToSchema;

use crate::{ApiError, AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[utoipa::path(
    get,
    path = "/api/tasks",
    tag = "Tasks",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Tasks owned by the caller, newest first", body = Vec<Task>),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 500, description = "Failed to fetch tasks", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Task>>, ApiError> {
    let identity = state.authenticate(&headers)?;
    let tasks = state.tasks().list(&identity).await?;

    Ok(Json(tasks))
}

#[utoipa::path(
    post,
    path = "/api/tasks",
    tag = "Tasks",
    security(("bearerAuth" = [])),
    request_body = NewTask,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 400, description = "Invalid task payload", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 500, description = "Failed to create task", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<NewTask>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let identity = state.authenticate(&headers)?;
    let Json(req) = payload?;

    let task = state.tasks().create(&identity, req).await?;

    Ok((StatusCode::CREATED, Json(task)))
}

#[utoipa::path(
    put,
    path = "/api/tasks/{task_id}",
    tag = "Tasks",
    security(("bearerAuth" = [])),
    params(("task_id" = String, Path, description = "Task id")),
    request_body = TaskPatch,
    responses(
        (status = 200, description = "Task updated", body = Task),
        (status = 400, description = "Invalid task payload", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 404, description = "Task not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(task_id): Path<String>,
    payload: Result<Json<TaskPatch>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let identity = state.authenticate(&headers)?;
    let Json(patch) = payload?;

    let task = state.tasks().update(&identity, &task_id, patch).await?;

    Ok(Json(task))
}

#[utoipa::path(
    delete,
    path = "/api/tasks/{task_id}",
    tag = "Tasks",
    security(("bearerAuth" = [])),
    params(("task_id" = String, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task deleted", body = MessageResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 404, description = "Task not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(task_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let identity = state.authenticate(&headers)?;
    state.tasks().delete(&identity, &task_id).await?;

    Ok(Json(MessageResponse {
        message: "Task deleted".to_string(),
    }))
}
