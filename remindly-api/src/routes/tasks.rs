/// To-do list endpoints
///
/// Every endpoint is scoped to the caller's own list.
///
/// - `POST /v1/tasks` - Append a task
/// - `GET /v1/tasks` - List tasks in creation order
/// - `DELETE /v1/tasks/:id` - Remove one task
/// - `DELETE /v1/tasks` - Remove all tasks

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::auth::AuthContext,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use remindly_shared::models::task::{CreateTask, Task};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Task text
    #[validate(
        length(min = 1, max = 1000, message = "Task must be between 1 and 1000 characters"),
        custom(function = "not_blank")
    )]
    pub text: String,
}

fn not_blank(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Task must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Task as returned to clients
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskResponse {
    /// Task ID
    pub id: Uuid,

    /// Task text
    pub text: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            text: task.text,
            created_at: task.created_at,
        }
    }
}

/// Result of clearing a list
#[derive(Debug, Serialize, Deserialize)]
pub struct ClearTasksResponse {
    /// Number of tasks removed
    pub deleted: u64,
}

/// Appends a task to the caller's list
///
/// # Endpoint
///
/// ```text
/// POST /v1/tasks
/// Authorization: Bearer <token>
/// Content-Type: application/json
///
/// { "text": "Buy milk" }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid token
/// - `404 Not Found`: Account deleted since the token was issued
/// - `422 Unprocessable Entity`: Empty or oversized text
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    req.validate()?;

    let task = state
        .store
        .create_task(CreateTask {
            owner_email: auth.email,
            text: req.text,
        })
        .await?;

    tracing::debug!(task_id = %task.id, owner = %task.owner_email, "Task created");

    Ok((StatusCode::CREATED, Json(task.into())))
}

/// Lists the caller's tasks, oldest first
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    let tasks = state.store.get_tasks(&auth.email).await?;

    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}

/// Deletes one of the caller's tasks
///
/// A task owned by someone else is reported as not found.
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !state.store.delete_task(&auth.email, id).await? {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Empties the caller's list
pub async fn clear_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ClearTasksResponse>> {
    let deleted = state.store.clear_tasks(&auth.email).await?;

    tracing::debug!(owner = %auth.email, deleted, "Tasks cleared");

    Ok(Json(ClearTasksResponse { deleted }))
}
