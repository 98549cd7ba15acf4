/// Task endpoints
///
/// Every handler runs behind the authentication gate and reaches storage only through
/// the caller's [`TaskScope`](taskhub_shared::auth::authorization::TaskScope). A task
/// owned by someone else is reported exactly like a missing one: `404 Task not found`.
///
/// # Endpoints
///
/// - `POST /tasks/create-task`
/// - `GET /tasks/tasks?page&limit&status&priority`
/// - `GET /tasks/task/:id`
/// - `PUT /tasks/update-task/:id`
/// - `PATCH /tasks/update-task/status/:id`
/// - `PATCH /tasks/update-task/priority/:id`
/// - `DELETE /tasks/delete-task/:id`

use crate::{
    app::AppState,
    error::ApiResult,
    routes::auth::MessageResponse,
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskhub_shared::{
    auth::middleware::AuthContext,
    models::{
        page::PageRequest,
        task::{NewTask, Task, TaskChanges, TaskFilter, TaskPriority, TaskStatus},
    },
};
use uuid::Uuid;
use validator::Validate;

/// Query parameters for listing tasks
#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
    pub total: i64,
    pub total_pages: i64,
    pub current_page: u32,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub message: String,
    pub task: Task,
}

#[derive(Debug, Serialize)]
pub struct SingleTaskResponse {
    pub task: Task,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedTaskResponse {
    pub message: String,
    pub updated_task: Task,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: TaskStatus,
}

#[derive(Debug, Deserialize)]
pub struct PriorityUpdate {
    pub priority: TaskPriority,
}

/// Fails with `404 Project not found` unless the caller owns the project
async fn ensure_project_owned(state: &AppState, auth: &AuthContext, project_id: Option<Uuid>) -> ApiResult<()> {
    if let Some(project_id) = project_id {
        state.project_scope(auth).get(project_id).await?;
    }
    Ok(())
}

/// Create a task owned by the caller
///
/// # Endpoint
///
/// ```text
/// POST /tasks/create-task
/// Content-Type: application/json
///
/// {
///   "title": "Write report",
///   "priority": "high",
///   "dueDate": "2025-07-01"
/// }
/// ```
///
/// The owner always comes from the session token; a `createdBy` field in the body is
/// ignored.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    body: Result<Json<NewTask>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let Json(draft) = body?;
    draft.validate()?;
    ensure_project_owned(&state, &auth, draft.project_id).await?;

    let task = state.task_scope(&auth).create(draft).await?;

    Ok((
        StatusCode::CREATED,
        Json(TaskResponse {
            message: "Task created successfully".to_string(),
            task,
        }),
    ))
}

/// List the caller's tasks, newest first
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    query: Result<Query<TaskListQuery>, QueryRejection>,
) -> ApiResult<Json<TaskListResponse>> {
    let Query(query) = query?;
    let request = PageRequest::new(query.page, query.limit)?;
    let filter = TaskFilter {
        status: query.status,
        priority: query.priority,
    };

    let page = state.task_scope(&auth).list(filter, request).await?;

    Ok(Json(TaskListResponse {
        tasks: page.items,
        total: page.total,
        total_pages: page.total_pages,
        current_page: page.current_page,
    }))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<SingleTaskResponse>> {
    let Path(id) = id?;
    let task = state.task_scope(&auth).get(id).await?;

    Ok(Json(SingleTaskResponse { task }))
}

/// Partial update; fields absent from the body keep their values
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<TaskChanges>, JsonRejection>,
) -> ApiResult<Json<UpdatedTaskResponse>> {
    let Path(id) = id?;
    let Json(changes) = body?;
    changes.validate()?;
    ensure_project_owned(&state, &auth, changes.project_id).await?;

    let updated_task = state.task_scope(&auth).update(id, changes).await?;

    Ok(Json(UpdatedTaskResponse {
        message: "Task updated successfully".to_string(),
        updated_task,
    }))
}

pub async fn update_task_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<StatusUpdate>, JsonRejection>,
) -> ApiResult<Json<UpdatedTaskResponse>> {
    let Path(id) = id?;
    let Json(update) = body?;

    let updated_task = state
        .task_scope(&auth)
        .update(id, TaskChanges::status(update.status))
        .await?;

    Ok(Json(UpdatedTaskResponse {
        message: "Task status updated".to_string(),
        updated_task,
    }))
}

pub async fn update_task_priority(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<PriorityUpdate>, JsonRejection>,
) -> ApiResult<Json<UpdatedTaskResponse>> {
    let Path(id) = id?;
    let Json(update) = body?;

    let updated_task = state
        .task_scope(&auth)
        .update(id, TaskChanges::priority(update.priority))
        .await?;

    Ok(Json(UpdatedTaskResponse {
        message: "Priority updated".to_string(),
        updated_task,
    }))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Path(id) = id?;
    state.task_scope(&auth).delete(id).await?;

    Ok(Json(MessageResponse {
        message: "Task deleted successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_accepts_status_spellings() {
        let query: TaskListQuery = serde_json::from_str(r#"{"status":"in progress"}"#).unwrap();
        assert_eq!(query.status, Some(TaskStatus::InProgress));

        let query: TaskListQuery = serde_json::from_str(r#"{"status":"in_progress","priority":"low"}"#).unwrap();
        assert_eq!(query.status, Some(TaskStatus::InProgress));
        assert_eq!(query.priority, Some(TaskPriority::Low));
    }

    #[test]
    fn test_list_response_is_camel_case() {
        let response = TaskListResponse {
            tasks: Vec::new(),
            total: 0,
            total_pages: 0,
            current_page: 1,
        };
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["currentPage"], 1);
        assert_eq!(json["totalPages"], 0);
        assert!(json["tasks"].as_array().unwrap().is_empty());
    }
}
