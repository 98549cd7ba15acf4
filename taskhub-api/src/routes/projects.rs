/// Project endpoints
///
/// All handlers are gated and owner-scoped. Statistics are computed over the caller's
/// projects only.
///
/// # Endpoints
///
/// - `POST /projects/create-project`
/// - `GET /projects/get-projects?page&limit&status`
/// - `GET /projects/statistics`
/// - `GET /projects/project/:id`
/// - `PUT /projects/update-project/:id`
/// - `DELETE /projects/delete-project/:id`

use crate::{app::AppState, error::ApiResult, routes::auth::MessageResponse};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use taskhub_shared::{
    auth::middleware::AuthContext,
    models::{
        page::PageRequest,
        project::{NewProject, Project, ProjectChanges, ProjectFilter, ProjectStatistic, ProjectStatus},
    },
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
pub struct ProjectListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<ProjectStatus>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectListResponse {
    pub projects: Vec<Project>,
    pub total: i64,
    pub total_pages: i64,
    pub current_page: u32,
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub message: String,
    pub project: Project,
}

#[derive(Debug, Serialize)]
pub struct SingleProjectResponse {
    pub project: Project,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedProjectResponse {
    pub message: String,
    pub updated_project: Project,
}

#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    pub statistics: Vec<ProjectStatistic>,
}

/// Create a project owned by the caller
///
/// # Endpoint
///
/// ```text
/// POST /projects/create-project
/// Content-Type: application/json
///
/// {
///   "name": "Launch",
///   "description": "Public release",
///   "dueDate": "2025-09-30"
/// }
/// ```
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    body: Result<Json<NewProject>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ProjectResponse>)> {
    let Json(draft) = body?;
    draft.validate()?;

    let project = state.project_scope(&auth).create(draft).await?;

    Ok((
        StatusCode::CREATED,
        Json(ProjectResponse {
            message: "Project created successfully".to_string(),
            project,
        }),
    ))
}

pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    query: Result<Query<ProjectListQuery>, QueryRejection>,
) -> ApiResult<Json<ProjectListResponse>> {
    let Query(query) = query?;
    let request = PageRequest::new(query.page, query.limit)?;
    let filter = ProjectFilter { status: query.status };

    let page = state.project_scope(&auth).list(filter, request).await?;

    Ok(Json(ProjectListResponse {
        projects: page.items,
        total: page.total,
        total_pages: page.total_pages,
        current_page: page.current_page,
    }))
}

/// Per-status counts of the caller's projects
///
/// # Response
///
/// ```json
/// {
///   "statistics": [
///     { "status": "active", "count": 3, "overdue": 1 },
///     { "status": "completed", "count": 2, "overdue": 0 }
///   ]
/// }
/// ```
pub async fn project_statistics(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<StatisticsResponse>> {
    let today = Utc::now().date_naive();
    let statistics = state.project_scope(&auth).statistics(today).await?;

    Ok(Json(StatisticsResponse { statistics }))
}

pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<SingleProjectResponse>> {
    let Path(id) = id?;
    let project = state.project_scope(&auth).get(id).await?;

    Ok(Json(SingleProjectResponse { project }))
}

pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<ProjectChanges>, JsonRejection>,
) -> ApiResult<Json<UpdatedProjectResponse>> {
    let Path(id) = id?;
    let Json(changes) = body?;
    changes.validate()?;

    let updated_project = state.project_scope(&auth).update(id, changes).await?;

    Ok(Json(UpdatedProjectResponse {
        message: "Project updated successfully".to_string(),
        updated_project,
    }))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Path(id) = id?;
    state.project_scope(&auth).delete(id).await?;

    Ok(Json(MessageResponse {
        message: "Project deleted successfully".to_string(),
    }))
}
