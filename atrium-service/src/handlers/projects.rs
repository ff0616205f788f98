use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use mongodb::bson;
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::{
        projects::{
            CreateProjectRequest, CreateProjectUpdateRequest, ProjectResponse,
            ProjectUpdateResponse, UpdateProjectRequest,
        },
        DataResponse, ListResponse, MessageResponse,
    },
    handlers::ensure_access,
    middleware::Actor,
    models::{Project, ProjectUpdate},
    services::{ownership::PROJECTS, Access, Filter, SortBy},
    utils::validation::ValidatedJson,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/projects",
    responses(
        (status = 200, description = "{success, count, data: [ProjectResponse]}"),
        (status = 403, description = "Missing projects:read", body = ErrorResponse)
    ),
    tag = "Projects",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn list_projects(
    State(state): State<AppState>,
    Actor(actor): Actor,
) -> Result<Json<ListResponse<ProjectResponse>>, AppError> {
    let projects = state
        .stores
        .projects
        .find(PROJECTS.list_filter::<Project>(&actor), SortBy::newest_first())
        .await?;
    Ok(Json(ListResponse::new(
        projects.into_iter().map(ProjectResponse::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    params(("id" = String, Path, description = "Project id")),
    responses(
        (status = 200, description = "{success, data: ProjectResponse}"),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tag = "Projects",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_project(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<ProjectResponse>>, AppError> {
    let project = PROJECTS
        .find_in_scope(state.stores.projects.as_ref(), &actor, &id)
        .await?;
    ensure_access(&state, &actor, &project, Access::Read)?;
    Ok(Json(DataResponse::new(project.into())))
}

#[utoipa::path(
    post,
    path = "/api/projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "{success, data: ProjectResponse}"),
        (status = 403, description = "Missing projects:create", body = ErrorResponse)
    ),
    tag = "Projects",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn create_project(
    State(state): State<AppState>,
    Actor(actor): Actor,
    ValidatedJson(req): ValidatedJson<CreateProjectRequest>,
) -> Result<(StatusCode, Json<DataResponse<ProjectResponse>>), AppError> {
    let now = Utc::now();
    let project = Project {
        id: Uuid::new_v4().to_string(),
        organization_id: actor.organization_id.clone(),
        name: req.name.trim().to_string(),
        description: req.description,
        status: req.status.unwrap_or_default(),
        priority: req.priority.unwrap_or_default(),
        start_date: req.start_date.map(bson::DateTime::from_chrono),
        end_date: req.end_date.map(bson::DateTime::from_chrono),
        budget: req.budget,
        progress: 0,
        manager: req.manager.unwrap_or_else(|| actor.user_id.clone()),
        team: req.team,
        created_at: now,
        updated_at: now,
    };
    state.stores.projects.insert(&project).await?;
    tracing::info!(project_id = %project.id, actor = %actor.user_id, "Project created");

    Ok((StatusCode::CREATED, Json(DataResponse::new(project.into()))))
}

#[utoipa::path(
    put,
    path = "/api/projects/{id}",
    params(("id" = String, Path, description = "Project id")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "{success, data: ProjectResponse}"),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tag = "Projects",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn update_project(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateProjectRequest>,
) -> Result<Json<DataResponse<ProjectResponse>>, AppError> {
    let mut project = PROJECTS
        .find_in_scope(state.stores.projects.as_ref(), &actor, &id)
        .await?;
    ensure_access(&state, &actor, &project, Access::Update)?;

    req.apply(&mut project);
    state.stores.projects.replace(&project).await?;
    Ok(Json(DataResponse::new(project.into())))
}

/// Deletes the project and its updates
#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    params(("id" = String, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project deleted", body = MessageResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tag = "Projects",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn delete_project(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let project = PROJECTS
        .find_in_scope(state.stores.projects.as_ref(), &actor, &id)
        .await?;
    ensure_access(&state, &actor, &project, Access::Delete)?;

    state.stores.projects.delete(&project.id).await?;
    let removed = state
        .stores
        .project_updates
        .delete_many(Filter::eq("project_id", project.id.as_str()))
        .await?;
    tracing::info!(project_id = %project.id, updates = removed, actor = %actor.user_id, "Project deleted");
    Ok(Json(MessageResponse::new("Project deleted successfully")))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}/updates",
    params(("id" = String, Path, description = "Project id")),
    responses(
        (status = 200, description = "{success, count, data: [ProjectUpdateResponse]}"),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tag = "Projects",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn list_project_updates(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<String>,
) -> Result<Json<ListResponse<ProjectUpdateResponse>>, AppError> {
    let project = PROJECTS
        .find_in_scope(state.stores.projects.as_ref(), &actor, &id)
        .await?;
    ensure_access(&state, &actor, &project, Access::Read)?;

    let updates = state
        .stores
        .project_updates
        .find(
            Filter::eq("project_id", project.id.as_str()),
            SortBy::newest_first(),
        )
        .await?;
    Ok(Json(ListResponse::new(
        updates.into_iter().map(ProjectUpdateResponse::from).collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/projects/{id}/updates",
    params(("id" = String, Path, description = "Project id")),
    request_body = CreateProjectUpdateRequest,
    responses(
        (status = 201, description = "{success, data: ProjectUpdateResponse}"),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tag = "Projects",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn create_project_update(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<CreateProjectUpdateRequest>,
) -> Result<(StatusCode, Json<DataResponse<ProjectUpdateResponse>>), AppError> {
    let project = PROJECTS
        .find_in_scope(state.stores.projects.as_ref(), &actor, &id)
        .await?;
    ensure_access(&state, &actor, &project, Access::Read)?;

    let update = ProjectUpdate {
        id: Uuid::new_v4().to_string(),
        project_id: project.id,
        organization_id: project.organization_id,
        content: req.content.trim().to_string(),
        progress: req.progress,
        created_by: actor.user_id.clone(),
        created_at: Utc::now(),
    };
    state.stores.project_updates.insert(&update).await?;

    Ok((StatusCode::CREATED, Json(DataResponse::new(update.into()))))
}
