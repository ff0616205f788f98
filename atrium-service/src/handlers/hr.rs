use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::{
        hr::{CreateMeetingRequest, MeetingResponse, UpdateMeetingRequest},
        DataResponse, ListResponse, MessageResponse,
    },
    handlers::ensure_access,
    middleware::Actor,
    models::{Meeting, MeetingStatus},
    services::{ownership::MEETINGS, Access, SortBy},
    utils::validation::ValidatedJson,
    AppState,
};

const DEFAULT_DURATION_MINUTES: i32 = 60;

/// Meetings of the caller's organization, soonest first
#[utoipa::path(
    get,
    path = "/api/hr/meetings",
    responses(
        (status = 200, description = "{success, count, data: [MeetingResponse]}"),
        (status = 403, description = "Missing hr:read", body = ErrorResponse)
    ),
    tag = "HR",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn list_meetings(
    State(state): State<AppState>,
    Actor(actor): Actor,
) -> Result<Json<ListResponse<MeetingResponse>>, AppError> {
    let meetings = state
        .stores
        .meetings
        .find(
            MEETINGS.list_filter::<Meeting>(&actor),
            SortBy::ascending("meeting_date"),
        )
        .await?;
    Ok(Json(ListResponse::new(
        meetings.into_iter().map(MeetingResponse::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/hr/meetings/{id}",
    params(("id" = String, Path, description = "Meeting id")),
    responses(
        (status = 200, description = "{success, data: MeetingResponse}"),
        (status = 404, description = "Meeting not found", body = ErrorResponse)
    ),
    tag = "HR",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_meeting(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<MeetingResponse>>, AppError> {
    let meeting = MEETINGS
        .find_in_scope(state.stores.meetings.as_ref(), &actor, &id)
        .await?;
    ensure_access(&state, &actor, &meeting, Access::Read)?;
    Ok(Json(DataResponse::new(meeting.into())))
}

#[utoipa::path(
    post,
    path = "/api/hr/meetings",
    request_body = CreateMeetingRequest,
    responses(
        (status = 201, description = "{success, data: MeetingResponse}"),
        (status = 403, description = "Missing hr:create", body = ErrorResponse)
    ),
    tag = "HR",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn create_meeting(
    State(state): State<AppState>,
    Actor(actor): Actor,
    ValidatedJson(req): ValidatedJson<CreateMeetingRequest>,
) -> Result<(StatusCode, Json<DataResponse<MeetingResponse>>), AppError> {
    let now = Utc::now();
    let meeting = Meeting {
        id: Uuid::new_v4().to_string(),
        organization_id: actor.organization_id.clone(),
        title: req.title.trim().to_string(),
        project_id: req.project_id,
        company_name: req.company_name.trim().to_string(),
        meeting_date: req.meeting_date,
        meeting_time: req.meeting_time,
        duration_minutes: req.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES),
        attendees: req.attendees,
        location: req.location,
        meeting_type: req.meeting_type.unwrap_or_default(),
        status: MeetingStatus::Scheduled,
        notes: req.notes,
        created_by: actor.user_id.clone(),
        created_at: now,
        updated_at: now,
    };
    state.stores.meetings.insert(&meeting).await?;
    tracing::info!(meeting_id = %meeting.id, actor = %actor.user_id, "Meeting scheduled");

    Ok((StatusCode::CREATED, Json(DataResponse::new(meeting.into()))))
}

#[utoipa::path(
    put,
    path = "/api/hr/meetings/{id}",
    params(("id" = String, Path, description = "Meeting id")),
    request_body = UpdateMeetingRequest,
    responses(
        (status = 200, description = "{success, data: MeetingResponse}"),
        (status = 404, description = "Meeting not found", body = ErrorResponse)
    ),
    tag = "HR",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn update_meeting(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateMeetingRequest>,
) -> Result<Json<DataResponse<MeetingResponse>>, AppError> {
    let mut meeting = MEETINGS
        .find_in_scope(state.stores.meetings.as_ref(), &actor, &id)
        .await?;
    ensure_access(&state, &actor, &meeting, Access::Update)?;

    req.apply(&mut meeting);
    state.stores.meetings.replace(&meeting).await?;
    Ok(Json(DataResponse::new(meeting.into())))
}

#[utoipa::path(
    delete,
    path = "/api/hr/meetings/{id}",
    params(("id" = String, Path, description = "Meeting id")),
    responses(
        (status = 200, description = "Meeting deleted", body = MessageResponse),
        (status = 404, description = "Meeting not found", body = ErrorResponse)
    ),
    tag = "HR",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn delete_meeting(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let meeting = MEETINGS
        .find_in_scope(state.stores.meetings.as_ref(), &actor, &id)
        .await?;
    ensure_access(&state, &actor, &meeting, Access::Delete)?;

    state.stores.meetings.delete(&meeting.id).await?;
    Ok(Json(MessageResponse::new("Meeting deleted successfully")))
}
