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
        crm::{CreateLeadRequest, LeadResponse, UpdateLeadRequest},
        DataResponse, ListResponse, MessageResponse,
    },
    handlers::ensure_access,
    middleware::Actor,
    models::Lead,
    services::{ownership::LEADS, Access, SortBy},
    utils::validation::ValidatedJson,
    AppState,
};

/// Leads of the caller's organization
#[utoipa::path(
    get,
    path = "/api/crm/leads",
    responses(
        (status = 200, description = "{success, count, data: [LeadResponse]}"),
        (status = 403, description = "Missing crm:read", body = ErrorResponse)
    ),
    tag = "CRM",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn list_leads(
    State(state): State<AppState>,
    Actor(actor): Actor,
) -> Result<Json<ListResponse<LeadResponse>>, AppError> {
    let leads = state
        .stores
        .leads
        .find(LEADS.list_filter::<Lead>(&actor), SortBy::newest_first())
        .await?;
    Ok(Json(ListResponse::new(
        leads.into_iter().map(LeadResponse::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/crm/leads/{id}",
    params(("id" = String, Path, description = "Lead id")),
    responses(
        (status = 200, description = "{success, data: LeadResponse}"),
        (status = 404, description = "Lead not found", body = ErrorResponse)
    ),
    tag = "CRM",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_lead(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<LeadResponse>>, AppError> {
    let lead = LEADS
        .find_in_scope(state.stores.leads.as_ref(), &actor, &id)
        .await?;
    ensure_access(&state, &actor, &lead, Access::Read)?;
    Ok(Json(DataResponse::new(lead.into())))
}

#[utoipa::path(
    post,
    path = "/api/crm/leads",
    request_body = CreateLeadRequest,
    responses(
        (status = 201, description = "{success, data: LeadResponse}"),
        (status = 403, description = "Missing crm:create", body = ErrorResponse)
    ),
    tag = "CRM",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn create_lead(
    State(state): State<AppState>,
    Actor(actor): Actor,
    ValidatedJson(req): ValidatedJson<CreateLeadRequest>,
) -> Result<(StatusCode, Json<DataResponse<LeadResponse>>), AppError> {
    let now = Utc::now();
    let lead = Lead {
        id: Uuid::new_v4().to_string(),
        organization_id: actor.organization_id.clone(),
        name: req.name.trim().to_string(),
        company: req.company.trim().to_string(),
        email: req.email.trim().to_lowercase(),
        phone: req.phone,
        status: req.status.unwrap_or_default(),
        source: req.source,
        assigned_to: req.assigned_to.unwrap_or_else(|| actor.user_id.clone()),
        notes: req.notes,
        converted_to_customer: false,
        created_by: actor.user_id.clone(),
        created_at: now,
        updated_at: now,
    };
    state.stores.leads.insert(&lead).await?;
    tracing::info!(lead_id = %lead.id, actor = %actor.user_id, "Lead created");

    Ok((StatusCode::CREATED, Json(DataResponse::new(lead.into()))))
}

#[utoipa::path(
    put,
    path = "/api/crm/leads/{id}",
    params(("id" = String, Path, description = "Lead id")),
    request_body = UpdateLeadRequest,
    responses(
        (status = 200, description = "{success, data: LeadResponse}"),
        (status = 404, description = "Lead not found", body = ErrorResponse)
    ),
    tag = "CRM",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn update_lead(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateLeadRequest>,
) -> Result<Json<DataResponse<LeadResponse>>, AppError> {
    let mut lead = LEADS
        .find_in_scope(state.stores.leads.as_ref(), &actor, &id)
        .await?;
    ensure_access(&state, &actor, &lead, Access::Update)?;

    req.apply(&mut lead);
    state.stores.leads.replace(&lead).await?;
    Ok(Json(DataResponse::new(lead.into())))
}

#[utoipa::path(
    delete,
    path = "/api/crm/leads/{id}",
    params(("id" = String, Path, description = "Lead id")),
    responses(
        (status = 200, description = "Lead deleted", body = MessageResponse),
        (status = 404, description = "Lead not found", body = ErrorResponse)
    ),
    tag = "CRM",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn delete_lead(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let lead = LEADS
        .find_in_scope(state.stores.leads.as_ref(), &actor, &id)
        .await?;
    ensure_access(&state, &actor, &lead, Access::Delete)?;

    state.stores.leads.delete(&lead.id).await?;
    tracing::info!(lead_id = %lead.id, actor = %actor.user_id, "Lead deleted");
    Ok(Json(MessageResponse::new("Lead deleted successfully")))
}
