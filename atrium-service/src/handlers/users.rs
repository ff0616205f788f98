use axum::{
    extract::{Path, State},
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{
        auth::UserResponse,
        users::{ChangeRoleRequest, SetPermissionsRequest, UpdateUserRequest},
        DataResponse, ListResponse, MessageResponse,
    },
    middleware::Actor,
    utils::validation::ValidatedJson,
    AppState,
};

/// Identities in the caller's organization
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "{success, count, data: [UserResponse]}"),
        (status = 403, description = "Missing users:read", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    Actor(actor): Actor,
) -> Result<Json<ListResponse<UserResponse>>, AppError> {
    let users = state.users.list(&actor).await?;
    Ok(Json(ListResponse::new(
        users.into_iter().map(UserResponse::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "{success, data: UserResponse}"),
        (status = 404, description = "Not in the caller's organization", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_user(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<UserResponse>>, AppError> {
    let user = state.users.get(&actor, &id).await?;
    Ok(Json(DataResponse::new(user.into())))
}

/// Update profile fields; role and active flag are admin-only
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "{success, data: UserResponse}"),
        (status = 403, description = "Cannot change your own role", body = ErrorResponse),
        (status = 409, description = "Email or username already taken", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn update_user(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<DataResponse<UserResponse>>, AppError> {
    let user = state.users.update(&actor, &id, req.into()).await?;
    Ok(Json(DataResponse::new(user.into())))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 400, description = "Cannot delete your own account", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.users.delete(&actor, &id).await?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

/// Assign a role to another identity
#[utoipa::path(
    put,
    path = "/api/users/{id}/role",
    params(("id" = String, Path, description = "User id")),
    request_body = ChangeRoleRequest,
    responses(
        (status = 200, description = "{success, data: UserResponse}"),
        (status = 403, description = "Cannot change your own role", body = ErrorResponse),
        (status = 422, description = "Unknown role", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn change_role(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<ChangeRoleRequest>,
) -> Result<Json<DataResponse<UserResponse>>, AppError> {
    let user = state.users.change_role(&actor, &id, &req.role).await?;
    Ok(Json(DataResponse::new(user.into())))
}

/// Replace an identity's permission set
#[utoipa::path(
    put,
    path = "/api/users/{id}/permissions",
    params(("id" = String, Path, description = "User id")),
    request_body = SetPermissionsRequest,
    responses(
        (status = 200, description = "{success, data: UserResponse}"),
        (status = 422, description = "Unknown permission string; nothing stored", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn set_permissions(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<SetPermissionsRequest>,
) -> Result<Json<DataResponse<UserResponse>>, AppError> {
    let user = state
        .users
        .set_permissions(&actor, &id, &req.permissions)
        .await?;
    Ok(Json(DataResponse::new(user.into())))
}
