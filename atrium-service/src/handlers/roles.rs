use axum::Json;
use std::collections::BTreeMap;

use crate::{
    dtos::{
        users::{RoleCatalog, RoleInfo},
        DataResponse,
    },
    models::{Permission, Role},
};

/// Roles with their hierarchy, and the permission catalog
#[utoipa::path(
    get,
    path = "/api/roles",
    responses(
        (status = 200, description = "{success, data: RoleCatalog}"),
        (status = 403, description = "Missing roles:read", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn list_roles() -> Json<DataResponse<RoleCatalog>> {
    let mut domains: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for permission in Permission::ALL {
        domains
            .entry(permission.domain().to_string())
            .or_default()
            .push(permission.action().to_string());
    }

    Json(DataResponse::new(RoleCatalog {
        roles: Role::ALL.into_iter().map(RoleInfo::from).collect(),
        permissions: Permission::ALL.iter().map(|p| p.to_string()).collect(),
        domains,
    }))
}
