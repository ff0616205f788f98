use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::Role;
use crate::services::UserChanges;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be at least 3 characters"))]
    pub username: Option<String>,

    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,

    /// Applied only when the caller is an admin.
    #[schema(example = "employee")]
    pub role: Option<String>,

    /// Applied only when the caller is an admin.
    pub active: Option<bool>,
}

impl From<UpdateUserRequest> for UserChanges {
    fn from(req: UpdateUserRequest) -> Self {
        Self {
            username: req.username,
            email: req.email,
            role: req.role,
            active: req.active,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangeRoleRequest {
    #[validate(length(min = 1, message = "Role is required"))]
    #[schema(example = "supervisor")]
    pub role: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SetPermissionsRequest {
    #[schema(example = json!(["crm:read", "crm:update"]))]
    pub permissions: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoleInfo {
    #[schema(value_type = String, example = "manager")]
    pub name: Role,
    pub rank: u8,
    pub description: String,
    #[schema(value_type = Vec<String>)]
    pub subordinates: Vec<Role>,
}

impl From<Role> for RoleInfo {
    fn from(role: Role) -> Self {
        Self {
            name: role,
            rank: role.rank(),
            description: role.description().to_string(),
            subordinates: role.subordinates(),
        }
    }
}

/// Role hierarchy and permission catalog. Informational only.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoleCatalog {
    pub roles: Vec<RoleInfo>,
    pub permissions: Vec<String>,
    /// Actions of the catalog grouped by domain
    #[schema(value_type = Object)]
    pub domains: BTreeMap<String, Vec<String>>,
}
