use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{Organization, OrganizationModule, Role, SubscriptionPlan, User};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be at least 3 characters"))]
    #[schema(example = "ada")]
    pub username: String,

    #[validate(email(message = "Please provide a valid email"))]
    #[schema(example = "ada@example.com")]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    #[schema(example = "secret123", min_length = 6)]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Please provide a valid email"))]
    #[schema(example = "ada@example.com")]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "secret123")]
    pub password: String,
}

/// An identity as returned to clients. Never carries the password hash.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: String,
    pub username: String,
    pub email: String,
    #[schema(value_type = String, example = "manager")]
    pub role: Role,
    #[schema(example = json!(["crm:read", "projects:read"]))]
    pub permissions: Vec<String>,
    pub organization_id: Option<String>,
    pub active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            permissions: user.permissions.to_strings(),
            last_login: user.last_login.map(|d| d.to_chrono()),
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            organization_id: user.organization_id,
            active: user.active,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrganizationResponse {
    pub id: String,
    #[schema(example = "ada's Organization")]
    pub name: String,
    pub domain: Option<String>,
    #[schema(value_type = Vec<String>, example = json!(["crm", "projects", "hr"]))]
    pub modules: Vec<OrganizationModule>,
    #[schema(value_type = String, example = "free")]
    pub plan: SubscriptionPlan,
    pub active: bool,
}

impl From<Organization> for OrganizationResponse {
    fn from(org: Organization) -> Self {
        Self {
            id: org.id,
            name: org.name,
            domain: org.domain,
            modules: org.modules,
            plan: org.plan,
            active: org.active,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisteredUser {
    pub user: UserResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub success: bool,
    #[schema(example = "User registered successfully")]
    pub message: String,
    pub data: RegisteredUser,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Session {
    pub user: UserResponse,
    /// Also set as the `token` cookie.
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    #[schema(example = "Login successful")]
    pub message: String,
    pub data: Session,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshResponse {
    pub success: bool,
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Profile {
    pub user: UserResponse,
    pub organization: Option<OrganizationResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub success: bool,
    pub data: Profile,
}
