//! Security audit records for access denials.

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;
use crate::services::store::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityEventType {
    /// Required permission missing from the actor's set
    PermissionDenied,
    /// Actor is neither owner nor sufficiently privileged for a record
    OwnershipDenied,
    /// Actor tried to change their own role
    SelfRoleChangeDenied,
    /// Actor tried to rewrite their own permission set
    SelfPermissionChangeDenied,
}

impl SecurityEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityEventType::PermissionDenied => "permission_denied",
            SecurityEventType::OwnershipDenied => "ownership_denied",
            SecurityEventType::SelfRoleChangeDenied => "self_role_change_denied",
            SecurityEventType::SelfPermissionChangeDenied => "self_permission_change_denied",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityAuditLog {
    #[serde(rename = "_id")]
    pub id: String,
    pub event_type: SecurityEventType,
    /// info, warning or critical
    pub severity: String,
    pub user_id: String,
    pub role: Role,
    pub organization_id: Option<String>,
    pub permission: Option<String>,
    pub resource: Option<String>,
    pub details: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl SecurityAuditLog {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        event_type: SecurityEventType,
        severity: impl Into<String>,
        user_id: impl Into<String>,
        role: Role,
        organization_id: Option<String>,
        permission: Option<String>,
        resource: Option<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_type,
            severity: severity.into(),
            user_id: user_id.into(),
            role,
            organization_id,
            permission,
            resource,
            details: details.into(),
            created_at: Utc::now(),
        }
    }
}

impl Record for SecurityAuditLog {
    const COLLECTION: &'static str = "security_audit_logs";

    fn id(&self) -> &str {
        &self.id
    }
}
