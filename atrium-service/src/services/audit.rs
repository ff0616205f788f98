use metrics::counter;
use std::sync::Arc;

use super::{authorization::ActorContext, store::Repository};
use crate::models::{Permission, SecurityAuditLog, SecurityEventType};

/// Records authorization denials. Writes happen in a detached task and never
/// hold up the response.
#[derive(Clone)]
pub struct SecurityAuditService {
    sink: Arc<dyn Repository<SecurityAuditLog>>,
}

impl SecurityAuditService {
    pub fn new(sink: Arc<dyn Repository<SecurityAuditLog>>) -> Self {
        Self { sink }
    }

    pub fn record_denial(
        &self,
        actor: &ActorContext,
        event_type: SecurityEventType,
        permission: Option<Permission>,
        resource: Option<String>,
        details: impl Into<String>,
    ) {
        let details = details.into();

        tracing::warn!(
            user_id = %actor.user_id,
            role = %actor.role,
            permission = ?permission.map(|p| p.as_str()),
            resource = ?resource,
            event = event_type.as_str(),
            "{}", details
        );
        counter!("authz_denials_total", "reason" => event_type.as_str()).increment(1);

        self.log_async(SecurityAuditLog::new(
            event_type,
            "warning",
            actor.user_id.clone(),
            actor.role,
            actor.organization_id.clone(),
            permission.map(|p| p.to_string()),
            resource,
            details,
        ));
    }

    fn log_async(&self, log: SecurityAuditLog) {
        let sink = self.sink.clone();
        tokio::spawn(async move {
            if let Err(e) = sink.insert(&log).await {
                tracing::error!(error = %e, event = log.event_type.as_str(), "Failed to write audit log");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::services::store::{Filter, InMemoryRepository, SortBy};
    use std::time::Duration;

    #[tokio::test]
    async fn denial_is_persisted_in_background() {
        let sink = Arc::new(InMemoryRepository::<SecurityAuditLog>::new());
        let audit = SecurityAuditService::new(sink.clone());
        let actor = ActorContext {
            user_id: "u1".to_string(),
            role: Role::Viewer,
            permissions: Default::default(),
            organization_id: Some("o1".to_string()),
        };

        audit.record_denial(
            &actor,
            SecurityEventType::PermissionDenied,
            Some(Permission::CrmCreate),
            Some("/api/crm/leads".to_string()),
            "Insufficient permissions",
        );

        let mut logs = Vec::new();
        for _ in 0..50 {
            logs = sink.find(Filter::All, SortBy::newest_first()).await.unwrap();
            if !logs.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].permission.as_deref(), Some("crm:create"));
        assert_eq!(logs[0].organization_id.as_deref(), Some("o1"));
    }

    #[tokio::test]
    async fn failed_audit_write_does_not_panic() {
        let sink = Arc::new(InMemoryRepository::<SecurityAuditLog>::new());
        sink.set_unavailable(true);
        let audit = SecurityAuditService::new(sink);
        let actor = ActorContext {
            user_id: "u1".to_string(),
            role: Role::Admin,
            permissions: Default::default(),
            organization_id: None,
        };
        audit.record_denial(
            &actor,
            SecurityEventType::SelfRoleChangeDenied,
            Some(Permission::RolesAssign),
            None,
            "Cannot change your own role",
        );
        tokio::task::yield_now().await;
    }
}
