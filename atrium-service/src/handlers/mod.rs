pub mod auth;
pub mod health;
pub mod hr;
pub mod leads;
pub mod metrics;
pub mod posts;
pub mod projects;
pub mod roles;
pub mod users;

use service_core::error::AppError;

use crate::{
    models::SecurityEventType,
    services::{Access, ActorContext, OwnedResource},
    AppState,
};

/// Per-item ownership check; denials are audited.
pub(crate) fn ensure_access<R: OwnedResource>(
    state: &AppState,
    actor: &ActorContext,
    resource: &R,
    access: Access,
) -> Result<(), AppError> {
    R::POLICY.check(actor, resource, access).map_err(|err| {
        state.audit.record_denial(
            actor,
            SecurityEventType::OwnershipDenied,
            Some(R::POLICY.permission_for(access)),
            Some(format!("{}:{}", R::COLLECTION, resource.id())),
            format!("{} ({} {})", err, access.as_str(), R::POLICY.kind),
        );
        AppError::from(err)
    })
}
