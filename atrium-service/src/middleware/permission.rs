use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::{
    models::{Permission, SecurityEventType},
    services::{authorize, ActorContext},
    AppState,
};

/// Route guard for one catalog permission. Runs after [`super::authenticate`]
/// and decides afresh on every request.
///
/// ```ignore
/// .route_layer(from_fn_with_state(state.clone(), |s, req, next| {
///     require_permission(s, Permission::CrmCreate, req, next)
/// }))
/// ```
pub async fn require_permission(
    State(state): State<AppState>,
    required: Permission,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let actor = req.extensions().get::<ActorContext>();

    if let Err(err) = authorize(actor, required) {
        if let Some(actor) = actor {
            state.audit.record_denial(
                actor,
                SecurityEventType::PermissionDenied,
                Some(required),
                Some(format!("{} {}", req.method(), req.uri().path())),
                err.to_string(),
            );
        }
        return Err(err.into());
    }

    Ok(next.run(req).await)
}
