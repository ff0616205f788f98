use axum::{extract::State, Json};
use serde_json::{json, Value};
use service_core::error::AppError;

use crate::AppState;

/// Liveness plus store reachability
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 500, description = "A backing store is unreachable", body = ErrorResponse)
    ),
    tag = "Observability"
)]
pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    state.stores.users.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Store health check failed");
        AppError::from(e)
    })?;

    let deny_list = match &state.deny_list {
        Some(list) => {
            list.health_check().await.map_err(|e| {
                tracing::error!(error = %e, "Deny-list health check failed");
                AppError::InternalError(e)
            })?;
            "up"
        }
        None => "disabled",
    };

    Ok(Json(json!({
        "success": true,
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "store": "up",
            "deny_list": deny_list
        }
    })))
}
