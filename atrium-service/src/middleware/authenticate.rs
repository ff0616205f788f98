use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use service_core::error::AppError;

use crate::{
    services::{ActorContext, AuthError},
    AppState,
};

pub const ACCESS_COOKIE: &str = "token";
pub const REFRESH_COOKIE: &str = "refreshToken";

/// The access credential: the `token` cookie, else an `Authorization: Bearer` header.
pub fn access_credential(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(ACCESS_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Resolve the caller and attach its [`ActorContext`] to the request.
pub async fn authenticate(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let credential = access_credential(&jar, req.headers());

    let actor = state
        .auth
        .authenticator()
        .resolve(credential.as_deref())
        .await
        .map_err(|e| {
            if !matches!(e, AuthError::StoreUnavailable(_)) {
                tracing::debug!(error = %e, path = %req.uri().path(), "Authentication failed");
            }
            AppError::from(e)
        })?;

    req.extensions_mut().insert(actor);
    Ok(next.run(req).await)
}

/// Handler extractor for the authenticated caller.
pub struct Actor(pub ActorContext);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ActorContext>()
            .cloned()
            .map(Actor)
            .ok_or_else(|| AuthError::Unauthenticated.into())
    }
}
