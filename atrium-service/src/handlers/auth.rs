use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar,
};
use service_core::error::AppError;

use crate::{
    dtos::{
        auth::{
            LoginRequest, LoginResponse, Profile, ProfileResponse, RefreshResponse,
            RegisterRequest, RegisterResponse, RegisteredUser, Session,
        },
        MessageResponse,
    },
    middleware::{access_credential, Actor, ACCESS_COOKIE, REFRESH_COOKIE},
    utils::{password::Password, validation::ValidatedJson},
    AppState,
};

fn session_cookie(name: &'static str, value: String, max_age: chrono::Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::seconds(max_age.num_seconds()))
        .build()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = RegisterResponse),
        (status = 409, description = "Email or username already taken", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 429, description = "Too many attempts", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let user = state
        .auth
        .register(&req.username, &req.email, Password::new(req.password))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            message: "User registered successfully".to_string(),
            data: RegisteredUser { user: user.into() },
        }),
    ))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful; sets token and refreshToken cookies", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 429, description = "Too many attempts", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let outcome = state
        .auth
        .login(&req.email, Password::new(req.password))
        .await?;

    let secure = state.config.security.secure_cookies;
    let jar = jar
        .add(session_cookie(
            ACCESS_COOKIE,
            outcome.access_token.clone(),
            state.tokens.access_ttl(),
            secure,
        ))
        .add(session_cookie(
            REFRESH_COOKIE,
            outcome.refresh_token,
            state.tokens.refresh_ttl(),
            secure,
        ));

    Ok((
        jar,
        Json(LoginResponse {
            success: true,
            message: "Login successful".to_string(),
            data: Session {
                user: outcome.user.into(),
                token: outcome.access_token,
            },
        }),
    ))
}

/// Issue a new access credential from the refresh cookie
#[utoipa::path(
    post,
    path = "/api/auth/refresh-token",
    responses(
        (status = 200, description = "New access credential; re-sets the token cookie", body = RefreshResponse),
        (status = 401, description = "Missing, invalid, expired or revoked refresh credential", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<RefreshResponse>), AppError> {
    let refresh_token = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string());
    let token = state.auth.refresh(refresh_token.as_deref()).await?;

    let jar = jar.add(session_cookie(
        ACCESS_COOKIE,
        token.clone(),
        state.tokens.access_ttl(),
        state.config.security.secure_cookies,
    ));

    Ok((jar, Json(RefreshResponse { success: true, token })))
}

/// Clear both cookies. Always succeeds.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse)
    ),
    tag = "Authentication"
)]
pub async fn logout(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    let access_token = access_credential(&jar, &headers);
    let refresh_token = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string());

    state
        .auth
        .logout(access_token.as_deref(), refresh_token.as_deref())
        .await;

    let jar = jar
        .remove(removal_cookie(ACCESS_COOKIE))
        .remove(removal_cookie(REFRESH_COOKIE));

    (jar, Json(MessageResponse::new("Logged out successfully")))
}

/// The caller's identity and organization
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current identity", body = ProfileResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn me(
    State(state): State<AppState>,
    Actor(actor): Actor,
) -> Result<Json<ProfileResponse>, AppError> {
    let (user, organization) = state.auth.me(&actor).await?;

    Ok(Json(ProfileResponse {
        success: true,
        data: Profile {
            user: user.into(),
            organization: organization.map(Into::into),
        },
    }))
}
