pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state, Next},
    routing::{delete, get, post, put, MethodRouter},
    Router,
};
use service_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{AtriumConfig, Environment};
use crate::models::Permission;
use crate::services::{
    AuthService, SecurityAuditService, Stores, TokenDenyList, TokenIssuer, UserService,
};
use service_core::error::AppError;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::logout,
        handlers::auth::me,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::update_user,
        handlers::users::delete_user,
        handlers::users::change_role,
        handlers::users::set_permissions,
        handlers::roles::list_roles,
        handlers::posts::list_posts,
        handlers::posts::get_post,
        handlers::posts::create_post,
        handlers::posts::update_post,
        handlers::posts::delete_post,
        handlers::leads::list_leads,
        handlers::leads::get_lead,
        handlers::leads::create_lead,
        handlers::leads::update_lead,
        handlers::leads::delete_lead,
        handlers::projects::list_projects,
        handlers::projects::get_project,
        handlers::projects::create_project,
        handlers::projects::update_project,
        handlers::projects::delete_project,
        handlers::projects::list_project_updates,
        handlers::projects::create_project_update,
        handlers::hr::list_meetings,
        handlers::hr::get_meeting,
        handlers::hr::create_meeting,
        handlers::hr::update_meeting,
        handlers::hr::delete_meeting,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::MessageResponse,
            dtos::auth::RegisterRequest,
            dtos::auth::LoginRequest,
            dtos::auth::UserResponse,
            dtos::auth::OrganizationResponse,
            dtos::auth::RegisteredUser,
            dtos::auth::RegisterResponse,
            dtos::auth::Session,
            dtos::auth::LoginResponse,
            dtos::auth::RefreshResponse,
            dtos::auth::Profile,
            dtos::auth::ProfileResponse,
            dtos::users::UpdateUserRequest,
            dtos::users::ChangeRoleRequest,
            dtos::users::SetPermissionsRequest,
            dtos::users::RoleInfo,
            dtos::users::RoleCatalog,
            dtos::posts::CreatePostRequest,
            dtos::posts::UpdatePostRequest,
            dtos::posts::PostResponse,
            dtos::crm::CreateLeadRequest,
            dtos::crm::UpdateLeadRequest,
            dtos::crm::LeadResponse,
            dtos::projects::CreateProjectRequest,
            dtos::projects::UpdateProjectRequest,
            dtos::projects::CreateProjectUpdateRequest,
            dtos::projects::ProjectResponse,
            dtos::projects::ProjectUpdateResponse,
            dtos::hr::CreateMeetingRequest,
            dtos::hr::UpdateMeetingRequest,
            dtos::hr::MeetingResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, sessions and credential refresh"),
        (name = "Users", description = "Identity, role and permission management"),
        (name = "Posts", description = "Owned posts with visibility"),
        (name = "CRM", description = "Sales leads"),
        (name = "Projects", description = "Projects and progress updates"),
        (name = "HR", description = "Meetings"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(
                    middleware::ACCESS_COOKIE,
                ))),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AtriumConfig>,
    pub stores: Stores,
    pub tokens: Arc<TokenIssuer>,
    pub auth: AuthService,
    pub users: UserService,
    pub audit: SecurityAuditService,
    /// Present only when revocation is enabled.
    pub deny_list: Option<Arc<dyn TokenDenyList>>,
    pub login_rate_limiter: IpRateLimiter,
    pub register_rate_limiter: IpRateLimiter,
    pub ip_rate_limiter: IpRateLimiter,
}

impl AppState {
    /// Wire the services over the given stores. `deny_list` is dropped unless
    /// revocation is enabled in the token configuration.
    pub fn new(
        config: AtriumConfig,
        stores: Stores,
        deny_list: Option<Arc<dyn TokenDenyList>>,
    ) -> Self {
        use service_core::middleware::rate_limit::create_ip_rate_limiter;

        let deny_list = deny_list.filter(|_| config.tokens.revocation_enabled);
        let tokens = Arc::new(TokenIssuer::new(&config.tokens));
        let audit = SecurityAuditService::new(stores.audit_logs.clone());
        let auth = AuthService::new(
            stores.users.clone(),
            stores.organizations.clone(),
            tokens.clone(),
            deny_list.clone(),
        );
        let users = UserService::new(stores.users.clone(), audit.clone());

        let limits = &config.rate_limit;
        let login_rate_limiter =
            create_ip_rate_limiter(limits.login_attempts, limits.login_window_seconds);
        let register_rate_limiter =
            create_ip_rate_limiter(limits.register_attempts, limits.register_window_seconds);
        let ip_rate_limiter =
            create_ip_rate_limiter(limits.global_ip_limit, limits.global_ip_window_seconds);

        Self {
            config: Arc::new(config),
            stores,
            tokens,
            auth,
            users,
            audit,
            deny_list,
            login_rate_limiter,
            register_rate_limiter,
            ip_rate_limiter,
        }
    }
}

/// Attach the permission guard for `permission` to every method of `route`.
fn guarded(
    state: &AppState,
    permission: Permission,
    route: MethodRouter<AppState>,
) -> MethodRouter<AppState> {
    route.route_layer(from_fn_with_state(
        state.clone(),
        move |s: State<AppState>, req: Request, next: Next| {
            middleware::require_permission(s, permission, req, next)
        },
    ))
}

fn user_routes(state: &AppState) -> Router<AppState> {
    use handlers::users;

    Router::new()
        .route("/api/users", guarded(state, Permission::UsersRead, get(users::list_users)))
        .route(
            "/api/users/:id",
            guarded(state, Permission::UsersRead, get(users::get_user))
                .merge(guarded(state, Permission::UsersUpdate, put(users::update_user)))
                .merge(guarded(state, Permission::UsersDelete, delete(users::delete_user))),
        )
        .route(
            "/api/users/:id/role",
            guarded(state, Permission::RolesAssign, put(users::change_role)),
        )
        .route(
            "/api/users/:id/permissions",
            guarded(state, Permission::RolesAssign, put(users::set_permissions)),
        )
        .route(
            "/api/roles",
            guarded(state, Permission::RolesRead, get(handlers::roles::list_roles)),
        )
}

fn post_routes(state: &AppState) -> Router<AppState> {
    use handlers::posts;

    Router::new()
        .route(
            "/api/posts",
            guarded(state, Permission::PostsRead, get(posts::list_posts))
                .merge(guarded(state, Permission::PostsCreate, post(posts::create_post))),
        )
        .route(
            "/api/posts/:id",
            guarded(state, Permission::PostsRead, get(posts::get_post))
                .merge(guarded(state, Permission::PostsUpdate, put(posts::update_post)))
                .merge(guarded(state, Permission::PostsDelete, delete(posts::delete_post))),
        )
}

fn crm_routes(state: &AppState) -> Router<AppState> {
    use handlers::leads;

    Router::new()
        .route(
            "/api/crm/leads",
            guarded(state, Permission::CrmRead, get(leads::list_leads))
                .merge(guarded(state, Permission::CrmCreate, post(leads::create_lead))),
        )
        .route(
            "/api/crm/leads/:id",
            guarded(state, Permission::CrmRead, get(leads::get_lead))
                .merge(guarded(state, Permission::CrmUpdate, put(leads::update_lead)))
                .merge(guarded(state, Permission::CrmDelete, delete(leads::delete_lead))),
        )
}

fn project_routes(state: &AppState) -> Router<AppState> {
    use handlers::projects;

    Router::new()
        .route(
            "/api/projects",
            guarded(state, Permission::ProjectsRead, get(projects::list_projects))
                .merge(guarded(state, Permission::ProjectsCreate, post(projects::create_project))),
        )
        .route(
            "/api/projects/:id",
            guarded(state, Permission::ProjectsRead, get(projects::get_project))
                .merge(guarded(state, Permission::ProjectsUpdate, put(projects::update_project)))
                .merge(guarded(
                    state,
                    Permission::ProjectsDelete,
                    delete(projects::delete_project),
                )),
        )
        .route(
            "/api/projects/:id/updates",
            guarded(state, Permission::ProjectsRead, get(projects::list_project_updates)).merge(
                guarded(
                    state,
                    Permission::ProjectsCreate,
                    post(projects::create_project_update),
                ),
            ),
        )
}

fn hr_routes(state: &AppState) -> Router<AppState> {
    use handlers::hr;

    Router::new()
        .route(
            "/api/hr/meetings",
            guarded(state, Permission::HrRead, get(hr::list_meetings))
                .merge(guarded(state, Permission::HrCreate, post(hr::create_meeting))),
        )
        .route(
            "/api/hr/meetings/:id",
            guarded(state, Permission::HrRead, get(hr::get_meeting))
                .merge(guarded(state, Permission::HrUpdate, put(hr::update_meeting)))
                .merge(guarded(state, Permission::HrDelete, delete(hr::delete_meeting))),
        )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(origin = %o, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect::<Vec<HeaderValue>>();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

pub async fn build_router(state: AppState) -> Result<Router, AppError> {
    // Create login route with rate limiting
    let login_route = Router::new()
        .route("/api/auth/login", post(handlers::auth::login))
        .layer(from_fn_with_state(
            state.login_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    // Create register route with rate limiting
    let register_route = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .layer(from_fn_with_state(
            state.register_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    // Everything behind the authentication gate
    let protected = Router::new()
        .route("/api/auth/me", get(handlers::auth::me))
        .merge(user_routes(&state))
        .merge(post_routes(&state))
        .merge(crm_routes(&state))
        .merge(project_routes(&state))
        .merge(hr_routes(&state))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::authenticate,
        ));

    let mut app = Router::new()
        .route("/api/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::metrics));

    // Swagger UI only outside production
    if state.config.environment == Environment::Dev {
        app = app.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    let app = app
        .merge(login_route)
        .merge(register_route)
        .route("/api/auth/refresh-token", post(handlers::auth::refresh))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .merge(protected)
        .with_state(state.clone())
        // Global IP rate limiting
        .layer(from_fn_with_state(
            state.ip_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ))
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");

            tracing::info_span!(
                "http_request",
                request_id = %request_id,
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        }))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(&state.config.security.allowed_origins));

    Ok(app)
}
