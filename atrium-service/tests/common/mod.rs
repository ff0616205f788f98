//! Shared harness for atrium-service integration tests.
//!
//! Builds the full router over in-memory stores and keeps concrete handles to
//! the stores so tests can seed data and simulate outages.

#![allow(dead_code)]

use atrium_service::{
    build_router,
    config::{
        AtriumConfig, Environment, MongoConfig, RateLimitConfig, SecurityConfig, TokenConfig,
    },
    models::{Organization, Permission, PermissionSet, Role, User},
    services::{store::InMemoryRepository, InMemoryDenyList, Repository, Stores, TokenDenyList},
    utils::password::{hash_password, Password},
    AppState,
};
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "secret123";

pub fn test_config(revocation_enabled: bool) -> AtriumConfig {
    AtriumConfig {
        common: service_core::config::Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
        },
        environment: Environment::Dev,
        service_name: "atrium-service".to_string(),
        service_version: "test".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        mongodb: MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "atrium_test".to_string(),
        },
        redis: None,
        tokens: TokenConfig {
            access_secret: SecretString::new("test-access-secret".to_string()),
            refresh_secret: SecretString::new("test-refresh-secret".to_string()),
            access_token_expiry_minutes: 60,
            refresh_token_expiry_days: 7,
            revocation_enabled,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            secure_cookies: false,
        },
        rate_limit: RateLimitConfig {
            global_ip_limit: 1000,
            global_ip_window_seconds: 60,
            login_attempts: 1000,
            login_window_seconds: 60,
            register_attempts: 1000,
            register_window_seconds: 60,
        },
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// Value of the named cookie set by this response, if any.
    pub fn cookie(&self, name: &str) -> Option<String> {
        let prefix = format!("{}=", name);
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(&prefix))
            .map(|v| {
                v[prefix.len()..]
                    .split(';')
                    .next()
                    .unwrap_or_default()
                    .to_string()
            })
    }

    /// Full `Set-Cookie` header for the named cookie.
    pub fn set_cookie_header(&self, name: &str) -> Option<String> {
        let prefix = format!("{}=", name);
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(&prefix))
            .map(str::to_string)
    }

    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub users: Arc<InMemoryRepository<User>>,
    pub organizations: Arc<InMemoryRepository<Organization>>,
    pub deny_list: Arc<InMemoryDenyList>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::with_config(test_config(false)).await
    }

    pub async fn with_revocation() -> Self {
        Self::with_config(test_config(true)).await
    }

    pub async fn with_config(config: AtriumConfig) -> Self {
        let users = Arc::new(InMemoryRepository::<User>::with_unique(&["email", "username"]));
        let organizations =
            Arc::new(InMemoryRepository::<Organization>::with_unique(&["domain"]));
        let deny_list = Arc::new(InMemoryDenyList::new());

        let mut stores = Stores::in_memory();
        stores.users = users.clone();
        stores.organizations = organizations.clone();

        let state = AppState::new(
            config,
            stores,
            Some(deny_list.clone() as Arc<dyn TokenDenyList>),
        );
        let router = build_router(state.clone())
            .await
            .expect("Failed to build router");

        Self {
            router,
            state,
            users,
            organizations,
            deny_list,
        }
    }

    /// Store an active identity directly, bypassing registration.
    pub async fn seed_user(
        &self,
        role: Role,
        permissions: &[Permission],
        organization_id: Option<&str>,
    ) -> User {
        let name = format!("user_{}", &Uuid::new_v4().simple().to_string()[..12]);
        let hash = hash_password(&Password::new(TEST_PASSWORD.to_string()))
            .expect("Failed to hash password");
        let mut user = User::new(
            name.clone(),
            format!("{}@example.com", name),
            hash.into_string(),
            role,
            permissions.iter().copied().collect::<PermissionSet>(),
        );
        user.organization_id = organization_id.map(str::to_string);
        self.state
            .stores
            .users
            .insert(&user)
            .await
            .expect("Failed to seed user");
        user
    }

    pub fn access_token(&self, user: &User) -> String {
        self.state
            .tokens
            .issue_access(&user.id, user.role)
            .expect("Failed to issue access token")
    }

    pub fn refresh_token(&self, user: &User) -> String {
        self.state
            .tokens
            .issue_refresh(&user.id)
            .expect("Failed to issue refresh token")
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router call failed");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Request authenticated with a bearer header.
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(with_body(builder, body)).await
    }

    /// Request carrying a raw `Cookie` header.
    pub async fn call_with_cookies(
        &self,
        method: Method,
        uri: &str,
        cookies: &str,
        body: Option<Value>,
    ) -> TestResponse {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::COOKIE, cookies);
        self.send(with_body(builder, body)).await
    }
}

fn with_body(builder: axum::http::request::Builder, body: Option<Value>) -> Request<Body> {
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("Failed to build request"),
        None => builder.body(Body::empty()).expect("Failed to build request"),
    }
}
