mod common;

use atrium_service::{
    models::{Permission, Role},
    services::{Filter, Repository, SortBy},
};
use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::{TestApp, TEST_PASSWORD};
use serde_json::json;

async fn login(app: &TestApp, email: &str) -> common::TestResponse {
    app.call(
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": email, "password": TEST_PASSWORD})),
    )
    .await
}

#[tokio::test]
async fn registration_creates_admin_with_organization() {
    let app = TestApp::spawn().await;

    let res = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"username": "ada", "email": "Ada@Analytical.org", "password": "engine42"})),
        )
        .await;

    assert_eq!(res.status, StatusCode::CREATED);
    let user = &res.body["data"]["user"];
    assert_eq!(user["role"], "admin");
    assert_eq!(user["email"], "ada@analytical.org");
    assert!(user.get("password_hash").is_none());
    let permissions = user["permissions"].as_array().unwrap();
    assert!(permissions.contains(&json!("org:manage")));
    assert!(permissions.contains(&json!("crm:create")));
    assert!(permissions.contains(&json!("projects:delete")));
    assert!(!permissions.contains(&json!("projects:assign")));
    assert!(!permissions.contains(&json!("finance:read")));

    let org_id = user["organization_id"].as_str().unwrap();
    let org = app.organizations.find_by_id(org_id).await.unwrap().unwrap();
    assert_eq!(org.name, "ada's Organization");
    assert_eq!(org.domain.as_deref(), Some("analytical.org"));
}

#[tokio::test]
async fn duplicate_registration_is_409() {
    let app = TestApp::spawn().await;
    let body = json!({"username": "ada", "email": "ada@analytical.org", "password": "engine42"});

    let first = app
        .call(Method::POST, "/api/auth/register", None, Some(body))
        .await;
    assert_eq!(first.status, StatusCode::CREATED);

    let same_email = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"username": "lovelace", "email": "ada@analytical.org", "password": "engine42"})),
        )
        .await;
    assert_eq!(same_email.status, StatusCode::CONFLICT);
    assert_eq!(same_email.message(), "User already exists");

    let same_username = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"username": "ada", "email": "other@analytical.org", "password": "engine42"})),
        )
        .await;
    assert_eq!(same_username.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn second_registrant_on_a_domain_has_no_organization() {
    let app = TestApp::spawn().await;

    app.call(
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({"username": "ada", "email": "ada@analytical.org", "password": "engine42"})),
    )
    .await;
    let res = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"username": "charles", "email": "charles@analytical.org", "password": "engine42"})),
        )
        .await;

    assert_eq!(res.status, StatusCode::CREATED);
    assert!(res.body["data"]["user"]["organization_id"].is_null());
    let orgs = app
        .organizations
        .find(Filter::All, SortBy::newest_first())
        .await
        .unwrap();
    assert_eq!(orgs.len(), 1);
}

#[tokio::test]
async fn registration_validates_fields() {
    let app = TestApp::spawn().await;

    let res = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"username": "ab", "email": "not-an-email", "password": "123"})),
        )
        .await;

    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.body["success"], false);
    assert_eq!(res.body["errors"].as_array().unwrap().len(), 3);

    let res = app
        .call(Method::POST, "/api/auth/register", None, Some(json!({"username": 5})))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_sets_both_cookies_and_records_last_login() {
    let app = TestApp::spawn().await;
    let user = app.seed_user(Role::Viewer, &[], None).await;

    let res = login(&app, &user.email).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["user"]["id"], user.id.as_str());
    let token = res.body["data"]["token"].as_str().unwrap();
    assert_eq!(res.cookie("token").as_deref(), Some(token));
    assert!(res.cookie("refreshToken").is_some());

    let access = res.set_cookie_header("token").unwrap();
    assert!(access.contains("HttpOnly"));
    assert!(access.contains("SameSite=Strict"));
    assert!(access.contains("Max-Age=3600"));
    let refresh = res.set_cookie_header("refreshToken").unwrap();
    assert!(refresh.contains("Max-Age=604800"));

    let stored = app.users.find_by_id(&user.id).await.unwrap().unwrap();
    assert!(stored.last_login.is_some());
}

#[tokio::test]
async fn failed_logins_are_indistinguishable() {
    let app = TestApp::spawn().await;
    let user = app.seed_user(Role::Viewer, &[], None).await;
    let mut disabled = app.seed_user(Role::Viewer, &[], None).await;
    disabled.active = false;
    app.users.replace(&disabled).await.unwrap();

    let wrong_password = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": user.email, "password": "wrong-password"})),
        )
        .await;
    let unknown = login(&app, "nobody@example.com").await;
    let inactive = login(&app, &disabled.email).await;

    for res in [&wrong_password, &unknown, &inactive] {
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.message(), "Invalid credentials");
    }
    assert_eq!(wrong_password.body, unknown.body);
    assert_eq!(unknown.body, inactive.body);
}

#[tokio::test]
async fn expired_access_cookie_recovers_through_refresh() {
    let app = TestApp::spawn().await;
    let user = app
        .seed_user(Role::Viewer, &[Permission::CrmRead], Some("org-1"))
        .await;
    let expired = app
        .state
        .tokens
        .issue_access_at(&user.id, user.role, Utc::now() - Duration::hours(2))
        .unwrap();
    let refresh = app.refresh_token(&user);
    let cookies = format!("token={}; refreshToken={}", expired, refresh);

    let res = app
        .call_with_cookies(Method::GET, "/api/crm/leads", &cookies, None)
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.message(), "Token has expired");

    let res = app
        .call_with_cookies(Method::POST, "/api/auth/refresh-token", &cookies, None)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    let fresh = res.cookie("token").unwrap();
    assert_eq!(res.body["token"], fresh.as_str());
    assert!(res.cookie("refreshToken").is_none());

    let res = app
        .call_with_cookies(
            Method::GET,
            "/api/crm/leads",
            &format!("token={}; refreshToken={}", fresh, refresh),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn refresh_rejects_missing_and_wrong_kind_credentials() {
    let app = TestApp::spawn().await;
    let user = app.seed_user(Role::Viewer, &[], None).await;

    let res = app
        .call(Method::POST, "/api/auth/refresh-token", None, None)
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app
        .call_with_cookies(
            Method::POST,
            "/api/auth/refresh-token",
            &format!("refreshToken={}", app.access_token(&user)),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.message(), "Token is not valid");
}

#[tokio::test]
async fn logout_clears_cookies_and_always_succeeds() {
    let app = TestApp::spawn().await;
    let user = app.seed_user(Role::Viewer, &[], None).await;
    let cookies = format!(
        "token={}; refreshToken={}",
        app.access_token(&user),
        app.refresh_token(&user)
    );

    let res = app
        .call_with_cookies(Method::POST, "/api/auth/logout", &cookies, None)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.message(), "Logged out successfully");
    assert_eq!(res.cookie("token").as_deref(), Some(""));
    assert_eq!(res.cookie("refreshToken").as_deref(), Some(""));

    let res = app.call(Method::POST, "/api/auth/logout", None, None).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn without_revocation_logout_leaves_credentials_valid() {
    let app = TestApp::spawn().await;
    let user = app.seed_user(Role::Viewer, &[], None).await;
    let token = app.access_token(&user);

    app.call(Method::POST, "/api/auth/logout", Some(&token), None)
        .await;

    let res = app.call(Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn revoked_credentials_are_rejected_after_logout() {
    let app = TestApp::with_revocation().await;
    let user = app.seed_user(Role::Viewer, &[], None).await;

    let res = login(&app, &user.email).await;
    let access = res.cookie("token").unwrap();
    let refresh = res.cookie("refreshToken").unwrap();
    let cookies = format!("token={}; refreshToken={}", access, refresh);

    let res = app
        .call_with_cookies(Method::POST, "/api/auth/logout", &cookies, None)
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let res = app.call(Method::GET, "/api/auth/me", Some(&access), None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.message(), "Token has been revoked");

    let res = app
        .call_with_cookies(
            Method::POST,
            "/api/auth/refresh-token",
            &format!("refreshToken={}", refresh),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.message(), "Token has been revoked");

    let other = app.access_token(&user);
    let res = app.call(Method::GET, "/api/auth/me", Some(&other), None).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn deny_list_outage_is_500() {
    let app = TestApp::with_revocation().await;
    let user = app.seed_user(Role::Viewer, &[], None).await;
    let token = app.access_token(&user);

    app.deny_list.set_unavailable(true);
    let res = app.call(Method::GET, "/api/auth/me", Some(&token), None).await;

    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.message(), "Internal server error");

    let res = app.call(Method::POST, "/api/auth/logout", Some(&token), None).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn me_returns_identity_and_organization() {
    let app = TestApp::spawn().await;
    let res = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"username": "ada", "email": "ada@analytical.org", "password": "engine42"})),
        )
        .await;
    let org_id = res.body["data"]["user"]["organization_id"]
        .as_str()
        .unwrap()
        .to_string();

    let res = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "ada@analytical.org", "password": "engine42"})),
        )
        .await;
    let token = res.body["data"]["token"].as_str().unwrap().to_string();

    let res = app.call(Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["user"]["username"], "ada");
    assert_eq!(res.body["data"]["organization"]["id"], org_id.as_str());

    app.organizations.set_unavailable(true);
    let res = app.call(Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body["data"]["organization"].is_null());
}
