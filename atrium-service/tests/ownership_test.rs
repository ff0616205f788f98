mod common;

use atrium_service::{
    models::{Permission, Role, SecurityEventType, User},
    services::{Filter, Repository, SortBy},
};
use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::{json, Value};
use std::time::Duration;

const POST_PERMISSIONS: &[Permission] = &[
    Permission::PostsCreate,
    Permission::PostsRead,
    Permission::PostsUpdate,
    Permission::PostsDelete,
];

const CRM_PERMISSIONS: &[Permission] = &[
    Permission::CrmCreate,
    Permission::CrmRead,
    Permission::CrmUpdate,
    Permission::CrmDelete,
];

async fn create_post(app: &TestApp, author: &User, status: &str, visibility: &str) -> Value {
    let res = app
        .call(
            Method::POST,
            "/api/posts",
            Some(&app.access_token(author)),
            Some(json!({
                "title": format!("{} {} post", status, visibility),
                "content": "Body",
                "status": status,
                "visibility": visibility,
            })),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    res.body["data"].clone()
}

async fn create_lead(app: &TestApp, owner: &User, name: &str) -> Value {
    let res = app
        .call(
            Method::POST,
            "/api/crm/leads",
            Some(&app.access_token(owner)),
            Some(json!({"name": name, "company": "Acme", "email": "buyer@acme.test"})),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    res.body["data"].clone()
}

#[tokio::test]
async fn private_post_is_hidden_from_other_readers() {
    let app = TestApp::spawn().await;
    let author = app.seed_user(Role::Employee, POST_PERMISSIONS, None).await;
    let reader = app.seed_user(Role::Employee, POST_PERMISSIONS, None).await;
    let admin = app.seed_user(Role::Admin, &[], None).await;

    let post = create_post(&app, &author, "published", "private").await;
    let uri = format!("/api/posts/{}", post["id"].as_str().unwrap());

    let res = app
        .call(Method::GET, &uri, Some(&app.access_token(&reader)), None)
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.body["success"], false);
    assert_eq!(res.message(), "Access denied");

    let res = app
        .call(Method::GET, &uri, Some(&app.access_token(&admin)), None)
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let res = app
        .call(Method::GET, &uri, Some(&app.access_token(&author)), None)
        .await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn owner_may_update_and_delete_but_others_may_not() {
    let app = TestApp::spawn().await;
    let author = app.seed_user(Role::Employee, POST_PERMISSIONS, None).await;
    let other = app.seed_user(Role::Manager, POST_PERMISSIONS, None).await;

    let post = create_post(&app, &author, "published", "public").await;
    let uri = format!("/api/posts/{}", post["id"].as_str().unwrap());
    let other_token = app.access_token(&other);
    let author_token = app.access_token(&author);

    let res = app.call(Method::GET, &uri, Some(&other_token), None).await;
    assert_eq!(res.status, StatusCode::OK);

    let res = app
        .call(Method::PUT, &uri, Some(&other_token), Some(json!({"title": "Hijacked"})))
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    let res = app.call(Method::DELETE, &uri, Some(&other_token), None).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app
        .call(
            Method::PUT,
            &uri,
            Some(&author_token),
            Some(json!({"title": "  Edited title ", "content": "\n New body \t"})),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["title"], "Edited title");
    assert_eq!(res.body["data"]["content"], "New body");

    let res = app.call(Method::DELETE, &uri, Some(&author_token), None).await;
    assert_eq!(res.status, StatusCode::OK);
    let res = app.call(Method::GET, &uri, Some(&author_token), None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_is_narrowed_to_own_or_published_public() {
    let app = TestApp::spawn().await;
    let author = app.seed_user(Role::Employee, POST_PERMISSIONS, None).await;
    let reader = app.seed_user(Role::Viewer, POST_PERMISSIONS, None).await;
    let admin = app.seed_user(Role::Admin, &[], None).await;

    create_post(&app, &author, "draft", "public").await;
    create_post(&app, &author, "published", "private").await;
    let shared = create_post(&app, &author, "published", "public").await;
    let own = create_post(&app, &reader, "draft", "private").await;

    let res = app
        .call(Method::GET, "/api/posts", Some(&app.access_token(&reader)), None)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["count"], 2);
    let listed = res.body["data"].as_array().unwrap();
    for post in listed {
        let owned = post["author_id"] == reader.id.as_str();
        let visible = post["status"] == "published" && post["visibility"] == "public";
        assert!(owned || visible, "leaked post {}", post["id"]);
    }
    let ids: Vec<&str> = listed.iter().filter_map(|p| p["id"].as_str()).collect();
    assert!(ids.contains(&shared["id"].as_str().unwrap()));
    assert!(ids.contains(&own["id"].as_str().unwrap()));

    let res = app
        .call(Method::GET, "/api/posts", Some(&app.access_token(&admin)), None)
        .await;
    assert_eq!(res.body["count"], 4);
}

#[tokio::test]
async fn ownership_denials_are_audited() {
    let app = TestApp::spawn().await;
    let author = app.seed_user(Role::Employee, POST_PERMISSIONS, Some("org-1")).await;
    let reader = app.seed_user(Role::Employee, POST_PERMISSIONS, Some("org-1")).await;

    let post = create_post(&app, &author, "draft", "private").await;
    let res = app
        .call(
            Method::GET,
            &format!("/api/posts/{}", post["id"].as_str().unwrap()),
            Some(&app.access_token(&reader)),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let mut logs = Vec::new();
    for _ in 0..50 {
        logs = app
            .state
            .stores
            .audit_logs
            .find(Filter::All, SortBy::newest_first())
            .await
            .unwrap();
        if !logs.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].event_type, SecurityEventType::OwnershipDenied);
    assert_eq!(logs[0].user_id, reader.id);
    assert_eq!(logs[0].permission.as_deref(), Some("posts:read"));
}

#[tokio::test]
async fn leads_in_other_organizations_are_not_found() {
    let app = TestApp::spawn().await;
    let owner = app.seed_user(Role::Employee, CRM_PERMISSIONS, Some("org-1")).await;
    let outsider = app.seed_user(Role::Employee, CRM_PERMISSIONS, Some("org-2")).await;

    let lead = create_lead(&app, &owner, "Grace").await;
    assert_eq!(lead["assigned_to"], owner.id.as_str());
    assert_eq!(lead["organization_id"], "org-1");
    let uri = format!("/api/crm/leads/{}", lead["id"].as_str().unwrap());
    let outsider_token = app.access_token(&outsider);

    for method in [Method::GET, Method::DELETE] {
        let res = app.call(method, &uri, Some(&outsider_token), None).await;
        assert_eq!(res.status, StatusCode::NOT_FOUND);
        assert_eq!(res.message(), "Lead not found");
    }

    let res = app
        .call(Method::GET, "/api/crm/leads", Some(&outsider_token), None)
        .await;
    assert_eq!(res.body["count"], 0);
}

#[tokio::test]
async fn colleagues_may_work_on_each_others_leads() {
    let app = TestApp::spawn().await;
    let owner = app.seed_user(Role::Employee, CRM_PERMISSIONS, Some("org-1")).await;
    let colleague = app.seed_user(Role::Employee, CRM_PERMISSIONS, Some("org-1")).await;

    let lead = create_lead(&app, &owner, "Grace").await;
    let uri = format!("/api/crm/leads/{}", lead["id"].as_str().unwrap());
    let token = app.access_token(&colleague);

    let res = app.call(Method::GET, "/api/crm/leads", Some(&token), None).await;
    assert_eq!(res.body["count"], 1);

    let res = app
        .call(Method::PUT, &uri, Some(&token), Some(json!({"status": "qualified"})))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["status"], "qualified");

    let res = app.call(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn actor_without_organization_sees_only_its_own_leads() {
    let app = TestApp::spawn().await;
    let loner = app.seed_user(Role::Employee, CRM_PERMISSIONS, None).await;
    let other_loner = app.seed_user(Role::Employee, CRM_PERMISSIONS, None).await;

    let mine = create_lead(&app, &loner, "Mine").await;
    let theirs = create_lead(&app, &other_loner, "Theirs").await;

    let token = app.access_token(&loner);
    let res = app.call(Method::GET, "/api/crm/leads", Some(&token), None).await;
    assert_eq!(res.body["count"], 1);
    assert_eq!(res.body["data"][0]["id"], mine["id"]);

    let res = app
        .call(
            Method::GET,
            &format!("/api/crm/leads/{}", theirs["id"].as_str().unwrap()),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}
