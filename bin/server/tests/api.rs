//! HTTP behavior of the API router against the in-memory store.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use chrono::{Duration, Utc};
use instar_platform_access::{Role, TokenConfig, TokenService, User, hash_password};
use instar_server::app::router;
use instar_server::auth::AppState;
use instar_server::db::{MemoryUserStore, UserStore};
use serde_json::{Value, json};
use tower::ServiceExt;

const SECRET: &str = "api-integration-test-signing-secret";

struct Harness {
    app: Router,
    store: Arc<MemoryUserStore>,
    tokens: TokenService,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(MemoryUserStore::new());
        let tokens = TokenService::new(TokenConfig::new(SECRET)).expect("token service");
        let state = Arc::new(AppState::new(store.clone(), tokens.clone()));
        Self {
            app: router(state),
            store,
            tokens,
        }
    }

    async fn add_user(&self, email: &str, password: &str, role: Role) -> User {
        let mut user = User::new(
            "Test User".to_string(),
            email.to_string(),
            "555-0100".to_string(),
            hash_password(password).expect("hash"),
        );
        user.set_role(role);
        self.store.create(&user).await.expect("create user");
        user
    }

    fn access_token(&self, user: &User) -> String {
        self.tokens
            .issue_access(user.id(), user.role(), Utc::now())
            .expect("access token")
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }
}

fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request")
}

#[tokio::test]
async fn health_is_ok() {
    let harness = Harness::new();
    let (status, body) = harness.send(get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".to_string()));
}

#[tokio::test]
async fn login_issues_token_pair() {
    let harness = Harness::new();
    let user = harness.add_user("ana@example.com", "s3cret", Role::Admin).await;

    let (status, body) = harness
        .send(json_request(
            "POST",
            "/api/login",
            json!({ "email": "Ana@Example.com", "password": "s3cret" }),
            None,
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");
    assert_eq!(body["userId"], user.id().to_string());

    let access = body["accessToken"].as_str().expect("access token");
    let claims = harness.tokens.verify_access(access, Utc::now()).expect("valid");
    assert_eq!(claims.sub, user.id());

    let refresh = body["refreshToken"].as_str().expect("refresh token");
    assert!(harness.tokens.verify_refresh(refresh, Utc::now()).is_ok());
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let harness = Harness::new();
    harness.add_user("ana@example.com", "s3cret", Role::User).await;

    let (wrong_password, body) = harness
        .send(json_request(
            "POST",
            "/api/login",
            json!({ "email": "ana@example.com", "password": "nope" }),
            None,
        ))
        .await;
    assert_eq!(wrong_password, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (unknown, _) = harness
        .send(json_request(
            "POST",
            "/api/login",
            json!({ "email": "ghost@example.com", "password": "s3cret" }),
            None,
        ))
        .await;
    assert_eq!(unknown, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn banned_user_cannot_log_in() {
    let harness = Harness::new();
    let mut user = harness.add_user("ban@example.com", "s3cret", Role::User).await;
    user.set_banned(true);
    harness.store.update(&user).await.expect("update");

    let (status, body) = harness
        .send(json_request(
            "POST",
            "/api/login",
            json!({ "email": "ban@example.com", "password": "s3cret" }),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "account is banned");
}

#[tokio::test]
async fn refresh_returns_new_access_token() {
    let harness = Harness::new();
    let user = harness.add_user("r@example.com", "pw", Role::Supplier).await;
    let pair = harness
        .tokens
        .issue_pair(user.id(), user.role(), Utc::now())
        .expect("pair");

    let (status, body) = harness
        .send(json_request(
            "POST",
            "/api/refreshtoken",
            json!({ "refreshToken": pair.refresh_token }),
            None,
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    let access = body["accessToken"].as_str().expect("access token");
    let claims = harness.tokens.verify_access(access, Utc::now()).expect("valid");
    assert_eq!(claims.sub, user.id());
    assert_eq!(claims.role, Role::Supplier);
}

#[tokio::test]
async fn refresh_requires_a_token() {
    let harness = Harness::new();

    let (missing, _) = harness
        .send(json_request("POST", "/api/refreshtoken", json!({}), None))
        .await;
    assert_eq!(missing, StatusCode::BAD_REQUEST);

    let (empty, _) = harness
        .send(json_request(
            "POST",
            "/api/refreshtoken",
            json!({ "refreshToken": "" }),
            None,
        ))
        .await;
    assert_eq!(empty, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn refresh_rejects_unreadable_bodies() {
    let harness = Harness::new();

    let untyped = Request::builder()
        .method("POST")
        .uri("/api/refreshtoken")
        .body(Body::from(r#"{"refreshToken":"abc"}"#))
        .expect("request");
    let (status, body) = harness.send(untyped).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = harness
        .send(json_request(
            "POST",
            "/api/refreshtoken",
            json!({ "refreshToken": 42 }),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn refresh_rejects_invalid_tokens() {
    let harness = Harness::new();
    let user = harness.add_user("r@example.com", "pw", Role::User).await;

    let (garbage, _) = harness
        .send(json_request(
            "POST",
            "/api/refreshtoken",
            json!({ "refreshToken": "not-a-token" }),
            None,
        ))
        .await;
    assert_eq!(garbage, StatusCode::UNAUTHORIZED);

    // An access token is not a refresh token.
    let access = harness.access_token(&user);
    let (wrong_kind, _) = harness
        .send(json_request(
            "POST",
            "/api/refreshtoken",
            json!({ "refreshToken": access }),
            None,
        ))
        .await;
    assert_eq!(wrong_kind, StatusCode::UNAUTHORIZED);

    let stale = harness
        .tokens
        .issue_pair(user.id(), user.role(), Utc::now() - Duration::days(8))
        .expect("pair");
    let (expired, _) = harness
        .send(json_request(
            "POST",
            "/api/refreshtoken",
            json!({ "refreshToken": stale.refresh_token }),
            None,
        ))
        .await;
    assert_eq!(expired, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_refused_after_ban() {
    let harness = Harness::new();
    let mut user = harness.add_user("b@example.com", "pw", Role::User).await;
    let pair = harness
        .tokens
        .issue_pair(user.id(), user.role(), Utc::now())
        .expect("pair");

    user.set_banned(true);
    harness.store.update(&user).await.expect("update");

    let (status, _) = harness
        .send(json_request(
            "POST",
            "/api/refreshtoken",
            json!({ "refreshToken": pair.refresh_token }),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_keeps_role_until_next_login() {
    let harness = Harness::new();
    let mut user = harness.add_user("demoted@example.com", "pw", Role::Admin).await;
    let pair = harness
        .tokens
        .issue_pair(user.id(), user.role(), Utc::now())
        .expect("pair");

    user.set_role(Role::User);
    harness.store.update(&user).await.expect("update");

    let (status, body) = harness
        .send(json_request(
            "POST",
            "/api/refreshtoken",
            json!({ "refreshToken": pair.refresh_token }),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let refreshed = body["accessToken"].as_str().expect("access token");
    let claims = harness.tokens.verify_access(refreshed, Utc::now()).expect("valid");
    assert_eq!(claims.role, Role::Admin);

    let (status, _) = harness.send(get("/api/users", Some(refreshed))).await;
    assert_eq!(status, StatusCode::OK);

    // A fresh login picks up the stored role.
    let (status, body) = harness
        .send(json_request(
            "POST",
            "/api/login",
            json!({ "email": "demoted@example.com", "password": "pw" }),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "user");
    let access = body["accessToken"].as_str().expect("access token");
    let (status, _) = harness.send(get("/api/users", Some(access))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn register_creates_plain_user() {
    let harness = Harness::new();

    let (status, body) = harness
        .send(json_request(
            "POST",
            "/api/register",
            json!({
                "displayName": "Nadia",
                "email": "Nadia@Example.com",
                "phone": "555-0199",
                "password": "pw"
            }),
            None,
        ))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "user");
    assert_eq!(body["email"], "nadia@example.com");
    assert_eq!(body["banned"], false);
    assert!(body.get("passwordHash").is_none());

    let (duplicate, _) = harness
        .send(json_request(
            "POST",
            "/api/register",
            json!({ "displayName": "Nadia", "email": "nadia@example.com", "password": "pw" }),
            None,
        ))
        .await;
    assert_eq!(duplicate, StatusCode::CONFLICT);
}

#[tokio::test]
async fn register_validates_fields() {
    let harness = Harness::new();
    let (status, _) = harness
        .send(json_request(
            "POST",
            "/api/register",
            json!({ "displayName": "X", "email": "not-an-email", "password": "pw" }),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_user_requires_authentication() {
    let harness = Harness::new();
    let user = harness.add_user("u@example.com", "pw", Role::User).await;
    let uri = format!("/api/users/{}", user.id());

    let (anonymous, _) = harness.send(get(&uri, None)).await;
    assert_eq!(anonymous, StatusCode::UNAUTHORIZED);

    let (bad_token, _) = harness.send(get(&uri, Some("garbage"))).await;
    assert_eq!(bad_token, StatusCode::UNAUTHORIZED);

    let token = harness.access_token(&user);
    let (status, body) = harness.send(get(&uri, Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user.id().to_string());
    assert_eq!(body["displayName"], "Test User");
}

#[tokio::test]
async fn expired_access_token_is_rejected() {
    let harness = Harness::new();
    let user = harness.add_user("u@example.com", "pw", Role::User).await;
    let token = harness
        .tokens
        .issue_access(user.id(), user.role(), Utc::now() - Duration::minutes(16))
        .expect("token");

    let (status, body) = harness
        .send(get(&format!("/api/users/{}", user.id()), Some(&token)))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "access token has expired");
}

#[tokio::test]
async fn get_user_edge_cases() {
    let harness = Harness::new();
    let user = harness.add_user("u@example.com", "pw", Role::User).await;
    let token = harness.access_token(&user);

    let (malformed, _) = harness.send(get("/api/users/not-an-id", Some(&token))).await;
    assert_eq!(malformed, StatusCode::BAD_REQUEST);

    let missing = instar_core::UserId::new();
    let (not_found, _) = harness
        .send(get(&format!("/api/users/{missing}"), Some(&token)))
        .await;
    assert_eq!(not_found, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_routes_reject_non_admins() {
    let harness = Harness::new();
    let user = harness.add_user("u@example.com", "pw", Role::User).await;
    let token = harness.access_token(&user);

    let (list, _) = harness.send(get("/api/users", Some(&token))).await;
    assert_eq!(list, StatusCode::FORBIDDEN);

    let (role, body) = harness
        .send(json_request(
            "PATCH",
            &format!("/api/users/{}/role", user.id()),
            json!({ "role": "admin" }),
            Some(&token),
        ))
        .await;
    assert_eq!(role, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "admin access required");

    let (anonymous, _) = harness.send(get("/api/users", None)).await;
    assert_eq!(anonymous, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_changes_role() {
    let harness = Harness::new();
    let admin = harness.add_user("admin@example.com", "pw", Role::Admin).await;
    let user = harness.add_user("u@example.com", "pw", Role::User).await;
    let token = harness.access_token(&admin);

    let (status, body) = harness
        .send(json_request(
            "PATCH",
            &format!("/api/users/{}/role", user.id()),
            json!({ "role": "supplier" }),
            Some(&token),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "supplier");
    let stored = harness.store.find_by_id(user.id()).await.expect("find").expect("present");
    assert_eq!(stored.role(), Role::Supplier);

    let (unknown_role, _) = harness
        .send(json_request(
            "PATCH",
            &format!("/api/users/{}/role", user.id()),
            json!({ "role": "owner" }),
            Some(&token),
        ))
        .await;
    assert!(unknown_role.is_client_error());
}

#[tokio::test]
async fn admin_bans_with_default_flag() {
    let harness = Harness::new();
    let admin = harness.add_user("admin@example.com", "pw", Role::Admin).await;
    let user = harness.add_user("u@example.com", "pw", Role::User).await;
    let token = harness.access_token(&admin);
    let uri = format!("/api/users/{}/ban", user.id());

    let (status, body) = harness
        .send(json_request("PATCH", &uri, json!({}), Some(&token)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["banned"], true);

    let (status, body) = harness
        .send(json_request("PATCH", &uri, json!({ "banned": false }), Some(&token)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["banned"], false);
}

#[tokio::test]
async fn admin_lists_and_deletes_users() {
    let harness = Harness::new();
    let admin = harness.add_user("admin@example.com", "pw", Role::Admin).await;
    let user = harness.add_user("u@example.com", "pw", Role::User).await;
    let token = harness.access_token(&admin);

    let (status, body) = harness.send(get("/api/users", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(2));

    let delete = |id: String| {
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/users/{id}"))
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .expect("request")
    };

    let (deleted, _) = harness.send(delete(user.id().to_string())).await;
    assert_eq!(deleted, StatusCode::NO_CONTENT);

    let (again, _) = harness.send(delete(user.id().to_string())).await;
    assert_eq!(again, StatusCode::NOT_FOUND);
}
