mod common;

use axum::http::{Method, StatusCode, header};
use chrono::Utc;
use common::{ADMIN_EMAIL, ADMIN_PASSWORD, message_of, read_json, spawn_app, spawn_app_with};
use raynk_site::{
    AppConfig, MockMediaHost,
    auth::{Identity, SESSION_COOKIE, SESSION_TTL_SECS},
    config::{AuthMode, Env},
    credentials,
    models::Course,
    repository::Collection,
};
use serde_json::json;

fn set_cookie(response: &axum::http::Response<axum::body::Body>) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("Set-Cookie header")
        .to_str()
        .unwrap()
        .to_string()
}

/// Turns a `Set-Cookie` value into the matching `Cookie` request value.
fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap().to_string()
}

// --- Login / logout ---

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let app = spawn_app();

    let response = app
        .json(
            Method::POST,
            "/api/admin/login",
            json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookie(&response);
    assert!(cookie.starts_with(&format!("{SESSION_COOKIE}=")));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains(&format!("Max-Age={SESSION_TTL_SECS}")));
    assert!(!cookie.contains("Secure"), "local sessions are not Secure-only");

    assert_eq!(message_of(response).await, "Login successful");
}

#[tokio::test]
async fn test_login_cookie_opens_the_admin_api() {
    let app = spawn_app();

    let login = app
        .json(
            Method::POST,
            "/api/admin/login",
            json!({ "email": "  ADMIN@raynklabs.com ", "password": ADMIN_PASSWORD }),
            None,
        )
        .await;
    assert_eq!(login.status(), StatusCode::OK);
    let cookie = cookie_pair(&set_cookie(&login));

    let me = app.get("/api/admin/me", Some(&cookie)).await;
    assert_eq!(me.status(), StatusCode::OK);
    let body = read_json(me).await;
    assert_eq!(body["email"], ADMIN_EMAIL);
    assert_eq!(body["role"], "admin");
    assert!(body["adminId"].is_null());
}

#[tokio::test]
async fn test_login_rejects_bad_credentials_uniformly() {
    let app = spawn_app();

    let wrong_password = app
        .json(
            Method::POST,
            "/api/admin/login",
            json!({ "email": ADMIN_EMAIL, "password": "nope" }),
            None,
        )
        .await;
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert!(wrong_password.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(message_of(wrong_password).await, "Invalid email or password");

    let unknown_email = app
        .json(
            Method::POST,
            "/api/admin/login",
            json!({ "email": "someone@raynklabs.com", "password": ADMIN_PASSWORD }),
            None,
        )
        .await;
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message_of(unknown_email).await, "Invalid email or password");
}

#[tokio::test]
async fn test_login_requires_both_fields() {
    let app = spawn_app();

    let response = app
        .json(Method::POST, "/api/admin/login", json!({ "email": ADMIN_EMAIL }), None)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(message_of(response).await, "Email and password are required");
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = spawn_app();

    let response = app
        .send(common::empty_request(Method::POST, "/api/admin/logout", None))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookie(&response);
    assert!(cookie.starts_with(&format!("{SESSION_COOKIE}=;")));
    assert!(cookie.contains("Max-Age=0"));
    assert_eq!(read_json(response).await, json!({ "success": true }));
}

#[tokio::test]
async fn test_production_cookies_are_secure() {
    let config = AppConfig {
        env: Env::Production,
        ..AppConfig::default()
    };
    let app = spawn_app_with(config, MockMediaHost::new());

    let response = app
        .json(
            Method::POST,
            "/api/admin/login",
            json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response).ends_with("; Secure"));
}

// --- The admin gate ---

#[tokio::test]
async fn test_admin_api_without_cookie_is_unauthorized() {
    let app = spawn_app();

    let response = app.get("/api/admin/courses", None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message_of(response).await, "Unauthorized");
}

#[tokio::test]
async fn test_admin_api_with_tampered_token_is_rejected() {
    let app = spawn_app();
    let cookie = format!("{}x", app.admin_cookie());

    let response = app.get("/api/admin/courses", Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message_of(response).await, "Invalid token");
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let app = spawn_app();
    let issued = Utc::now().timestamp() - SESSION_TTL_SECS - 5;
    let token = app
        .tokens
        .sign_at(
            &Identity {
                admin_id: None,
                email: ADMIN_EMAIL.to_string(),
                role: "admin".to_string(),
            },
            issued,
        )
        .unwrap();
    let cookie = format!("{SESSION_COOKIE}={token}");

    let response = app.get("/api/admin/me", Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message_of(response).await, "Invalid token");
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let app = spawn_app();
    let foreign = spawn_app_with(
        AppConfig {
            jwt_secret: "another-secret-entirely".to_string(),
            ..AppConfig::default()
        },
        MockMediaHost::new(),
    );

    let response = app.get("/api/admin/me", Some(&foreign.admin_cookie())).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_rejected_mutation_has_no_side_effect() {
    let app = spawn_app();

    let response = app
        .json(
            Method::POST,
            "/api/admin/courses",
            json!({ "title": "Rust", "description": "Systems" }),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .json(
            Method::POST,
            "/api/courses",
            json!({ "title": "Rust", "description": "Systems" }),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let stored = Collection::<Course>::new(app.store_state()).count().await.unwrap();
    assert_eq!(stored, 0);
}

#[tokio::test]
async fn test_public_mutation_paths_accept_a_session() {
    let app = spawn_app();
    let cookie = app.admin_cookie();

    let response = app
        .json(
            Method::POST,
            "/api/courses",
            json!({ "title": "Rust", "description": "Systems" }),
            Some(&cookie),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_dashboard_pages_redirect_to_login() {
    let app = spawn_app();

    for path in ["/admin/dashboard", "/admin/dashboard/courses"] {
        let response = app.get(path, None).await;
        assert!(response.status().is_redirection(), "{path} should redirect");
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/admin");
    }
}

#[tokio::test]
async fn test_dashboard_pages_pass_with_session() {
    let app = spawn_app();
    let cookie = app.admin_cookie();

    // No frontend is configured, so an authorized page request falls through to 404.
    let response = app.get("/admin/dashboard", Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_login_page_is_not_gated() {
    let app = spawn_app();

    let response = app.get("/admin", None).await;

    assert!(!response.status().is_redirection());
}

// --- Database mode ---

fn database_config() -> AppConfig {
    AppConfig {
        auth_mode: AuthMode::Database,
        admin_email: Some("Owner@RaynkLabs.com".to_string()),
        admin_password: Some("owner-password".to_string()),
        ..AppConfig::default()
    }
}

#[tokio::test]
async fn test_seed_admin_runs_once() {
    let app = spawn_app_with(database_config(), MockMediaHost::new());

    assert!(credentials::seed_admin(&app.config, app.store_state()).await.unwrap());
    assert!(!credentials::seed_admin(&app.config, app.store_state()).await.unwrap());
}

#[tokio::test]
async fn test_seed_admin_is_a_no_op_in_static_mode() {
    let app = spawn_app();

    assert!(!credentials::seed_admin(&app.config, app.store_state()).await.unwrap());
}

#[tokio::test]
async fn test_database_login_issues_admin_id() {
    let app = spawn_app_with(database_config(), MockMediaHost::new());
    credentials::seed_admin(&app.config, app.store_state()).await.unwrap();

    let login = app
        .json(
            Method::POST,
            "/api/admin/login",
            json!({ "email": "owner@raynklabs.com", "password": "owner-password" }),
            None,
        )
        .await;
    assert_eq!(login.status(), StatusCode::OK);
    let cookie = cookie_pair(&set_cookie(&login));

    let me = read_json(app.get("/api/admin/me", Some(&cookie)).await).await;
    assert_eq!(me["email"], "owner@raynklabs.com");
    assert!(me["adminId"].is_string());

    let wrong = app
        .json(
            Method::POST,
            "/api/admin/login",
            json!({ "email": "owner@raynklabs.com", "password": "admin-password" }),
            None,
        )
        .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
}

// --- Tasks ---

#[tokio::test]
async fn test_personal_tasks_are_scoped_to_the_session() {
    let app = spawn_app();
    let alice = app.cookie_for("alice@raynklabs.com");
    let bob = app.cookie_for("bob@raynklabs.com");

    let created = app
        .json(
            Method::POST,
            "/api/admin/personal/tasks",
            json!({ "title": "Review projects" }),
            Some(&alice),
        )
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let created = read_json(created).await;
    assert_eq!(created["owner"], "alice@raynklabs.com");

    let mine = read_json(app.get("/api/admin/personal/tasks", Some(&alice)).await).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let theirs = read_json(app.get("/api/admin/personal/tasks", Some(&bob)).await).await;
    assert!(theirs.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_common_tasks_are_shared_and_need_a_title() {
    let app = spawn_app();
    let alice = app.cookie_for("alice@raynklabs.com");
    let bob = app.cookie_for("bob@raynklabs.com");

    let blank = app
        .json(Method::POST, "/api/admin/common-tasks", json!({ "title": "  " }), Some(&alice))
        .await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
    assert_eq!(message_of(blank).await, "Title is required");

    let created = app
        .json(
            Method::POST,
            "/api/admin/common-tasks",
            json!({ "title": "Update hero copy" }),
            Some(&alice),
        )
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);

    let seen_by_bob = read_json(app.get("/api/admin/common-tasks", Some(&bob)).await).await;
    assert_eq!(seen_by_bob[0]["title"], "Update hero copy");
}
