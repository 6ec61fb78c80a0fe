//! HTTP-level tests for registration, login, refresh rotation and logout.

mod common;

use axum::http::StatusCode;
use breedid_db::repositories::{DirectoryRepo, UserRepo};
use common::{body_json, get_auth, post_json, register_and_login, TestApp, TEST_PASSWORD};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_register_creates_user_with_root_directory(pool: PgPool) {
    let app = TestApp::new(pool.clone());

    let response = post_json(
        app.router(),
        "/api/auth/register",
        serde_json::json!({ "username": "bella", "email": "Bella@Example.com", "password": TEST_PASSWORD }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Registration successful.");
    assert_eq!(json["data"]["email"], "bella@example.com");
    assert_eq!(json["data"]["role"], "user");
    assert!(json["data"].get("password_hash").is_none());

    let user = UserRepo::find_by_email(&pool, "bella@example.com")
        .await
        .unwrap()
        .unwrap();
    let root = DirectoryRepo::find_owned(&pool, user.directory_id.unwrap(), user.id)
        .await
        .unwrap();
    assert!(root.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_email_conflicts(pool: PgPool) {
    let app = TestApp::new(pool);
    let body = serde_json::json!({ "username": "a", "email": "dup@example.com", "password": TEST_PASSWORD });

    let first = post_json(app.router(), "/api/auth/register", body.clone()).await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = post_json(app.router(), "/api/auth/register", body).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let json = body_json(second).await;
    assert_eq!(json["errors"][0]["message"], "Email is already registered");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_wrong_password(pool: PgPool) {
    let app = TestApp::new(pool);
    register_and_login(&app, "pw@example.com").await;

    let response = post_json(
        app.router(),
        "/api/auth/login",
        serde_json::json!({ "email": "pw@example.com", "password": "not-the-password" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["errors"][0]["message"], "Invalid email or password");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_profile_reports_remaining_quota(pool: PgPool) {
    let app = TestApp::new(pool);
    let (user_id, access, _) = register_and_login(&app, "me@example.com").await;

    let response = get_auth(app.router(), "/api/users/me", &access).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["id"], user_id);
    assert_eq!(json["data"]["usage"]["photo_remaining"], 2);
    assert_eq!(json["data"]["usage"]["video_remaining"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_refresh_rotates_and_detects_reuse(pool: PgPool) {
    let app = TestApp::new(pool);
    let (_, _, refresh) = register_and_login(&app, "rot@example.com").await;

    // First rotation succeeds.
    let response = post_json(
        app.router(),
        "/api/auth/refresh-token",
        serde_json::json!({ "refresh_token": refresh }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let rotated = json["data"]["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(rotated, refresh);

    // Replaying the old token is rejected...
    let replay = post_json(
        app.router(),
        "/api/auth/refresh-token",
        serde_json::json!({ "refresh_token": refresh }),
    )
    .await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);

    // ...and revokes the rotated one as well.
    let after = post_json(
        app.router(),
        "/api/auth/refresh-token",
        serde_json::json!({ "refresh_token": rotated }),
    )
    .await;
    assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_logout_revokes_refresh_token(pool: PgPool) {
    let app = TestApp::new(pool);
    let (_, _, refresh) = register_and_login(&app, "bye@example.com").await;

    let response = post_json(
        app.router(),
        "/api/auth/logout",
        serde_json::json!({ "refresh_token": refresh }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json(
        app.router(),
        "/api/auth/refresh-token",
        serde_json::json!({ "refresh_token": refresh }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_admin_routes_require_admin_role(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let (user_id, access, _) = register_and_login(&app, "plain@example.com").await;

    let response = get_auth(app.router(), "/api/admin/users", &access).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    UserRepo::set_role(&pool, user_id, breedid_core::roles::Role::Admin)
        .await
        .unwrap();
    let response = post_json(
        app.router(),
        "/api/auth/login",
        serde_json::json!({ "email": "plain@example.com", "password": TEST_PASSWORD }),
    )
    .await;
    let admin_token = body_json(response).await["data"]["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = get_auth(app.router(), "/api/admin/users?page=1&limit=5", &admin_token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["pagination"]["total"], 1);
    assert_eq!(json["data"][0]["email"], "plain@example.com");
}
