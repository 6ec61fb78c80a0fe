//! Media library and directory tree over HTTP.

mod common;

use axum::http::StatusCode;
use common::{
    body_bytes, body_json, count_files, delete_auth, get, get_auth, multipart_body,
    post_json_auth, post_multipart, register_and_login, Caller, FilePart, TestApp,
};
use sqlx::PgPool;

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-png";

fn png_part(name: &str) -> FilePart<'_> {
    FilePart::file(name, "image/png", PNG)
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_upload_single_exposes_url_not_path(pool: PgPool) {
    let app = TestApp::new(pool);
    let (user_id, access, _) = register_and_login(&app, "lib@example.com").await;

    let body = multipart_body(&[png_part("buddy.png")], &[("name", "Buddy"), ("description", "At the park")]);
    let response = post_multipart(app.router(), "/api/medias/upload/single", Caller::Bearer(&access), body).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["name"], "Buddy");
    assert_eq!(data["description"], "At the park");
    assert_eq!(data["media_type"], "image/png");
    assert_eq!(data["creator_id"], user_id);
    assert!(data.get("media_path").is_none());

    let url = data["media_url"].as_str().unwrap();
    assert!(url.starts_with("http://localhost:3000/uploads/images/"), "{url}");
    assert!(url.ends_with(".png"));

    // The URL path is served back as the stored bytes.
    let path = url.trim_start_matches("http://localhost:3000");
    let response = get(app.router(), path).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, PNG);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_upload_single_requires_name(pool: PgPool) {
    let app = TestApp::new(pool);
    let (_, access, _) = register_and_login(&app, "noname@example.com").await;

    let body = multipart_body(&[png_part("a.png")], &[]);
    let response = post_multipart(app.router(), "/api/medias/upload/single", Caller::Bearer(&access), body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(count_files(app.uploads.path()), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_upload_url_returns_only_url(pool: PgPool) {
    let app = TestApp::new(pool);
    let (_, access, _) = register_and_login(&app, "url@example.com").await;

    let body = multipart_body(&[png_part("x.png")], &[]);
    let response = post_multipart(app.router(), "/api/medias/upload-url", Caller::Bearer(&access), body).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert!(json["media_url"]
        .as_str()
        .unwrap()
        .starts_with("http://localhost:3000/uploads/images/"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_upload_multiple_with_names(pool: PgPool) {
    let app = TestApp::new(pool);
    let (_, access, _) = register_and_login(&app, "batch@example.com").await;

    let files = [
        FilePart { field: "files", ..png_part("1.png") },
        FilePart { field: "files", ..png_part("2.png") },
    ];
    let body = multipart_body(&files, &[("names", "First"), ("names", "Second")]);
    let response = post_multipart(app.router(), "/api/medias/upload/multiple", Caller::Bearer(&access), body).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let names: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["First", "Second"]);
    assert_eq!(count_files(app.uploads.path()), 2);

    // A names list that does not match the file count is rejected up front.
    let body = multipart_body(&files, &[("names", "Only one")]);
    let response = post_multipart(app.router(), "/api/medias/upload/multiple", Caller::Bearer(&access), body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(count_files(app.uploads.path()), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_upload_multiple_rolls_back_on_row_failure(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let (_, access, _) = register_and_login(&app, "rollback@example.com").await;

    sqlx::raw_sql(
        "CREATE FUNCTION reject_named_boom() RETURNS TRIGGER AS $$
         BEGIN
             IF NEW.name = 'boom' THEN RAISE EXCEPTION 'rejected'; END IF;
             RETURN NEW;
         END;
         $$ LANGUAGE plpgsql;
         CREATE TRIGGER trg_reject_boom BEFORE INSERT ON medias
             FOR EACH ROW EXECUTE FUNCTION reject_named_boom();",
    )
    .execute(&pool)
    .await
    .unwrap();

    let files = [
        FilePart { field: "files", ..png_part("1.png") },
        FilePart { field: "files", ..png_part("2.png") },
        FilePart { field: "files", ..png_part("3.png") },
    ];
    let body = multipart_body(&files, &[("names", "fine"), ("names", "boom"), ("names", "never")]);
    let response = post_multipart(app.router(), "/api/medias/upload/multiple", Caller::Bearer(&access), body).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM medias")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 0);
    assert_eq!(count_files(app.uploads.path()), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_filters_and_ownership(pool: PgPool) {
    let app = TestApp::new(pool);
    let (_, alice, _) = register_and_login(&app, "alice@example.com").await;
    let (_, bob, _) = register_and_login(&app, "bob@example.com").await;

    for name in ["Rex", "Rover"] {
        let body = multipart_body(&[png_part("p.png")], &[("name", name)]);
        let response = post_multipart(app.router(), "/api/medias/upload/single", Caller::Bearer(&alice), body).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let json = body_json(get_auth(app.router(), "/api/medias?search=rov&type=image", &alice).await).await;
    assert_eq!(json["pagination"]["total"], 1);
    assert_eq!(json["data"][0]["name"], "Rover");
    let rover_id = json["data"][0]["id"].as_i64().unwrap();

    let json = body_json(get_auth(app.router(), "/api/medias?type=video", &alice).await).await;
    assert_eq!(json["pagination"]["total"], 0);

    // Bob sees none of Alice's media, and fetching one reads as missing.
    let json = body_json(get_auth(app.router(), "/api/medias", &bob).await).await;
    assert_eq!(json["pagination"]["total"], 0);
    let response = get_auth(app.router(), &format!("/api/medias/{rover_id}"), &bob).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get_auth(app.router(), "/api/medias?start_date=2025-05-02&end_date=2025-05-01", &alice).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_and_soft_delete_media(pool: PgPool) {
    let app = TestApp::new(pool);
    let (_, access, _) = register_and_login(&app, "edit@example.com").await;

    let body = multipart_body(&[png_part("p.png")], &[("name", "Old")]);
    let response = post_multipart(app.router(), "/api/medias/upload/single", Caller::Bearer(&access), body).await;
    let id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = post_json_auth(
        app.router(),
        &format!("/api/medias/{id}"),
        serde_json::json!({ "name": "New" }),
        &access,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["name"], "New");

    let response = delete_auth(app.router(), &format!("/api/medias/{id}"), &access).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(app.router(), &format!("/api/medias/{id}"), &access).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The file stays on disk until the cleanup job purges it.
    assert_eq!(count_files(app.uploads.path()), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_directory_tree_lifecycle(pool: PgPool) {
    let app = TestApp::new(pool);
    let (_, access, _) = register_and_login(&app, "tree@example.com").await;

    let response = post_json_auth(
        app.router(),
        "/api/directories",
        serde_json::json!({ "name": "Walks" }),
        &access,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let walks = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = post_json_auth(
        app.router(),
        "/api/directories",
        serde_json::json!({ "name": "Beach", "parent_id": walks }),
        &access,
    )
    .await;
    let beach = body_json(response).await["data"]["id"].as_i64().unwrap();

    let beach_field = beach.to_string();
    let body = multipart_body(
        &[png_part("b.png")],
        &[("name", "Sandy"), ("directory_id", beach_field.as_str())],
    );
    let response = post_multipart(app.router(), "/api/medias/upload/single", Caller::Bearer(&access), body).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let root = body_json(get_auth(app.router(), "/api/directories/content", &access).await).await;
    let root_id = root["data"]["directory_id"].as_i64().unwrap();
    assert_eq!(root["data"]["directories"][0]["name"], "Walks");

    let content = body_json(
        get_auth(app.router(), &format!("/api/directories/content/{beach}"), &access).await,
    )
    .await;
    assert_eq!(content["data"]["medias"][0]["name"], "Sandy");

    let crumbs = body_json(
        get_auth(app.router(), &format!("/api/directories/{beach}/breadcrumb"), &access).await,
    )
    .await;
    let ids: Vec<i64> = crumbs["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![root_id, walks, beach]);

    // The root cannot be removed; a subtree can, taking its media with it.
    let response = delete_auth(app.router(), &format!("/api/directories/{root_id}"), &access).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = delete_auth(app.router(), &format!("/api/directories/{walks}"), &access).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let json = body_json(get_auth(app.router(), "/api/medias", &access).await).await;
    assert_eq!(json["pagination"]["total"], 0);
    let response = get_auth(app.router(), &format!("/api/directories/content/{beach}"), &access).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
