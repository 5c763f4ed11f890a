//! Web API Drive Tests
//!
//! Integration tests for the drive endpoints.

use axum::http::header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use bytes::Bytes;
use drive::storage::LocalBackend;
use drive::web::handlers::AppState;
use drive::web::middleware::{JwtClaims, JwtState};
use drive::web::router::create_router;
use drive::{BackendRegistry, UploadLimits};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

const TEST_SECRET: &str = "test-secret-key-for-testing-only";

/// Create a test server over a fresh storage root.
async fn create_test_server() -> (TestServer, TempDir) {
    create_test_server_with_limits(UploadLimits::default()).await
}

async fn create_test_server_with_limits(limits: UploadLimits) -> (TestServer, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let backend = LocalBackend::new(dir.path())
        .await
        .expect("Failed to create backend");
    let registry = Arc::new(BackendRegistry::with_backend(Arc::new(backend)));

    let app_state = Arc::new(AppState::new(registry).with_upload_limits(limits));
    let jwt_state = Arc::new(JwtState::new(TEST_SECRET));

    let router = create_router(app_state, jwt_state, &[]);
    let server = TestServer::new(router).expect("Failed to create test server");

    (server, dir)
}

/// Mint a bearer token for `owner`.
fn token_for(owner: &str) -> String {
    let now = chrono::Utc::now().timestamp() as u64;
    let claims = JwtClaims {
        sub: owner.to_string(),
        iat: now,
        exp: now + 3600,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("Failed to encode token")
}

fn bearer(owner: &str) -> String {
    format!("Bearer {}", token_for(owner))
}

fn text_file(name: &str, content: &str) -> Part {
    Part::bytes(content.as_bytes().to_vec())
        .file_name(name)
        .mime_type("text/plain")
}

async fn put_text(server: &TestServer, owner: &str, path: &str, content: &str) {
    server
        .put("/api/drive/file")
        .add_query_param("path", path)
        .add_header(AUTHORIZATION, bearer(owner))
        .bytes(Bytes::from(content.to_string()))
        .await
        .assert_status_ok();
}

async fn list_names(server: &TestServer, owner: &str, path: &str) -> Vec<String> {
    let response = server
        .get("/api/drive/list")
        .add_query_param("path", path)
        .add_header(AUTHORIZATION, bearer(owner))
        .await;
    response.assert_status_ok();

    let json: Value = response.json();
    json["data"]["entries"]
        .as_array()
        .expect("entries array")
        .iter()
        .map(|e| e["name"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn test_list_requires_auth() {
    let (server, _dir) = create_test_server().await;

    let response = server.get("/api/drive/list").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let json: Value = response.json();
    assert_eq!(json["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_invalid_token_rejected() {
    let (server, _dir) = create_test_server().await;

    let response = server
        .get("/api/drive/list")
        .add_header(AUTHORIZATION, "Bearer not.a.token".to_string())
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_empty_namespace() {
    let (server, _dir) = create_test_server().await;

    let response = server
        .get("/api/drive/list")
        .add_header(AUTHORIZATION, bearer("alice"))
        .await;
    response.assert_status_ok();

    let json: Value = response.json();
    assert_eq!(json, json!({ "data": { "entries": [] } }));
}

#[tokio::test]
async fn test_put_and_download_round_trip() {
    let (server, _dir) = create_test_server().await;
    put_text(&server, "alice", "/docs/readme.txt", "hello drive").await;

    let response = server
        .get("/api/drive/download")
        .add_query_param("path", "/docs/readme.txt")
        .add_header(AUTHORIZATION, bearer("alice"))
        .await;
    response.assert_status_ok();
    assert_eq!(response.text(), "hello drive");

    let disposition = response.header(CONTENT_DISPOSITION);
    assert_eq!(
        disposition.to_str().unwrap(),
        "attachment; filename=\"readme.txt\""
    );
    let content_type = response.header(CONTENT_TYPE);
    assert!(content_type.to_str().unwrap().starts_with("text/plain"));
}

#[tokio::test]
async fn test_download_with_query_token() {
    let (server, _dir) = create_test_server().await;
    put_text(&server, "alice", "/a.txt", "via query").await;

    let response = server
        .get("/api/drive/download")
        .add_query_param("path", "/a.txt")
        .add_query_param("token", token_for("alice"))
        .await;
    response.assert_status_ok();
    assert_eq!(response.text(), "via query");
}

#[tokio::test]
async fn test_query_token_only_accepted_for_download() {
    let (server, _dir) = create_test_server().await;
    put_text(&server, "alice", "/a.txt", "x").await;

    let response = server
        .get("/api/drive/list")
        .add_query_param("token", token_for("alice"))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = server
        .delete("/api/drive/file")
        .add_query_param("path", "/a.txt")
        .add_query_param("token", token_for("alice"))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    assert_eq!(list_names(&server, "alice", "/").await, vec!["a.txt"]);
}

#[tokio::test]
async fn test_download_missing_file_not_found() {
    let (server, _dir) = create_test_server().await;

    let response = server
        .get("/api/drive/download")
        .add_query_param("path", "/nope.txt")
        .add_header(AUTHORIZATION, bearer("alice"))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_download_directory_rejected() {
    let (server, _dir) = create_test_server().await;
    put_text(&server, "alice", "/docs/a.txt", "x").await;

    let response = server
        .get("/api/drive/download")
        .add_query_param("path", "/docs")
        .add_header(AUTHORIZATION, bearer("alice"))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_orders_directories_first() {
    let (server, _dir) = create_test_server().await;
    put_text(&server, "alice", "/b.txt", "b").await;
    put_text(&server, "alice", "/a.txt", "a").await;
    put_text(&server, "alice", "/Zeta/inner.txt", "z").await;

    let names = list_names(&server, "alice", "/").await;
    assert_eq!(names, vec!["Zeta", "a.txt", "b.txt"]);
}

#[tokio::test]
async fn test_list_entry_shape() {
    let (server, _dir) = create_test_server().await;
    put_text(&server, "alice", "/docs/note.txt", "12345").await;

    let response = server
        .get("/api/drive/list")
        .add_query_param("path", "/docs")
        .add_header(AUTHORIZATION, bearer("alice"))
        .await;
    response.assert_status_ok();

    let json: Value = response.json();
    let entry = &json["data"]["entries"][0];
    assert_eq!(entry["name"], "note.txt");
    assert_eq!(entry["path"], "/docs/note.txt");
    assert_eq!(entry["size"], 5);
    assert_eq!(entry["is_directory"], false);
    assert!(entry["modified"].is_string());
}

#[tokio::test]
async fn test_path_traversal_rejected() {
    let (server, _dir) = create_test_server().await;

    let response = server
        .get("/api/drive/list")
        .add_query_param("path", "/a/../../etc")
        .add_header(AUTHORIZATION, bearer("alice"))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .put("/api/drive/file")
        .add_query_param("path", "/../escape.txt")
        .add_header(AUTHORIZATION, bearer("alice"))
        .bytes(Bytes::from_static(b"nope"))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_root_forbidden() {
    let (server, _dir) = create_test_server().await;
    put_text(&server, "alice", "/keep.txt", "keep").await;

    let response = server
        .delete("/api/drive/file")
        .add_query_param("path", "/")
        .add_header(AUTHORIZATION, bearer("alice"))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    assert_eq!(list_names(&server, "alice", "/").await, vec!["keep.txt"]);
}

#[tokio::test]
async fn test_delete_file_and_directory() {
    let (server, _dir) = create_test_server().await;
    put_text(&server, "alice", "/docs/a.txt", "a").await;
    put_text(&server, "alice", "/b.txt", "b").await;

    server
        .delete("/api/drive/file")
        .add_query_param("path", "/docs")
        .add_header(AUTHORIZATION, bearer("alice"))
        .await
        .assert_status_ok();
    server
        .delete("/api/drive/file")
        .add_query_param("path", "/b.txt")
        .add_header(AUTHORIZATION, bearer("alice"))
        .await
        .assert_status_ok();

    assert!(list_names(&server, "alice", "/").await.is_empty());
}

#[tokio::test]
async fn test_delete_missing_not_found() {
    let (server, _dir) = create_test_server().await;

    let response = server
        .delete("/api/drive/file")
        .add_query_param("path", "/ghost.txt")
        .add_header(AUTHORIZATION, bearer("alice"))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mkdir_rename_move_exists() {
    let (server, _dir) = create_test_server().await;

    server
        .post("/api/drive/mkdir")
        .add_header(AUTHORIZATION, bearer("alice"))
        .json(&json!({ "path": "/projects/2024" }))
        .await
        .assert_status_ok();
    put_text(&server, "alice", "/draft.txt", "draft").await;

    server
        .put("/api/drive/rename")
        .add_header(AUTHORIZATION, bearer("alice"))
        .json(&json!({ "oldPath": "/draft.txt", "newPath": "/final.txt" }))
        .await
        .assert_status_ok();

    server
        .post("/api/drive/move")
        .add_header(AUTHORIZATION, bearer("alice"))
        .json(&json!({ "oldPath": "/final.txt", "newPath": "/projects/2024/final.txt" }))
        .await
        .assert_status_ok();

    let exists = |path: &'static str| {
        server
            .get("/api/drive/exists")
            .add_query_param("path", path)
            .add_header(AUTHORIZATION, bearer("alice"))
    };

    let json: Value = exists("/projects/2024/final.txt").await.json();
    assert_eq!(json["data"]["exists"], true);
    let json: Value = exists("/draft.txt").await.json();
    assert_eq!(json["data"]["exists"], false);
    let json: Value = exists("/final.txt").await.json();
    assert_eq!(json["data"]["exists"], false);
}

#[tokio::test]
async fn test_rename_missing_source_not_found() {
    let (server, _dir) = create_test_server().await;

    let response = server
        .put("/api/drive/rename")
        .add_header(AUTHORIZATION, bearer("alice"))
        .json(&json!({ "oldPath": "/missing", "newPath": "/other" }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mkdir_rejects_control_characters() {
    let (server, _dir) = create_test_server().await;

    let response = server
        .post("/api/drive/mkdir")
        .add_header(AUTHORIZATION, bearer("alice"))
        .json(&json!({ "path": "/bad\u{0007}name" }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_upload_batch_with_relative_paths() {
    let (server, _dir) = create_test_server().await;

    let form = MultipartForm::new()
        .add_text("path", "/photos")
        .add_text("relativePaths", "trip/day1.txt\ntrip/day2.txt")
        .add_part("files", text_file("day1.txt", "first"))
        .add_part("files", text_file("day2.txt", "second"));

    let response = server
        .post("/api/drive/upload")
        .add_header(AUTHORIZATION, bearer("alice"))
        .multipart(form)
        .await;
    response.assert_status_ok();

    let json: Value = response.json();
    assert_eq!(json["data"]["success"], true);
    assert_eq!(json["data"]["count"], 2);

    assert_eq!(
        list_names(&server, "alice", "/photos/trip").await,
        vec!["day1.txt", "day2.txt"]
    );
}

#[tokio::test]
async fn test_upload_sanitizes_relative_paths() {
    let (server, _dir) = create_test_server().await;

    let form = MultipartForm::new()
        .add_text("relativePaths", "../../secret.txt")
        .add_part("file", text_file("secret.txt", "contained"));

    server
        .post("/api/drive/upload")
        .add_header(AUTHORIZATION, bearer("alice"))
        .multipart(form)
        .await
        .assert_status_ok();

    let response = server
        .get("/api/drive/download")
        .add_query_param("path", "/secret.txt")
        .add_header(AUTHORIZATION, bearer("alice"))
        .await;
    response.assert_status_ok();
    assert_eq!(response.text(), "contained");
}

#[tokio::test]
async fn test_upload_without_files_rejected() {
    let (server, _dir) = create_test_server().await;

    let form = MultipartForm::new().add_text("path", "/docs");

    let response = server
        .post("/api/drive/upload")
        .add_header(AUTHORIZATION, bearer("alice"))
        .multipart(form)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_too_many_files_rejected() {
    let limits = UploadLimits {
        max_file_size: 1024,
        max_files: 2,
    };
    let (server, _dir) = create_test_server_with_limits(limits).await;

    let form = MultipartForm::new()
        .add_part("files", text_file("1.txt", "1"))
        .add_part("files", text_file("2.txt", "2"))
        .add_part("files", text_file("3.txt", "3"));

    let response = server
        .post("/api/drive/upload")
        .add_header(AUTHORIZATION, bearer("alice"))
        .multipart(form)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    // Nothing from a rejected batch is written
    assert!(list_names(&server, "alice", "/").await.is_empty());
}

#[tokio::test]
async fn test_upload_oversized_file_rejected() {
    let limits = UploadLimits {
        max_file_size: 8,
        max_files: 10,
    };
    let (server, _dir) = create_test_server_with_limits(limits).await;

    let form = MultipartForm::new()
        .add_part("files", text_file("small.txt", "ok"))
        .add_part("files", text_file("big.txt", "way more than eight bytes"));

    let response = server
        .post("/api/drive/upload")
        .add_header(AUTHORIZATION, bearer("alice"))
        .multipart(form)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let json: Value = response.json();
    assert!(json["error"]["message"]
        .as_str()
        .unwrap_or_default()
        .contains("big.txt"));
    assert!(list_names(&server, "alice", "/").await.is_empty());
}

#[tokio::test]
async fn test_put_oversized_body_rejected() {
    let limits = UploadLimits {
        max_file_size: 8,
        max_files: 10,
    };
    let (server, _dir) = create_test_server_with_limits(limits).await;

    let response = server
        .put("/api/drive/file")
        .add_query_param("path", "/big.bin")
        .add_header(AUTHORIZATION, bearer("alice"))
        .bytes(Bytes::from(vec![0u8; 64]))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    assert!(list_names(&server, "alice", "/").await.is_empty());
}

#[tokio::test]
async fn test_put_overwrites_existing_file() {
    let (server, _dir) = create_test_server().await;
    put_text(&server, "alice", "/a.txt", "first version").await;
    put_text(&server, "alice", "/a.txt", "second").await;

    let response = server
        .get("/api/drive/download")
        .add_query_param("path", "/a.txt")
        .add_header(AUTHORIZATION, bearer("alice"))
        .await;
    assert_eq!(response.text(), "second");
}

#[tokio::test]
async fn test_owners_are_isolated() {
    let (server, _dir) = create_test_server().await;
    put_text(&server, "alice", "/private.txt", "alice only").await;

    assert!(list_names(&server, "bob", "/").await.is_empty());

    let response = server
        .get("/api/drive/download")
        .add_query_param("path", "/private.txt")
        .add_header(AUTHORIZATION, bearer("bob"))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let json: Value = server
        .get("/api/drive/exists")
        .add_query_param("path", "/private.txt")
        .add_header(AUTHORIZATION, bearer("bob"))
        .await
        .json();
    assert_eq!(json["data"]["exists"], false);
}

#[tokio::test]
async fn test_invalid_owner_rejected() {
    let (server, _dir) = create_test_server().await;

    let response = server
        .get("/api/drive/list")
        .add_header(AUTHORIZATION, bearer("../alice"))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}
