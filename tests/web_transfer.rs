//! Web Transfer Tests
//!
//! Download, inline browse, presentation preview and uploads.

mod common;

use axum::body::Body;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE, COOKIE};
use axum::http::{Request, StatusCode};
use axum_test::multipart::{MultipartForm, Part};
use common::{location, test_config, TestDrive};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::util::ServiceExt;
use wasabi_drive::storage::{MemoryObjectStore, ObjectStore, SharedStore, OWNER_TAG};
use wasabi_drive::web::handlers::AppState;
use wasabi_drive::web::router::create_router;

async fn logged_in() -> (TestDrive, String) {
    let drive = TestDrive::new();
    let cookie = drive.login_acme().await;
    drive.put("acme/Docs/", b"").await;
    drive.put("acme/Docs/notes.txt", b"hello drive").await;
    (drive, cookie)
}

fn file_part(name: &str, data: &'static [u8]) -> Part {
    Part::bytes(data.to_vec()).file_name(name.to_string())
}

#[tokio::test]
async fn test_download_streams_attachment() {
    let (drive, cookie) = logged_in().await;

    let response = drive.get(&cookie, "/download/Docs/notes.txt").await;

    response.assert_status_ok();
    assert_eq!(response.text(), "hello drive");
    assert_eq!(
        response.header(CONTENT_DISPOSITION),
        "attachment; filename=\"notes.txt\""
    );
    assert!(response
        .header(CONTENT_TYPE)
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    assert_eq!(response.header(CONTENT_LENGTH), "11");
    assert_eq!(response.header("pragma"), "no-cache");
}

#[tokio::test]
async fn test_browse_is_inline() {
    let (drive, cookie) = logged_in().await;
    drive.put("acme/Docs/relatório.pdf", b"%PDF-1.4").await;

    let response = drive
        .get(&cookie, "/browse/Docs/relat%C3%B3rio.pdf")
        .await;

    response.assert_status_ok();
    assert_eq!(response.header(CONTENT_TYPE), "application/pdf");
    let disposition = response.header(CONTENT_DISPOSITION);
    let disposition = disposition.to_str().unwrap();
    assert!(disposition.starts_with("inline; "));
    assert!(disposition.contains("filename*=UTF-8''relat%C3%B3rio.pdf"));
}

#[tokio::test]
async fn test_download_missing_file_is_not_found() {
    let (drive, cookie) = logged_in().await;

    let response = drive.get(&cookie, "/download/Docs/missing.txt").await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert!(response.text().contains("Page Not Found"));
}

#[tokio::test]
async fn test_download_rejects_traversal() {
    let (drive, cookie) = logged_in().await;
    drive.put("globex/secret.txt", b"secret").await;

    let response = drive
        .get(&cookie, "/download/%2E%2E/globex/secret.txt")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(!response.text().contains("secret"));
}

#[tokio::test]
async fn test_pptpdf_rejects_other_files() {
    let (drive, cookie) = logged_in().await;

    let response = drive.get(&cookie, "/pptpdf/Docs/notes.txt").await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pptpdf_missing_presentation() {
    let (drive, cookie) = logged_in().await;

    let response = drive.get(&cookie, "/pptpdf/Docs/deck.pptx").await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_api_upload_stores_sanitized_name_with_owner() {
    let (drive, cookie) = logged_in().await;
    let form = MultipartForm::new().add_part("file", file_part("relatório final.pdf", b"%PDF"));

    let response = drive
        .server
        .post("/api/upload/Docs/")
        .add_header(COOKIE, cookie.clone())
        .multipart(form)
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["ok"], true);
    assert_eq!(body["name"], "relatorio_final.pdf");
    assert_eq!(body["path"], "Docs/relatorio_final.pdf");
    assert!(body.get("error").is_none());

    let key = "acme/Docs/relatorio_final.pdf";
    assert_eq!(drive.content(key).await.unwrap().as_ref(), b"%PDF");
    let tags = drive.store.get_tags(key).await.unwrap();
    assert!(tags.contains(&(OWNER_TAG.to_string(), "ana".to_string())));
}

#[tokio::test]
async fn test_api_upload_to_home() {
    let (drive, cookie) = logged_in().await;
    let form = MultipartForm::new().add_part("file", file_part("a.txt", b"a"));

    let response = drive
        .server
        .post("/api/upload/")
        .add_header(COOKIE, cookie.clone())
        .multipart(form)
        .await;

    response.assert_status_ok();
    assert!(drive.exists("acme/a.txt").await);
}

#[tokio::test]
async fn test_api_upload_invalid_name() {
    let (drive, cookie) = logged_in().await;
    let form = MultipartForm::new().add_part("file", file_part("...", b"data"));

    let response = drive
        .server
        .post("/api/upload/Docs/")
        .add_header(COOKIE, cookie.clone())
        .multipart(form)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"], "Nome de arquivo inválido");
}

#[tokio::test]
async fn test_api_upload_without_file() {
    let (drive, cookie) = logged_in().await;
    let form = MultipartForm::new().add_text("other", "value");

    let response = drive
        .server
        .post("/api/upload/Docs/")
        .add_header(COOKIE, cookie.clone())
        .multipart(form)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"], "Nenhum arquivo enviado");
}

#[tokio::test]
async fn test_api_upload_requires_session() {
    let drive = TestDrive::new();
    let form = MultipartForm::new().add_part("file", file_part("a.txt", b"a"));

    let response = drive.server.post("/api/upload/").multipart(form).await;

    response.assert_status(StatusCode::FOUND);
    assert_eq!(location(&response), "/blank");
    assert!(drive.store.keys().await.is_empty());
}

#[tokio::test]
async fn test_legacy_upload_stores_every_file() {
    let (drive, cookie) = logged_in().await;
    let form = MultipartForm::new()
        .add_part("files", file_part("one.txt", b"1"))
        .add_part("files", file_part("two words.txt", b"2"))
        .add_part("files", file_part("___", b"skipped"));

    let response = drive
        .server
        .post("/upload/Docs/")
        .add_header(COOKIE, cookie.clone())
        .multipart(form)
        .await;

    response.assert_status(StatusCode::FOUND);
    assert_eq!(location(&response), "/files/Docs/");
    assert!(drive.exists("acme/Docs/one.txt").await);
    assert!(drive.exists("acme/Docs/two_words.txt").await);
    assert_eq!(drive.keys_under("acme/Docs/").await.len(), 4);
}

#[tokio::test]
async fn test_request_over_limit_is_rejected() {
    let mut config = test_config();
    config.server.max_content_length = 16;
    let store: SharedStore = Arc::new(MemoryObjectStore::new());
    let state = Arc::new(AppState::new(store, &config));
    let router = create_router(state, config.server.max_content_length);

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload/")
                .header(CONTENT_LENGTH, "1024")
                .body(Body::from(vec![b'x'; 1024]))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"Request too large");
}
