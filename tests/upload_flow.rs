use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{ALLOW, CONTENT_LENGTH, CONTENT_TYPE, LOCATION, SERVER};
use chrono::{DateTime, Local};
use hyper::{Request, Response, StatusCode};
use imghost::config::{AppState, Config};
use imghost::handler::handle_request;
use imghost::render::{Templates, DATE_FORMAT};
use imghost::storage::ImageId;
use std::net::SocketAddr;
use std::sync::Arc;

const BOUNDARY: &str = "imghost-test-boundary";

fn test_state(root: &std::path::Path, max_upload_size: u64) -> Arc<AppState> {
    state_with_templates(root, max_upload_size, Templates::builtin().unwrap())
}

fn state_with_templates(
    root: &std::path::Path,
    max_upload_size: u64,
    templates: Templates,
) -> Arc<AppState> {
    let mut config = Config::load_with("does-not-exist/imghost-test-config", None).unwrap();
    config.storage.root = root.to_path_buf();
    config.http.max_upload_size = max_upload_size;
    config.logging.access_log = false;
    AppState::new(config, templates).shared()
}

fn peer() -> SocketAddr {
    "127.0.0.1:50000".parse().unwrap()
}

fn multipart_body(name: &str, file_name: Option<&str>, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    match file_name {
        Some(f) => body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\n")
                .as_bytes(),
        ),
        None => body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n").as_bytes(),
        ),
    }
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(body: Vec<u8>, with_length: bool) -> Request<Full<Bytes>> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/save/")
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if with_length {
        builder = builder.header(CONTENT_LENGTH, body.len());
    }
    builder.body(Full::new(Bytes::from(body))).unwrap()
}

fn get(path: &str) -> Request<Full<Bytes>> {
    Request::builder()
        .uri(path)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

async fn send(state: &Arc<AppState>, req: Request<Full<Bytes>>) -> Response<Full<Bytes>> {
    handle_request(req, Arc::clone(state), peer()).await.unwrap()
}

async fn body_bytes(resp: Response<Full<Bytes>>) -> Bytes {
    resp.into_body().collect().await.unwrap().to_bytes()
}

/// Upload `content` and return the id from the redirect
async fn upload(state: &Arc<AppState>, content: &[u8]) -> String {
    let resp = send(state, upload_request(multipart_body("img", Some("a.png"), content), true)).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let location = resp.headers()[LOCATION].to_str().unwrap().to_string();
    location.strip_prefix("/img/").unwrap().to_string()
}

fn stored_files(root: &std::path::Path) -> usize {
    std::fs::read_dir(root).map_or(0, Iterator::count)
}

#[tokio::test]
async fn test_upload_then_view_and_fetch() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path(), 10 * 1024 * 1024);
    let content: Vec<u8> = (0u8..50).collect();

    let id = upload(&state, &content).await;
    assert_eq!(id.len(), 32);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    assert!(dir.path().join(format!("{id}.png")).is_file());

    let resp = send(&state, get(&format!("/img/{id}"))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = String::from_utf8(body_bytes(resp).await.to_vec()).unwrap();
    assert!(html.contains(&format!("/images/{id}.png")));

    let resp = send(&state, get(&format!("/images/{id}.png"))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[CONTENT_TYPE], "image/png");
    assert_eq!(body_bytes(resp).await.as_ref(), content.as_slice());
}

#[tokio::test]
async fn test_uploads_get_distinct_ids() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path(), 1024);

    let first = upload(&state, b"first").await;
    let second = upload(&state, b"second").await;
    assert_ne!(first, second);
    assert_eq!(stored_files(dir.path()), 2);
}

#[tokio::test]
async fn test_unknown_id_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path(), 1024);

    let resp = send(&state, get("/img/doesnotexist")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = send(&state, get("/images/doesnotexist.png")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_img_field_is_400() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path(), 1024);

    let body = multipart_body("picture", Some("a.png"), b"data");
    let resp = send(&state, upload_request(body, true)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // A plain text field named img is not a file
    let body = multipart_body("img", None, b"data");
    let resp = send(&state, upload_request(body, true)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Form submitted without choosing a file
    let body = multipart_body("img", Some(""), b"");
    let resp = send(&state, upload_request(body, true)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    assert_eq!(stored_files(dir.path()), 0);
}

#[tokio::test]
async fn test_non_multipart_body_is_400() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path(), 1024);

    let req = Request::builder()
        .method("POST")
        .uri("/save/")
        .header(CONTENT_TYPE, "application/octet-stream")
        .body(Full::new(Bytes::from_static(b"raw")))
        .unwrap();
    let resp = send(&state, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oversized_upload_is_413() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path(), 100);
    let content = vec![7u8; 500];

    let body = multipart_body("img", Some("big.png"), &content);
    let resp = send(&state, upload_request(body, true)).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

    // Same body without a declared length is cut off while streaming
    let body = multipart_body("img", Some("big.png"), &content);
    let resp = send(&state, upload_request(body, false)).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

    assert_eq!(stored_files(dir.path()), 0);
}

#[tokio::test]
async fn test_edit_and_unknown_paths_are_404() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path(), 1024);

    for path in ["/edit/abc", "/", "/img/", "/img/../secret", "/images/abc.jpg", "/nothing"] {
        let resp = send(&state, get(path)).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{path}");
    }
}

#[tokio::test]
async fn test_method_policy() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path(), 1024);

    let resp = send(&state, get("/save/")).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(resp.headers()[ALLOW], "POST");

    let req = Request::builder()
        .method("DELETE")
        .uri("/upload/")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let resp = send(&state, req).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(resp.headers()[ALLOW], "GET, HEAD");
}

#[tokio::test]
async fn test_upload_form() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path(), 1024);

    let resp = send(&state, get("/upload/")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[SERVER], "imghost");
    let html = String::from_utf8(body_bytes(resp).await.to_vec()).unwrap();
    assert!(html.contains("multipart/form-data"));
    assert!(html.contains(r#"name="img""#));
}

#[tokio::test]
async fn test_view_date_not_before_upload() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path(), 1024);

    let before = Local::now();
    let id = upload(&state, b"timestamped").await;

    let resp = send(&state, get(&format!("/img/{id}"))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = String::from_utf8(body_bytes(resp).await.to_vec()).unwrap();

    let date = html
        .split("Uploaded ")
        .nth(1)
        .and_then(|rest| rest.split("</p>").next())
        .unwrap();
    let shown = DateTime::parse_from_str(date.trim(), DATE_FORMAT).unwrap();
    assert!(
        shown.timestamp() >= before.timestamp(),
        "shown {shown}, upload started {before}"
    );
}

#[tokio::test]
async fn test_percent_encoded_paths_are_decoded() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path(), 1024);
    let content = b"encoded";
    let id = upload(&state, content).await;

    let (first, rest) = id.split_at(1);
    let encoded = format!("%{:02X}{rest}", first.as_bytes()[0]);

    let resp = send(&state, get(&format!("/img/{encoded}"))).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&state, get(&format!("/images/{encoded}.png"))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await.as_ref(), content);

    // A decoded separator never forms an id
    let resp = send(&state, get("/img/ab%2Fcd")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_storage_failure_on_save_is_generic_500() {
    let dir = tempfile::tempdir().unwrap();
    // The storage root is a regular file, so it cannot be created as a directory
    let root = dir.path().join("images");
    std::fs::write(&root, b"not a directory").unwrap();
    let state = test_state(&root, 1024);

    let body = multipart_body("img", Some("a.png"), b"data");
    let resp = send(&state, upload_request(body, true)).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let text = String::from_utf8(body_bytes(resp).await.to_vec()).unwrap();
    assert_eq!(text, "500 Internal Server Error");
    assert!(!text.contains("images"));
}

#[tokio::test]
async fn test_render_failure_on_view_returns_message() {
    let dir = tempfile::tempdir().unwrap();
    let pages = tempfile::tempdir().unwrap();
    std::fs::write(pages.path().join("img.html"), "{{ missing_value }}").unwrap();
    std::fs::write(pages.path().join("upload.html"), "form").unwrap();
    let templates = Templates::from_dir(pages.path()).unwrap();
    let state = state_with_templates(dir.path(), 1024, templates);

    let id = ImageId::parse("abc123").unwrap();
    state.store.save(id, b"data").await.unwrap();

    let resp = send(&state, get("/img/abc123")).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let text = String::from_utf8(body_bytes(resp).await.to_vec()).unwrap();
    assert!(text.starts_with("Failed to render 'img.html'"), "{text}");
    assert!(text.contains("missing_value"), "{text}");
}
