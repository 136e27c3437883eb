use std::fs;

use hookfetch::http::header::{CONTENT_LENGTH, CONTENT_TYPE, LAST_MODIFIED};
use hookfetch::http::{Method, StatusCode};
use hookfetch::{Dispatcher, RequestInit, Response, Url, WorkingDir, transport_fn};
use hookfetch_hooks::FileHook;
use tempfile::TempDir;

const SMILEY: &str = "☺\n\n";

fn fixture() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("smiley.txt"), SMILEY).unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();
    dir
}

fn uri(dir: &TempDir, name: &str) -> String {
    let base = Url::from_directory_path(dir.path()).unwrap();
    base.join(name).unwrap().to_string()
}

fn dispatcher(dir: &TempDir) -> Dispatcher {
    Dispatcher::builder()
        .working_dir(WorkingDir::Fixed(dir.path().to_path_buf()))
        .hook(FileHook::with_base(dir.path().to_string_lossy()))
        .build()
}

#[tokio::test]
async fn test_get_absolute_path() {
    let dir = fixture();
    let response = dispatcher(&dir).fetch(uri(&dir, "smiley.txt")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "text/plain; charset=UTF-8");
    assert_eq!(response.content_length(), Some(SMILEY.len() as u64));
    assert!(response.headers().contains_key(LAST_MODIFIED));
    assert_eq!(response.url().map(Url::as_str), Some(uri(&dir, "smiley.txt").as_str()));
    assert_eq!(response.text().await.unwrap(), SMILEY);
}

#[tokio::test]
async fn test_get_relative_path() {
    let dir = fixture();
    let response = dispatcher(&dir).fetch("file:smiley.txt").await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), SMILEY);
}

#[tokio::test]
async fn test_missing_file_is_404() {
    let dir = fixture();
    let response = dispatcher(&dir).fetch(uri(&dir, "frowny.txt")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.status_text(), "Not Found");
}

#[tokio::test]
async fn test_outside_base_is_left_to_others() {
    let dir = fixture();
    let other = fixture();
    let target = uri(&other, "smiley.txt");

    let err = dispatcher(&dir).fetch(target.as_str()).await.unwrap_err();
    assert_eq!(err.to_string(), format!("No hook permits access to: {target}"));
}

#[tokio::test]
async fn test_directory_is_403() {
    let dir = fixture();
    let response = dispatcher(&dir).fetch(uri(&dir, "nested")).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(response.status_text(), "Forbidden");
}

#[tokio::test]
async fn test_base_itself_is_403() {
    let dir = fixture();
    let base = Url::from_file_path(dir.path()).unwrap();
    let response = dispatcher(&dir).fetch(base).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_head_has_headers_but_no_body() {
    let dir = fixture();
    let init = RequestInit::new().method(Method::HEAD);
    let response = dispatcher(&dir).dispatch(uri(&dir, "smiley.txt"), init).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "text/plain; charset=UTF-8");
    assert_eq!(response.headers()[CONTENT_LENGTH], SMILEY.len().to_string().as_str());
    assert_eq!(response.text().await.unwrap(), "");
}

#[tokio::test]
async fn test_other_methods_are_rejected() {
    let dir = fixture();
    let init = RequestInit::new().method(Method::DELETE);
    let err = dispatcher(&dir).dispatch(uri(&dir, "smiley.txt"), init).await.unwrap_err();

    assert_eq!(err.to_string(), "Can only GET or HEAD a file: URI");
}

#[tokio::test]
async fn test_query_is_rejected() {
    let dir = fixture();
    let err = dispatcher(&dir)
        .fetch(format!("{}?x=1", uri(&dir, "smiley.txt")))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Can't handle file: URIs with query: \"x=1\"");
}

#[tokio::test]
async fn test_other_schemes_pass_through_to_upstream() {
    let dir = fixture();
    let dispatcher = Dispatcher::builder()
        .hook(FileHook::with_base(dir.path().to_string_lossy()))
        .upstream(transport_fn(|_| async { Ok(Response::new("hello")) }))
        .build();

    let response = dispatcher.fetch("https://example.com").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "hello");
}
