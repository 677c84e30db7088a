//! Integration tests for the comic API.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`; the
//! metadata source is an `httpmock` server answering with the fixtures in
//! `tests/responses`.

use std::path::PathBuf;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use comic_api::api::handlers::ComicsResponse;
use comic_api::api::{create_router, AppState};
use comic_api::comics::{Comic, ComicClient};
use httpmock::Method::GET;
use httpmock::{Mock, MockServer};
use pretty_assertions::assert_eq;
use tower::ServiceExt;
use tower_http::cors::CorsLayer;

/// Loads a test response file from the responses directory.
fn get_response(filename: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/responses");
    path.push(filename);
    std::fs::read_to_string(path).expect("Failed to read response file")
}

fn fixture(filename: &str) -> Comic {
    serde_json::from_str(&get_response(filename)).expect("Invalid fixture")
}

fn app(server: &MockServer) -> Router {
    let client = ComicClient::new(&server.base_url()).expect("Failed to build client");
    create_router(AppState::new(client), CorsLayer::new())
}

async fn mock_comic<'a>(server: &'a MockServer, num: i64, filename: &str) -> Mock<'a> {
    let body = get_response(filename);
    server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/{}/info.0.json", num));
            then.status(200)
                .header("content-type", "application/json")
                .body(body);
        })
        .await
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn comics_body(comics: Vec<Comic>) -> String {
    serde_json::to_string(&ComicsResponse { comics }).unwrap()
}

#[tokio::test]
async fn comics_in_range_are_sorted_by_title() {
    let server = MockServer::start_async().await;
    let m40 = mock_comic(&server, 40, "comic_40.json").await;
    let m41 = mock_comic(&server, 41, "comic_41.json").await;
    let m42 = mock_comic(&server, 42, "comic_42.json").await;

    let (status, body) = get(app(&server), "/comics?start=40&end=42").await;

    m40.assert_async().await;
    m41.assert_async().await;
    m42.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        comics_body(vec![
            fixture("comic_42.json"),
            fixture("comic_40.json"),
            fixture("comic_41.json"),
        ])
    );
}

#[tokio::test]
async fn even_months_are_dropped_and_leading_symbols_ignored() {
    let server = MockServer::start_async().await;
    mock_comic(&server, 500, "comic_numeric_title.json").await;
    mock_comic(&server, 501, "comic_even_month.json").await;
    mock_comic(&server, 502, "comic_symbol_title.json").await;

    let (status, body) = get(app(&server), "/comics?start=500&end=502").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        comics_body(vec![
            fixture("comic_numeric_title.json"),
            fixture("comic_symbol_title.json"),
        ])
    );
}

#[tokio::test]
async fn repeated_requests_are_identical() {
    let server = MockServer::start_async().await;
    mock_comic(&server, 40, "comic_40.json").await;
    mock_comic(&server, 41, "comic_41.json").await;
    mock_comic(&server, 42, "comic_42.json").await;

    let app = app(&server);
    let first = get(app.clone(), "/comics?start=40&end=42").await;
    let second = get(app, "/comics?start=40&end=42").await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn reversed_range_is_empty_without_fetching() {
    let server = MockServer::start_async().await;
    let m40 = mock_comic(&server, 40, "comic_40.json").await;

    let (status, body) = get(app(&server), "/comics?start=42&end=40").await;

    m40.assert_hits_async(0).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"comics":[]}"#);
}

#[tokio::test]
async fn malformed_upstream_body_aborts_the_request() {
    let server = MockServer::start_async().await;
    mock_comic(&server, 40, "comic_40.json").await;
    let broken = server
        .mock_async(|when, then| {
            when.method(GET).path("/41/info.0.json");
            then.status(200)
                .header("content-type", "application/json")
                .body("{\"num\": 41, \"title\": ");
        })
        .await;
    let m42 = mock_comic(&server, 42, "comic_42.json").await;

    let (status, body) = get(app(&server), "/comics?start=40&end=42").await;

    broken.assert_async().await;
    m42.assert_hits_async(0).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let error: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(error.get("comics").is_none());
    assert!(error["error"]
        .as_str()
        .unwrap()
        .starts_with("failed to parse comic 41"));
}

#[tokio::test]
async fn upstream_error_status_aborts_the_request() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/404/info.0.json");
            then.status(404);
        })
        .await;

    let (status, body) = get(app(&server), "/comics?start=404&end=404").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        r#"{"error":"failed to fetch comic 404: HTTP 404 Not Found"}"#
    );
}

#[tokio::test]
async fn invalid_parameters_are_rejected_before_fetching() {
    let server = MockServer::start_async().await;
    let any = server
        .mock_async(|when, then| {
            when.method(GET);
            then.status(200).body(get_response("comic_42.json"));
        })
        .await;

    let cases = [
        ("", "please include the starting and ending comic numbers"),
        ("?start=3", "please include the starting and ending comic numbers"),
        ("?end=7", "please include the starting and ending comic numbers"),
        (
            "?start=now&end=42",
            "please make sure that the starting number is an integer",
        ),
        (
            "?start=now&end=never",
            "please make sure that the starting number is an integer",
        ),
        (
            "?start=1&end=never",
            "please make sure that the ending number is an integer",
        ),
    ];

    for (query, message) in cases {
        let (status, body) = get(app(&server), &format!("/comics{}", query)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "query: {:?}", query);
        assert_eq!(body, format!(r#"{{"error":"{}"}}"#, message));
    }

    any.assert_hits_async(0).await;
}

#[tokio::test]
async fn ping_returns_pong() {
    let server = MockServer::start_async().await;

    let (status, body) = get(app(&server), "/ping").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"message":"pong"}"#);
}

#[tokio::test]
async fn unreachable_upstream_aborts_the_request() {
    let closed = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", closed.local_addr().unwrap());
    drop(closed);

    let client = ComicClient::new(&base_url).expect("Failed to build client");
    let app = create_router(AppState::new(client), CorsLayer::new());

    let (status, body) = get(app, "/comics?start=1&end=3").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(error.get("comics").is_none());
    assert!(error["error"]
        .as_str()
        .unwrap()
        .starts_with("failed to fetch comic 1: "));
}
