mod stub;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt as _;
use serde_json::Value;
use stub::{Providers, Reply, Stub};
use tower::ServiceExt as _;
use ytsum::app::{AppState, router};
use ytsum::cli::ApiArgs;
use ytsum::config::Config;
use ytsum::pipeline::Pipeline;

fn build_app(stub: &Stub) -> axum::Router {
    let api = ApiArgs {
        youtube_api_key: Some("yt-test-key".to_owned()),
        hugging_face_api_key: Some("hf-test-key".to_owned()),
        youtube_api_base: stub.youtube_api_base(),
        captions_base: stub.base_url.clone(),
        inference_base: stub.base_url.clone(),
        config: None,
    };
    let mut config = Config::default();
    config.request_timeout_secs = 10;
    config.resolver.caption_backoff_ms = 5;
    config.summarizer.backoff_base_ms = 5;
    config.summarizer.backoff_max_ms = 20;
    let pipeline = Pipeline::from_settings(&api, &config).unwrap();
    router(AppState::new(pipeline), None)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn send_json(app: &axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, req).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn healthz_and_index_page() {
    let stub = Providers::default().spawn();
    let app = build_app(&stub);

    let (status, body) = send(&app, get("/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok\n");

    let (status, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("<title>ytsum</title>"));
    assert!(html.contains("/api/video"));
}

#[tokio::test]
async fn video_route_returns_summary_and_records_session() {
    let stub = Providers::default().spawn();
    let app = build_app(&stub);

    let (status, _) = send(&app, get("/api/session")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send_json(
        &app,
        post_json("/api/video", serde_json::json!({ "url": stub::VIDEO_URL })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["video"]["video_id"], stub::VIDEO_ID);
    assert_eq!(body["video"]["statistics"]["viewCount"], "1234567");
    assert_eq!(body["source"], "description");
    assert_eq!(body["model"], "facebook/bart-large-cnn");
    assert!(!body["summary"].as_str().unwrap().is_empty());
    assert!(body["paragraphs"].as_array().unwrap().len() >= 2);

    let (status, session) = send_json(&app, get("/api/session")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["url"], stub::VIDEO_URL);
    assert_eq!(session["loading"], false);
    assert_eq!(session["request_id"], body["request_id"]);
    assert!(session["error"].is_null());
}

#[tokio::test]
async fn video_route_maps_failures_to_statuses() {
    let stub = Providers::default().spawn();
    let app = build_app(&stub);
    let (status, body) = send_json(
        &app,
        post_json("/api/video", serde_json::json!({ "url": "not a url" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Invalid YouTube URL"));

    let (_, session) = send_json(&app, get("/api/session")).await;
    assert_eq!(session["url"], "not a url");
    assert!(session["error"].as_str().is_some());

    let missing = Providers {
        metadata: Reply::text(404, "{}"),
        ..Providers::default()
    }
    .spawn();
    let (status, body) = send_json(
        &build_app(&missing),
        post_json("/api/video", serde_json::json!({ "url": stub::VIDEO_URL })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Video not found. Please check the URL.");
}

#[tokio::test]
async fn summarize_route_validates_and_classifies() {
    let stub = Providers::default().spawn();
    let app = build_app(&stub);

    let (status, body) = send_json(
        &app,
        post_json("/api/summarize", serde_json::json!({ "text": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Not enough text"));

    let (status, body) = send_json(
        &app,
        post_json(
            "/api/summarize",
            serde_json::json!({ "text": stub::words(80) }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["summary"].as_str().unwrap().contains("Borrowing lets functions"));

    let unavailable = Providers {
        inference_default: Reply::inference_error(503, "Model is currently loading"),
        ..Providers::default()
    }
    .spawn();
    let (status, body) = send_json(
        &build_app(&unavailable),
        post_json(
            "/api/summarize",
            serde_json::json!({ "text": stub::words(80) }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn superseded_submission_gets_conflict() {
    let inference_calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&inference_calls);
    let providers = Providers::default();
    let metadata = providers.metadata.clone();
    let stub = Stub::spawn(move |req| {
        let path = req.path();
        if path.starts_with("/youtube/v3/videos") {
            metadata.clone()
        } else if path.starts_with("/models/") {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                std::thread::sleep(Duration::from_millis(600));
            }
            Reply::summary(stub::SUMMARY)
        } else {
            Reply::text(404, "")
        }
    });
    let app = build_app(&stub);

    let first = tokio::spawn({
        let app = app.clone();
        async move {
            send_json(
                &app,
                post_json("/api/video", serde_json::json!({ "url": stub::VIDEO_URL })),
            )
            .await
        }
    });
    tokio::time::sleep(Duration::from_millis(200)).await;
    let (second_status, second) = send_json(
        &app,
        post_json(
            "/api/video",
            serde_json::json!({ "url": "https://youtu.be/dQw4w9WgXcQ" }),
        ),
    )
    .await;
    let (first_status, first) = first.await.unwrap();

    assert_eq!(first_status, StatusCode::CONFLICT);
    assert!(first["error"].as_str().unwrap().contains("newer submission"));
    assert_eq!(second_status, StatusCode::OK);

    let (_, session) = send_json(&app, get("/api/session")).await;
    assert_eq!(session["url"], "https://youtu.be/dQw4w9WgXcQ");
    assert_eq!(session["request_id"], second["request_id"]);
}

#[tokio::test]
async fn missing_or_malformed_fields_are_bad_requests() {
    let stub = Providers::default().spawn();
    let app = build_app(&stub);

    for body in [serde_json::json!({}), serde_json::json!({ "text": null })] {
        let (status, resp) = send_json(&app, post_json("/api/summarize", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(resp["error"].as_str().unwrap().contains("Not enough text"));
    }

    let (status, resp) = send_json(
        &app,
        post_json("/api/summarize", serde_json::json!({ "text": 42 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(resp["error"].as_str().unwrap().contains("Malformed request body"));

    let not_json = Request::builder()
        .method("POST")
        .uri("/api/summarize")
        .body(Body::from("text=hello"))
        .unwrap();
    let (status, resp) = send_json(&app, not_json).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(resp["error"].is_string());

    let (status, resp) = send_json(&app, post_json("/api/video", serde_json::json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(resp["error"].as_str().unwrap().contains("Invalid YouTube URL"));

    assert!(stub.requests().is_empty());
}
