use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use vidz_core::engine::testing::{downloading, sample_metadata, Gate, ScriptedEngine};
use vidz_core::engine::FetchOptions;
use vidz_core::{JobController, JobRegistry};

use super::downloads::{content_disposition, status_word};
use vidz_core::JobState;
use crate::server::{build_router, AppState};

struct Harness {
    router: Router,
    engine: Arc<ScriptedEngine>,
    _dir: tempfile::TempDir,
}

fn harness(engine: ScriptedEngine) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let engine = Arc::new(engine);
    let controller = JobController::new(
        Arc::new(JobRegistry::new()),
        engine.clone(),
        FetchOptions::new(dir.path()),
    );
    Harness {
        router: build_router(AppState::new(Arc::new(controller)), None),
        engine,
        _dir: dir,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>, axum::http::HeaderMap) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec(), headers)
}

async fn post_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, bytes, _) = send(router, request).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Vec<u8>, axum::http::HeaderMap) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(router, request).await
}

async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, bytes, _) = get(router, uri).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn wait_for_state(router: &Router, id: &str, state: &str) -> Value {
    for _ in 0..400 {
        let (status, body) = get_json(router, &format!("/api/progress/{}", id)).await;
        assert_eq!(status, StatusCode::OK);
        if body["state"] == state {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("job {} never reached {}", id, state);
}

#[tokio::test]
async fn health_reports_version_and_job_count() {
    let h = harness(ScriptedEngine::new());
    let (status, body) = get_json(&h.router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["jobs"], 0);
}

#[tokio::test]
async fn info_returns_metadata_with_formatted_duration() {
    let h = harness(ScriptedEngine::new().with_metadata(sample_metadata("Big Buck Bunny")));
    let (status, body) = post_json(&h.router, "/api/info", json!({"url": "https://example.com/v1"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Big Buck Bunny");
    assert_eq!(body["duration_formatted"], "1:05");
    assert_eq!(body["view_count"], 1000);
    assert_eq!(body["formats"][0]["quality"], "720p");
    assert_eq!(h.engine.resolve_calls(), 1);
}

#[tokio::test]
async fn info_rejects_empty_url_and_engine_failures() {
    let h = harness(ScriptedEngine::new().resolve_fails("ERROR: Unsupported URL"));

    let (status, body) = post_json(&h.router, "/api/info", json!({"url": " "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = post_json(&h.router, "/api/info", json!({"url": "https://x.test/"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "RESOLUTION_ERROR");
    assert_eq!(body["message"], "ERROR: Unsupported URL");
    assert_eq!(body["error"], "ERROR: Unsupported URL");
}

#[tokio::test]
async fn download_progress_and_file_roundtrip() {
    let gate = Gate::new();
    let h = harness(
        ScriptedEngine::new()
            .emit(downloading(512_000, 1_024_000))
            .wait(&gate)
            .succeed_with_file("Clip.mp4", "Clip"),
    );

    let (status, body) = post_json(
        &h.router,
        "/api/download",
        json!({"url": "https://example.com/v1", "quality": "720p"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["downloadId"].as_str().unwrap().to_string();

    let mid = wait_for_state(&h.router, &id, "transferring").await;
    assert_eq!(mid["percentage"], 50.0);
    assert!(mid.get("result").is_none());

    let (status, body) = get_json(&h.router, &format!("/api/file/{}", id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "NOT_READY");

    gate.open();
    let done = wait_for_state(&h.router, &id, "completed").await;
    assert_eq!(done["percentage"], 100.0);
    assert_eq!(done["result"]["filename"], "Clip.mp4");
    assert!(done.get("error").is_none());

    let (status, bytes, headers) = get(&h.router, &format!("/api/file/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"scripted media");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"Clip.mp4\""
    );

    let req = h.engine.last_request().unwrap();
    assert!(req.selector.contains("height<=720"));
    assert!(req.audio.is_none());
}

#[tokio::test]
async fn progress_carries_flat_fields_for_browser_clients() {
    let gate = Gate::new();
    let h = harness(
        ScriptedEngine::new()
            .emit(downloading(256_000, 1_024_000))
            .wait(&gate)
            .succeed_with_file("Clip.mp4", "Clip"),
    );
    let (_, body) = post_json(&h.router, "/api/download", json!({"url": "https://example.com/v1"})).await;
    let id = body["downloadId"].as_str().unwrap().to_string();

    let mid = wait_for_state(&h.router, &id, "transferring").await;
    assert_eq!(mid["status"], "downloading");
    assert_eq!(mid["progress"], 25.0);
    assert_eq!(mid["progress"], mid["percentage"]);
    assert!(mid.get("filename").is_none());
    assert!(mid.get("speed").is_some());
    assert!(mid.get("eta").is_some());

    gate.open();
    let done = wait_for_state(&h.router, &id, "completed").await;
    assert_eq!(done["status"], "completed");
    assert_eq!(done["progress"], 100.0);
    assert_eq!(done["filename"], "Clip.mp4");

    let (status, body) = get_json(&h.router, &format!("/api/progress/{}", uuid::Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], body["message"]);
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[test]
fn status_words_cover_every_state() {
    assert_eq!(status_word(JobState::Starting), "starting");
    assert_eq!(status_word(JobState::Resolving), "starting");
    assert_eq!(status_word(JobState::Transferring), "downloading");
    assert_eq!(status_word(JobState::Finalizing), "processing");
    assert_eq!(status_word(JobState::Completed), "completed");
    assert_eq!(status_word(JobState::Failed), "error");
}

#[tokio::test]
async fn download_accepts_audio_only_and_unknown_quality() {
    let h = harness(ScriptedEngine::new().succeed("Song.mp3", "Song"));
    let (status, body) = post_json(
        &h.router,
        "/api/download",
        json!({"url": "https://example.com/v1", "quality": "4k", "audioOnly": true}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["downloadId"].as_str().unwrap().to_string();
    wait_for_state(&h.router, &id, "completed").await;

    let req = h.engine.last_request().unwrap();
    assert_eq!(req.selector, "bestaudio[ext=m4a]/bestaudio");
    assert!(req.audio.is_some());
}

#[tokio::test]
async fn download_rejects_missing_url() {
    let h = harness(ScriptedEngine::new());
    let (status, body) = post_json(&h.router, "/api/download", json!({"quality": "best"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (_, health) = get_json(&h.router, "/health").await;
    assert_eq!(health["jobs"], 0);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let h = harness(ScriptedEngine::new());
    let request = Request::builder()
        .method("POST")
        .uri("/api/download")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, bytes, _) = send(&h.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let h = harness(ScriptedEngine::new());
    let unknown = uuid::Uuid::new_v4();
    for uri in [
        format!("/api/progress/{}", unknown),
        format!("/api/file/{}", unknown),
        "/api/progress/not-a-uuid".to_string(),
    ] {
        let (status, body) = get_json(&h.router, &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body["code"], "NOT_FOUND");
    }
}

#[tokio::test]
async fn failed_job_reports_error_and_never_serves_a_file() {
    let h = harness(ScriptedEngine::new().fail("ERROR: Video unavailable"));
    let (_, body) = post_json(&h.router, "/api/download", json!({"url": "https://example.com/gone"})).await;
    let id = body["downloadId"].as_str().unwrap().to_string();

    let failed = wait_for_state(&h.router, &id, "failed").await;
    assert_eq!(failed["error"], "ERROR: Video unavailable");
    assert_eq!(failed["status"], "error");
    assert!(failed.get("result").is_none());

    let (status, body) = get_json(&h.router, &format!("/api/file/{}", id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "NOT_READY");
}

#[tokio::test]
async fn missing_artifact_is_not_found() {
    let h = harness(ScriptedEngine::new().succeed("never-written.mp4", "Ghost"));
    let (_, body) = post_json(&h.router, "/api/download", json!({"url": "https://example.com/v1"})).await;
    let id = body["downloadId"].as_str().unwrap().to_string();
    wait_for_state(&h.router, &id, "completed").await;

    let (status, body) = get_json(&h.router, &format!("/api/file/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "ARTIFACT_MISSING");
}

#[tokio::test]
async fn static_dir_serves_front_end() {
    let site = tempfile::tempdir().unwrap();
    std::fs::write(site.path().join("index.html"), "<h1>VidZ</h1>").unwrap();
    let out = tempfile::tempdir().unwrap();
    let controller = JobController::new(
        Arc::new(JobRegistry::new()),
        Arc::new(ScriptedEngine::new()),
        FetchOptions::new(out.path()),
    );
    let router = build_router(AppState::new(Arc::new(controller)), Some(site.path()));

    let (status, bytes, _) = get(&router, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"<h1>VidZ</h1>");

    let (status, _) = get_json(&router, "/health").await;
    assert_eq!(status, StatusCode::OK);
}

#[test]
fn content_disposition_escapes_non_ascii_names() {
    assert_eq!(content_disposition("a.mp4"), "attachment; filename=\"a.mp4\"");
    assert_eq!(
        content_disposition("Café \"live\".mp3"),
        "attachment; filename=\"Caf_ _live_.mp3\"; filename*=UTF-8''Caf%C3%A9%20%22live%22.mp3"
    );
}
