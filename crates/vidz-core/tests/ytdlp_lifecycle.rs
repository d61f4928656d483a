//! Integration test: full job lifecycle through the yt-dlp engine, driven by a
//! fake `yt-dlp` script instead of the real binary.
#![cfg(unix)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use tempfile::tempdir;
use vidz_core::engine::{FetchOptions, Quality, YtDlp};
use vidz_core::{Error, JobController, JobId, JobRegistry, JobState, JobStatusView};

fn controller(output_dir: &std::path::Path) -> JobController {
    let engine = YtDlp::new(common::fake_ytdlp::path().to_string_lossy().into_owned());
    JobController::new(
        Arc::new(JobRegistry::new()),
        Arc::new(engine),
        FetchOptions::new(output_dir),
    )
}

async fn wait_terminal(ctl: &JobController, id: &JobId) -> JobStatusView {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        let view = ctl.poll(id).expect("job exists");
        if view.is_terminal() {
            return view;
        }
        assert!(tokio::time::Instant::now() < deadline, "job did not finish: {:?}", view);
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn info_parses_engine_metadata() {
    let out = tempdir().unwrap();
    let ctl = controller(out.path());

    let meta = ctl.info("https://example.com/watch?v=1").await.expect("info");
    assert_eq!(meta.title, "Fake Clip");
    assert_eq!(meta.uploader, "Tester");
    assert_eq!(meta.duration, 125);
    assert_eq!(meta.view_count, 4200);
    let heights: Vec<u32> = meta.renditions.iter().map(|r| r.height).collect();
    assert_eq!(heights, vec![720, 360], "deduplicated, highest first");
}

#[tokio::test]
async fn info_failure_carries_engine_message() {
    let out = tempdir().unwrap();
    let ctl = controller(out.path());

    match ctl.info("https://fail.example/x").await {
        Err(Error::Resolution(msg)) => assert!(msg.starts_with("ERROR: [generic] Unsupported URL"), "{}", msg),
        other => panic!("expected resolution error, got {:?}", other),
    }
}

#[tokio::test]
async fn download_completes_and_artifact_is_retrievable() {
    let out = tempdir().unwrap();
    let ctl = controller(out.path());

    let id = ctl
        .submit("https://example.com/watch?v=1", Quality::P720, false)
        .expect("submit");
    let view = wait_terminal(&ctl, &id).await;
    assert_eq!(view.state, JobState::Completed, "error: {:?}", view.error);
    assert_eq!(view.percentage, 100.0);
    let result = view.result.expect("result");
    assert_eq!(result.title, "Fake Clip");
    assert_eq!(result.filename, "Fake Clip.mp4");

    let path = ctl.retrieve_artifact(&id).await.expect("artifact");
    assert_eq!(path, out.path().join("Fake Clip.mp4"));
    assert_eq!(std::fs::read(&path).unwrap(), b"fake media");
}

#[tokio::test]
async fn failed_download_reports_last_error_line() {
    let out = tempdir().unwrap();
    let ctl = controller(out.path());

    let id = ctl
        .submit("https://fail.example/x", Quality::Best, true)
        .expect("submit");
    let view = wait_terminal(&ctl, &id).await;
    assert_eq!(view.state, JobState::Failed);
    let message = view.error.expect("error").message;
    assert!(message.starts_with("ERROR: [generic] Unsupported URL"), "{}", message);
    assert!(matches!(
        ctl.retrieve_artifact(&id).await,
        Err(Error::NotReady { state: JobState::Failed, .. })
    ));
}

#[tokio::test]
async fn non_utf8_engine_output_does_not_fail_the_download() {
    let out = tempdir().unwrap();
    let ctl = controller(out.path());

    let id = ctl
        .submit("https://latin1.example/watch?v=2", Quality::Best, false)
        .expect("submit");
    let view = wait_terminal(&ctl, &id).await;
    assert_eq!(view.state, JobState::Completed, "error: {:?}", view.error);
    assert_eq!(view.result.expect("result").filename, "Fake Clip.mp4");
    assert!(ctl.retrieve_artifact(&id).await.is_ok());
}

#[tokio::test]
async fn non_utf8_error_line_is_reported_lossily() {
    let out = tempdir().unwrap();
    let ctl = controller(out.path());

    let id = ctl
        .submit("https://badbytes.example/x", Quality::Best, false)
        .expect("submit");
    let view = wait_terminal(&ctl, &id).await;
    assert_eq!(view.state, JobState::Failed);
    let message = view.error.expect("error").message;
    assert!(message.starts_with("ERROR: broken "), "{}", message);
    assert!(message.contains('\u{FFFD}'), "{}", message);
}
