//! Download job routes: submit, poll, and fetch the finished file.

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;

use vidz_core::engine::{file_name, Quality};
use vidz_core::controller::ResultView;
use vidz_core::{JobState, JobStatusView};

use super::parse_job_id;
use crate::error::{ApiError, ApiResult};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    #[serde(default)]
    pub url: String,
    /// Tier name; unknown values fall back to `best`.
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub audio_only: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    pub download_id: String,
}

pub async fn start_download(
    State(state): State<AppState>,
    payload: Result<Json<DownloadRequest>, JsonRejection>,
) -> ApiResult<Json<DownloadResponse>> {
    let Json(req) = payload?;
    let quality = req.quality.as_deref().map(Quality::parse).unwrap_or_default();
    let id = state.controller.submit(&req.url, quality, req.audio_only)?;
    Ok(Json(DownloadResponse {
        download_id: id.to_string(),
    }))
}

/// Wire form of a job status. Carries the core view plus the flat fields
/// polled by browser clients: `status`, `progress`, `filename` and `error`
/// as a plain message.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub id: String,
    pub state: JobState,
    pub status: &'static str,
    pub percentage: f64,
    pub progress: f64,
    pub downloaded_bytes: u64,
    pub total_bytes: u64,
    pub speed: Option<String>,
    pub eta: Option<String>,
    pub downloaded: String,
    pub total: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Coarse status word: `starting`, `downloading`, `processing`,
/// `completed` or `error`.
pub(crate) fn status_word(state: JobState) -> &'static str {
    match state {
        JobState::Starting | JobState::Resolving => "starting",
        JobState::Transferring => "downloading",
        JobState::Finalizing => "processing",
        JobState::Completed => "completed",
        JobState::Failed => "error",
    }
}

impl From<JobStatusView> for ProgressResponse {
    fn from(view: JobStatusView) -> Self {
        Self {
            id: view.id.to_string(),
            state: view.state,
            status: status_word(view.state),
            percentage: view.percentage,
            progress: view.percentage,
            downloaded_bytes: view.downloaded_bytes,
            total_bytes: view.total_bytes,
            speed: view.speed,
            eta: view.eta,
            downloaded: view.downloaded,
            total: view.total,
            title: view.title,
            filename: view.result.as_ref().map(|r| r.filename.clone()),
            result: view.result,
            error: view.error.map(|e| e.message),
        }
    }
}

pub async fn get_progress(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProgressResponse>> {
    let id = parse_job_id(&id)?;
    Ok(Json(ProgressResponse::from(state.controller.poll(&id)?)))
}

pub async fn get_file(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let id = parse_job_id(&id)?;
    let path = state.controller.retrieve_artifact(&id).await?;

    let file = tokio::fs::File::open(&path).await.map_err(|e| {
        tracing::warn!(job_id = %id, path = %path.display(), "cannot open artifact: {}", e);
        ApiError::not_found(format!("file not found: {}", path.display()))
    })?;
    let len = file.metadata().await.ok().map(|m| m.len());

    let mut response = Body::from_stream(ReaderStream::new(file)).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    if let Some(len) = len {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    }
    let disposition = content_disposition(&file_name(&path));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    tracing::info!(job_id = %id, path = %path.display(), "serving artifact");
    Ok(response)
}

/// `attachment` disposition with an ASCII fallback name and the exact UTF-8
/// name in `filename*` (RFC 6266).
pub(crate) fn content_disposition(name: &str) -> String {
    let fallback: String = name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();
    if fallback == name {
        return format!("attachment; filename=\"{}\"", name);
    }
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        percent_encode(name)
    )
}

fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 3);
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}
