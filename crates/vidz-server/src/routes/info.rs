//! Metadata lookup without downloading.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use vidz_core::engine::MediaMetadata;
use vidz_core::format::format_duration;

use crate::error::ApiResult;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct InfoRequest {
    #[serde(default)]
    pub url: String,
}

/// Snake-case keys (`view_count`, `duration_formatted`) for browser clients.
#[derive(Debug, Serialize)]
pub struct InfoResponse {
    #[serde(flatten)]
    pub metadata: MediaMetadata,
    pub duration_formatted: String,
}

pub async fn get_info(
    State(state): State<AppState>,
    payload: Result<Json<InfoRequest>, JsonRejection>,
) -> ApiResult<Json<InfoResponse>> {
    let Json(req) = payload?;
    let metadata = state.controller.info(&req.url).await.map_err(|e| {
        tracing::info!(url = %req.url, "metadata lookup failed: {}", e);
        e
    })?;
    Ok(Json(InfoResponse {
        duration_formatted: format_duration(metadata.duration),
        metadata,
    }))
}
