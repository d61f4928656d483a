//! Route table.

mod downloads;
mod health;
mod info;

#[cfg(test)]
mod tests;

use axum::routing::{get, post};
use axum::Router;

use crate::error::ApiError;
use crate::server::AppState;
use vidz_core::JobId;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/info", post(info::get_info))
        .route("/api/download", post(downloads::start_download))
        .route("/api/progress/{id}", get(downloads::get_progress))
        .route("/api/file/{id}", get(downloads::get_file))
        .with_state(state)
}

/// Ids that do not parse can never name a job, so they are reported as unknown.
fn parse_job_id(raw: &str) -> Result<JobId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::not_found(format!("download {} not found", raw)))
}
