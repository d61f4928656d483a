//! Presentation-ready status of a job, shared by the CLI and HTTP layers.

use serde::Serialize;

use crate::format::{format_eta, format_size, format_speed};
use crate::registry::{Job, JobId, JobOutcome, JobState};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub title: String,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorView {
    pub message: String,
}

/// Pollable status record. `result` and `error` are only set once the job
/// is terminal, and never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusView {
    pub id: JobId,
    pub state: JobState,
    /// Rounded to one decimal.
    pub percentage: f64,
    pub downloaded_bytes: u64,
    pub total_bytes: u64,
    pub speed: Option<String>,
    pub eta: Option<String>,
    pub downloaded: String,
    pub total: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorView>,
}

impl JobStatusView {
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

impl From<&Job> for JobStatusView {
    fn from(job: &Job) -> Self {
        let progress = job.progress();
        let (result, error) = match job.outcome() {
            Some(JobOutcome::Completed(r)) => (
                Some(ResultView {
                    title: r.title.clone(),
                    filename: r.filename.clone(),
                }),
                None,
            ),
            Some(JobOutcome::Failed(f)) => (
                None,
                Some(ErrorView {
                    message: f.message.clone(),
                }),
            ),
            None => (None, None),
        };
        Self {
            id: job.id(),
            state: job.state(),
            percentage: (progress.percentage * 10.0).round() / 10.0,
            downloaded_bytes: progress.downloaded_bytes,
            total_bytes: progress.total_bytes,
            speed: progress.speed_bytes_per_sec.map(format_speed),
            eta: progress.eta_secs.map(format_eta),
            downloaded: format_size(progress.downloaded_bytes),
            total: format_size(progress.total_bytes),
            title: job.title().map(str::to_string),
            result,
            error,
        }
    }
}
