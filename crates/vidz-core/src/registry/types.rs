//! Job record and its state machine.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

use crate::engine::{EngineEvent, Quality};
use crate::progress::ProgressSnapshot;

/// Job identifier.
pub type JobId = uuid::Uuid;

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Starting,
    Resolving,
    Transferring,
    Finalizing,
    Completed,
    Failed,
}

impl JobState {
    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Starting => "starting",
            JobState::Resolving => "resolving",
            JobState::Transferring => "transferring",
            JobState::Finalizing => "finalizing",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the caller asked for. Immutable once the job exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub url: String,
    pub quality: Quality,
    pub audio_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    pub title: String,
    pub filename: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    pub message: String,
}

/// Terminal outcome; a job holds at most one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed(JobResult),
    Failed(JobFailure),
}

/// One requested transfer. Mutated only through the crate-internal
/// transition methods below, which the controller's job task drives.
#[derive(Debug, Clone)]
pub struct Job {
    id: JobId,
    request: JobRequest,
    state: JobState,
    progress: ProgressSnapshot,
    title: Option<String>,
    outcome: Option<JobOutcome>,
    finished_at: Option<Instant>,
}

impl Job {
    pub(crate) fn new(id: JobId, request: JobRequest) -> Self {
        Self {
            id,
            request,
            state: JobState::Starting,
            progress: ProgressSnapshot::default(),
            title: None,
            outcome: None,
            finished_at: None,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn request(&self) -> &JobRequest {
        &self.request
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn progress(&self) -> &ProgressSnapshot {
        &self.progress
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn outcome(&self) -> Option<&JobOutcome> {
        self.outcome.as_ref()
    }

    pub fn result(&self) -> Option<&JobResult> {
        match &self.outcome {
            Some(JobOutcome::Completed(r)) => Some(r),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&JobFailure> {
        match &self.outcome {
            Some(JobOutcome::Failed(f)) => Some(f),
            _ => None,
        }
    }

    /// When the job reached a terminal state.
    pub fn finished_at(&self) -> Option<Instant> {
        self.finished_at
    }

    pub(crate) fn begin_resolving(&mut self) {
        if self.state == JobState::Starting {
            self.state = JobState::Resolving;
        }
    }

    pub(crate) fn set_title(&mut self, title: String) {
        if !self.state.is_terminal() {
            self.title = Some(title);
        }
    }

    /// React to one engine event. The percentage never moves backward, even
    /// when the engine restarts its byte counters for a second stream.
    pub(crate) fn apply_event(&mut self, event: &EngineEvent) {
        if self.state.is_terminal() {
            return;
        }
        match event {
            EngineEvent::Downloading(raw) => {
                self.progress =
                    ProgressSnapshot::project(raw).not_below(self.progress.percentage);
                self.state = JobState::Transferring;
            }
            EngineEvent::Finished { .. } => {
                self.state = JobState::Finalizing;
            }
        }
    }

    /// Enter `Completed`. Returns false (and changes nothing) if already terminal.
    pub(crate) fn complete(&mut self, result: JobResult) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.title = Some(result.title.clone());
        self.progress = self.progress.completed();
        self.state = JobState::Completed;
        self.outcome = Some(JobOutcome::Completed(result));
        self.finished_at = Some(Instant::now());
        true
    }

    /// Enter `Failed`. Returns false (and changes nothing) if already terminal.
    pub(crate) fn fail(&mut self, message: impl Into<String>) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        let mut message = message.into();
        if message.trim().is_empty() {
            message = "Unknown error".to_string();
        }
        self.state = JobState::Failed;
        self.outcome = Some(JobOutcome::Failed(JobFailure { message }));
        self.finished_at = Some(Instant::now());
        true
    }
}
