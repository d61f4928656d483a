//! Job lifecycle controller.
//!
//! Owns the registry and the engine. `submit` creates a job and spawns one
//! task per job which drives it to `Completed` or `Failed`; `poll` and
//! `retrieve_artifact` read the registry. Only the job task changes job
//! state, and every job runs independently of the others.

mod guard;
mod task;
mod view;


use std::path::PathBuf;
use std::sync::Arc;

use crate::config::VidzConfig;
use crate::engine::{Engine, FetchOptions, FetchRequest, MediaMetadata, Quality, YtDlp};
use crate::error::{Error, Result};
use crate::registry::{JobId, JobRegistry, JobRequest, JobState};

pub use view::{ErrorView, JobStatusView, ResultView};

use self::task::JobContext;

pub struct JobController {
    registry: Arc<JobRegistry>,
    engine: Arc<dyn Engine>,
    options: FetchOptions,
    prefetch_metadata: bool,
}

impl JobController {
    pub fn new(registry: Arc<JobRegistry>, engine: Arc<dyn Engine>, options: FetchOptions) -> Self {
        Self {
            registry,
            engine,
            options,
            prefetch_metadata: false,
        }
    }

    /// Controller backed by yt-dlp, with settings from the config file.
    pub fn from_config(cfg: &VidzConfig, registry: Arc<JobRegistry>) -> Self {
        let options = FetchOptions::new(cfg.output_dir.clone())
            .with_audio(cfg.audio_codec.clone(), cfg.audio_quality.clone());
        Self::new(registry, Arc::new(YtDlp::from_config(cfg)), options)
            .with_prefetch_metadata(cfg.prefetch_metadata)
    }

    /// Resolve metadata (state `Resolving`) before each transfer.
    pub fn with_prefetch_metadata(mut self, yes: bool) -> Self {
        self.prefetch_metadata = yes;
        self
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Look up metadata for a URL without downloading.
    pub async fn info(&self, url: &str) -> Result<MediaMetadata> {
        let url = validate_url(url)?;
        self.engine.resolve(url).await
    }

    /// Create a job and start it in the background. Returns immediately.
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, url: &str, quality: Quality, audio_only: bool) -> Result<JobId> {
        let url = validate_url(url)?;
        let request = JobRequest {
            url: url.to_string(),
            quality,
            audio_only,
        };
        let fetch = FetchRequest::new(url, quality, audio_only, &self.options);
        let id = self.registry.create(request);
        tracing::info!(job_id = %id, url, quality = %quality, audio_only, "job submitted");

        let ctx = JobContext {
            registry: Arc::clone(&self.registry),
            engine: Arc::clone(&self.engine),
            prefetch_metadata: self.prefetch_metadata,
        };
        tokio::spawn(task::run_job(ctx, id, fetch));
        Ok(id)
    }

    /// Current status of a job.
    pub fn poll(&self, id: &JobId) -> Result<JobStatusView> {
        self.registry
            .get(id)
            .map(|job| JobStatusView::from(&job))
            .ok_or(Error::NotFound(*id))
    }

    /// Path of a completed job's file, checked to still exist on disk.
    pub async fn retrieve_artifact(&self, id: &JobId) -> Result<PathBuf> {
        let job = self.registry.get(id).ok_or(Error::NotFound(*id))?;
        let result = match job.result() {
            Some(result) if job.state() == JobState::Completed => result,
            _ => {
                return Err(Error::NotReady {
                    id: *id,
                    state: job.state(),
                })
            }
        };
        match tokio::fs::metadata(&result.path).await {
            Ok(meta) if meta.is_file() => Ok(result.path.clone()),
            _ => {
                tracing::warn!(job_id = %id, path = %result.path.display(), "artifact missing on disk");
                Err(Error::ArtifactMissing(result.path.clone()))
            }
        }
    }
}

fn validate_url(url: &str) -> Result<&str> {
    let url = url.trim();
    if url.is_empty() {
        return Err(Error::Validation("URL is required".to_string()));
    }
    Ok(url)
}
