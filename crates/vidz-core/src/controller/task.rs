//! The per-job task: fetch through the engine, project events into the
//! registry, and write back exactly one terminal outcome.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::engine::{file_name, ArtifactRef, Engine, EngineEvent, FetchRequest};
use crate::error::Result;
use crate::registry::{JobId, JobRegistry, JobResult};

use super::guard::TerminalGuard;

/// Engine events buffered between the engine and the projection.
const EVENT_BUFFER: usize = 64;

pub(super) struct JobContext {
    pub(super) registry: Arc<JobRegistry>,
    pub(super) engine: Arc<dyn Engine>,
    pub(super) prefetch_metadata: bool,
}

pub(super) async fn run_job(ctx: JobContext, id: JobId, request: FetchRequest) {
    let guard = TerminalGuard::new(Arc::clone(&ctx.registry), id);

    match drive(&ctx, id, &request).await {
        Ok(artifact) => {
            let result = JobResult {
                filename: file_name(&artifact.path),
                title: artifact.title,
                path: artifact.path,
            };
            tracing::info!(job_id = %id, path = %result.path.display(), "job completed");
            ctx.registry.update(&id, |job| {
                job.complete(result);
            });
        }
        Err(e) => {
            tracing::warn!(job_id = %id, engine = ctx.engine.name(), "job failed: {}", e);
            ctx.registry.update(&id, |job| {
                job.fail(e.to_string());
            });
        }
    }

    guard.disarm();
}

async fn drive(ctx: &JobContext, id: JobId, request: &FetchRequest) -> Result<ArtifactRef> {
    if ctx.prefetch_metadata {
        ctx.registry.update(&id, |job| job.begin_resolving());
        let meta = ctx.engine.resolve(&request.url).await?;
        tracing::debug!(job_id = %id, title = %meta.title, "metadata resolved");
        ctx.registry.update(&id, |job| job.set_title(meta.title));
    }

    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let (fetched, ()) = tokio::join!(
        ctx.engine.fetch(request, tx),
        consume_events(&ctx.registry, id, rx)
    );
    fetched
}

/// Apply events until the engine drops its sender.
async fn consume_events(registry: &JobRegistry, id: JobId, mut rx: mpsc::Receiver<EngineEvent>) {
    while let Some(event) = rx.recv().await {
        if let EngineEvent::Finished { filename } = &event {
            tracing::debug!(job_id = %id, file = %filename.display(), "transfer finished, post-processing");
        }
        if !registry.update(&id, |job| job.apply_event(&event)) {
            tracing::debug!(job_id = %id, "job evicted while running; dropping event");
        }
    }
}
