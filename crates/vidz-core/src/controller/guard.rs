//! RAII guard that fails a job if its task exits without a terminal state.

use std::sync::Arc;

use crate::registry::{JobId, JobRegistry};

/// Writes `Failed` on drop unless disarmed. Covers panics inside the engine
/// and tasks dropped by runtime shutdown.
pub(super) struct TerminalGuard {
    registry: Arc<JobRegistry>,
    id: JobId,
    armed: bool,
}

impl TerminalGuard {
    pub(super) fn new(registry: Arc<JobRegistry>, id: JobId) -> Self {
        Self {
            registry,
            id,
            armed: true,
        }
    }

    pub(super) fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut failed = false;
        self.registry.update(&self.id, |job| {
            failed = job.fail("download task ended unexpectedly");
        });
        if failed {
            tracing::error!(job_id = %self.id, "job task ended without a result");
        }
    }
}
